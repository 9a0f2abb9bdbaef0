use base64::{engine::general_purpose, Engine};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::error::GatewayError;
use crate::handlers::prompt::build_prompt;
use crate::models::{AdviceRequest, AdviceResult, ChatPayload, ImageAnalysisResult, Scenario};
use crate::services::{AdviceGenerator, ImageAnalyzer};

/// Two-hop orchestration: analyze the photo, then ask for advice.
///
/// Stateless apart from the injected clients, so one instance serves every
/// request concurrently.
pub struct AdvisorHandler {
    analyzer: Arc<dyn ImageAnalyzer>,
    generator: Arc<dyn AdviceGenerator>,
}

impl AdvisorHandler {
    pub fn new(analyzer: Arc<dyn ImageAnalyzer>, generator: Arc<dyn AdviceGenerator>) -> Self {
        Self {
            analyzer,
            generator,
        }
    }

    /// Gateway entry point. Every failure comes back as a `GatewayError`.
    pub async fn advise(&self, payload: ChatPayload) -> Result<AdviceResult, GatewayError> {
        let request = validate(payload)?;
        let fingerprint = fingerprint(&request.image);

        log::info!(
            "🏠 Advice request: scenario={}, image={} ({} bytes), context={}",
            request.scenario,
            fingerprint,
            request.image.len(),
            request.context.is_some()
        );

        let analysis = self.analyze(&request.image, &fingerprint).await?;
        let advice = self
            .advice_for(&request.scenario, &analysis, request.context.as_deref())
            .await?;

        log::info!("✅ Advice ready for image={}", fingerprint);

        Ok(AdviceResult {
            advice,
            image_analysis: analysis,
        })
    }

    /// First hop only. Also backs the `/process` collaborator endpoint.
    pub async fn analyze(
        &self,
        image: &[u8],
        fingerprint: &str,
    ) -> Result<ImageAnalysisResult, GatewayError> {
        log::info!("📸 Analyzing image={}", fingerprint);
        self.analyzer.analyze(image).await.map_err(|e| {
            log::error!("❌ Image analysis failed for image={}: {}", fingerprint, e);
            GatewayError::Analysis(e)
        })
    }

    /// Second hop only. Also backs the `/generate` collaborator endpoint.
    pub async fn advice_for(
        &self,
        scenario: &Scenario,
        analysis: &ImageAnalysisResult,
        context: Option<&str>,
    ) -> Result<String, GatewayError> {
        let prompt = build_prompt(scenario, analysis, context);
        log::debug!("📝 Prompt for scenario={}:\n{}", scenario, prompt);

        self.generator.generate(&prompt).await.map_err(|e| {
            log::error!("❌ Advice generation failed for scenario={}: {}", scenario, e);
            GatewayError::Generation(e)
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, GatewayError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => {
            log::warn!("⚠️ Rejecting request: missing {}", field);
            Err(GatewayError::MissingField(field))
        }
    }
}

pub fn validate(payload: ChatPayload) -> Result<AdviceRequest, GatewayError> {
    let scenario = required(payload.scenario, "scenario")?;
    let image_data = required(payload.image_data, "image_data")?;
    let image = decode_image(&image_data)?;

    Ok(AdviceRequest {
        scenario: Scenario::from(scenario),
        image,
        context: payload.context.filter(|c| !c.trim().is_empty()),
    })
}

/// Decode base64 image data, dropping a `data:image/...;base64,` prefix if present.
pub fn decode_image(image_data: &str) -> Result<Vec<u8>, GatewayError> {
    let encoded = match image_data.find("base64,") {
        Some(idx) => &image_data[idx + "base64,".len()..],
        None => image_data,
    };

    let image = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| {
            log::warn!("⚠️ Rejecting request: undecodable image_data: {}", e);
            GatewayError::InvalidImage(e.to_string())
        })?;

    if image.is_empty() {
        return Err(GatewayError::MissingField("image_data"));
    }

    Ok(image)
}

/// Short content hash used to correlate log lines of one request.
pub fn fingerprint(image: &[u8]) -> String {
    let digest = Sha256::digest(image);
    hex::encode(&digest[..6])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AnalysisError, GenerationError};
    use crate::models::{ImageProperties, Label};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // "hello" in base64
    const IMAGE_B64: &str = "aGVsbG8=";

    struct MockAnalyzer {
        calls: AtomicUsize,
        result: Result<ImageAnalysisResult, String>,
    }

    #[async_trait::async_trait]
    impl ImageAnalyzer for MockAnalyzer {
        async fn analyze(&self, image: &[u8]) -> Result<ImageAnalysisResult, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(image, b"hello");
            self.result.clone().map_err(AnalysisError::Upstream)
        }
    }

    struct MockGenerator {
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl AdviceGenerator for MockGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                Err(GenerationError::EmptyResponse)
            } else {
                Ok("Water the plant once a week.".to_string())
            }
        }
    }

    fn plant_analysis() -> ImageAnalysisResult {
        ImageAnalysisResult {
            labels: vec![Label {
                description: "Plant".to_string(),
                score: 0.98,
                topicality: None,
            }],
            objects: vec![],
            text: None,
            dominant_colors: vec![],
            properties: ImageProperties::default(),
        }
    }

    fn setup(
        analysis: Result<ImageAnalysisResult, String>,
        generator_fails: bool,
    ) -> (AdvisorHandler, Arc<MockAnalyzer>, Arc<MockGenerator>) {
        let analyzer = Arc::new(MockAnalyzer {
            calls: AtomicUsize::new(0),
            result: analysis,
        });
        let generator = Arc::new(MockGenerator {
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(vec![]),
            fail: generator_fails,
        });
        let handler = AdvisorHandler::new(analyzer.clone(), generator.clone());
        (handler, analyzer, generator)
    }

    fn payload(scenario: Option<&str>, image_data: Option<&str>) -> ChatPayload {
        ChatPayload {
            scenario: scenario.map(str::to_string),
            image_data: image_data.map(str::to_string),
            context: None,
        }
    }

    #[tokio::test]
    async fn test_both_hops_succeed() {
        let (handler, analyzer, generator) = setup(Ok(plant_analysis()), false);

        let result = handler
            .advise(payload(Some("plant"), Some(IMAGE_B64)))
            .await
            .unwrap();

        assert_eq!(result.advice, "Water the plant once a week.");
        assert_eq!(result.image_analysis, plant_analysis());
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(
            prompts[0],
            build_prompt(&Scenario::Plant, &plant_analysis(), None)
        );
    }

    #[tokio::test]
    async fn test_missing_fields_touch_no_collaborator() {
        let (handler, analyzer, generator) = setup(Ok(plant_analysis()), false);

        let err = handler.advise(payload(None, Some(IMAGE_B64))).await.unwrap_err();
        assert_eq!(err.to_string(), "missing required field: scenario");

        let err = handler.advise(payload(Some("plant"), None)).await.unwrap_err();
        assert_eq!(err.to_string(), "missing required field: image_data");

        let err = handler.advise(payload(Some(""), Some(IMAGE_B64))).await.unwrap_err();
        assert_eq!(err.to_string(), "missing required field: scenario");

        let err = handler
            .advise(payload(Some("plant"), Some("!!not base64!!")))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidImage(_)));

        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_analysis_failure_short_circuits() {
        let (handler, analyzer, generator) = setup(Err("429 Resource exhausted".to_string()), false);

        let err = handler
            .advise(payload(Some("plant"), Some(IMAGE_B64)))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Error processing image: 429 Resource exhausted");
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generation_failure_is_prefixed() {
        let (handler, _analyzer, generator) = setup(Ok(plant_analysis()), true);

        let err = handler
            .advise(payload(Some("kitchen"), Some(IMAGE_B64)))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Message generator error: empty response");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_context_reaches_prompt() {
        let (handler, _analyzer, generator) = setup(Ok(plant_analysis()), false);
        let mut request = payload(Some("garage"), Some(IMAGE_B64));
        request.context = Some("Shared with two roommates".to_string());

        handler.advise(request).await.unwrap();

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("Additional Context from User: Shared with two roommates"));
        assert!(prompts[0].contains("General cleanliness and hygiene"));
    }

    #[test]
    fn test_decode_strips_data_url_prefix() {
        assert_eq!(decode_image("data:image/jpeg;base64,aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_image("aGVsbG8=").unwrap(), b"hello");
        assert!(decode_image("data:image/png;base64,").is_err());
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(fingerprint(b"hello"), "2cf24dba5fb0");
        assert_eq!(fingerprint(b"hello").len(), 12);
    }
}
