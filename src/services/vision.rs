use base64::{engine::general_purpose, Engine};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ImageAnalyzer;
use crate::error::AnalysisError;
use crate::models::{
    DetectedObject, DominantColor, ImageAnalysisResult, ImageProperties, Label, Rgb, Vertex, UNKNOWN,
};

const FEATURES: [&str; 4] = [
    "LABEL_DETECTION",
    "OBJECT_LOCALIZATION",
    "TEXT_DETECTION",
    "IMAGE_PROPERTIES",
];

const ENVIRONMENT_LABELS: [&str; 5] = ["kitchen", "bathroom", "bedroom", "living room", "dining room"];

/// Checked in this order; the first level with a matching label wins.
const CLEANLINESS_INDICATORS: [(&str, &[&str]); 3] = [
    ("clean", &["clean", "tidy", "organized", "neat", "spotless"]),
    ("moderate", &["lived in", "used", "normal"]),
    ("dirty", &["dirty", "messy", "cluttered", "disorganized", "stained"]),
];

#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    requests: Vec<AnnotateImageRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest<'a> {
    image: ImageContent,
    features: Vec<Feature<'a>>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    feature_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    label_annotations: Vec<EntityAnnotation>,
    #[serde(default)]
    localized_object_annotations: Vec<LocalizedObjectAnnotation>,
    #[serde(default)]
    text_annotations: Vec<EntityAnnotation>,
    #[serde(default)]
    image_properties_annotation: Option<ImagePropertiesAnnotation>,
    #[serde(default)]
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    #[serde(default)]
    description: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    topicality: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalizedObjectAnnotation {
    #[serde(default)]
    name: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    bounding_poly: Option<BoundingPoly>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoundingPoly {
    #[serde(default)]
    normalized_vertices: Vec<Vertex>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImagePropertiesAnnotation {
    #[serde(default)]
    dominant_colors: Option<DominantColorsAnnotation>,
}

#[derive(Debug, Deserialize)]
struct DominantColorsAnnotation {
    #[serde(default)]
    colors: Vec<ColorInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColorInfo {
    #[serde(default)]
    color: Color,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    pixel_fraction: f32,
}

#[derive(Debug, Default, Deserialize)]
struct Color {
    #[serde(default)]
    red: f32,
    #[serde(default)]
    green: f32,
    #[serde(default)]
    blue: f32,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// Google Cloud Vision `images:annotate` client
pub struct VisionClient {
    api_key: String,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl VisionClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            base_url,
            timeout,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/images:annotate", self.base_url)
    }
}

#[async_trait::async_trait]
impl ImageAnalyzer for VisionClient {
    async fn analyze(&self, image: &[u8]) -> Result<ImageAnalysisResult, AnalysisError> {
        log::debug!("📸 Sending {} bytes to Vision API", image.len());

        let request = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: general_purpose::STANDARD.encode(image),
                },
                features: FEATURES
                    .iter()
                    .map(|&feature_type| Feature { feature_type })
                    .collect(),
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        log::debug!("📥 Vision API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("❌ Vision API error ({}): {}", status, body);
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let annotate: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::from_reqwest(e, self.timeout))?;

        let first = annotate
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| AnalysisError::Decode("no annotation results".to_string()))?;

        if let Some(err) = &first.error {
            log::error!("❌ Vision API rejected image (code {}): {}", err.code, err.message);
            return Err(AnalysisError::Upstream(err.message.clone()));
        }

        let result = map_response(first);
        log::info!(
            "✅ Vision analysis: {} labels, {} objects, {}",
            result.labels.len(),
            result.objects.len(),
            if result.text.is_some() { "text" } else { "no text" }
        );

        Ok(result)
    }
}

fn map_response(response: AnnotateImageResponse) -> ImageAnalysisResult {
    let labels: Vec<Label> = response
        .label_annotations
        .into_iter()
        .map(|label| Label {
            description: label.description,
            score: label.score,
            topicality: label.topicality,
        })
        .collect();

    let objects: Vec<DetectedObject> = response
        .localized_object_annotations
        .into_iter()
        .map(|obj| DetectedObject {
            name: obj.name,
            score: obj.score,
            bounding_poly: obj
                .bounding_poly
                .map(|poly| poly.normalized_vertices)
                .unwrap_or_default(),
        })
        .collect();

    // The first text annotation holds the whole detected text block.
    let text = response
        .text_annotations
        .into_iter()
        .next()
        .map(|t| t.description)
        .filter(|t| !t.trim().is_empty());

    let dominant_colors = response
        .image_properties_annotation
        .and_then(|props| props.dominant_colors)
        .map(|dc| dc.colors)
        .unwrap_or_default()
        .into_iter()
        .map(|info| DominantColor {
            color: Rgb {
                red: channel(info.color.red),
                green: channel(info.color.green),
                blue: channel(info.color.blue),
            },
            score: info.score,
            pixel_fraction: info.pixel_fraction,
        })
        .collect();

    let properties = infer_properties(&labels, &objects);

    ImageAnalysisResult {
        labels,
        objects,
        text,
        dominant_colors,
        properties,
    }
}

fn channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Keyword heuristics used when the upstream gives no explicit room classification.
pub fn infer_properties(labels: &[Label], objects: &[DetectedObject]) -> ImageProperties {
    let lowered: Vec<String> = labels.iter().map(|l| l.description.to_lowercase()).collect();

    let environment_type = lowered
        .iter()
        .find(|d| ENVIRONMENT_LABELS.contains(&d.as_str()))
        .cloned()
        .unwrap_or_else(|| UNKNOWN.to_string());

    let cleanliness_level = CLEANLINESS_INDICATORS
        .iter()
        .find(|(_, indicators)| {
            lowered
                .iter()
                .any(|d| indicators.iter().any(|indicator| d.contains(indicator)))
        })
        .map(|(level, _)| level.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());

    let organization_level = match objects.len() {
        0 => UNKNOWN,
        1..=5 => "minimal",
        6..=10 => "moderate",
        _ => "cluttered",
    }
    .to_string();

    ImageProperties {
        environment_type,
        cleanliness_level,
        organization_level,
    }
}
