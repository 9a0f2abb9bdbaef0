pub mod gemini; // Gemini text generation
pub mod vision; // Cloud Vision image annotation

pub use gemini::GeminiClient;
pub use vision::VisionClient;

use crate::error::{AnalysisError, GenerationError};
use crate::models::ImageAnalysisResult;

/// Image-analysis hop: raw image bytes in, structured labels out.
#[async_trait::async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze(&self, image: &[u8]) -> Result<ImageAnalysisResult, AnalysisError>;
}

/// Advice-generation hop: prompt in, generated text out.
#[async_trait::async_trait]
pub trait AdviceGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
