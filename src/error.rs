use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::Envelope;

/// Failure of the image-analysis hop.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Vision API request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Vision API request failed: {0}")]
    Transport(String),
    #[error("Vision API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("malformed Vision API response: {0}")]
    Decode(String),
    /// Error reported by the service itself, passed through verbatim.
    #[error("{0}")]
    Upstream(String),
}

impl AnalysisError {
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            AnalysisError::Timeout(timeout)
        } else if err.is_decode() {
            AnalysisError::Decode(err.to_string())
        } else {
            AnalysisError::Transport(err.to_string())
        }
    }
}

/// Failure of the advice-generation hop.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Gemini API request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Gemini API request failed: {0}")]
    Transport(String),
    #[error("Gemini API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("malformed Gemini API response: {0}")]
    Decode(String),
    #[error("blocked by safety filters: {0}")]
    Blocked(String),
    #[error("empty response")]
    EmptyResponse,
    /// Error object returned in a 2xx body, passed through verbatim.
    #[error("{0}")]
    Upstream(String),
}

impl GenerationError {
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            GenerationError::Timeout(timeout)
        } else if err.is_decode() {
            GenerationError::Decode(err.to_string())
        } else {
            GenerationError::Transport(err.to_string())
        }
    }
}

/// Everything the gateway can report back to the browser.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid image_data: {0}")]
    InvalidImage(String),
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("request body too large: {0}")]
    PayloadTooLarge(String),
    #[error("Error processing image: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("Message generator error: {0}")]
    Generation(#[from] GenerationError),
    #[error("Only POST requests are supported")]
    MethodNotAllowed,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingField(_)
            | GatewayError::InvalidImage(_)
            | GatewayError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Analysis(_) | GatewayError::Generation(_) => StatusCode::BAD_GATEWAY,
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(Envelope::<()>::failure(self.to_string()))).into_response()
    }
}
