use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "unknown";

/// Caller-supplied tag selecting the advice focus block.
///
/// Matching is exact string equality. Anything outside the known set is kept
/// verbatim in `Other` and routed to the generic focus block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Scenario {
    Plant,
    Closet,
    Fridge,
    Kitchen,
    Bathroom,
    Bedroom,
    LivingRoom,
    Unknown,
    Other(String),
}

impl Scenario {
    pub fn as_str(&self) -> &str {
        match self {
            Scenario::Plant => "plant",
            Scenario::Closet => "closet",
            Scenario::Fridge => "fridge",
            Scenario::Kitchen => "kitchen",
            Scenario::Bathroom => "bathroom",
            Scenario::Bedroom => "bedroom",
            Scenario::LivingRoom => "living room",
            Scenario::Unknown => UNKNOWN,
            Scenario::Other(raw) => raw,
        }
    }
}

impl From<String> for Scenario {
    fn from(s: String) -> Self {
        match s.as_str() {
            "plant" => Scenario::Plant,
            "closet" => Scenario::Closet,
            "fridge" => Scenario::Fridge,
            "kitchen" => Scenario::Kitchen,
            "bathroom" => Scenario::Bathroom,
            "bedroom" => Scenario::Bedroom,
            "living room" => Scenario::LivingRoom,
            "unknown" => Scenario::Unknown,
            _ => Scenario::Other(s),
        }
    }
}

impl From<&str> for Scenario {
    fn from(s: &str) -> Self {
        Scenario::from(s.to_string())
    }
}

impl From<Scenario> for String {
    fn from(scenario: Scenario) -> Self {
        match scenario {
            Scenario::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw body of `POST /` as sent by the browser. Fields stay optional so that
/// validation can name the missing one.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatPayload {
    #[serde(default)]
    pub scenario: Option<String>,
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

/// A validated gateway request. Lives for one HTTP call.
#[derive(Debug, Clone)]
pub struct AdviceRequest {
    pub scenario: Scenario,
    pub image: Vec<u8>,
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub description: String,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topicality: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub name: String,
    pub score: f32,
    #[serde(default)]
    pub bounding_poly: Vec<Vertex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantColor {
    pub color: Rgb,
    pub score: f32,
    pub pixel_fraction: f32,
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageProperties {
    #[serde(default = "unknown")]
    pub environment_type: String,
    #[serde(default = "unknown")]
    pub cleanliness_level: String,
    #[serde(default = "unknown")]
    pub organization_level: String,
}

impl Default for ImageProperties {
    fn default() -> Self {
        Self {
            environment_type: unknown(),
            cleanliness_level: unknown(),
            organization_level: unknown(),
        }
    }
}

/// Structured output of the image-analysis hop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysisResult {
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub objects: Vec<DetectedObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, rename = "colors")]
    pub dominant_colors: Vec<DominantColor>,
    #[serde(default)]
    pub properties: ImageProperties,
}

/// Returned only when both hops succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceResult {
    pub advice: String,
    #[serde(rename = "analysis")]
    pub image_analysis: ImageAnalysisResult,
}

/// Uniform `{success, data|error}` wrapper returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Body of the collaborator `POST /process` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessPayload {
    #[serde(default)]
    pub image_data: Option<String>,
}

/// Body of the collaborator `POST /generate` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratePayload {
    pub image_analysis: ImageAnalysisResult,
    #[serde(default)]
    pub scenario: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedAdvice {
    pub advice: String,
}
