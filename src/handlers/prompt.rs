//! Deterministic prompt construction for the advice-generation hop.
//!
//! The prompt is a pure function of scenario, analysis result and optional
//! user context, so identical inputs always yield the identical string.

use crate::models::{ImageAnalysisResult, Scenario, UNKNOWN};

const MAX_LABELS: usize = 5;
const MAX_OBJECTS: usize = 5;

const HEADER: &str = "You are an expert housekeeping advisor. Based on the analysis of an image, \
provide practical, specific housekeeping advice (cleaning, organizing, or cooking tips) for the user.";

const FOOTER: &str = "Provide your advice in a friendly, conversational tone. Include:\n\
1. A brief assessment of the current state\n\
2. 3-5 specific, actionable recommendations\n\
3. One quick tip or life hack relevant to the situation\n\
\n\
Keep your response concise (250-350 words) and practical.";

/// Which focus block a scenario selects. Closed set; everything else is `Generic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Kitchen,
    Bathroom,
    Bedroom,
    LivingRoom,
    Generic,
}

impl Focus {
    pub fn for_scenario(scenario: &Scenario) -> Self {
        match scenario {
            Scenario::Kitchen => Focus::Kitchen,
            Scenario::Bathroom => Focus::Bathroom,
            Scenario::Bedroom => Focus::Bedroom,
            Scenario::LivingRoom => Focus::LivingRoom,
            Scenario::Plant
            | Scenario::Closet
            | Scenario::Fridge
            | Scenario::Unknown
            | Scenario::Other(_) => Focus::Generic,
        }
    }

    pub fn points(self) -> &'static [&'static str; 4] {
        match self {
            Focus::Kitchen => &[
                "Food safety and hygiene",
                "Efficient organization of kitchen tools and appliances",
                "Cleaning techniques for different surfaces",
                "Meal preparation tips based on visible ingredients",
            ],
            Focus::Bathroom => &[
                "Hygiene and sanitation",
                "Mold and mildew prevention",
                "Efficient organization of toiletries",
                "Water conservation tips",
            ],
            Focus::Bedroom => &[
                "Organization and decluttering",
                "Bedding hygiene and maintenance",
                "Creating a restful environment",
                "Storage solutions",
            ],
            Focus::LivingRoom => &[
                "Dust control and air quality",
                "Furniture arrangement and care",
                "Decluttering common areas",
                "Creating a welcoming space",
            ],
            Focus::Generic => &[
                "General cleanliness and hygiene",
                "Decluttering and organization of visible items",
                "Simple maintenance routines",
                "Care of any plants, clothing, or food that is visible",
            ],
        }
    }

    fn block(self) -> String {
        let mut block = String::from("Focus on:");
        for (i, point) in self.points().iter().enumerate() {
            block.push_str(&format!("\n{}. {}", i + 1, point));
        }
        block
    }
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        UNKNOWN
    } else {
        value
    }
}

fn join_or_none<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let joined = items.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "none".to_string()
    } else {
        joined
    }
}

pub fn build_prompt(
    scenario: &Scenario,
    analysis: &ImageAnalysisResult,
    context: Option<&str>,
) -> String {
    let props = &analysis.properties;

    // Input order, not score order.
    let labels = join_or_none(
        analysis
            .labels
            .iter()
            .take(MAX_LABELS)
            .map(|l| l.description.as_str()),
    );
    let objects = join_or_none(
        analysis
            .objects
            .iter()
            .take(MAX_OBJECTS)
            .map(|o| o.name.as_str()),
    );

    let mut prompt = format!(
        "{}\n\n\
         Image Analysis:\n\
         - Environment Type: {}\n\
         - Cleanliness Level: {}\n\
         - Organization Level: {}\n\
         - Key Items Detected: {}\n\
         - Key Features: {}",
        HEADER,
        or_unknown(&props.environment_type),
        or_unknown(&props.cleanliness_level),
        or_unknown(&props.organization_level),
        objects,
        labels,
    );

    if let Some(text) = analysis.text.as_deref().filter(|t| !t.trim().is_empty()) {
        prompt.push_str(&format!("\n- Text Visible in Image: {}", text));
    }

    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("\n\nAdditional Context from User: {}", context));
    }

    prompt.push_str("\n\n");
    prompt.push_str(&Focus::for_scenario(scenario).block());
    prompt.push_str("\n\n");
    prompt.push_str(FOOTER);

    prompt
}
