//! Plant disease catalog.
//!
//! The classifier emits one of these class names as `diseaseName`. Each
//! class carries the treatment tips shown to growers.

use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tips returned for names outside the catalog.
pub const FALLBACK_TIPS: &[&str] = &["No treatment tips available"];

/// A class the plant disease model can predict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiseaseClass {
    BacteriaSpot,
    EarlyBlight,
    Healthy,
    LateBlight,
    LeafMold,
    SeptoriaLeafSpot,
    TargetSpot,
    YellowLeafCurlVirus,
    MosaicVirus,
    SpiderMite,
}

#[derive(Debug, Clone, Error)]
#[error("Unknown disease: {0}")]
pub struct UnknownDisease(pub String);

impl DiseaseClass {
    /// All classes in model output order.
    pub const ALL: [DiseaseClass; 10] = [
        DiseaseClass::BacteriaSpot,
        DiseaseClass::EarlyBlight,
        DiseaseClass::Healthy,
        DiseaseClass::LateBlight,
        DiseaseClass::LeafMold,
        DiseaseClass::SeptoriaLeafSpot,
        DiseaseClass::TargetSpot,
        DiseaseClass::YellowLeafCurlVirus,
        DiseaseClass::MosaicVirus,
        DiseaseClass::SpiderMite,
    ];

    /// Display name as printed by the classifier.
    pub fn display_name(&self) -> &'static str {
        match self {
            DiseaseClass::BacteriaSpot => "Bacteria Spot Disease",
            DiseaseClass::EarlyBlight => "Early Blight Disease",
            DiseaseClass::Healthy => "Healthy and Fresh",
            DiseaseClass::LateBlight => "Late Blight Disease",
            DiseaseClass::LeafMold => "Leaf Mold Disease",
            DiseaseClass::SeptoriaLeafSpot => "Septoria Leaf Spot Disease",
            DiseaseClass::TargetSpot => "Target Spot Disease",
            DiseaseClass::YellowLeafCurlVirus => "Tomato Yellow Leaf Curl Virus Disease",
            DiseaseClass::MosaicVirus => "Tomato Mosaic Virus Disease",
            DiseaseClass::SpiderMite => "Two Spotted Spider Mite Disease",
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, DiseaseClass::Healthy)
    }

    /// Treatment tips for this class.
    pub fn tips(&self) -> &'static [&'static str] {
        match self {
            DiseaseClass::BacteriaSpot => &[
                "Remove infected leaves",
                "Avoid overhead watering",
                "Use copper-based fungicides",
                "Practice crop rotation",
                "Sanitize gardening tools",
                "Monitor regularly for new spots",
            ],
            DiseaseClass::EarlyBlight => &[
                "Apply fungicide every 7–10 days",
                "Remove infected leaves",
                "Rotate crops yearly",
                "Mulch soil to prevent splash",
                "Water at soil level only",
                "Prune dense foliage for airflow",
            ],
            DiseaseClass::Healthy => &[
                "Maintain regular care routine",
                "Ensure good sunlight exposure",
                "Monitor for early signs of disease",
                "Use proper fertilization",
                "Water consistently but not excessively",
                "Keep area weed-free",
            ],
            DiseaseClass::LateBlight => &[
                "Destroy infected plants immediately",
                "Apply late blight fungicide",
                "Improve air circulation",
                "Avoid wetting leaves when watering",
                "Use resistant varieties if possible",
                "Monitor weather conditions for high humidity",
            ],
            DiseaseClass::LeafMold => &[
                "Remove and destroy infected leaves",
                "Avoid overhead watering",
                "Apply fungicide for leaf mold",
                "Increase air circulation",
                "Prune dense leaves",
                "Space plants adequately",
            ],
            DiseaseClass::SeptoriaLeafSpot => &[
                "Remove affected leaves promptly",
                "Apply fungicide every 7–10 days",
                "Avoid watering leaves directly",
                "Practice crop rotation",
                "Keep garden clean of debris",
                "Monitor plants regularly",
            ],
            DiseaseClass::TargetSpot => &[
                "Remove infected foliage",
                "Apply recommended fungicide",
                "Ensure proper spacing between plants",
                "Avoid overhead irrigation",
                "Sanitize tools regularly",
                "Monitor leaves for early symptoms",
            ],
            DiseaseClass::YellowLeafCurlVirus => &[
                "Remove and destroy infected plants",
                "Control whitefly population",
                "Use virus-resistant tomato varieties",
                "Avoid handling plants when wet",
                "Remove weeds that host pests",
                "Use reflective mulch to repel insects",
            ],
            DiseaseClass::MosaicVirus => &[
                "Remove infected plants",
                "Disinfect tools and hands before handling plants",
                "Avoid tobacco products near plants",
                "Use virus-resistant seeds",
                "Practice crop rotation",
                "Control insect vectors",
            ],
            DiseaseClass::SpiderMite => &[
                "Spray plants with water to remove mites",
                "Use insecticidal soap or neem oil",
                "Introduce natural predators (ladybugs, predatory mites)",
                "Keep humidity higher to reduce mite proliferation",
                "Prune heavily infested areas",
                "Monitor plants frequently for early infestation",
            ],
        }
    }

    /// Catalog entry for this class.
    pub fn info(&self) -> DiseaseInfo {
        DiseaseInfo {
            name: self.display_name().to_string(),
            healthy: self.is_healthy(),
            tips: self.tips().iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Tips for a classifier-provided name, falling back for unknown names.
    pub fn tips_for_name(name: &str) -> &'static [&'static str] {
        name.parse::<DiseaseClass>()
            .map(|class| class.tips())
            .unwrap_or(FALLBACK_TIPS)
    }
}

impl std::fmt::Display for DiseaseClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for DiseaseClass {
    type Err = UnknownDisease;

    /// Accepts the display name (case-insensitive) or the snake_case id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|class| {
                class.display_name().eq_ignore_ascii_case(needle)
                    || serde_json::to_value(class)
                        .ok()
                        .and_then(|v| v.as_str().map(|id| id == needle))
                        .unwrap_or(false)
            })
            .ok_or_else(|| UnknownDisease(s.to_string()))
    }
}

/// Catalog entry served by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DiseaseInfo {
    pub name: String,
    pub healthy: bool,
    pub tips: Vec<String>,
}
