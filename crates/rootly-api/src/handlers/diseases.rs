//! Disease catalog handlers.

use axum::extract::Path;
use axum::Json;
use rootly_models::{DiseaseClass, DiseaseInfo};
use serde::Serialize;

/// List every class the classifier can report.
pub async fn list_diseases() -> Json<Vec<DiseaseInfo>> {
    Json(DiseaseClass::ALL.iter().map(DiseaseClass::info).collect())
}

#[derive(Serialize)]
pub struct DiseaseTipsResponse {
    pub name: String,
    /// False when the name is outside the catalog and fallback tips are returned
    pub known: bool,
    pub tips: Vec<String>,
}

/// Treatment tips for a disease name as printed by the classifier.
pub async fn disease_tips(Path(name): Path<String>) -> Json<DiseaseTipsResponse> {
    let tips = DiseaseClass::tips_for_name(&name);
    let (name, known) = match name.parse::<DiseaseClass>() {
        Ok(class) => (class.display_name().to_string(), true),
        Err(_) => (name, false),
    };

    Json(DiseaseTipsResponse {
        name,
        known,
        tips: tips.iter().map(|t| t.to_string()).collect(),
    })
}
