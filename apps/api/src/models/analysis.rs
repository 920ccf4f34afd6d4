use serde::{Deserialize, Serialize};

/// Structured summary of a CV, produced by the provider from raw text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CvAnalysis {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub total_experience_years: Option<f32>,
    #[serde(default)]
    pub top_skills: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
}
