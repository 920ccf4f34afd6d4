//! Maps provider output onto the shapes the API returns.
//! Any response that cannot be mapped is a `ParseError`.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::parse_json_text;
use crate::models::analysis::CvAnalysis;
use crate::models::recommendation::Recommendation;

#[derive(Debug, Deserialize)]
struct RecommendationEnvelope {
    recommendations: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct QuestionEnvelope {
    questions: Vec<Value>,
}

/// Reads `recommendations` from the provider text. Entries that do not
/// deserialize or have a blank title are skipped; the rest keep their order.
pub fn parse_recommendations(text: &str, limit: usize) -> Result<Vec<Recommendation>, AppError> {
    let envelope: RecommendationEnvelope = parse_json_text(text)?;

    let recommendations: Vec<Recommendation> = envelope
        .recommendations
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Recommendation>(entry) {
            Ok(rec) => Some(rec),
            Err(e) => {
                warn!("Skipping malformed recommendation: {e}");
                None
            }
        })
        .filter_map(clean_recommendation)
        .take(limit)
        .collect();

    if recommendations.is_empty() {
        return Err(AppError::Parse(
            "provider returned no usable recommendations".to_string(),
        ));
    }
    Ok(recommendations)
}

/// Reads `questions`, keeping non-blank strings up to `limit`.
pub fn parse_questions(text: &str, limit: usize) -> Result<Vec<String>, AppError> {
    let envelope: QuestionEnvelope = parse_json_text(text)?;

    let questions: Vec<String> = envelope
        .questions
        .into_iter()
        .filter_map(|q| match q {
            Value::String(s) => Some(s.trim().to_string()),
            _ => None,
        })
        .filter(|q| !q.is_empty())
        .take(limit)
        .collect();

    if questions.is_empty() {
        return Err(AppError::Parse("provider returned no questions".to_string()));
    }
    Ok(questions)
}

pub fn parse_cv_analysis(text: &str) -> Result<CvAnalysis, AppError> {
    let mut analysis: CvAnalysis = parse_json_text(text)?;

    analysis.name = non_blank(analysis.name);
    analysis.email = non_blank(analysis.email);
    analysis.summary = non_blank(analysis.summary);
    analysis.total_experience_years = analysis
        .total_experience_years
        .filter(|y| y.is_finite() && *y >= 0.0);
    analysis.top_skills = trimmed_list(analysis.top_skills);

    Ok(analysis)
}

fn clean_recommendation(mut rec: Recommendation) -> Option<Recommendation> {
    rec.title = rec.title.trim().to_string();
    if rec.title.is_empty() {
        return None;
    }
    rec.description = non_blank(rec.description);
    rec.company = non_blank(rec.company);
    rec.salary = non_blank(rec.salary);
    rec.skills_to_learn = trimmed_list(rec.skills_to_learn);
    Some(rec)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn trimmed_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
