//! Axum route handlers for the analysis API.

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::intake::intake_cv;
use crate::models::analysis::CvAnalysis;
use crate::models::profile::{Profile, ProfileSummary};
use crate::models::recommendation::Recommendation;
use crate::state::AppState;

// Request / response types

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub profile: ProfileSummary,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeTextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionsRequest {
    #[serde(alias = "cvData")]
    pub cv_data: Value,
}

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationsRequest {
    #[serde(alias = "cvData")]
    pub cv_data: Value,
    #[serde(default)]
    pub answers: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<Recommendation>,
}

// Handlers

/// POST /api/v1/analyze
///
/// Multipart upload → Profile → recommendations. A rejected upload returns
/// before the provider is contacted; a provider failure returns no partial list.
pub async fn handle_analyze_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let mut multipart = multipart.map_err(|e| {
        AppError::InvalidInput(format!(
            "Expected a multipart/form-data upload: {}",
            e.body_text()
        ))
    })?;

    let analysis_id = Uuid::new_v4();
    let span = tracing::info_span!("analysis", %analysis_id);

    async move {
        let profile = intake_cv(&mut multipart, state.config.max_upload_bytes).await?;
        let candidate = candidate_json(&profile)?;
        let recommendations = state.advisor.recommend(&candidate, &[]).await?;

        info!("Analysis complete with {} recommendations", recommendations.len());

        Ok::<_, AppError>(Json(AnalysisResponse {
            analysis_id,
            generated_at: Utc::now(),
            profile: ProfileSummary::from(&profile),
            recommendations,
        }))
    }
    .instrument(span)
    .await
}

/// POST /api/v1/cv/analyze
///
/// Structured CV facts from already-extracted text.
pub async fn handle_analyze_text(
    State(state): State<AppState>,
    request: Result<Json<AnalyzeTextRequest>, JsonRejection>,
) -> Result<Json<CvAnalysis>, AppError> {
    let Json(request) = request.map_err(json_error)?;
    let text = request.text.trim();
    if text.is_empty() {
        return Err(AppError::InvalidInput("No CV text provided".to_string()));
    }

    let analysis = state.advisor.analyze_cv(text).await?;
    Ok(Json(analysis))
}

/// POST /api/v1/cv/questions
pub async fn handle_questions(
    State(state): State<AppState>,
    request: Result<Json<QuestionsRequest>, JsonRejection>,
) -> Result<Json<QuestionsResponse>, AppError> {
    let Json(request) = request.map_err(json_error)?;
    require_cv_data(&request.cv_data)?;

    let questions = state.advisor.interview_questions(&request.cv_data).await?;
    Ok(Json(QuestionsResponse { questions }))
}

/// POST /api/v1/recommendations
///
/// Recommendations from client-held CV data plus optional interview answers.
pub async fn handle_recommendations(
    State(state): State<AppState>,
    request: Result<Json<RecommendationsRequest>, JsonRejection>,
) -> Result<Json<RecommendationsResponse>, AppError> {
    let Json(request) = request.map_err(json_error)?;
    require_cv_data(&request.cv_data)?;

    let recommendations = state
        .advisor
        .recommend(&request.cv_data, &request.answers)
        .await?;
    Ok(Json(RecommendationsResponse { recommendations }))
}

fn json_error(rejection: JsonRejection) -> AppError {
    AppError::InvalidInput(format!("Invalid JSON request: {}", rejection.body_text()))
}

fn require_cv_data(cv_data: &Value) -> Result<(), AppError> {
    match cv_data {
        Value::Object(map) if !map.is_empty() => Ok(()),
        _ => Err(AppError::InvalidInput(
            "cv_data must be a non-empty JSON object".to_string(),
        )),
    }
}

/// The provider sees everything the intake produced, minus file metadata.
fn candidate_json(profile: &Profile) -> Result<Value, AppError> {
    let mut value = serde_json::to_value(profile).map_err(anyhow::Error::from)?;
    if let Value::Object(map) = &mut value {
        map.remove("source");
    }
    Ok(value)
}
