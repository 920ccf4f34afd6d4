//! Career advisor: the seam between the HTTP handlers and the external provider.
//!
//! `AppState` holds an `Arc<dyn CareerAdvisor>`. Production uses
//! `LlmCareerAdvisor`; tests swap in canned implementations.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::llm_client::prompts::{render, system_prompt, UNTRUSTED_INPUT_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::analysis::CvAnalysis;
use crate::models::recommendation::Recommendation;
use crate::recommendation::parse::{parse_cv_analysis, parse_questions, parse_recommendations};
use crate::recommendation::prompts::{
    CV_ANALYSIS_PROMPT_TEMPLATE, CV_ANALYSIS_SYSTEM, QUESTIONS_PROMPT_TEMPLATE, QUESTIONS_SYSTEM,
    RECOMMENDATION_PROMPT_TEMPLATE, RECOMMENDATION_SYSTEM,
};

/// Number of roles asked for and returned.
pub const RECOMMENDATION_COUNT: usize = 4;
/// Number of interview questions asked for and returned.
pub const QUESTION_COUNT: usize = 6;
/// CV text beyond this many characters is not sent to the provider.
pub const MAX_CV_PROMPT_CHARS: usize = 30_000;

#[async_trait]
pub trait CareerAdvisor: Send + Sync {
    /// Structured facts from raw CV text.
    async fn analyze_cv(&self, cv_text: &str) -> Result<CvAnalysis, AppError>;

    /// Personalised interview questions for the candidate.
    async fn interview_questions(&self, candidate: &Value) -> Result<Vec<String>, AppError>;

    /// Ranked role suggestions. Never returns an empty list on success.
    async fn recommend(
        &self,
        candidate: &Value,
        answers: &[Value],
    ) -> Result<Vec<Recommendation>, AppError>;
}

/// Advisor backed by the Gemini client. One provider call per operation.
pub struct LlmCareerAdvisor {
    llm: LlmClient,
}

impl LlmCareerAdvisor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    async fn complete(&self, prompt: &str, role: &str) -> Result<String, AppError> {
        let response = self.llm.call(prompt, &system_prompt(role)).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        debug!("Provider returned {} chars", text.len());
        Ok(text)
    }
}

#[async_trait]
impl CareerAdvisor for LlmCareerAdvisor {
    async fn analyze_cv(&self, cv_text: &str) -> Result<CvAnalysis, AppError> {
        let prompt = render(
            CV_ANALYSIS_PROMPT_TEMPLATE,
            &[
                ("untrusted", UNTRUSTED_INPUT_INSTRUCTION),
                ("cv_text", truncate_chars(cv_text, MAX_CV_PROMPT_CHARS)),
            ],
        );
        let text = self.complete(&prompt, CV_ANALYSIS_SYSTEM).await?;
        parse_cv_analysis(&text)
    }

    async fn interview_questions(&self, candidate: &Value) -> Result<Vec<String>, AppError> {
        let count = QUESTION_COUNT.to_string();
        let candidate = to_prompt_json(candidate);
        let prompt = render(
            QUESTIONS_PROMPT_TEMPLATE,
            &[
                ("count", count.as_str()),
                ("untrusted", UNTRUSTED_INPUT_INSTRUCTION),
                ("candidate", candidate.as_str()),
            ],
        );
        let text = self.complete(&prompt, QUESTIONS_SYSTEM).await?;
        parse_questions(&text, QUESTION_COUNT)
    }

    async fn recommend(
        &self,
        candidate: &Value,
        answers: &[Value],
    ) -> Result<Vec<Recommendation>, AppError> {
        let count = RECOMMENDATION_COUNT.to_string();
        let candidate = to_prompt_json(candidate);
        let answers = if answers.is_empty() {
            "(none provided)".to_string()
        } else {
            to_prompt_json(&Value::Array(answers.to_vec()))
        };
        let prompt = render(
            RECOMMENDATION_PROMPT_TEMPLATE,
            &[
                ("count", count.as_str()),
                ("untrusted", UNTRUSTED_INPUT_INSTRUCTION),
                ("candidate", candidate.as_str()),
                ("answers", answers.as_str()),
            ],
        );
        let text = self.complete(&prompt, RECOMMENDATION_SYSTEM).await?;
        let recommendations = parse_recommendations(&text, RECOMMENDATION_COUNT)?;
        info!("Provider suggested {} roles", recommendations.len());
        Ok(recommendations)
    }
}

/// Pretty JSON with every string value cut to `MAX_CV_PROMPT_CHARS`.
fn to_prompt_json(value: &Value) -> String {
    let bounded = bound_strings(value.clone());
    serde_json::to_string_pretty(&bounded).unwrap_or_else(|_| bounded.to_string())
}

fn bound_strings(value: Value) -> Value {
    match value {
        Value::String(s) if s.chars().count() > MAX_CV_PROMPT_CHARS => {
            Value::String(truncate_chars(&s, MAX_CV_PROMPT_CHARS).to_string())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(bound_strings).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, bound_strings(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Cuts at a char boundary.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
