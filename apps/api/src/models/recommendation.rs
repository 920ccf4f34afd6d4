use serde::{Deserialize, Deserializer, Serialize};

/// A suggested role, in the order the provider ranked it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "ProviderRecommendation")]
pub struct Recommendation {
    pub title: String,
    pub description: Option<String>,
    pub company: Option<String>,
    /// 0 to 100
    pub match_score: Option<u8>,
    pub skills_to_learn: Vec<String>,
    pub salary: Option<String>,
}

/// Provider shape. Older prompts answer with `reason` instead of
/// `description`, and some models send both.
#[derive(Deserialize)]
struct ProviderRecommendation {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default, deserialize_with = "deserialize_match_score")]
    match_score: Option<u8>,
    #[serde(default)]
    skills_to_learn: Vec<String>,
    #[serde(default)]
    salary: Option<String>,
}

impl From<ProviderRecommendation> for Recommendation {
    fn from(raw: ProviderRecommendation) -> Self {
        let description = raw
            .description
            .filter(|d| !d.trim().is_empty())
            .or(raw.reason);
        Self {
            title: raw.title,
            description,
            company: raw.company,
            match_score: raw.match_score,
            skills_to_learn: raw.skills_to_learn,
            salary: raw.salary,
        }
    }
}

/// Accepts integers, floats and numeric strings; clamps to 0..=100.
/// Anything else becomes `None` rather than failing the whole entry.
fn deserialize_match_score<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let score = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    };
    Ok(score
        .filter(|s| s.is_finite())
        .map(|s| s.round().clamp(0.0, 100.0) as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_is_accepted_as_description() {
        let json = r#"{
            "title": "Backend Engineer",
            "company": "Acme",
            "match_score": 87,
            "reason": "Strong Python background",
            "skills_to_learn": ["Kubernetes"],
            "salary": "10–15 LPA"
        }"#;
        let rec: Recommendation = serde_json::from_str(json).unwrap();
        assert_eq!(rec.description.as_deref(), Some("Strong Python background"));
        assert_eq!(rec.match_score, Some(87));
        assert_eq!(rec.skills_to_learn, vec!["Kubernetes".to_string()]);
    }

    #[test]
    fn test_description_wins_when_both_keys_are_sent() {
        let json = r#"{
            "title": "Backend Engineer",
            "description": "Builds APIs",
            "reason": "Strong Python"
        }"#;
        let rec: Recommendation = serde_json::from_str(json).unwrap();
        assert_eq!(rec.description.as_deref(), Some("Builds APIs"));

        let json = r#"{"title": "Backend Engineer", "description": " ", "reason": "Strong Python"}"#;
        let rec: Recommendation = serde_json::from_str(json).unwrap();
        assert_eq!(rec.description.as_deref(), Some("Strong Python"));
    }

    #[test]
    fn test_serializes_description_only() {
        let rec: Recommendation =
            serde_json::from_str(r#"{"title": "QA", "reason": "Detail oriented"}"#).unwrap();
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["description"], "Detail oriented");
        assert!(value.get("reason").is_none());
    }

    #[test]
    fn test_only_title_is_required() {
        let rec: Recommendation = serde_json::from_str(r#"{"title": "Data Analyst"}"#).unwrap();
        assert_eq!(rec.title, "Data Analyst");
        assert_eq!(rec.description, None);
        assert_eq!(rec.match_score, None);
        assert!(rec.skills_to_learn.is_empty());
    }

    #[test]
    fn test_match_score_is_clamped_and_lenient() {
        let parse = |score: &str| -> Option<u8> {
            let json = format!(r#"{{"title": "X", "match_score": {score}}}"#);
            serde_json::from_str::<Recommendation>(&json)
                .unwrap()
                .match_score
        };
        assert_eq!(parse("150"), Some(100));
        assert_eq!(parse("-3"), Some(0));
        assert_eq!(parse("72.6"), Some(73));
        assert_eq!(parse(r#""85%""#), Some(85));
        assert_eq!(parse(r#""high""#), None);
        assert_eq!(parse("null"), None);
    }
}
