use serde::{Deserialize, Serialize};

use crate::intake::document::DocumentKind;

/// The uploaded file a profile was built from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceDocument {
    pub file_name: Option<String>,
    pub kind: DocumentKind,
    pub size_bytes: usize,
}

/// Candidate data for one analysis request. Lives only as long as the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub skills: Vec<String>,
    pub education: Option<String>,
    pub experience: Option<String>,
    /// Normalised document text. Never empty.
    pub resume_text: String,
    pub source: SourceDocument,
}

/// What the client gets back about its own profile: everything except the
/// document text, which is reduced to its length.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub name: Option<String>,
    pub email: Option<String>,
    pub skills: Vec<String>,
    pub education: Option<String>,
    pub experience: Option<String>,
    pub resume_chars: usize,
    pub source: SourceDocument,
}

impl From<&Profile> for ProfileSummary {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            email: profile.email.clone(),
            skills: profile.skills.clone(),
            education: profile.education.clone(),
            experience: profile.experience.clone(),
            resume_chars: profile.resume_text.chars().count(),
            source: profile.source.clone(),
        }
    }
}
