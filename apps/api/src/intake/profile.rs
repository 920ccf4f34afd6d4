//! Builds the request-scoped `Profile` from form fields and document text.

use std::collections::HashSet;

use crate::intake::upload::ProfileFields;
use crate::models::profile::{Profile, SourceDocument};

/// Form values take precedence over anything found in the document.
pub fn build_profile(fields: ProfileFields, source: SourceDocument, resume_text: String) -> Profile {
    let email = fields
        .email
        .filter(|e| is_email(e))
        .or_else(|| find_email(&resume_text));

    Profile {
        name: fields.name,
        email,
        skills: split_skills(fields.skills.as_deref()),
        education: fields.education,
        experience: fields.experience,
        resume_text,
        source,
    }
}

/// Splits a free-form skills string on commas, semicolons and newlines.
/// Duplicates are dropped case-insensitively, first spelling wins.
pub fn split_skills(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    raw.split([',', ';', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(String::from)
        .collect()
}

/// First token in the text that looks like an e-mail address.
pub fn find_email(text: &str) -> Option<String> {
    text.split_whitespace()
        .map(|token| {
            token.trim_matches(|c: char| {
                matches!(c, ',' | ';' | ':' | '(' | ')' | '<' | '>' | '[' | ']' | '"' | '\'')
                    || c == '.'
            })
        })
        .map(|token| token.strip_prefix("mailto:").unwrap_or(token))
        .find(|token| is_email(token))
        .map(str::to_string)
}

fn is_email(candidate: &str) -> bool {
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    let valid_chars = |s: &str, extra: &[char]| {
        s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || extra.contains(&c))
    };

    !local.is_empty()
        && valid_chars(local, &['_', '+', '%'])
        && valid_chars(domain, &[])
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::document::DocumentKind;

    fn source() -> SourceDocument {
        SourceDocument {
            file_name: Some("cv.txt".to_string()),
            kind: DocumentKind::PlainText,
            size_bytes: 42,
        }
    }

    #[test]
    fn test_split_skills_trims_and_dedups() {
        let skills = split_skills(Some(" Python, SQL;python\n Rust ,, "));
        assert_eq!(skills, vec!["Python", "SQL", "Rust"]);
        assert!(split_skills(None).is_empty());
        assert!(split_skills(Some(" , ; ")).is_empty());
    }

    #[test]
    fn test_find_email_in_text() {
        let text = "Jane Doe | Email: (jane.doe+cv@example.co.uk), Phone 555";
        assert_eq!(find_email(text).as_deref(), Some("jane.doe+cv@example.co.uk"));
        assert_eq!(
            find_email("contact mailto:a@b.io.").as_deref(),
            Some("a@b.io")
        );
    }

    #[test]
    fn test_find_email_ignores_handles_and_broken_addresses() {
        assert_eq!(find_email("follow @jane on x"), None);
        assert_eq!(find_email("user@localhost only"), None);
        assert_eq!(find_email("a@b..com"), None);
    }

    #[test]
    fn test_form_fields_override_document() {
        let fields = ProfileFields {
            name: Some("Jane".to_string()),
            email: Some("jane@form.org".to_string()),
            skills: Some("Python, Django".to_string()),
            education: Some("B.Tech".to_string()),
            experience: None,
        };
        let profile = build_profile(fields, source(), "contact: jane@doc.org".to_string());
        assert_eq!(profile.name.as_deref(), Some("Jane"));
        assert_eq!(profile.email.as_deref(), Some("jane@form.org"));
        assert_eq!(profile.skills, vec!["Python", "Django"]);
        assert_eq!(profile.education.as_deref(), Some("B.Tech"));
        assert_eq!(profile.resume_text, "contact: jane@doc.org");
    }

    #[test]
    fn test_invalid_form_email_falls_back_to_document() {
        let fields = ProfileFields {
            email: Some("not-an-email".to_string()),
            ..ProfileFields::default()
        };
        let profile = build_profile(fields, source(), "reach me at jane@doc.org".to_string());
        assert_eq!(profile.email.as_deref(), Some("jane@doc.org"));
    }
}
