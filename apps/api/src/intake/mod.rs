// Intake: multipart upload → validated document → extracted text → Profile.
// Nothing here calls the recommendation provider; a rejected upload never
// leaves this module.

pub mod document;
pub mod profile;
pub mod upload;

use axum::extract::Multipart;
use tracing::info;

use crate::errors::AppError;
use crate::intake::document::{detect_kind, extract_text};
use crate::intake::profile::build_profile;
use crate::intake::upload::{read_upload, too_large, UploadedCv};
use crate::models::profile::{Profile, SourceDocument};

/// Reads the form and turns it into a Profile.
pub async fn intake_cv(multipart: &mut Multipart, max_bytes: usize) -> Result<Profile, AppError> {
    let upload = read_upload(multipart, max_bytes).await?;
    profile_from_upload(upload, max_bytes).await
}

/// Validates an already-read upload and extracts its text.
pub async fn profile_from_upload(upload: UploadedCv, max_bytes: usize) -> Result<Profile, AppError> {
    if upload.bytes.is_empty() {
        return Err(AppError::InvalidInput(
            "The uploaded file is empty".to_string(),
        ));
    }
    if upload.bytes.len() > max_bytes {
        return Err(too_large(max_bytes));
    }

    let kind = detect_kind(
        upload.file_name.as_deref(),
        upload.content_type.as_deref(),
        &upload.bytes,
    )?;

    let size_bytes = upload.bytes.len();
    let text = extract_text(kind, upload.bytes).await?;

    info!(
        file_name = upload.file_name.as_deref().unwrap_or("<unnamed>"),
        ?kind,
        size_bytes,
        text_chars = text.chars().count(),
        "CV accepted"
    );

    let source = SourceDocument {
        file_name: upload.file_name,
        kind,
        size_bytes,
    };
    Ok(build_profile(upload.fields, source, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::document::tests::minimal_pdf;
    use crate::intake::document::DocumentKind;
    use crate::intake::upload::ProfileFields;
    use bytes::Bytes;

    const MAX: usize = 1024 * 1024;

    fn upload(file_name: &str, bytes: impl Into<Bytes>) -> UploadedCv {
        UploadedCv {
            file_name: Some(file_name.to_string()),
            content_type: None,
            bytes: bytes.into(),
            fields: ProfileFields::default(),
        }
    }

    #[tokio::test]
    async fn test_empty_file_is_invalid_input() {
        let err = profile_from_upload(upload("cv.pdf", Bytes::new()), MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(msg) if msg.contains("empty")));
    }

    #[tokio::test]
    async fn test_oversized_file_is_invalid_input() {
        let err = profile_from_upload(upload("cv.txt", vec![b'a'; 11]), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(msg) if msg.contains("larger")));
    }

    #[tokio::test]
    async fn test_text_upload_produces_non_empty_profile() {
        let profile = profile_from_upload(
            upload("cv.txt", "Jane Doe\njane@example.com\n5 years Python experience"),
            MAX,
        )
        .await
        .unwrap();
        assert!(!profile.resume_text.is_empty());
        assert_eq!(profile.email.as_deref(), Some("jane@example.com"));
        assert_eq!(profile.source.kind, DocumentKind::PlainText);
        assert_eq!(profile.source.file_name.as_deref(), Some("cv.txt"));
    }

    #[tokio::test]
    async fn test_pdf_upload_produces_profile() {
        let pdf = minimal_pdf("5 years Python experience");
        let size = pdf.len();
        let profile = profile_from_upload(upload("resume.pdf", pdf), MAX)
            .await
            .unwrap();
        assert!(profile.resume_text.contains("Python"));
        assert_eq!(profile.source.kind, DocumentKind::Pdf);
        assert_eq!(profile.source.size_bytes, size);
    }

    #[tokio::test]
    async fn test_unsupported_type_is_invalid_input() {
        let err = profile_from_upload(upload("photo.png", vec![0x89, b'P', b'N', b'G']), MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
