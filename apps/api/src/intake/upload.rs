//! Reads the multipart upload form into an `UploadedCv`.

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};

use crate::errors::AppError;

/// Multipart field names accepted for the document itself.
const FILE_FIELDS: &[&str] = &["file", "cv", "resume"];

/// Optional user-entered profile data sent alongside the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub skills: Option<String>,
    pub education: Option<String>,
    pub experience: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UploadedCv {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
    pub fields: ProfileFields,
}

/// Reads every field of the form. The document is buffered up to
/// `max_bytes`; anything larger is rejected before it is fully read.
pub async fn read_upload(multipart: &mut Multipart, max_bytes: usize) -> Result<UploadedCv, AppError> {
    let mut document: Option<(Option<String>, Option<String>, Bytes)> = None;
    let mut fields = ProfileFields::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if FILE_FIELDS.contains(&name.as_str()) {
            if document.is_some() {
                return Err(AppError::InvalidInput(
                    "Upload exactly one CV document".to_string(),
                ));
            }
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = read_limited(field, max_bytes).await?;
            document = Some((file_name, content_type, bytes));
            continue;
        }

        let slot = match name.as_str() {
            "name" => &mut fields.name,
            "email" => &mut fields.email,
            "skills" => &mut fields.skills,
            "education" => &mut fields.education,
            "experience" => &mut fields.experience,
            _ => {
                tracing::debug!("Ignoring unknown form field '{name}'");
                continue;
            }
        };
        let value = field
            .text()
            .await
            .map_err(|e| multipart_error(e, max_bytes))?;
        let value = value.trim();
        if !value.is_empty() {
            *slot = Some(value.to_string());
        }
    }

    let (file_name, content_type, bytes) = document.ok_or_else(|| {
        AppError::InvalidInput(
            "No CV file was uploaded. Attach a PDF, DOCX or TXT file.".to_string(),
        )
    })?;

    Ok(UploadedCv {
        file_name,
        content_type,
        bytes,
        fields,
    })
}

async fn read_limited(mut field: Field<'_>, max_bytes: usize) -> Result<Bytes, AppError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if buf.len() + chunk.len() > max_bytes {
            return Err(too_large(max_bytes));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

pub fn too_large(max_bytes: usize) -> AppError {
    AppError::InvalidInput(format!(
        "The uploaded file is larger than the {} limit",
        human_size(max_bytes)
    ))
}

fn multipart_error(err: MultipartError, max_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return too_large(max_bytes);
    }
    AppError::InvalidInput(format!("Malformed upload: {}", err.body_text()))
}

fn human_size(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    const KIB: usize = 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{} KB", bytes / KIB)
    } else {
        format!("{bytes} bytes")
    }
}
