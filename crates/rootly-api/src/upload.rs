//! Upload validation and staging.
//!
//! The browser already checks type and size, but that check is trivially
//! bypassed, so the relay repeats it before anything touches disk.

use std::path::Path;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use rootly_classifier::{ScratchDir, ScratchFile};
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// Limits applied to every upload.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Maximum image size in bytes
    pub max_bytes: u64,
    /// Accepted extensions (lowercase, no dot)
    pub allowed_extensions: Vec<String>,
}

impl UploadPolicy {
    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            max_bytes: config.max_upload_bytes,
            allowed_extensions: config.allowed_extensions.clone(),
        }
    }

    /// Lowercased extension of a client filename.
    pub fn extension_of(filename: &str) -> Option<String> {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }

    /// Check the client filename and return its extension.
    pub fn validate_filename(&self, filename: &str) -> ApiResult<String> {
        if filename.trim().is_empty() {
            return Err(ApiError::bad_request("No image selected"));
        }

        match Self::extension_of(filename) {
            Some(ext) if self.allowed_extensions.contains(&ext) => Ok(ext),
            _ => Err(ApiError::bad_request("Invalid file type")),
        }
    }

    /// A declared content type must be an image. Generic binary is treated as undeclared.
    pub fn validate_content_type(&self, content_type: Option<&str>) -> ApiResult<()> {
        match content_type {
            None => Ok(()),
            Some(ct) if ct.starts_with("image/") || ct == "application/octet-stream" => Ok(()),
            Some(_) => Err(ApiError::bad_request("Invalid file type")),
        }
    }

    pub fn too_large_message(&self) -> String {
        const MB: u64 = 1024 * 1024;
        if self.max_bytes >= MB && self.max_bytes % MB == 0 {
            format!("File too large. Max {}MB", self.max_bytes / MB)
        } else {
            format!("File too large. Max {} bytes", self.max_bytes)
        }
    }
}

/// An image received and written to the scratch directory.
#[derive(Debug)]
pub struct StagedUpload {
    /// Filename sent by the client (never used as a path)
    pub original_name: String,
    /// Staged bytes; removed from disk when dropped
    pub file: ScratchFile,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn size(&self) -> u64 {
        self.file.size()
    }
}

/// Find the image field, validate it and stream it into a scratch file.
///
/// Fields other than [`IMAGE_FIELD`] are skipped. The size limit is enforced
/// per chunk, so an oversized upload is rejected without buffering it. A
/// body over the router's limit is answered with the same 413 message.
pub async fn receive_image(
    multipart: &mut Multipart,
    policy: &UploadPolicy,
    scratch: &ScratchDir,
) -> ApiResult<StagedUpload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, policy))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let ext = policy.validate_filename(&original_name)?;
        policy.validate_content_type(field.content_type())?;

        let file = stream_to_scratch(field, policy, scratch, &ext).await?;
        if file.size() == 0 {
            return Err(ApiError::bad_request("Uploaded file is empty"));
        }

        debug!(
            original_name = %original_name,
            size = file.size(),
            path = %file.path().display(),
            "Upload staged"
        );

        return Ok(StagedUpload {
            original_name,
            file,
        });
    }

    Err(ApiError::bad_request("No image file provided"))
}

async fn stream_to_scratch(
    mut field: Field<'_>,
    policy: &UploadPolicy,
    scratch: &ScratchDir,
    ext: &str,
) -> ApiResult<ScratchFile> {
    let mut file = scratch.create(Some(ext)).await?;

    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, policy))? {
        if file.size() + chunk.len() as u64 > policy.max_bytes {
            return Err(ApiError::PayloadTooLarge(policy.too_large_message()));
        }
        file.write_chunk(&chunk).await?;
    }

    file.finish().await?;
    Ok(file)
}

fn multipart_error(e: MultipartError, policy: &UploadPolicy) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(policy.too_large_message())
    } else {
        ApiError::bad_request(format!("Failed to parse multipart data: {}", e.body_text()))
    }
}
