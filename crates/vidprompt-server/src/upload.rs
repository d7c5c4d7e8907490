//! Multipart job submissions: a `prompt` text field and a `video` file field.
//!
//! The video is streamed straight to the uploads directory under a unique
//! name. Any failure while reading the form removes what was written.

use std::path::Path;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use vidprompt_core::SourceFile;
use vidprompt_runtime::JobRequest;

/// Longest sanitized file name kept in the stored name.
const MAX_NAME_LEN: usize = 100;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Malformed upload: {0}")]
    Malformed(String),

    #[error("Only video files are allowed (got {0})")]
    NotVideo(String),

    #[error("Upload too large: {0}")]
    TooLarge(String),

    #[error("Could not store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::Malformed(_) | UploadError::NotVideo(_) => StatusCode::BAD_REQUEST,
            UploadError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MultipartError> for UploadError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::TooLarge(e.body_text())
        } else {
            UploadError::Malformed(e.body_text())
        }
    }
}

/// Parsed form. Either part may be missing; the runtime decides what that means.
#[derive(Debug, Default)]
pub struct ReceivedJob {
    pub prompt: Option<String>,
    pub source: Option<SourceFile>,
}

impl ReceivedJob {
    /// Delete the stored video, if any.
    pub async fn discard(&mut self) {
        if let Some(source) = self.source.take() {
            remove_upload(&source.path).await;
        }
    }
}

impl From<ReceivedJob> for JobRequest {
    fn from(received: ReceivedJob) -> Self {
        JobRequest {
            prompt: received.prompt,
            source: received.source,
        }
    }
}

/// Read the whole form, storing the video under `uploads_dir`.
pub async fn receive(
    mut multipart: Multipart,
    uploads_dir: &Path,
    max_bytes: u64,
) -> Result<ReceivedJob, UploadError> {
    let mut received = ReceivedJob::default();
    if let Err(e) = read_fields(&mut multipart, uploads_dir, max_bytes, &mut received).await {
        received.discard().await;
        return Err(e);
    }
    Ok(received)
}

async fn read_fields(
    multipart: &mut Multipart,
    uploads_dir: &Path,
    max_bytes: u64,
    received: &mut ReceivedJob,
) -> Result<(), UploadError> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("prompt") => received.prompt = Some(field.text().await?),
            Some("video") => {
                if received.source.is_some() {
                    return Err(UploadError::Malformed(
                        "only one video file may be uploaded".into(),
                    ));
                }
                received.source = Some(store_video(field, uploads_dir, max_bytes).await?);
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }
    Ok(())
}

async fn store_video(
    mut field: Field<'_>,
    uploads_dir: &Path,
    max_bytes: u64,
) -> Result<SourceFile, UploadError> {
    let original_name = field
        .file_name()
        .map(str::to_string)
        .unwrap_or_else(|| "video".to_string());
    let content_type = field.content_type().map(str::to_string);
    if let Some(ct) = &content_type {
        if !is_video_content_type(ct) {
            return Err(UploadError::NotVideo(ct.clone()));
        }
    }

    let path = uploads_dir.join(stored_name(&original_name));
    let mut file = tokio::fs::File::create(&path).await?;
    let mut size: u64 = 0;

    let written: Result<(), UploadError> = async {
        while let Some(chunk) = field.chunk().await? {
            size += chunk.len() as u64;
            if size > max_bytes {
                return Err(UploadError::TooLarge(format!(
                    "video exceeds {} bytes",
                    max_bytes
                )));
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
    .await;

    if let Err(e) = written {
        drop(file);
        remove_upload(&path).await;
        return Err(e);
    }

    info!("Stored upload {} ({} bytes) at {}", original_name, size, path.display());

    let mut source = SourceFile::new(path, original_name).with_size(size);
    if let Some(ct) = content_type {
        source = source.with_content_type(ct);
    }
    Ok(source)
}

pub async fn remove_upload(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Could not remove upload {}: {}", path.display(), e);
    }
}

/// `video/*`, case-insensitive, parameters ignored.
pub fn is_video_content_type(content_type: &str) -> bool {
    content_type
        .trim()
        .to_ascii_lowercase()
        .strip_prefix("video/")
        .map(|sub| !sub.is_empty())
        .unwrap_or(false)
}

/// `<millis>-<8 hex>-<sanitized name>`, unique per upload.
pub fn stored_name(original: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        &id[..8],
        sanitize_filename(original)
    )
}

/// Keep the last path component, restricted to `[A-Za-z0-9._-]`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "video".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("clip.mp4"), "clip.mp4");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\My Clip (1).mov"), "My_Clip__1_.mov");
        assert_eq!(sanitize_filename(".."), "video");
        assert_eq!(sanitize_filename(""), "video");
        assert_eq!(sanitize_filename(&"a".repeat(300)).len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_stored_names_are_unique() {
        let a = stored_name("clip.mp4");
        let b = stored_name("clip.mp4");
        assert_ne!(a, b);
        assert!(a.ends_with("-clip.mp4"));
        assert_eq!(a.split('-').nth(1).map(str::len), Some(8));
    }

    #[test]
    fn test_video_content_types() {
        assert!(is_video_content_type("video/mp4"));
        assert!(is_video_content_type("Video/QuickTime"));
        assert!(is_video_content_type("video/webm; codecs=vp9"));
        assert!(!is_video_content_type("video/"));
        assert!(!is_video_content_type("image/png"));
        assert!(!is_video_content_type("application/octet-stream"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(UploadError::NotVideo("text/plain".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            UploadError::TooLarge("big".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
