//! Uploaded source files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A video received from the client and stored on local disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Where the upload was written.
    pub path: PathBuf,
    /// File name as sent by the client.
    pub original_name: String,
    /// MIME type declared by the client, if any.
    pub content_type: Option<String>,
    /// Size in bytes.
    pub size: u64,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, original_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            original_name: original_name.into(),
            content_type: None,
            size: 0,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Stored path as a display string.
    pub fn path_str(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}
