use std::path::{Path, PathBuf};

const FALLBACK_MIME: &str = "application/octet-stream";

/// Who authored a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

/// Where the bytes of an attachment come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    /// Read from disk when the message is dispatched
    Path(PathBuf),
    /// Already in memory
    Bytes(Vec<u8>),
}

/// A file handed over by the UI to be sent along with a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentFile {
    pub name: String,
    pub mime: String,
    pub source: AttachmentSource,
}

impl AttachmentFile {
    /// Reference a file on disk; name and MIME type are taken from the path
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime = guess_mime(&path);

        Self {
            name,
            mime,
            source: AttachmentSource::Path(path),
        }
    }

    /// Wrap an in-memory buffer
    pub fn from_bytes(name: impl Into<String>, mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            source: AttachmentSource::Bytes(data),
        }
    }

    /// Load the full binary content
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        match &self.source {
            AttachmentSource::Path(path) => tokio::fs::read(path).await,
            AttachmentSource::Bytes(data) => Ok(data.clone()),
        }
    }
}

fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_MIME)
        .to_string()
}

/// One entry of the conversation log
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub attachments: Vec<AttachmentFile>,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl Message {
    /// Create a new user message
    pub fn user(
        id: String,
        content: String,
        attachments: Vec<AttachmentFile>,
        timestamp: i64,
    ) -> Self {
        Self {
            id,
            content,
            sender: Sender::User,
            attachments,
            timestamp,
        }
    }

    /// Create a new assistant message
    pub fn assistant(id: String, content: String, timestamp: i64) -> Self {
        Self {
            id,
            content,
            sender: Sender::Assistant,
            attachments: Vec::new(),
            timestamp,
        }
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
