use thiserror::Error;

/// Failures of a single send. None of them are fatal to the application.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("could not read attachment '{name}': {source}")]
    Attachment {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("webhook returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("webhook request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("webhook response was not valid JSON: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("could not encode request: {0}")]
    Encode(String),
}

impl ChatError {
    /// Encoding errors abort before anything reaches the network
    pub fn is_encoding(&self) -> bool {
        matches!(self, Self::Attachment { .. } | Self::Encode(_))
    }
}
