use std::path::PathBuf;

/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the polling loop
/// can tell retryable transport failures apart from everything else.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid path: {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// Connection, timeout or other network-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote API answered with `ok: false`.
    #[error("api error {code}: {description}")]
    Api {
        code: i64,
        description: String,
        retry_after: Option<u64>,
        migrate_to_chat_id: Option<i64>,
    },

    /// The response could not be read as an envelope or as the expected result.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("failed to persist {path}: {reason}")]
    Persistence { path: PathBuf, reason: String },

    #[error("handler error: {0}")]
    Handler(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// Whether the polling loop should back off and fetch again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Api { .. } | Error::Decode(_)
        )
    }

    /// Flood-control hint sent by the server, in seconds.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Error::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
