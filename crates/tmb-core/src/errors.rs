use std::path::PathBuf;

/// Bridge-wide error type.
///
/// Adapter crates map platform errors into this so the relay loops can apply
/// one policy everywhere: log, drop the affected message, keep running. Only
/// the config/session variants are fatal, and only at startup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("no config file at {0}; a template was written, fill it in and restart")]
    ConfigMissing(PathBuf),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error("transcode failed: {0}")]
    Transcode(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
