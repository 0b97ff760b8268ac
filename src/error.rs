use std::path::PathBuf;

use thiserror::Error;

/// Why an interchange blob could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFailure {
    /// The bytes are not well-formed UTF-8 JSON.
    Unreadable,
    /// Well-formed JSON that does not describe a valid document.
    InvalidShape,
}

impl DecodeFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeFailure::Unreadable => "unreadable bytes",
            DecodeFailure::InvalidShape => "invalid document shape",
        }
    }
}

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Can't read {}: {reason}. Does the file exist?", path.display())]
    NotFound { path: PathBuf, reason: String },

    #[error("Problem with {}: {message}", path.display())]
    ExtractionFailed { path: PathBuf, message: String },

    #[error("Document can't be encoded: {0}")]
    EncodeFailed(String),

    #[error("Document can't be decoded ({}): {message}", kind.as_str())]
    DecodeFailed { kind: DecodeFailure, message: String },

    #[error("Problem writing {bytes} bytes of data to {}: {reason}", path.display())]
    WriteFailed {
        path: PathBuf,
        bytes: usize,
        reason: String,
    },

    #[error("Can't read {}: {reason}. Does the file exist?", path.display())]
    FileUnreadable { path: PathBuf, reason: String },

    #[error("Please specify a valid user: --user=<id|login> ({0})")]
    Unauthorized(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ParserError {
    /// Attaches the file name of the blob being decoded to the message.
    pub fn in_file(self, path: &std::path::Path) -> Self {
        match self {
            ParserError::DecodeFailed { kind, message } => ParserError::DecodeFailed {
                kind,
                message: format!("JSON in {} can't be decoded: {}", path.display(), message),
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParserError>;
