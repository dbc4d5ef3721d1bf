//! Error types for caching filesystem operations

use crate::types::Whence;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServeFsError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("invalid seek offset {offset} from {whence:?}")]
    InvalidSeek { offset: i64, whence: Whence },

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ServeFsError {
    /// Classify a real-open failure, preserving the kind the request-routing
    /// layer maps to a transport status.
    pub(crate) fn from_open(path: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_string()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_string()),
            _ => Self::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServeFsError>;
