//! Content loading errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading posts from the content directory
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Post not found: {id}")]
    NotFound { id: String },

    #[error("Post id {id:?} is used by both {first:?} and {second:?}")]
    DuplicateId {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ContentError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the requested post does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentError::NotFound { .. })
    }
}
