//! Error taxonomy for the viewer core.
//!
//! Every failure that can reach the edit-commit, share or relocation boundary
//! is expressed as a [`ViewerError`]. The viewer never propagates these past
//! itself; it turns them into error notifications.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    /// The source file could not be read.
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source bytes are not a decodable image.
    #[error("malformed image: {0}")]
    Decode(String),

    /// No drawable surface could be produced (empty image or empty crop).
    #[error("no drawable surface: {0}")]
    Render(String),

    /// Collaborator failures carry the collaborator's own description.
    #[error("{0}")]
    Save(String),

    #[error("{0}")]
    Move(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Share(String),

    /// The viewer was asked to open on an empty collection.
    #[error("cannot open the viewer on an empty collection")]
    EmptyCollection,

    /// A background task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl ViewerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<image::ImageError> for ViewerError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(source) => Self::Io {
                path: PathBuf::new(),
                source,
            },
            other => Self::Decode(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ViewerError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}
