//! Error types for the card reading pipeline
//!
//! Only image loading escalates to callers. Recognition failures are absorbed
//! by the OCR fan-out, and visualization failures are kept separate so they
//! never invalidate an extracted record.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the card reading pipeline
#[derive(Debug, Error)]
pub enum CardError {
    /// The input image is missing or cannot be decoded
    #[error("failed to load card image {path:?}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A single OCR call failed
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Writing visualization artifacts failed
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Errors raised while writing visualization artifacts
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to create visualization directory {path:?}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write visualization image {path:?}")]
    WriteImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type Result<T, E = CardError> = std::result::Result<T, E>;
