//! Library error type.
//!
//! Malformed alignment lines and exhausted placeholders are not errors: they
//! are counted in [`crate::models::PipelineStats`] and the run continues.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LyricError {
    /// Lyrics source returned nothing usable, or the sentence artifact holds
    /// an `{"error": true}` payload instead of sentences.
    #[error("lyrics not available for this track")]
    NoLyricsAvailable,

    #[error("speed factor must be a finite number greater than zero, got {0}")]
    InvalidSpeedFactor(f64),

    #[error("speed factor must be a number, got '{0}'")]
    UnparsableSpeedFactor(String),

    #[error("I/O error while {context} ({}): {source}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error while {context} ({}): {source}", path.display())]
    Json {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An external tool (aligner, speed changer) exited unsuccessfully.
    #[error("external command `{command}` failed with {status}")]
    CommandFailed { command: String, status: String },

    #[error("refusing to write '{}': {reason}", path.display())]
    UnsafeOutput { path: PathBuf, reason: String },
}

impl LyricError {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(
        context: &'static str,
        path: impl Into<PathBuf>,
        source: serde_json::Error,
    ) -> Self {
        Self::Json {
            context,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unsafe_output(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::UnsafeOutput {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LyricError>;
