//! Lyric clip library - word-timing pipeline shared by the CLI and tests.

pub mod alignment;
pub mod config;
pub mod error;
pub mod grouping;
pub mod highlight;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod rescale;
pub mod safety;
pub mod services;
pub mod store;

pub use error::{LyricError, Result};
pub use models::{AlignmentRecord, HighlightFrame, PipelineStats, Sentence, WordToken};
