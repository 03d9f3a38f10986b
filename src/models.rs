//! Core data models for the lyric timing pipeline.
//!
//! This module contains the structs shared by every stage, together with
//! their on-disk JSON shapes.

use serde::{Deserialize, Serialize};

// ============================================================================
// Timed Words
// ============================================================================

/// One aligned word.
///
/// Serialized as `{"startTimeMs": "0", "words": "HELLO", "endTimeMs": "500"}`:
/// timestamps travel as strings and the single word sits under `"words"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordToken {
    #[serde(rename = "startTimeMs", with = "ms_string")]
    pub start_ms: u64,
    #[serde(rename = "words")]
    pub text: String,
    #[serde(rename = "endTimeMs", with = "ms_string")]
    pub end_ms: u64,
}

impl WordToken {
    pub fn new(text: impl Into<String>, start_ms: u64, end_ms: u64) -> Self {
        Self {
            text: text.into(),
            start_ms,
            end_ms,
        }
    }
}

/// One display line of lyrics with the timed words matched to it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    #[serde(rename = "sentence")]
    pub text: String,
    pub words: Vec<WordToken>,
}

impl Sentence {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            words: Vec::new(),
        }
    }

    /// Blank lines mark music breaks and are never rendered.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Raw forced-aligner output row: `<start_s> <end_s> <token>`.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignmentRecord {
    pub start_s: f64,
    pub end_s: f64,
    pub token: String,
}

// ============================================================================
// Highlight Schedule
// ============================================================================

/// One word of a wrapped display line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayToken {
    pub text: String,
    pub highlighted: bool,
}

/// One overlay clip: the whole sentence drawn with a single word lit,
/// shown from `start_ms` until `end_ms`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightFrame {
    pub sentence_index: usize,
    pub word_index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    pub lines: Vec<Vec<DisplayToken>>,
    pub word_color: String,
    pub line_color: String,
}

impl HighlightFrame {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Per-run counters, dumped to stderr after each stage.
#[derive(Default, Debug, Clone, Serialize)]
pub struct PipelineStats {
    // Reconcile
    pub alignment_lines: usize,
    pub malformed_lines: usize,
    pub placeholders_resolved: usize,
    pub placeholders_unresolved: usize,
    pub flat_words: usize,

    // Group
    pub sentences: usize,
    pub empty_sentences: usize,
    pub matched_words: usize,
    pub dropped_words: usize,

    // Rescale / schedule
    pub speed_factor: f64,
    pub frames: usize,

    // Timing
    pub elapsed_seconds: f64,
}

impl PipelineStats {
    /// Share of flat words that landed in some sentence, as a percentage.
    pub fn match_rate(&self) -> f64 {
        if self.flat_words == 0 {
            0.0
        } else {
            100.0 * self.matched_words as f64 / self.flat_words as f64
        }
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

// ============================================================================
// Serde helpers
// ============================================================================

/// Millisecond timestamps are written as strings; both strings and bare
/// integers are accepted on read.
mod ms_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ms: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(ms)
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawMs {
        Text(String),
        Int(u64),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match RawMs::deserialize(deserializer)? {
            RawMs::Text(s) => s.trim().parse().map_err(de::Error::custom),
            RawMs::Int(n) => Ok(n),
        }
    }
}
