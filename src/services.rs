//! Seams for the external tools the pipeline drives.
//!
//! Lyrics lookup, forced alignment, audio speed change and frame rendering
//! all live outside this crate. Each gets a trait here plus the file- or
//! command-backed implementation the CLI uses.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{LyricError, Result};
use crate::models::HighlightFrame;
use crate::store;

pub trait LyricsSource {
    /// Raw lyrics for a track, `None` when the source has nothing for it.
    fn fetch(&self, title: &str, artist: &str) -> Result<Option<String>>;
}

pub trait ForcedAligner {
    /// Run alignment of `lyrics` against `audio` and return the raw
    /// `<start> <end> <token>` output.
    fn align(&self, audio: &Path, lyrics: &Path) -> Result<String>;
}

pub trait AudioSpeedChanger {
    /// Write `input` sped up by `factor` and cut to `duration_ms` to `output`.
    fn speed_up(&self, input: &Path, factor: f64, duration_ms: u64, output: &Path) -> Result<()>;
}

pub trait FrameRenderer {
    fn render(&self, frames: &[HighlightFrame]) -> Result<()>;
}

// ============================================================================
// Lyrics
// ============================================================================

/// Lyrics saved by a previous fetch, one file per track.
pub struct FileLyricsSource {
    path: PathBuf,
}

impl FileLyricsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LyricsSource for FileLyricsSource {
    fn fetch(&self, _title: &str, _artist: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LyricError::io("reading lyrics", &self.path, e)),
        }
    }
}

// ============================================================================
// Alignment
// ============================================================================

/// Alignment output produced ahead of time.
pub struct FileAligner {
    path: PathBuf,
}

impl FileAligner {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ForcedAligner for FileAligner {
    fn align(&self, _audio: &Path, _lyrics: &Path) -> Result<String> {
        store::read_text(&self.path)
    }
}

/// Runs an aligner through `sh -c`. The template may use `{audio}`,
/// `{lyrics}` and `{output}`; the aligner must write its result to `{output}`.
pub struct CommandAligner {
    template: String,
    output: PathBuf,
}

impl CommandAligner {
    pub fn new(template: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            output: output.into(),
        }
    }
}

impl ForcedAligner for CommandAligner {
    fn align(&self, audio: &Path, lyrics: &Path) -> Result<String> {
        let command = render_template(
            &self.template,
            &[
                ("{audio}", shell_quote(audio)),
                ("{lyrics}", shell_quote(lyrics)),
                ("{output}", shell_quote(&self.output)),
            ],
        );
        run_shell(&command)?;
        store::read_text(&self.output)
    }
}

// ============================================================================
// Audio
// ============================================================================

/// Runs a speed-change tool through `sh -c`. Template keys: `{input}`,
/// `{factor}`, `{duration_s}`, `{output}`.
pub struct CommandSpeedChanger {
    template: String,
}

impl CommandSpeedChanger {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl AudioSpeedChanger for CommandSpeedChanger {
    fn speed_up(&self, input: &Path, factor: f64, duration_ms: u64, output: &Path) -> Result<()> {
        let command = render_template(
            &self.template,
            &[
                ("{input}", shell_quote(input)),
                ("{factor}", factor.to_string()),
                ("{duration_s}", format!("{:.3}", duration_ms as f64 / 1000.0)),
                ("{output}", shell_quote(output)),
            ],
        );
        run_shell(&command)
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Hands the schedule to an external renderer as a JSON file.
pub struct JsonFrameWriter {
    path: PathBuf,
}

impl JsonFrameWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FrameRenderer for JsonFrameWriter {
    fn render(&self, frames: &[HighlightFrame]) -> Result<()> {
        store::write_json(&self.path, frames)
    }
}

// ============================================================================
// Shell helpers
// ============================================================================

fn render_template(template: &str, values: &[(&str, String)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |acc, (key, value)| acc.replace(key, value))
}

/// Single-quote a path for `sh`.
fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', r"'\''"))
}

fn run_shell(command: &str) -> Result<()> {
    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .status()
        .map_err(|e| LyricError::io("spawning shell", "sh", e))?;
    if status.success() {
        Ok(())
    } else {
        Err(LyricError::CommandFailed {
            command: command.to_string(),
            status: status.to_string(),
        })
    }
}
