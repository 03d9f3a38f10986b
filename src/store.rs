//! Artifact persistence.
//!
//! Stages exchange plain structures; this module is the only place they touch
//! disk. JSON is written pretty-printed with four-space indents and raw UTF-8,
//! through a temp file and rename so a crash never leaves half an artifact.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{LyricError, Result};
use crate::models::{Sentence, WordToken};

pub const FLAT_WORDS_FILE: &str = "lyrics.json";
pub const SENTENCES_FILE: &str = "sentence_based_lyrics.json";
pub const RESCALED_FILE: &str = "lyrics_speed_up.json";
pub const FRAMES_FILE: &str = "frames.json";

pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| LyricError::io("reading text", path, e))
}

/// Write `bytes` to `path` via `<path>.tmp` + rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| LyricError::io("creating output directory", parent, e))?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp_name);
    {
        let f = fs::File::create(&tmp).map_err(|e| LyricError::io("creating temp file", &tmp, e))?;
        let mut w = BufWriter::new(f);
        w.write_all(bytes)
            .and_then(|_| w.flush())
            .map_err(|e| LyricError::io("writing temp file", &tmp, e))?;
    }
    fs::rename(&tmp, path).map_err(|e| LyricError::io("renaming temp file", path, e))
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    let mut body = text.to_string();
    if !body.ends_with('\n') {
        body.push('\n');
    }
    write_atomic(path, body.as_bytes())
}

pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = to_json_string(value).map_err(|e| LyricError::json("serializing artifact", path, e))?;
    write_atomic(path, json.as_bytes())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = read_text(path)?;
    serde_json::from_str(&raw).map_err(|e| LyricError::json("parsing artifact", path, e))
}

pub fn read_flat_words(path: &Path) -> Result<Vec<WordToken>> {
    read_json(path)
}

/// Read a sentence-grouped artifact. A lyrics-provider error payload
/// (`{"error": true, ...}`) in its place means the track has no lyrics.
pub fn read_sentences(path: &Path) -> Result<Vec<Sentence>> {
    let value: serde_json::Value = read_json(path)?;
    if value.get("error").and_then(|e| e.as_bool()) == Some(true) {
        return Err(LyricError::NoLyricsAvailable);
    }
    serde_json::from_value(value).map_err(|e| LyricError::json("decoding sentences", path, e))
}
