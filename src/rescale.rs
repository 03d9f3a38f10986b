//! Rescale sentence timings after the audio has been sped up.

use crate::error::{LyricError, Result};
use crate::models::{Sentence, WordToken};
use crate::normalize::strip_parentheticals;

/// Speed-up applied to both audio and lyric timings.
pub const DEFAULT_SPEED_FACTOR: f64 = 1.14;

pub fn validate_factor(factor: f64) -> Result<f64> {
    if factor.is_finite() && factor > 0.0 {
        Ok(factor)
    } else {
        Err(LyricError::InvalidSpeedFactor(factor))
    }
}

/// Divide one timestamp by the factor, flooring.
pub fn scale_ms(ms: u64, factor: f64) -> u64 {
    (ms as f64 / factor).floor().max(0.0) as u64
}

fn rescale_word(word: &WordToken, factor: f64) -> WordToken {
    let start_ms = scale_ms(word.start_ms, factor);
    // Flooring each bound on its own can invert a zero-length word
    let end_ms = scale_ms(word.end_ms, factor).max(start_ms);
    WordToken {
        text: strip_parentheticals(&word.text),
        start_ms,
        end_ms,
    }
}

/// Return a new sentence structure with every timestamp divided by `factor`
/// and parenthesized ad-libs removed from each word's text.
pub fn rescale(sentences: &[Sentence], factor: f64) -> Result<Vec<Sentence>> {
    let factor = validate_factor(factor)?;
    Ok(sentences
        .iter()
        .map(|sentence| Sentence {
            text: sentence.text.clone(),
            words: sentence
                .words
                .iter()
                .map(|w| rescale_word(w, factor))
                .collect(),
        })
        .collect())
}
