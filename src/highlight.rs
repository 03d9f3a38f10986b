//! Karaoke highlight queries over rescaled sentences.
//!
//! A word stays lit until the next word of its sentence starts; the last word
//! of a sentence uses its own end time. These effective spans are derived on
//! every query and never written back into the sentence structure.

use crate::models::{DisplayToken, HighlightFrame, Sentence, WordToken};
use crate::normalize::{canonicalize_word, split_compound_words};

/// Highlight colours, cycled once per rendered sentence.
pub const WORD_COLORS: [&str; 3] = ["#FFD700", "#FF6347", "#32CD32"];

/// Colours for the words that are not lit, cycled the same way.
pub const LINE_COLORS: [&str; 6] = ["#F5F5F5", "#EDEDED", "#E5E5E5", "#DCDCDC", "#D3D3D3", "#C8C8C8"];

pub const DEFAULT_WRAP_WIDTH: usize = 15;

/// `[start, end)` highlight span of each word in a sentence.
pub fn effective_spans(words: &[WordToken]) -> Vec<(u64, u64)> {
    words
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let end = words.get(i + 1).map_or(w.end_ms, |next| next.start_ms);
            (w.start_ms, end)
        })
        .collect()
}

/// Index of the word lit at `t_ms`, if any.
pub fn active_word_at(words: &[WordToken], t_ms: u64) -> Option<usize> {
    effective_spans(words)
        .iter()
        .position(|&(start, end)| start <= t_ms && t_ms < end)
}

/// True when a word with this canonical form is lit at `t_ms`.
pub fn is_active(canonical_word: &str, words: &[WordToken], t_ms: u64) -> bool {
    active_word_at(words, t_ms).is_some_and(|i| canonicalize_word(&words[i].text) == canonical_word)
}

/// A display token may be a compound ("well-known") that was timed as
/// separate words; it is lit while any of its parts is.
fn is_token_active(token: &str, words: &[WordToken], t_ms: u64) -> bool {
    split_compound_words(token)
        .iter()
        .any(|part| is_active(&canonicalize_word(part), words, t_ms))
}

// ============================================================================
// Frame schedule
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct ScheduleOptions {
    /// Column width the sentence text is wrapped at.
    pub wrap_width: usize,
    /// Starting index into [`WORD_COLORS`].
    pub color_offset: usize,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            wrap_width: DEFAULT_WRAP_WIDTH,
            color_offset: 0,
        }
    }
}

/// Greedy word wrap. Words longer than `width` get a line of their own
/// instead of being split.
pub fn wrap_words(text: &str, width: usize) -> Vec<Vec<String>> {
    let mut lines: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let len = word.chars().count();
        if !current.is_empty() && current_len + 1 + len > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current_len += if current.is_empty() { len } else { len + 1 };
        current.push(word.to_string());
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn display_lines(sentence: &Sentence, width: usize, t_ms: u64) -> Vec<Vec<DisplayToken>> {
    wrap_words(&sentence.text, width)
        .into_iter()
        .map(|line| {
            line.into_iter()
                .map(|word| word.replace('♪', ""))
                .filter(|word| !word.is_empty())
                .map(|text| DisplayToken {
                    highlighted: is_token_active(&text, &sentence.words, t_ms),
                    text,
                })
                .collect::<Vec<_>>()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// One overlay frame per timed word of every non-blank sentence.
pub fn build_schedule(sentences: &[Sentence], options: ScheduleOptions) -> Vec<HighlightFrame> {
    let mut frames = Vec::new();
    let mut rendered = 0usize;

    for (sentence_index, sentence) in sentences.iter().enumerate() {
        if sentence.is_blank() {
            continue;
        }
        let word_color = WORD_COLORS[(options.color_offset + rendered) % WORD_COLORS.len()];
        let line_color = LINE_COLORS[rendered % LINE_COLORS.len()];

        for (word_index, (start_ms, end_ms)) in effective_spans(&sentence.words).into_iter().enumerate() {
            frames.push(HighlightFrame {
                sentence_index,
                word_index,
                start_ms,
                end_ms,
                lines: display_lines(sentence, options.wrap_width, start_ms),
                word_color: word_color.to_string(),
                line_color: line_color.to_string(),
            });
        }
        rendered += 1;
    }

    frames
}
