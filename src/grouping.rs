//! Regroup the flat timed-word stream into the original lyric lines.

use crate::models::{Sentence, WordToken};
use crate::normalize::canonicalize_word;

/// Canonical words a line is expected to contain. Hyphens split words here
/// only; the sentence text itself keeps them.
pub fn line_canonical_words(line: &str) -> Vec<String> {
    line.replace('-', " ")
        .split_whitespace()
        .map(canonicalize_word)
        .collect()
}

/// Partition `flat_words` into one [`Sentence`] per line of `original_text`.
/// Trailing newlines do not start a sentence and `\r\n` counts as one break.
///
/// A single cursor walks the flat list. Each line takes words while it still
/// has expected words left: a flat word whose canonical form equals the next
/// expected word is appended, any other flat word is skipped for good. A
/// spurious aligner token can therefore cost the line a real word; that loss
/// is accepted rather than searched around.
pub fn group(original_text: &str, flat_words: &[WordToken]) -> Vec<Sentence> {
    let mut cursor = 0usize;
    let mut sentences = Vec::new();

    for line in original_text.trim_end_matches(['\r', '\n']).lines() {
        let expected = line_canonical_words(line);
        let mut sentence = Sentence::new(line);

        while cursor < flat_words.len() && sentence.words.len() < expected.len() {
            let candidate = &flat_words[cursor];
            if canonicalize_word(&candidate.text) == expected[sentence.words.len()] {
                sentence.words.push(candidate.clone());
            }
            cursor += 1;
        }

        sentences.push(sentence);
    }

    sentences
}

/// Words placed into sentences, and words the grouper skipped over.
pub fn count_matched(sentences: &[Sentence], flat_len: usize) -> (usize, usize) {
    let matched: usize = sentences.iter().map(|s| s.words.len()).sum();
    (matched, flat_len.saturating_sub(matched))
}
