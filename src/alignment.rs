//! Forced-aligner output parsing and reconciliation with the lyric text.
//!
//! The aligner sees the cleaned lyrics and answers one `<start> <end> <token>`
//! line per word. Words it could hear but not transcribe come back as a
//! placeholder token; those are replaced with the lyric word at the same
//! position so their timing is not lost.

use crate::models::{AlignmentRecord, WordToken};
use crate::normalize::original_words;

/// Placeholder the Kaldi-based lyric aligner emits for breath/noise segments.
pub const DEFAULT_PLACEHOLDER: &str = "BREATH*";

/// Parsed aligner output plus the number of lines that did not fit the format.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AlignmentParse {
    pub records: Vec<AlignmentRecord>,
    pub malformed_lines: usize,
}

/// Reconciled flat word list and placeholder bookkeeping.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Reconciliation {
    pub words: Vec<WordToken>,
    pub placeholders_resolved: usize,
    /// Placeholders met after every lyric word was consumed. They are kept in
    /// `words` verbatim so the output stays one-to-one with the input.
    pub placeholders_unresolved: usize,
}

/// Parse one aligner line. Exactly three whitespace-separated fields with
/// finite, non-negative times; anything else is rejected.
pub fn parse_alignment_line(line: &str) -> Option<AlignmentRecord> {
    let mut parts = line.split_whitespace();
    let (start, end, token) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let start_s: f64 = start.parse().ok()?;
    let end_s: f64 = end.parse().ok()?;
    if !start_s.is_finite() || !end_s.is_finite() || start_s < 0.0 || end_s < 0.0 {
        return None;
    }
    Some(AlignmentRecord {
        start_s,
        end_s,
        token: token.to_string(),
    })
}

/// Parse a whole aligner output file. Blank lines are ignored silently,
/// other non-conforming lines are counted as malformed.
pub fn parse_alignment(text: &str) -> AlignmentParse {
    let mut parsed = AlignmentParse::default();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_alignment_line(line) {
            Some(record) => parsed.records.push(record),
            None => parsed.malformed_lines += 1,
        }
    }
    parsed
}

/// Seconds to whole milliseconds, truncating.
pub fn seconds_to_ms(seconds: f64) -> u64 {
    (seconds * 1000.0).floor().max(0.0) as u64
}

/// Merge aligner records with the original lyric words.
///
/// The lyric cursor advances once per record whether or not the aligner's
/// token matches the lyric word; a real token is always trusted for text.
pub fn reconcile(original_text: &str, records: &[AlignmentRecord], placeholder: &str) -> Reconciliation {
    let originals = original_words(original_text);
    let mut cursor = 0usize;
    let mut out = Reconciliation {
        words: Vec::with_capacity(records.len()),
        ..Default::default()
    };

    for record in records {
        let text = if record.token == placeholder {
            match originals.get(cursor) {
                Some(word) => {
                    cursor += 1;
                    out.placeholders_resolved += 1;
                    word.to_uppercase()
                }
                None => {
                    out.placeholders_unresolved += 1;
                    record.token.clone()
                }
            }
        } else {
            cursor += 1;
            record.token.clone()
        };

        out.words.push(WordToken {
            text,
            start_ms: seconds_to_ms(record.start_s),
            end_ms: seconds_to_ms(record.end_s),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(start_s: f64, end_s: f64, token: &str) -> AlignmentRecord {
        AlignmentRecord {
            start_s,
            end_s,
            token: token.to_string(),
        }
    }

    #[test]
    fn test_parse_alignment_line() {
        assert_eq!(parse_alignment_line("0.5 1.25 HELLO"), Some(rec(0.5, 1.25, "HELLO")));
        assert_eq!(parse_alignment_line("  0 1\tBREATH*  "), Some(rec(0.0, 1.0, "BREATH*")));
    }

    #[test]
    fn test_parse_alignment_line_rejects_bad_shapes() {
        assert_eq!(parse_alignment_line("0.5 1.25"), None);
        assert_eq!(parse_alignment_line("0.5 1.25 TWO WORDS"), None);
        assert_eq!(parse_alignment_line("start end WORD"), None);
        assert_eq!(parse_alignment_line("-1 0.5 WORD"), None);
        assert_eq!(parse_alignment_line("NaN 0.5 WORD"), None);
    }

    #[test]
    fn test_parse_alignment_counts_malformed() {
        let parsed = parse_alignment("0.0 0.5 HELLO\n\nLOG: done\n0.5 1.0 WORLD\n");
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.malformed_lines, 1);
    }

    #[test]
    fn test_reconcile_without_placeholders_keeps_tokens() {
        let records = vec![
            rec(0.0, 0.5, "HELLO"),
            rec(0.5, 1.0, "WORLD"),
            rec(1.2, 1.6, "SECOND"),
            rec(1.6, 2.0, "LINE"),
        ];
        let result = reconcile("hello world\nsecond line", &records, DEFAULT_PLACEHOLDER);
        let got: Vec<(&str, u64, u64)> = result
            .words
            .iter()
            .map(|w| (w.text.as_str(), w.start_ms, w.end_ms))
            .collect();
        assert_eq!(
            got,
            vec![
                ("HELLO", 0, 500),
                ("WORLD", 500, 1000),
                ("SECOND", 1200, 1600),
                ("LINE", 1600, 2000),
            ]
        );
        assert_eq!(result.placeholders_resolved, 0);
    }

    #[test]
    fn test_reconcile_substitutes_placeholder() {
        let records = vec![rec(0.0, 0.3, "<noise>"), rec(0.3, 0.6, "WORLD")];
        let result = reconcile("hello world", &records, "<noise>");
        assert_eq!(result.words[0], WordToken::new("HELLO", 0, 300));
        assert_eq!(result.words[1], WordToken::new("WORLD", 300, 600));
        assert_eq!(result.placeholders_resolved, 1);
    }

    #[test]
    fn test_reconcile_placeholder_uses_compound_parts() {
        let records = vec![
            rec(0.0, 0.2, "WELL"),
            rec(0.2, 0.4, DEFAULT_PLACEHOLDER),
            rec(0.4, 0.6, "SONG"),
        ];
        let result = reconcile("well-known song", &records, DEFAULT_PLACEHOLDER);
        let texts: Vec<&str> = result.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["WELL", "KNOWN", "SONG"]);
    }

    #[test]
    fn test_reconcile_mismatched_token_still_advances() {
        let records = vec![rec(0.0, 0.2, "HULLO"), rec(0.2, 0.4, DEFAULT_PLACEHOLDER)];
        let result = reconcile("hello world", &records, DEFAULT_PLACEHOLDER);
        assert_eq!(result.words[0].text, "HULLO");
        assert_eq!(result.words[1].text, "WORLD");
    }

    #[test]
    fn test_reconcile_exhausted_placeholder_passes_through() {
        let records = vec![
            rec(0.0, 0.2, "HELLO"),
            rec(0.2, 0.4, DEFAULT_PLACEHOLDER),
            rec(0.4, 0.6, DEFAULT_PLACEHOLDER),
        ];
        let result = reconcile("hello world", &records, DEFAULT_PLACEHOLDER);
        assert_eq!(result.words.len(), 3);
        assert_eq!(result.words[1].text, "WORLD");
        assert_eq!(result.words[2].text, DEFAULT_PLACEHOLDER);
        assert_eq!(result.placeholders_resolved, 1);
        assert_eq!(result.placeholders_unresolved, 1);
    }

    #[test]
    fn test_reconcile_output_length_matches_input() {
        let records: Vec<AlignmentRecord> = (0..7)
            .map(|i| rec(i as f64 * 0.1, i as f64 * 0.1 + 0.1, if i % 2 == 0 { DEFAULT_PLACEHOLDER } else { "X" }))
            .collect();
        for text in ["", "one", "one two three four five six seven eight"] {
            assert_eq!(reconcile(text, &records, DEFAULT_PLACEHOLDER).words.len(), records.len());
        }
    }

    #[test]
    fn test_seconds_to_ms_truncates() {
        assert_eq!(seconds_to_ms(1.2345), 1234);
        assert_eq!(seconds_to_ms(0.0), 0);
    }
}
