//! Text normalization for fetched lyrics and aligned words.
//!
//! `clean_lyrics` turns a lyrics-site page into the plain text handed to the
//! aligner. `canonicalize_word` is the only equality test used between that
//! text and the aligner's tokens, so both the reconciler and the grouper
//! depend on it. Run tests after changes.

use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Section labels that mark where the sung lyrics begin.
/// Checked in order; the first pattern with a match wins.
pub static SECTION_START_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // French sites: "[Couplet 1]", "[Couplet 2 : Artist]"
        Regex::new(r"(?i)\[couplet\s+\d+.*?\]").unwrap(),
        // "[Verse 1]", "[Verse 1: Artist]"
        Regex::new(r"(?i)\[verse\s+\d+.*?\]").unwrap(),
        // Single-verse songs: "[Couplet unique]"
        Regex::new(r"(?i)\[couplet\s+unique.*?\]").unwrap(),
    ]
});

/// Parenthesized ad-libs: "(yeah)", "(x2)". Non-greedy so "(a) b (c)" keeps " b ".
pub static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());

/// Bracketed section labels and annotations: "[Refrain]", "[Pont : Artist]"
pub static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").unwrap());

/// Lyrics-site footer glued to the end of the page: "...last line12Embed"
pub static EMBED_FOOTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\d*embed\s*\z").unwrap());

/// Anything that is neither a word character nor whitespace.
pub static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]+").unwrap());

/// Regex to collapse multiple spaces into single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// Characters dropped from cleaned lyrics before alignment.
const STRIPPED_CHARS: [char; 4] = [',', ':', '\'', '♪'];

// ============================================================================
// ASCII FOLDING
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritics).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}' | '\u{1AB0}'..='\u{1AFF}' |
             '\u{1DC0}'..='\u{1DFF}' | '\u{20D0}'..='\u{20FF}' |
             '\u{FE20}'..='\u{FE2F}')
}

/// Fold to lowercase ASCII: NFKD, drop combining marks, transliterate the rest.
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    any_ascii(&stripped).to_lowercase()
}

// ============================================================================
// LYRICS CLEANUP
// ============================================================================

/// Byte offset of the first verse label, or 0 when the page has none.
pub fn find_lyrics_start(raw: &str) -> usize {
    SECTION_START_PATTERNS
        .iter()
        .find_map(|p| p.find(raw))
        .map(|m| m.start())
        .unwrap_or(0)
}

/// Clean raw fetched lyrics into the plain text the aligner reads.
///
/// The verse label search runs before brackets are stripped, so a page that
/// starts with credits or a "[Intro]" block is cut at its first real verse.
/// An empty result means no usable lyrics.
pub fn clean_lyrics(raw: &str) -> String {
    let body = &raw[find_lyrics_start(raw)..];
    let body = body.replace('♪', "");

    let mut result = fold_to_ascii(&body);
    result = PARENTHETICAL.replace_all(&result, "").to_string();
    result = BRACKETED.replace_all(&result, "").to_string();
    result = EMBED_FOOTER.replace_all(&result, "").to_string();
    result = result.replace(STRIPPED_CHARS, "");

    let mut lines: Vec<String> = Vec::new();
    for line in result.lines() {
        let line = MULTI_SPACE.replace_all(line.trim(), " ").to_string();
        // Keep at most one blank line between stanzas
        if line.is_empty() && lines.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

// ============================================================================
// WORD CANONICALIZATION
// ============================================================================

/// Canonical form used to compare lyric words with aligner tokens.
/// Hyphens become spaces, other punctuation is dropped, result is uppercase.
pub fn canonicalize_word(word: &str) -> String {
    NON_WORD
        .replace_all(&word.replace('-', " "), "")
        .to_uppercase()
}

/// Split hyphenated compounds: "well-known" → ["well", "known"]
pub fn split_compound_words(word: &str) -> Vec<String> {
    word.replace('-', " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Flat word sequence of a lyric text, compounds split, in document order.
pub fn original_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .flat_map(split_compound_words)
        .collect()
}

/// Remove every parenthesized substring: "(oh) yeah" → " yeah"
pub fn strip_parentheticals(text: &str) -> String {
    PARENTHETICAL.replace_all(text, "").to_string()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_word_basic() {
        assert_eq!(canonicalize_word("hello"), "HELLO");
        assert_eq!(canonicalize_word("World!"), "WORLD");
        assert_eq!(canonicalize_word("Don't-Stop!"), "DONT STOP");
        assert_eq!(canonicalize_word("Don't-Stop!"), canonicalize_word("DONT STOP"));
    }

    #[test]
    fn test_canonicalize_word_idempotent() {
        for word in ["c'était", "Well-Known,", "«oui»", "ÇA", "rock'n'roll", "", "--"] {
            let once = canonicalize_word(word);
            assert_eq!(canonicalize_word(&once), once, "not idempotent for {:?}", word);
        }
    }

    #[test]
    fn test_canonicalize_word_keeps_accents() {
        // Word characters are Unicode-aware; no ASCII folding here
        assert_eq!(canonicalize_word("été"), "ÉTÉ");
    }

    #[test]
    fn test_split_compound_words() {
        assert_eq!(split_compound_words("well-known"), vec!["well", "known"]);
        assert_eq!(split_compound_words("plain"), vec!["plain"]);
        assert!(split_compound_words("-").is_empty());
    }

    #[test]
    fn test_original_words_crosses_lines() {
        assert_eq!(
            original_words("hello world\nit's a well-known\n\nline"),
            vec!["hello", "world", "it's", "a", "well", "known", "line"]
        );
    }

    #[test]
    fn test_strip_parentheticals() {
        assert_eq!(strip_parentheticals("YEAH(OH)"), "YEAH");
        assert_eq!(strip_parentheticals("(a) b (c)"), " b ");
        assert_eq!(strip_parentheticals("no parens"), "no parens");
    }

    #[test]
    fn test_fold_to_ascii() {
        assert_eq!(fold_to_ascii("Été"), "ete");
        assert_eq!(fold_to_ascii("Motörhead"), "motorhead");
    }

    #[test]
    fn test_find_lyrics_start() {
        let raw = "Some credits\n[Intro]\nla la\n[Verse 1: Artist]\nfirst line";
        assert_eq!(&raw[find_lyrics_start(raw)..], "[Verse 1: Artist]\nfirst line");
        assert_eq!(find_lyrics_start("no labels here"), 0);
    }

    #[test]
    fn test_find_lyrics_start_prefers_couplet() {
        let raw = "[Verse 1]\nx\n[Couplet 1]\ny";
        assert!(raw[find_lyrics_start(raw)..].starts_with("[Couplet 1]"));
    }

    #[test]
    fn test_clean_lyrics_strips_annotations() {
        let raw = "Song Lyrics\n[Couplet 1]\nJ'ai vu, la mer (ouais)\n\n\n[Refrain]\nÉté: soleil\nlast line42Embed";
        assert_eq!(clean_lyrics(raw), "jai vu la mer\n\nete soleil\nlast line");
    }

    #[test]
    fn test_clean_lyrics_without_label_keeps_everything() {
        assert_eq!(clean_lyrics("Hello  World\nSecond ♪ line\n"), "hello world\nsecond line");
    }

    #[test]
    fn test_clean_lyrics_keeps_embedded_inside_words() {
        assert_eq!(clean_lyrics("embedded in you"), "embedded in you");
    }

    #[test]
    fn test_clean_lyrics_keeps_sung_embed_mid_text() {
        assert_eq!(clean_lyrics("deep down I embed\nthe rest"), "deep down i embed\nthe rest");
        assert_eq!(clean_lyrics("deep down I embed\nthe rest7Embed\n"), "deep down i embed\nthe rest");
    }

    #[test]
    fn test_clean_lyrics_empty() {
        assert_eq!(clean_lyrics(""), "");
        assert_eq!(clean_lyrics("[Instrumental]\n\n"), "");
    }
}
