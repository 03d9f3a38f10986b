//! Stage-by-stage runs through the public API, the way the CLI chains them.

use lyric_clip::alignment::{parse_alignment, reconcile, DEFAULT_PLACEHOLDER};
use lyric_clip::grouping::group;
use lyric_clip::highlight::{build_schedule, ScheduleOptions};
use lyric_clip::normalize::clean_lyrics;
use lyric_clip::rescale::rescale;
use lyric_clip::{store, LyricError, WordToken};

const LYRICS: &str = "hello world\nsecond line";
const ALIGNMENT: &str = "0.0 0.5 HELLO\n0.5 1.0 WORLD\n1.2 1.6 SECOND\n1.6 2.0 LINE\n";

fn spans(words: &[WordToken]) -> Vec<(u64, u64)> {
    words.iter().map(|w| (w.start_ms, w.end_ms)).collect()
}

#[test]
fn test_two_line_song_through_every_stage() {
    let parsed = parse_alignment(ALIGNMENT);
    assert_eq!(parsed.malformed_lines, 0);

    let flat = reconcile(LYRICS, &parsed.records, DEFAULT_PLACEHOLDER).words;
    assert_eq!(spans(&flat), vec![(0, 500), (500, 1000), (1200, 1600), (1600, 2000)]);

    let sentences = group(LYRICS, &flat);
    assert_eq!(sentences.len(), 2);
    assert_eq!(sentences[0].text, "hello world");
    assert!(sentences.iter().all(|s| s.words.len() == 2));

    let rescaled = rescale(&sentences, 2.0).unwrap();
    let all: Vec<WordToken> = rescaled.iter().flat_map(|s| s.words.clone()).collect();
    assert_eq!(spans(&all), vec![(0, 250), (250, 500), (600, 800), (800, 1000)]);

    let frames = build_schedule(&rescaled, ScheduleOptions::default());
    assert_eq!(frames.len(), 4);
    assert_eq!(frames[2].start_ms, 600);
    assert_eq!(frames[2].sentence_index, 1);
}

#[test]
fn test_placeholder_takes_the_lyric_word() {
    let parsed = parse_alignment("0.0 0.3 <noise>\n0.3 0.6 WORLD\n");
    let result = reconcile("hello world", &parsed.records, "<noise>");

    assert_eq!(
        result.words,
        vec![WordToken::new("HELLO", 0, 300), WordToken::new("WORLD", 300, 600)]
    );
    assert_eq!(result.placeholders_resolved, 1);
    assert_eq!(result.placeholders_unresolved, 0);
}

#[test]
fn test_artifacts_survive_the_disk() {
    let dir = tempfile::tempdir().unwrap();
    let parsed = parse_alignment(ALIGNMENT);
    let flat = reconcile(LYRICS, &parsed.records, DEFAULT_PLACEHOLDER).words;
    let sentences = group(LYRICS, &flat);

    let words_path = dir.path().join(store::FLAT_WORDS_FILE);
    let sentences_path = dir.path().join(store::SENTENCES_FILE);
    store::write_json(&words_path, &flat).unwrap();
    store::write_json(&sentences_path, &sentences).unwrap();

    let raw = std::fs::read_to_string(&sentences_path).unwrap();
    assert!(raw.contains("\"startTimeMs\": \"1200\""));
    assert!(raw.contains("\"sentence\": \"second line\""));

    assert_eq!(store::read_flat_words(&words_path).unwrap(), flat);
    let reread = store::read_sentences(&sentences_path).unwrap();
    assert_eq!(reread, sentences);
    assert_eq!(group(LYRICS, &store::read_flat_words(&words_path).unwrap()), reread);
}

#[test]
fn test_cleaned_lyrics_file_groups_like_memory() {
    let dir = tempfile::tempdir().unwrap();
    let cleaned = clean_lyrics("[Verse 1]\r\nHello, world\r\nSecond line\r\n");
    let flat = reconcile(&cleaned, &parse_alignment(ALIGNMENT).records, DEFAULT_PLACEHOLDER).words;

    let path = dir.path().join("scrapedlyrics.txt");
    store::write_text(&path, &cleaned).unwrap();
    let reread = store::read_text(&path).unwrap();

    let from_memory = group(&cleaned, &flat);
    let from_file = group(&reread, &flat);
    assert_eq!(from_memory.len(), 2);
    assert_eq!(from_file, from_memory);
    assert!(from_file.iter().all(|s| !s.text.contains('\r')));
}

#[test]
fn test_error_payload_means_no_lyrics() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(store::SENTENCES_FILE);
    std::fs::write(&path, "{\"error\": true}").unwrap();
    assert!(matches!(store::read_sentences(&path), Err(LyricError::NoLyricsAvailable)));
}
