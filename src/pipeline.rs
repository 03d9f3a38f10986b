//! End-to-end pipeline: lyrics → alignment → sentences → rescaled timings →
//! highlight frames.
//!
//! Stages hand plain structures to each other. Every artifact is also written
//! to the work directory so a failed run can be inspected; nothing there is
//! cleaned up automatically.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::alignment::{parse_alignment, reconcile};
use crate::config::PipelineConfig;
use crate::error::{LyricError, Result};
use crate::grouping::{count_matched, group};
use crate::highlight::{build_schedule, ScheduleOptions};
use crate::models::{HighlightFrame, PipelineStats, Sentence, WordToken};
use crate::normalize::clean_lyrics;
use crate::progress::{create_spinner, finish_spinner, log_stage};
use crate::rescale::rescale;
use crate::services::{AudioSpeedChanger, ForcedAligner, FrameRenderer, JsonFrameWriter, LyricsSource};
use crate::store;

pub const CLEANED_LYRICS_FILE: &str = "scrapedlyrics.txt";
pub const SPED_UP_AUDIO_FILE: &str = "song_speed_up.wav";

/// What to process and where to put the artifacts.
#[derive(Debug, Clone)]
pub struct TrackRequest {
    pub title: String,
    pub artist: String,
    pub audio: PathBuf,
    pub work_dir: PathBuf,
}

/// Everything a run produced, in stage order.
#[derive(Debug, Clone)]
pub struct PipelineArtifacts {
    pub lyrics: String,
    pub flat_words: Vec<WordToken>,
    pub sentences: Vec<Sentence>,
    pub rescaled: Vec<Sentence>,
    pub frames: Vec<HighlightFrame>,
    pub stats: PipelineStats,
}

pub struct PipelineBuilder {
    config: PipelineConfig,
    lyrics_source: Option<Box<dyn LyricsSource>>,
    aligner: Option<Box<dyn ForcedAligner>>,
    speed_changer: Option<Box<dyn AudioSpeedChanger>>,
    renderer: Option<Box<dyn FrameRenderer>>,
}

impl PipelineBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            lyrics_source: None,
            aligner: None,
            speed_changer: None,
            renderer: None,
        }
    }

    pub fn with_lyrics_source(mut self, source: Box<dyn LyricsSource>) -> Self {
        self.lyrics_source = Some(source);
        self
    }

    pub fn with_aligner(mut self, aligner: Box<dyn ForcedAligner>) -> Self {
        self.aligner = Some(aligner);
        self
    }

    pub fn with_speed_changer(mut self, speed_changer: Box<dyn AudioSpeedChanger>) -> Self {
        self.speed_changer = Some(speed_changer);
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn FrameRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Lyrics source and aligner are required; without a renderer the frames
    /// are only written to `frames.json`.
    pub fn build(self) -> std::result::Result<Pipeline, &'static str> {
        Ok(Pipeline {
            config: self.config,
            lyrics_source: self.lyrics_source.ok_or("a lyrics source is required")?,
            aligner: self.aligner.ok_or("a forced aligner is required")?,
            speed_changer: self.speed_changer,
            renderer: self.renderer,
        })
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    lyrics_source: Box<dyn LyricsSource>,
    aligner: Box<dyn ForcedAligner>,
    speed_changer: Option<Box<dyn AudioSpeedChanger>>,
    renderer: Option<Box<dyn FrameRenderer>>,
}

impl Pipeline {
    /// Run every stage for one track.
    ///
    /// Returns [`LyricError::NoLyricsAvailable`] before touching the aligner
    /// when the lyrics source has nothing usable.
    pub fn run(&self, request: &TrackRequest) -> Result<PipelineArtifacts> {
        let start = Instant::now();
        let mut stats = PipelineStats {
            speed_factor: self.config.speed_factor,
            ..Default::default()
        };
        let work_dir = request.work_dir.as_path();

        // Stage 1: lyrics
        let spinner = create_spinner("Stage 1: Fetching lyrics");
        let raw = self
            .lyrics_source
            .fetch(&request.title, &request.artist)?
            .ok_or(LyricError::NoLyricsAvailable)?;
        let lyrics = clean_lyrics(&raw);
        if lyrics.is_empty() {
            spinner.finish_and_clear();
            return Err(LyricError::NoLyricsAvailable);
        }
        let lyrics_path = work_dir.join(CLEANED_LYRICS_FILE);
        store::write_text(&lyrics_path, &lyrics)?;
        finish_spinner(
            &spinner,
            format!("Stage 1: Saved {} lyric lines", lyrics.lines().count()),
        );

        // Stage 2: alignment
        let spinner = create_spinner("Stage 2: Aligning");
        let aligned = self.aligner.align(&request.audio, &lyrics_path)?;
        let parsed = parse_alignment(&aligned);
        let reconciled = reconcile(&lyrics, &parsed.records, &self.config.placeholder);
        stats.alignment_lines = parsed.records.len() + parsed.malformed_lines;
        stats.malformed_lines = parsed.malformed_lines;
        stats.placeholders_resolved = reconciled.placeholders_resolved;
        stats.placeholders_unresolved = reconciled.placeholders_unresolved;
        stats.flat_words = reconciled.words.len();
        if reconciled.placeholders_unresolved > 0 {
            log_stage(
                "reconcile",
                &format!(
                    "{} placeholder(s) left unresolved: lyrics ran out of words",
                    reconciled.placeholders_unresolved
                ),
            );
        }
        let flat_words = reconciled.words;
        store::write_json(&work_dir.join(store::FLAT_WORDS_FILE), &flat_words)?;
        finish_spinner(&spinner, format!("Stage 2: Reconciled {} words", flat_words.len()));

        // Stage 3: sentences
        let sentences = group(&lyrics, &flat_words);
        let (matched, dropped) = count_matched(&sentences, flat_words.len());
        stats.sentences = sentences.len();
        stats.empty_sentences = sentences.iter().filter(|s| s.words.is_empty()).count();
        stats.matched_words = matched;
        stats.dropped_words = dropped;
        store::write_json(&work_dir.join(store::SENTENCES_FILE), &sentences)?;
        log_stage(
            "group",
            &format!("{} sentences, {} words matched, {} dropped", sentences.len(), matched, dropped),
        );

        // Stage 4: speed-up
        let rescaled = rescale(&sentences, self.config.speed_factor)?;
        store::write_json(&work_dir.join(store::RESCALED_FILE), &rescaled)?;
        if let Some(changer) = &self.speed_changer {
            let spinner = create_spinner("Stage 4: Speeding up audio");
            let output = work_dir.join(SPED_UP_AUDIO_FILE);
            changer.speed_up(
                &request.audio,
                self.config.speed_factor,
                self.config.clip_duration_ms,
                &output,
            )?;
            finish_spinner(&spinner, format!("Stage 4: Wrote {}", output.display()));
        }

        // Stage 5: frames
        let frames = build_schedule(
            &rescaled,
            ScheduleOptions {
                wrap_width: self.config.wrap_width,
                color_offset: self.config.color_offset,
            },
        );
        stats.frames = frames.len();
        self.render(work_dir, &frames)?;

        stats.elapsed_seconds = start.elapsed().as_secs_f64();
        Ok(PipelineArtifacts {
            lyrics,
            flat_words,
            sentences,
            rescaled,
            frames,
            stats,
        })
    }

    fn render(&self, work_dir: &Path, frames: &[HighlightFrame]) -> Result<()> {
        JsonFrameWriter::new(work_dir.join(store::FRAMES_FILE)).render(frames)?;
        if let Some(renderer) = &self.renderer {
            renderer.render(frames)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct StaticLyrics(Option<&'static str>);

    impl LyricsSource for StaticLyrics {
        fn fetch(&self, _title: &str, _artist: &str) -> Result<Option<String>> {
            Ok(self.0.map(str::to_string))
        }
    }

    struct StaticAligner(&'static str);

    impl ForcedAligner for StaticAligner {
        fn align(&self, _audio: &Path, lyrics: &Path) -> Result<String> {
            assert!(lyrics.exists(), "aligner must see the cleaned lyrics on disk");
            Ok(self.0.to_string())
        }
    }

    struct CountingRenderer {
        calls: Rc<RefCell<Vec<usize>>>,
    }

    impl FrameRenderer for CountingRenderer {
        fn render(&self, frames: &[HighlightFrame]) -> Result<()> {
            self.calls.borrow_mut().push(frames.len());
            Ok(())
        }
    }

    fn request(dir: &Path) -> TrackRequest {
        TrackRequest {
            title: "Song".into(),
            artist: "Artist".into(),
            audio: dir.join("song.mp3"),
            work_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn test_run_writes_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = PipelineBuilder::new(PipelineConfig {
            speed_factor: 2.0,
            ..Default::default()
        })
        .with_lyrics_source(Box::new(StaticLyrics(Some("[Verse 1]\nHello, world\nSecond line"))))
        .with_aligner(Box::new(StaticAligner(
            "0.0 0.5 HELLO\n0.5 1.0 BREATH*\n1.2 1.6 SECOND\n1.6 2.0 LINE\n",
        )))
        .build()
        .unwrap();

        let artifacts = pipeline.run(&request(dir.path())).unwrap();
        assert_eq!(artifacts.lyrics, "hello world\nsecond line");
        assert_eq!(artifacts.flat_words[1].text, "WORLD");
        assert_eq!(artifacts.sentences.len(), 2);
        assert_eq!(artifacts.rescaled[1].words[0], WordToken::new("SECOND", 600, 800));
        assert_eq!(artifacts.frames.len(), 4);
        assert_eq!(artifacts.stats.placeholders_resolved, 1);
        assert_eq!(artifacts.stats.matched_words, 4);

        for name in [
            CLEANED_LYRICS_FILE,
            store::FLAT_WORDS_FILE,
            store::SENTENCES_FILE,
            store::RESCALED_FILE,
            store::FRAMES_FILE,
        ] {
            assert!(dir.path().join(name).exists(), "missing {}", name);
        }
        assert_eq!(
            store::read_sentences(&dir.path().join(store::RESCALED_FILE)).unwrap(),
            artifacts.rescaled
        );
    }

    #[test]
    fn test_run_without_lyrics() {
        let dir = tempfile::tempdir().unwrap();
        for lyrics in [None, Some("[Instrumental]")] {
            let pipeline = PipelineBuilder::new(PipelineConfig::default())
                .with_lyrics_source(Box::new(StaticLyrics(lyrics)))
                .with_aligner(Box::new(StaticAligner("")))
                .build()
                .unwrap();
            assert!(matches!(
                pipeline.run(&request(dir.path())),
                Err(LyricError::NoLyricsAvailable)
            ));
        }
        assert!(!dir.path().join(store::FLAT_WORDS_FILE).exists());
    }

    #[test]
    fn test_run_calls_extra_renderer() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let pipeline = PipelineBuilder::new(PipelineConfig::default())
            .with_lyrics_source(Box::new(StaticLyrics(Some("la la"))))
            .with_aligner(Box::new(StaticAligner("0.0 0.4 LA\n0.4 0.8 LA\n")))
            .with_renderer(Box::new(CountingRenderer {
                calls: Rc::clone(&calls),
            }))
            .build()
            .unwrap();
        pipeline.run(&request(dir.path())).unwrap();
        assert_eq!(*calls.borrow(), vec![2]);
    }

    #[test]
    fn test_build_requires_aligner() {
        let result = PipelineBuilder::new(PipelineConfig::default())
            .with_lyrics_source(Box::new(StaticLyrics(None)))
            .build();
        assert!(result.is_err());
    }
}
