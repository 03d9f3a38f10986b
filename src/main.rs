use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

use lyric_clip::alignment::{parse_alignment, reconcile, DEFAULT_PLACEHOLDER};
use lyric_clip::config::PipelineConfig;
use lyric_clip::grouping::{count_matched, group};
use lyric_clip::highlight::{build_schedule, is_active, ScheduleOptions};
use lyric_clip::normalize::{canonicalize_word, clean_lyrics};
use lyric_clip::pipeline::{PipelineBuilder, TrackRequest};
use lyric_clip::progress::{format_duration, log_stage, set_log_only};
use lyric_clip::rescale::rescale;
use lyric_clip::safety::validate_output_path;
use lyric_clip::services::{CommandAligner, CommandSpeedChanger, FileAligner, FileLyricsSource, ForcedAligner};
use lyric_clip::store;
use lyric_clip::LyricError;

#[derive(Parser, Debug)]
#[command(name = "lyric-clip")]
#[command(about = "Reconcile forced-alignment output with lyrics, regroup it into lines, speed it up, and schedule karaoke highlights")]
struct Cli {
    /// Hide spinners and print plain progress lines
    #[arg(long, global = true)]
    log_only: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean fetched lyrics into aligner-ready plain text
    Clean(CleanArgs),

    /// Merge aligner output with the lyric text into a flat word list
    Reconcile(ReconcileArgs),

    /// Group a flat word list into the lyric lines
    Group(GroupArgs),

    /// Divide every timestamp of a sentence file by the speed factor
    SpeedUp(SpeedUpArgs),

    /// Build the per-word highlight frames of a sentence file
    Schedule(ScheduleArgs),

    /// Show which sentences light up a word at a given time
    Query(QueryArgs),

    /// Run every stage for one track
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct CleanArgs {
    /// Raw lyrics as fetched
    input: PathBuf,

    /// Output text file (default: print to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ReconcileArgs {
    /// Cleaned lyrics the aligner was given
    lyrics: PathBuf,

    /// Aligner output, one `<start> <end> <token>` per line
    alignment: PathBuf,

    #[arg(short, long, default_value = store::FLAT_WORDS_FILE)]
    output: PathBuf,

    /// Token the aligner emits for untranscribed sounds
    #[arg(long)]
    placeholder: Option<String>,
}

#[derive(Args, Debug)]
struct GroupArgs {
    lyrics: PathBuf,

    /// Flat word list written by `reconcile`
    words: PathBuf,

    #[arg(short, long, default_value = store::SENTENCES_FILE)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct SpeedUpArgs {
    sentences: PathBuf,

    /// Speed factor (default: 1.14, or LYRIC_CLIP_SPEED_FACTOR)
    #[arg(long)]
    factor: Option<f64>,

    #[arg(short, long, default_value = store::RESCALED_FILE)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct ScheduleArgs {
    sentences: PathBuf,

    #[command(flatten)]
    layout: LayoutArgs,

    #[arg(short, long, default_value = store::FRAMES_FILE)]
    output: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct LayoutArgs {
    /// Column width sentences are wrapped at
    #[arg(long)]
    wrap_width: Option<usize>,

    /// First highlight colour index
    #[arg(long)]
    color_offset: Option<usize>,
}

#[derive(Args, Debug)]
struct QueryArgs {
    sentences: PathBuf,

    /// Word to look up, any casing or punctuation
    #[arg(long)]
    word: String,

    /// Playback time in milliseconds
    #[arg(long)]
    at_ms: u64,
}

#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("aligner").required(true).args(["alignment", "aligner_cmd"])))]
struct RunArgs {
    /// Raw or cleaned lyrics for the track
    #[arg(long)]
    lyrics: PathBuf,

    /// Track audio handed to the aligner and speed changer
    #[arg(long, default_value = "song.mp3")]
    audio: PathBuf,

    #[arg(long, default_value = "")]
    title: String,

    #[arg(long, default_value = "")]
    artist: String,

    /// Pre-computed aligner output
    #[arg(long)]
    alignment: Option<PathBuf>,

    /// Aligner command template using {audio}, {lyrics} and {output}
    #[arg(long)]
    aligner_cmd: Option<String>,

    /// Speed-change command template using {input}, {factor}, {duration_s} and {output}
    #[arg(long)]
    speed_cmd: Option<String>,

    /// Directory receiving every artifact
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    #[arg(long)]
    factor: Option<f64>,

    #[arg(long)]
    placeholder: Option<String>,

    #[command(flatten)]
    layout: LayoutArgs,

    /// Write run statistics as JSON
    #[arg(long)]
    stats: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    set_log_only(cli.log_only);

    let result = match cli.cmd {
        Command::Clean(args) => cmd_clean(args),
        Command::Reconcile(args) => cmd_reconcile(args),
        Command::Group(args) => cmd_group(args),
        Command::SpeedUp(args) => cmd_speed_up(args),
        Command::Schedule(args) => cmd_schedule(args),
        Command::Query(args) => cmd_query(args),
        Command::Run(args) => cmd_run(args),
    };

    // Missing lyrics ends the run without being an error
    match result {
        Err(e) if matches!(e.downcast_ref::<LyricError>(), Some(LyricError::NoLyricsAvailable)) => {
            eprintln!("Lyrics not available for this track.");
            Ok(())
        }
        other => other,
    }
}

fn base_config() -> Result<PipelineConfig> {
    PipelineConfig::default()
        .with_env_overrides()
        .context("Invalid LYRIC_CLIP_SPEED_FACTOR")
}

fn schedule_options(config: &PipelineConfig, layout: &LayoutArgs) -> ScheduleOptions {
    ScheduleOptions {
        wrap_width: layout.wrap_width.unwrap_or(config.wrap_width),
        color_offset: layout.color_offset.unwrap_or(config.color_offset),
    }
}

fn cmd_clean(args: CleanArgs) -> Result<()> {
    let raw = store::read_text(&args.input)?;
    let cleaned = clean_lyrics(&raw);
    if cleaned.is_empty() {
        return Err(LyricError::NoLyricsAvailable.into());
    }
    match args.output {
        Some(output) => {
            validate_output_path(&output, "txt", &[args.input.as_path()])?;
            store::write_text(&output, &cleaned)?;
            log_stage("clean", &format!("Wrote {} lines to {}", cleaned.lines().count(), output.display()));
        }
        None => println!("{}", cleaned),
    }
    Ok(())
}

fn cmd_reconcile(args: ReconcileArgs) -> Result<()> {
    validate_output_path(&args.output, "json", &[args.lyrics.as_path(), args.alignment.as_path()])?;
    let placeholder = args.placeholder.unwrap_or_else(|| DEFAULT_PLACEHOLDER.to_string());
    let lyrics = store::read_text(&args.lyrics)?;
    let parsed = parse_alignment(&store::read_text(&args.alignment)?);
    let result = reconcile(&lyrics, &parsed.records, &placeholder);

    store::write_json(&args.output, &result.words)?;
    log_stage(
        "reconcile",
        &format!(
            "{} words ({} placeholders resolved, {} unresolved, {} malformed lines skipped) -> {}",
            result.words.len(),
            result.placeholders_resolved,
            result.placeholders_unresolved,
            parsed.malformed_lines,
            args.output.display()
        ),
    );
    Ok(())
}

fn cmd_group(args: GroupArgs) -> Result<()> {
    validate_output_path(&args.output, "json", &[args.lyrics.as_path(), args.words.as_path()])?;
    let lyrics = store::read_text(&args.lyrics)?;
    let words = store::read_flat_words(&args.words)?;
    let sentences = group(&lyrics, &words);
    let (matched, dropped) = count_matched(&sentences, words.len());

    store::write_json(&args.output, &sentences)?;
    log_stage(
        "group",
        &format!(
            "{} sentences, {} words matched, {} dropped -> {}",
            sentences.len(),
            matched,
            dropped,
            args.output.display()
        ),
    );
    Ok(())
}

fn cmd_speed_up(args: SpeedUpArgs) -> Result<()> {
    validate_output_path(&args.output, "json", &[args.sentences.as_path()])?;
    let factor = match args.factor {
        Some(f) => f,
        None => base_config()?.speed_factor,
    };
    let sentences = store::read_sentences(&args.sentences)?;
    let rescaled = rescale(&sentences, factor)?;

    store::write_json(&args.output, &rescaled)?;
    log_stage(
        "speed-up",
        &format!("{} sentences scaled by {} -> {}", rescaled.len(), factor, args.output.display()),
    );
    Ok(())
}

fn cmd_schedule(args: ScheduleArgs) -> Result<()> {
    validate_output_path(&args.output, "json", &[args.sentences.as_path()])?;
    let config = PipelineConfig::default();
    let sentences = store::read_sentences(&args.sentences)?;
    let frames = build_schedule(&sentences, schedule_options(&config, &args.layout));

    store::write_json(&args.output, &frames)?;
    log_stage("schedule", &format!("{} frames -> {}", frames.len(), args.output.display()));
    Ok(())
}

fn cmd_query(args: QueryArgs) -> Result<()> {
    let sentences = store::read_sentences(&args.sentences)?;
    let canonical = canonicalize_word(&args.word);

    let mut count = 0;
    for (i, sentence) in sentences.iter().enumerate() {
        if is_active(&canonical, &sentence.words, args.at_ms) {
            println!("[{}] {}", i, sentence.text);
            count += 1;
        }
    }
    if count == 0 {
        println!("'{}' is not highlighted at {}ms.", canonical, args.at_ms);
    }
    Ok(())
}

fn cmd_run(args: RunArgs) -> Result<()> {
    let start = Instant::now();
    let mut config = base_config()?;
    if let Some(factor) = args.factor {
        config.speed_factor = factor;
    }
    if let Some(placeholder) = args.placeholder.clone() {
        config.placeholder = placeholder;
    }
    let options = schedule_options(&config, &args.layout);
    config.wrap_width = options.wrap_width;
    config.color_offset = options.color_offset;
    let config = config.validate()?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    check_run_inputs(&args)?;

    let aligner: Box<dyn ForcedAligner> = match (&args.alignment, &args.aligner_cmd) {
        (Some(path), _) => Box::new(FileAligner::new(path)),
        (None, Some(template)) => Box::new(CommandAligner::new(
            template.clone(),
            args.out_dir.join("lyrics_aligned.txt"),
        )),
        (None, None) => return Err(anyhow!("either --alignment or --aligner-cmd is required")),
    };

    let mut builder = PipelineBuilder::new(config)
        .with_lyrics_source(Box::new(FileLyricsSource::new(&args.lyrics)))
        .with_aligner(aligner);
    if let Some(template) = &args.speed_cmd {
        builder = builder.with_speed_changer(Box::new(CommandSpeedChanger::new(template.clone())));
    }
    let pipeline = builder.build().map_err(|e| anyhow!(e))?;

    let request = TrackRequest {
        title: args.title.clone(),
        artist: args.artist.clone(),
        audio: args.audio.clone(),
        work_dir: args.out_dir.clone(),
    };
    eprintln!("Processing lyrics: {:?}", args.lyrics);
    let mut artifacts = pipeline.run(&request)?;
    artifacts.stats.elapsed_seconds = start.elapsed().as_secs_f64();

    artifacts.stats.log_phase("run");
    if let Some(path) = &args.stats {
        artifacts.stats.write_to_file(path)?;
    }

    eprintln!("\n{:=<60}", "");
    eprintln!("Run complete!");
    eprintln!("  Sentences: {}", artifacts.rescaled.len());
    eprintln!("  Words: {} ({:.1}% placed)", artifacts.flat_words.len(), artifacts.stats.match_rate());
    eprintln!("  Frames: {}", artifacts.frames.len());
    eprintln!("  Elapsed: {}", format_duration(start.elapsed()));
    eprintln!("{:=<60}", "");
    Ok(())
}

/// The run writes fixed file names into `--out-dir`; none of them may be an input.
fn check_run_inputs(args: &RunArgs) -> Result<()> {
    let mut inputs: Vec<&Path> = vec![args.lyrics.as_path(), args.audio.as_path()];
    if let Some(alignment) = &args.alignment {
        inputs.push(alignment.as_path());
    }
    for name in [
        store::FLAT_WORDS_FILE,
        store::SENTENCES_FILE,
        store::RESCALED_FILE,
        store::FRAMES_FILE,
    ] {
        validate_output_path(&args.out_dir.join(name), "json", &inputs)?;
    }
    validate_output_path(
        &args.out_dir.join(lyric_clip::pipeline::CLEANED_LYRICS_FILE),
        "txt",
        &inputs,
    )?;
    Ok(())
}
