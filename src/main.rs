use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use style_composer::{Config, Pipeline};

#[derive(Parser, Debug)]
#[command(name = "style-composer")]
#[command(about = "Compose new pieces from phrases of existing WAV recordings", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Directory of input WAV files
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Directory for generated pieces
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Seed for reproducible pieces
    #[arg(long)]
    seed: Option<u64>,

    /// Number of pieces to generate
    #[arg(long)]
    pieces: Option<usize>,

    /// Phrases per piece
    #[arg(long)]
    phrases: Option<usize>,

    /// Phrase length in seconds
    #[arg(long)]
    segment_length: Option<f64>,

    /// Also write a pitch-shifted, stretched variant of every input file
    #[arg(long)]
    variants: bool,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(input) = args.input {
        config.audio.input_dir = input;
    }
    if let Some(output) = args.output {
        config.audio.output_dir = output;
    }
    if let Some(seed) = args.seed {
        config.composition.seed = Some(seed);
    }
    if let Some(pieces) = args.pieces {
        config.composition.num_pieces = pieces;
    }
    if let Some(phrases) = args.phrases {
        config.composition.num_phrases = phrases;
    }
    if let Some(segment_length) = args.segment_length {
        config.composition.segment_length = segment_length;
    }

    log::info!("Starting WAV-style composer");
    let pipeline = Pipeline::new(config).context("invalid configuration")?;
    let report = pipeline.run().context("composition failed")?;

    if !report.tracks.is_empty() {
        println!("\nGenerated Tracks Table:");
        print!("{}", report.track_table());
    }

    if args.variants {
        let variants = pipeline.generate_variants().context("variant generation failed")?;
        log::info!("Generated {} variant(s)", variants.len());
    }
    Ok(())
}
