use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use serde::Serialize;

use block_sequence::config::Config;
use block_sequence::detection::load_raw_detections;
use block_sequence::rect::BoxRect;
use block_sequence::render::write_overlay;
use block_sequence::sequence::build_sequence;

/// Rebuild a block program from detector output.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON array of detections: [{"bbox": {...}, "categories": [{"label", "score"}]}]
    #[arg(long)]
    detections: PathBuf,

    /// TOML config; built-in defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Photo the detections were taken from, for the overlay
    #[arg(long, requires = "output")]
    image: Option<PathBuf>,

    /// Where to write the overlay image
    #[arg(long, requires = "image")]
    output: Option<PathBuf>,

    /// Print the sequence as JSON instead of one label per line
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct SequenceEntry<'a> {
    index: usize,
    label: &'a str,
    bbox: BoxRect,
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    let raw = load_raw_detections(&cli.detections)
        .with_context(|| format!("loading detections {}", cli.detections.display()))?;
    let detections = config.detector.apply(raw);
    let sequence = build_sequence(&detections);

    if sequence.is_empty() {
        log::info!("no run block found among {} detections", detections.len());
    } else {
        log::info!("sequence of {} blocks ({:?})", sequence.len(), sequence.stage());
    }

    if cli.json {
        let entries: Vec<SequenceEntry<'_>> = sequence
            .indices()
            .iter()
            .zip(sequence.iter())
            .map(|(&index, d)| SequenceEntry {
                index,
                label: &d.label,
                bbox: d.bbox,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for label in sequence.labels() {
            println!("{label}");
        }
    }

    // clap's `requires` guarantees both or neither.
    if let (Some(image_path), Some(output_path)) = (&cli.image, &cli.output) {
        write_overlay(image_path, output_path, &detections, &sequence, &config.render)
            .with_context(|| format!("rendering overlay of {}", image_path.display()))?;
        log::info!("wrote overlay to {}", output_path.display());
    }

    Ok(())
}
