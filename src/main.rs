//! card-reader - read a student ID card photo from the command line
//!
//! Prints the extracted record and the visualization artifact paths as JSON.

use anyhow::{bail, Context, Result};
use card_reader::config::{self, AppConfig};
use card_reader::{unique_base_name, CardProcessor, IdPrecedence, TesseractRecognizer};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Student card reader
#[derive(Parser, Debug)]
#[command(name = "card-reader")]
#[command(about = "Extract student information from a photographed ID card")]
struct Args {
    /// Card image (JPEG or PNG)
    image: PathBuf,

    /// Configuration file (defaults to config.toml in the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory that receives the visualization folder
    #[arg(long)]
    media_root: Option<PathBuf>,

    /// Skip writing visualization images
    #[arg(long)]
    no_visualize: bool,

    /// Let a stray standalone number win over a labeled student ID
    #[arg(long)]
    legacy_id_order: bool,

    /// Prefix for visualization file names
    #[arg(long, default_value = "card")]
    name_prefix: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::load_or_default(),
    };
    apply_overrides(&mut config, &args);

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if TesseractRecognizer::version().is_err() {
        warn!("tesseract executable not found; every OCR pass will come back empty");
    }

    let processor = CardProcessor::with_tesseract(&config)?;

    let Some(card) = processor.process(&args.image) else {
        bail!("Failed to load card image {:?}", args.image);
    };

    let visualizations = if config.visualization.enabled {
        let base_name = unique_base_name(&args.name_prefix);
        match card.visualize(processor.visualizer(), &base_name) {
            Ok(bundle) => Some(bundle.paths),
            Err(e) => {
                warn!("Visualization failed, record is unaffected: {}", e);
                None
            }
        }
    } else {
        None
    };

    let output = serde_json::json!({
        "record": card.record,
        "visualizations": visualizations,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to serialize record")?
    );

    if card.record.is_empty() {
        bail!("No card fields recognized; retry with a clearer photo");
    }

    info!("Done");
    Ok(())
}

fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(root) = &args.media_root {
        config.visualization.media_root = Some(root.clone());
    }
    if args.no_visualize {
        config.visualization.enabled = false;
    }
    if args.legacy_id_order {
        config.extraction.id_precedence = IdPrecedence::Positional;
    }
}
