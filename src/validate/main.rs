//! Batch validation of POI sides and multiply-digitized flags.
//!
//! Loads POI tables and street layers, classifies every POI, re-derives
//! street flags from geometry, and writes the result tables plus updated
//! street files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use curbside::dataset::{
    discover_files, load_pois, write_fully_invalid, write_results, Cleaner, StreetLayer,
};
use curbside::review::{AcceptAll, PromptReviewer, Reviewer};
use curbside::{Config, Profile, Validator};

const RESULTS_FILE: &str = "resultado_pois.csv";
const INVALID_FILE: &str = "pois_invalidos_completos.csv";
const UPDATED_PREFIX: &str = "ACTUALIZADO_";
const CLEAN_SUFFIX: &str = "_CLEAN";

#[derive(Parser, Debug)]
#[command(name = "validate")]
#[command(about = "Validate POI sides and multiply-digitized street flags")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full validation pass
    Run(RunArgs),
    /// Normalize text cells of POI tables
    Clean(CleanArgs),
}

#[derive(ClapArgs, Debug)]
struct RunArgs {
    /// Directory with POI CSV files
    #[arg(long, default_value = "POIs")]
    pois: PathBuf,

    /// Directory with navigation street GeoJSON files
    #[arg(long, default_value = "STREETS_NAV")]
    streets: PathBuf,

    /// Directory with naming street GeoJSON files used for POI sides
    #[arg(long)]
    naming: Option<PathBuf>,

    /// Only read the first N files of each directory
    #[arg(long)]
    limit: Option<usize>,

    /// TOML configuration file (overrides --profile)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Named parameter profile
    #[arg(long, value_enum, default_value_t = Profile::Standard)]
    profile: Profile,

    /// Directory for result tables and updated streets
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Confirm each flag correction on the terminal
    #[arg(long)]
    review: bool,
}

#[derive(ClapArgs, Debug)]
struct CleanArgs {
    /// Directory with POI CSV files
    #[arg(long, default_value = "POIs")]
    pois: PathBuf,

    /// Directory for cleaned tables
    #[arg(short, long, default_value = "POIs_CLEAN")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Run(run_args) => run(run_args),
        Command::Clean(clean_args) => clean(clean_args),
    }
}

fn run(args: RunArgs) -> Result<()> {
    info!("Curbside validation");

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::for_profile(args.profile),
    };

    let poi_files = discover_files(&args.pois, "csv", args.limit)
        .context("Failed to find POI tables")?;
    let pois = load_pois(&poi_files).context("Failed to load POIs")?;
    info!("Loaded {} POIs from {} files", pois.len(), poi_files.len());

    let mut streets = load_layer(&args.streets, args.limit).context("Failed to load streets")?;
    let naming = match &args.naming {
        Some(dir) => Some(load_layer(dir, args.limit).context("Failed to load naming streets")?),
        None => None,
    };

    let mut reviewer: Box<dyn Reviewer> = if args.review {
        Box::new(PromptReviewer::new(io::stdin().lock(), io::stderr()))
    } else {
        Box::new(AcceptAll)
    };

    let validator = Validator::new(&config);
    let outcome = validator.run(
        &pois,
        &mut streets.segments,
        naming.as_ref().map(|layer| layer.segments.as_slice()),
        reviewer.as_mut(),
    );

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    let results_path = args.output.join(RESULTS_FILE);
    write_results(&results_path, &outcome.results).context("Failed to write results")?;
    info!("Wrote {} results to {}", outcome.results.len(), results_path.display());

    let invalid_path = args.output.join(INVALID_FILE);
    let invalid = write_fully_invalid(&invalid_path, &outcome.results)
        .context("Failed to write invalid POIs")?;
    info!("Wrote {} fully invalid POIs to {}", invalid, invalid_path.display());

    if !outcome.inference.rejected.is_empty() {
        info!("{} corrections rejected on review", outcome.inference.rejected.len());
    }

    if outcome.inference.has_changes() {
        let exceptions = outcome.inference.exception_flags();
        let written = streets
            .write_updated(
                &outcome.inference.updated_segments,
                &exceptions,
                &args.output,
                UPDATED_PREFIX,
            )
            .context("Failed to write updated streets")?;
        info!(
            "Corrected {} segments across {} files",
            outcome.inference.updated_segments.len(),
            written.len()
        );
    } else {
        info!("No MULTIDIGIT corrections needed");
    }

    Ok(())
}

/// Read every GeoJSON file under `dir` into one layer
fn load_layer(dir: &Path, limit: Option<usize>) -> Result<StreetLayer> {
    let files = discover_files(dir, "geojson", limit)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let layer = StreetLayer::load_with(&files, |path| {
        pb.set_message(
            path.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string(),
        );
        pb.inc(1);
    })
    .with_context(|| format!("Failed to load streets in {}", dir.display()))?;
    pb.finish_with_message("Streets loaded");

    info!(
        "Loaded {} segments from {} files in {}",
        layer.segments.len(),
        layer.files.len(),
        dir.display()
    );
    Ok(layer)
}

fn clean(args: CleanArgs) -> Result<()> {
    let cleaner = Cleaner::new()?;
    let files = discover_files(&args.pois, "csv", None).context("Failed to find POI tables")?;

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    let mut cleaned = 0;
    for input in files {
        let Some(stem) = input.file_stem().and_then(|s| s.to_str()) else {
            warn!("Skipping file with unreadable name: {}", input.display());
            continue;
        };
        if stem.ends_with(CLEAN_SUFFIX) {
            continue;
        }

        let output = args.output.join(format!("{}{}.csv", stem, CLEAN_SUFFIX));
        cleaner
            .clean_csv(&input, &output)
            .with_context(|| format!("Failed to clean {}", input.display()))?;
        cleaned += 1;
    }

    info!("Cleaned {} tables", cleaned);
    Ok(())
}
