//! Satellite imagery for flagged records.
//!
//! Runs the validation pass, then fetches one tile per corrected street
//! segment or relink POI so the result can be checked by eye.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use geo::Coord;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use curbside::dataset::{discover_files, load_pois, StreetLayer};
use curbside::geometry::to_geographic;
use curbside::imagery::ImageryFetcher;
use curbside::models::{Poi, Segment, SideVerdict};
use curbside::pipeline::{link_index, street_centroid};
use curbside::review::AcceptAll;
use curbside::{Config, Profile, ValidationOutcome, Validator};

/// Which records to photograph
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    /// Street segments whose MULTIDIGIT flag was corrected
    Segments,
    /// POIs whose declared and geometric sides disagree
    Relink,
}

#[derive(Parser, Debug)]
#[command(name = "inspect")]
#[command(about = "Fetch satellite tiles for flagged segments and POIs")]
struct Args {
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

    /// Records to fetch imagery for
    #[arg(long, value_enum, default_value_t = Target::Segments)]
    target: Target,

    /// Tile service API key
    #[arg(long, env = "HERE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Maximum number of tiles to fetch
    #[arg(long)]
    max_images: Option<usize>,

    /// Directory for tiles and sidecars
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Curbside imagery inspection");

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::for_profile(args.profile),
    };
    if let Some(key) = &args.api_key {
        config.imagery.api_key = Some(key.clone());
    }
    if let Some(max) = args.max_images {
        config.imagery.max_images = max;
    }
    if let Some(dir) = &args.output {
        config.imagery.output_dir = dir.clone();
    }

    let fetcher =
        ImageryFetcher::new(config.imagery.clone()).context("Failed to set up imagery client")?;

    let poi_files = discover_files(&args.pois, "csv", args.limit)
        .context("Failed to find POI tables")?;
    let pois = load_pois(&poi_files).context("Failed to load POIs")?;
    let mut streets = load_layer(&args.streets, args.limit)?;
    let naming = match &args.naming {
        Some(dir) => Some(load_layer(dir, args.limit)?),
        None => None,
    };

    let outcome = Validator::new(&config).run(
        &pois,
        &mut streets.segments,
        naming.as_ref().map(|layer| layer.segments.as_slice()),
        &mut AcceptAll,
    );

    let side_segments = naming.as_ref().unwrap_or(&streets).segments.as_slice();
    let mut targets = match args.target {
        Target::Segments => segment_targets(&outcome, &streets.segments),
        Target::Relink => relink_targets(&outcome, &pois, side_segments),
    };

    if targets.is_empty() {
        info!("Nothing to inspect");
        return Ok(());
    }
    let cap = fetcher.config().max_images;
    if targets.len() > cap {
        info!("Limiting imagery to {} of {} records", cap, targets.len());
        targets.truncate(cap);
    }

    let pb = ProgressBar::new(targets.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut saved = 0;
    for (label, at) in &targets {
        pb.set_message(label.clone());
        // Coordinates are planar meters; the tile service wants lat/lon.
        let lon_lat = to_geographic(*at);
        if fetcher.inspect(label, lon_lat.y, lon_lat.x).await.is_some() {
            saved += 1;
        }
        pb.inc(1);
    }
    pb.finish_with_message("Imagery done");

    info!(
        "Saved {} of {} tiles to {}",
        saved,
        targets.len(),
        fetcher.config().output_dir.display()
    );
    Ok(())
}

fn load_layer(dir: &Path, limit: Option<usize>) -> Result<StreetLayer> {
    let files = discover_files(dir, "geojson", limit)
        .with_context(|| format!("Failed to find streets in {}", dir.display()))?;
    StreetLayer::load(&files).with_context(|| format!("Failed to load streets in {}", dir.display()))
}

/// Centroids of the corrected segments, labelled by link id
fn segment_targets(outcome: &ValidationOutcome, segments: &[Segment]) -> Vec<(String, Coord<f64>)> {
    outcome
        .inference
        .updated_segments
        .iter()
        .filter_map(|&i| {
            let segment = segments.get(i)?;
            let at = street_centroid(segment)?;
            Some((format!("segment_{}", segment.link_id), at))
        })
        .collect()
}

/// Locations of relink POIs, falling back to their street centroid
fn relink_targets(
    outcome: &ValidationOutcome,
    pois: &[Poi],
    segments: &[Segment],
) -> Vec<(String, Coord<f64>)> {
    let links = link_index(segments);
    pois.iter()
        .zip(&outcome.results)
        .filter(|(_, result)| result.eval_side == SideVerdict::Relink)
        .filter_map(|(poi, _)| {
            let at = poi.location.or_else(|| {
                links
                    .get(poi.link_id.as_str())
                    .and_then(|&i| street_centroid(&segments[i]))
            });
            if at.is_none() {
                warn!("POI {} has no location, skipping", poi.id);
            }
            Some((format!("poi_{}", poi.id), at?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use curbside::models::{MultiDigitVerdict, PoiResult, Side};
    use curbside::multidigit::InferenceReport;
    use geo::{coord, line_string};

    fn result(id: &str, verdict: SideVerdict) -> PoiResult {
        PoiResult {
            poi_id: id.to_string(),
            poi_name: String::new(),
            declared_side: Side::Left,
            geometric_side: Side::Right,
            eval_side: verdict,
            eval_multidigit: MultiDigitVerdict::Ok,
            invalid: false,
            needs_side_update: false,
        }
    }

    #[test]
    fn test_relink_targets_fall_back_to_street() {
        let segments = vec![
            Segment::new("7", Some(line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)])),
            Segment::new("7", Some(line_string![(x: 100.0, y: 0.0), (x: 110.0, y: 0.0)])),
        ];
        let mut located = Poi::new("a", "7");
        located.location = Some(coord! { x: 1.0, y: 2.0 });
        let pois = vec![located, Poi::new("b", "7"), Poi::new("c", "7"), Poi::new("d", "99")];
        let outcome = ValidationOutcome {
            results: vec![
                result("a", SideVerdict::Relink),
                result("b", SideVerdict::Relink),
                result("c", SideVerdict::Ok),
                result("d", SideVerdict::Relink),
            ],
            inference: InferenceReport::default(),
        };

        let targets = relink_targets(&outcome, &pois, &segments);
        // First street with the link wins; unlocatable POIs are dropped
        assert_eq!(
            targets,
            vec![
                ("poi_a".to_string(), coord! { x: 1.0, y: 2.0 }),
                ("poi_b".to_string(), coord! { x: 5.0, y: 0.0 }),
            ]
        );
    }
}
