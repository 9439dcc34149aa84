//! Satellite tile fetcher.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use super::ImageryConfig;
use crate::error::{Error, Result};
use crate::geometry::tiles::{TileBounds, TileId};

/// A downloaded tile and where it sits on the globe
#[derive(Debug, Clone)]
pub struct SatelliteTile {
    pub tile: TileId,
    pub bounds: TileBounds,
    pub bytes: Vec<u8>,
}

/// Sidecar written next to each saved tile
#[derive(Debug, Clone, Serialize)]
pub struct InspectionRecord {
    pub label: String,
    pub lat: f64,
    pub lon: f64,
    pub tile: TileId,
    pub bounds: TileBounds,
    /// Where the record sits inside the image
    pub marker_pixel: (i64, i64),
    pub tile_wkt: String,
    pub fetched_at: DateTime<Utc>,
}

pub struct ImageryFetcher {
    client: Client,
    config: ImageryConfig,
    api_key: String,
}

impl ImageryFetcher {
    pub fn new(config: ImageryConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("imagery api_key is not set".into()))?;

        let client = Client::builder()
            .user_agent("curbside/0.1 (map validation)")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    pub fn config(&self) -> &ImageryConfig {
        &self.config
    }

    /// Tile request URL for `tile`
    pub fn tile_url(&self, tile: TileId) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| Error::Config(format!("invalid imagery base_url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config("imagery base_url cannot be a base".into()))?
            .pop_if_empty()
            .push(&tile.zoom.to_string())
            .push(&tile.x.to_string())
            .push(&tile.y.to_string())
            .push(&self.config.format);
        url.query_pairs_mut()
            .append_pair("apiKey", &self.api_key)
            .append_pair("style", &self.config.style)
            .append_pair("size", &self.config.tile_size.to_string());
        Ok(url)
    }

    /// Download the tile containing `lat`/`lon`. One attempt, no retry.
    pub async fn fetch(&self, lat: f64, lon: f64) -> Result<SatelliteTile> {
        let tile = TileId::from_lat_lon(lat, lon, self.config.zoom);
        let url = self.tile_url(tile)?;
        debug!("Fetching tile {}/{}/{}", tile.zoom, tile.x, tile.y);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Fetch(format!(
                "tile {}/{}/{} returned {}",
                tile.zoom,
                tile.x,
                tile.y,
                response.status()
            )));
        }
        let bytes = response.bytes().await?.to_vec();

        Ok(SatelliteTile {
            tile,
            bounds: tile.bounds(),
            bytes,
        })
    }

    /// Fetch and save the tile for one record.
    ///
    /// Failures are logged and reported as `None`; they never abort the
    /// caller's loop.
    pub async fn inspect(&self, label: &str, lat: f64, lon: f64) -> Option<PathBuf> {
        let tile = match self.fetch(lat, lon).await {
            Ok(tile) => tile,
            Err(e) => {
                warn!("Skipping imagery for {}: {}", label, e);
                return None;
            }
        };

        match save_tile(&self.config, label, lat, lon, &tile) {
            Ok(path) => {
                info!("Saved imagery for {} to {}", label, path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Could not save imagery for {}: {}", label, e);
                None
            }
        }
    }
}

/// Write the tile image and its JSON sidecar into `config.output_dir`
pub fn save_tile(
    config: &ImageryConfig,
    label: &str,
    lat: f64,
    lon: f64,
    tile: &SatelliteTile,
) -> Result<PathBuf> {
    let dir: &Path = &config.output_dir;
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let image_path = dir.join(format!("{}.{}", label, config.format));
    fs::write(&image_path, &tile.bytes).map_err(|e| Error::io(&image_path, e))?;

    let record = InspectionRecord {
        label: label.to_string(),
        lat,
        lon,
        tile: tile.tile,
        bounds: tile.bounds,
        marker_pixel: tile.bounds.pixel(lat, lon, config.tile_size),
        tile_wkt: tile.bounds.to_wkt(),
        fetched_at: Utc::now(),
    };
    let sidecar = dir.join(format!("{}.json", label));
    let json = serde_json::to_string_pretty(&record)?;
    fs::write(&sidecar, json).map_err(|e| Error::io(&sidecar, e))?;

    Ok(image_path)
}
