//! Satellite imagery for visual review of flagged records.
//!
//! Never used by the validators themselves.

mod fetcher;

pub use fetcher::{ImageryFetcher, InspectionRecord, SatelliteTile};

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ImageryConfig {
    /// Tile endpoint; `/{zoom}/{x}/{y}/{format}` is appended
    pub base_url: String,
    /// Credentials for the tile service. Filled in by the caller, never
    /// read from the environment here.
    pub api_key: Option<String>,
    pub zoom: u8,
    pub format: String,
    pub tile_size: u32,
    pub style: String,
    /// Stop saving images after this many
    pub max_images: usize,
    pub output_dir: PathBuf,
    pub timeout_secs: u64,
}

impl Default for ImageryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.hereapi.com/v3/base/mc".to_string(),
            api_key: None,
            zoom: 18,
            format: "png".to_string(),
            tile_size: 512,
            style: "satellite.day".to_string(),
            max_images: 20,
            output_dir: PathBuf::from("imagenes_segmentos"),
            timeout_secs: 30,
        }
    }
}
