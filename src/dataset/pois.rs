//! POI table loading.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use geo::Coord;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::geometry::to_web_mercator;
use crate::models::{Poi, Side};

/// Column positions, resolved case-insensitively from the header row
struct Columns {
    id: usize,
    name: Option<usize>,
    percent: Option<usize>,
    link: usize,
    side: Option<usize>,
    lon: Option<usize>,
    lat: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| Error::MissingInput(format!("column '{}' not found", name)))
        };

        Ok(Self {
            id: required("POI_ID")?,
            name: find("POI_NAME"),
            percent: find("PERCFRREF"),
            link: required("LINK_ID")?,
            side: find("POI_ST_SD"),
            lon: find("LON").or_else(|| find("LONGITUDE")),
            lat: find("LAT").or_else(|| find("LATITUDE")),
        })
    }
}

fn field<'a>(record: &'a StringRecord, index: Option<usize>) -> Option<&'a str> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn number(record: &StringRecord, index: Option<usize>) -> Option<f64> {
    field(record, index)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Read POIs from any CSV source
pub fn load_pois_from<R: Read>(reader: R) -> Result<Vec<Poi>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = Columns::resolve(&headers)?;

    let mut pois = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        let Some(id) = field(&record, Some(columns.id)) else {
            warn!("Skipping POI row without POI_ID");
            continue;
        };

        let location = match (number(&record, columns.lon), number(&record, columns.lat)) {
            (Some(x), Some(y)) => Some(to_web_mercator(Coord { x, y })),
            _ => None,
        };

        pois.push(Poi {
            id: id.to_string(),
            name: field(&record, columns.name).unwrap_or_default().to_string(),
            percent_from_ref: number(&record, columns.percent),
            link_id: normalize_link_id(field(&record, Some(columns.link)).unwrap_or_default()),
            stored_side: field(&record, columns.side).map(Side::from_code),
            location,
        });
    }

    Ok(pois)
}

/// Link ids written by spreadsheet tools sometimes come back as `123.0`
pub fn normalize_link_id(raw: &str) -> String {
    let raw = raw.trim();
    match raw.strip_suffix(".0") {
        Some(int) if !int.is_empty() && int.chars().all(|c| c.is_ascii_digit()) => int.to_string(),
        _ => raw.to_string(),
    }
}

/// Load and concatenate POIs from every file. No POIs at all is fatal.
pub fn load_pois(paths: &[PathBuf]) -> Result<Vec<Poi>> {
    let mut pois = Vec::new();
    for path in paths {
        let loaded = load_file(path)?;
        info!("Loaded {} POIs from {}", loaded.len(), path.display());
        pois.extend(loaded);
    }

    if pois.is_empty() {
        return Err(Error::MissingInput("no POI records found".into()));
    }
    Ok(pois)
}

fn load_file(path: &Path) -> Result<Vec<Poi>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    load_pois_from(file)
}
