//! Result tables.

use std::path::Path;

use csv::Writer;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::PoiResult;

/// Write one row per POI
pub fn write_results(path: &Path, results: &[PoiResult]) -> Result<()> {
    write_rows(path, results.iter())?;
    info!("Wrote {} POI results to {}", results.len(), path.display());
    Ok(())
}

/// Write only the POIs that failed both checks. Returns how many.
pub fn write_fully_invalid(path: &Path, results: &[PoiResult]) -> Result<usize> {
    let invalid: Vec<&PoiResult> = results.iter().filter(|r| r.invalid).collect();
    write_rows(path, invalid.iter().copied())?;
    info!("Wrote {} fully invalid POIs to {}", invalid.len(), path.display());
    Ok(invalid.len())
}

fn write_rows<'a>(path: &Path, rows: impl Iterator<Item = &'a PoiResult>) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    let mut wrote_any = false;
    for row in rows {
        writer.serialize(row)?;
        wrote_any = true;
    }
    if !wrote_any {
        writer.write_record(HEADER)?;
    }
    writer.flush().map_err(|e| Error::io(path, e))?;
    Ok(())
}

/// Column order of [`PoiResult`], for empty tables
const HEADER: [&str; 8] = [
    "POI_ID",
    "POI_NAME",
    "DECLARED_SIDE",
    "GEOMETRIC_SIDE",
    "EVAL_SIDE",
    "EVAL_MULTIDIGIT",
    "INVALID",
    "NEEDS_SIDE_UPDATE",
];
