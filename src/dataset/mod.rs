//! Reading and writing the tabular and GeoJSON inputs.

pub mod clean;
pub mod output;
pub mod pois;
pub mod streets;

pub use clean::Cleaner;
pub use output::{write_fully_invalid, write_results};
pub use pois::{load_pois, load_pois_from};
pub use streets::{StreetFile, StreetLayer};

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Files under `dir` with the given extension, sorted by path.
///
/// `limit` keeps only the first N. Finding nothing is fatal.
pub fn discover_files(dir: &Path, extension: &str, limit: Option<usize>) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        warn!("Input directory not found: {}", dir.display());
        return Err(Error::MissingInput(format!(
            "directory {} does not exist",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if matches {
            files.push(path.to_path_buf());
        }
    }
    files.sort();

    if let Some(limit) = limit {
        files.truncate(limit);
    }
    if files.is_empty() {
        return Err(Error::MissingInput(format!(
            "no .{} files in {}",
            extension,
            dir.display()
        )));
    }

    info!("Found {} .{} file(s) in {}", files.len(), extension, dir.display());
    Ok(files)
}
