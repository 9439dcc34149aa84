//! Cell cleanup for hand-edited POI tables.

use std::path::Path;

use csv::{ReaderBuilder, Writer};
use regex::Regex;
use tracing::info;

use crate::error::{Error, Result};

/// Columns removed from cleaned tables
const DROPPED_COLUMNS: &[&str] = &["ACC_TYPE"];

pub struct Cleaner {
    punctuation: Regex,
}

impl Cleaner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            punctuation: Regex::new(r"[^\w\s]")?,
        })
    }

    /// Normalize one cell.
    ///
    /// Blank cells become `None`. Numbers pass through unchanged; text is
    /// folded to ASCII, stripped of quotes and punctuation, and has spaces
    /// replaced with `_`.
    pub fn clean_cell(&self, cell: &str) -> Option<String> {
        let cell: String = cell
            .chars()
            .map(|c| match c {
                '\u{a0}' | '\n' | '\r' | '\t' => ' ',
                other => other,
            })
            .collect();
        let cell = cell.trim();
        if cell.is_empty() {
            return None;
        }
        if cell.parse::<f64>().is_ok() {
            return Some(cell.to_string());
        }

        let mut ascii = String::with_capacity(cell.len());
        for c in cell.chars() {
            if c.is_ascii() {
                ascii.push(c);
            } else if let Some(base) = fold_accent(c) {
                ascii.push(base);
            }
        }

        let unquoted = ascii.replace(['"', '\''], "");
        let stripped = self.punctuation.replace_all(&unquoted, "");
        Some(stripped.replace(' ', "_"))
    }

    /// Clean every cell of `input` into `output`, dropping unwanted
    /// columns. Returns the number of data rows written.
    pub fn clean_csv(&self, input: &Path, output: &Path) -> Result<usize> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(input)?;
        let headers = reader.headers()?.clone();

        let keep: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !DROPPED_COLUMNS.iter().any(|d| h.trim() == *d))
            .map(|(i, _)| i)
            .collect();

        let mut writer = Writer::from_path(output)?;
        writer.write_record(keep.iter().map(|&i| &headers[i]))?;

        let mut rows = 0;
        for result in reader.records() {
            let record = result?;
            let cleaned: Vec<String> = keep
                .iter()
                .map(|&i| {
                    record
                        .get(i)
                        .and_then(|cell| self.clean_cell(cell))
                        .unwrap_or_default()
                })
                .collect();
            writer.write_record(&cleaned)?;
            rows += 1;
        }
        writer.flush().map_err(|e| Error::io(output, e))?;

        info!("Cleaned {} rows from {} into {}", rows, input.display(), output.display());
        Ok(rows)
    }
}

/// ASCII base letter of common Latin accented characters
fn fold_accent(c: char) -> Option<char> {
    let base = match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ç' => 'c',
        'Ç' => 'C',
        _ => return None,
    };
    Some(base)
}
