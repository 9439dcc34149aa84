//! Street GeoJSON layers.
//!
//! Geometry arrives in lon/lat and is projected to Web Mercator on load.
//! The original features are kept untouched so write-back only changes the
//! flag properties.

use std::fs;
use std::path::{Path, PathBuf};

use geojson::{Feature, FeatureCollection, GeoJson};
use serde_json::Value;
use tracing::{debug, info};

use super::pois::normalize_link_id;
use crate::error::{Error, Result};
use crate::geometry::WebMercator;
use crate::models::{MultiDigit, Segment, TravelDirection};

pub const LINK_ID: &str = "link_id";
pub const MULTIDIGIT: &str = "MULTIDIGIT";
pub const DIR_TRAVEL: &str = "DIR_TRAVEL";
pub const EXCEPTION_LEGIT: &str = "EXCEPTION_LEGIT";

/// One source file and where its segments start in the layer
#[derive(Debug, Clone)]
pub struct StreetFile {
    pub path: PathBuf,
    pub collection: FeatureCollection,
    pub offset: usize,
}

impl StreetFile {
    pub fn len(&self) -> usize {
        self.collection.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.features.is_empty()
    }

    fn contains(&self, index: usize) -> bool {
        (self.offset..self.offset + self.len()).contains(&index)
    }
}

/// All street files of a run, flattened into one segment list
#[derive(Debug, Clone, Default)]
pub struct StreetLayer {
    pub files: Vec<StreetFile>,
    pub segments: Vec<Segment>,
}

fn property_string(feature: &Feature, key: &str) -> String {
    match feature.property(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Build a planar segment from a feature. Anything that is not a
/// LineString keeps `geometry = None`.
pub fn segment_from_feature(feature: &Feature) -> Segment {
    let geometry = feature
        .geometry
        .clone()
        .and_then(|g| geo::Geometry::<f64>::try_from(g).ok())
        .and_then(|g| match g {
            geo::Geometry::LineString(line) => Some(line.to_web_mercator()),
            _ => None,
        });

    let link_id = normalize_link_id(&property_string(feature, LINK_ID));
    if geometry.is_none() {
        debug!("Street {} has no usable line geometry", link_id);
    }

    Segment::new(link_id, geometry)
        .with_multidigit(property_string(feature, MULTIDIGIT))
        .with_direction(TravelDirection::from_code(&property_string(feature, DIR_TRAVEL)))
}

pub fn parse_collection(content: &str) -> Result<FeatureCollection> {
    let geojson: GeoJson = content.parse()?;
    Ok(FeatureCollection::try_from(geojson)?)
}

impl StreetLayer {
    /// Load and concatenate every file. An empty layer is fatal.
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        Self::load_with(paths, |_| {})
    }

    /// [`load`](Self::load), calling `on_loaded` after each file
    pub fn load_with<F>(paths: &[PathBuf], mut on_loaded: F) -> Result<Self>
    where
        F: FnMut(&Path),
    {
        let mut layer = StreetLayer::default();
        for path in paths {
            let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
            let collection = parse_collection(&content)?;
            info!(
                "Loaded {} street features from {}",
                collection.features.len(),
                path.display()
            );
            layer.push(path.clone(), collection);
            on_loaded(path);
        }

        if layer.segments.is_empty() {
            return Err(Error::MissingInput("no street features found".into()));
        }
        Ok(layer)
    }

    pub fn push(&mut self, path: PathBuf, collection: FeatureCollection) {
        let offset = self.segments.len();
        self.segments
            .extend(collection.features.iter().map(segment_from_feature));
        self.files.push(StreetFile {
            path,
            collection,
            offset,
        });
    }

    /// Copy current flags into the features and write every file that
    /// contains a changed segment to `out_dir/<prefix><name>`.
    ///
    /// Nothing is written when `changed` is empty.
    pub fn write_updated(
        &mut self,
        changed: &[usize],
        exceptions: &[MultiDigit],
        out_dir: &Path,
        prefix: &str,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        if changed.is_empty() {
            return Ok(written);
        }

        for file in &mut self.files {
            if !changed.iter().any(|&i| file.contains(i)) {
                continue;
            }

            for (i, feature) in file.collection.features.iter_mut().enumerate() {
                let index = file.offset + i;
                let segment = &self.segments[index];
                feature.set_property(MULTIDIGIT, segment.multidigit_code.clone());
                let exception = exceptions.get(index).copied().unwrap_or(MultiDigit::No);
                feature.set_property(EXCEPTION_LEGIT, exception.as_str());
            }

            let name = file
                .path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("streets.geojson");
            let out = out_dir.join(format!("{}{}", prefix, name));
            fs::write(&out, file.collection.to_string()).map_err(|e| Error::io(&out, e))?;
            info!("Wrote updated streets to {}", out.display());
            written.push(out);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAV: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"link_id": 702604079, "MULTIDIGIT": "N", "DIR_TRAVEL": "T"},
                "geometry": {"type": "LineString", "coordinates": [[-99.1332, 19.4326], [-99.1330, 19.4326]]}
            },
            {
                "type": "Feature",
                "properties": {"link_id": "702604080", "MULTIDIGIT": null},
                "geometry": {"type": "Point", "coordinates": [-99.1, 19.4]}
            },
            {
                "type": "Feature",
                "properties": {"link_id": "702604081", "MULTIDIGIT": "Y", "DIR_TRAVEL": "B"},
                "geometry": null
            }
        ]
    }"#;

    fn layer_from(content: &str, path: &str) -> StreetLayer {
        let mut layer = StreetLayer::default();
        layer.push(PathBuf::from(path), parse_collection(content).unwrap());
        layer
    }

    #[test]
    fn test_segments_from_features() {
        let layer = layer_from(NAV, "STREETS_NAV_1.geojson");
        assert_eq!(layer.segments.len(), 3);

        let first = &layer.segments[0];
        assert_eq!(first.link_id, "702604079");
        assert_eq!(first.multidigit_code, "N");
        assert_eq!(first.travel_direction, TravelDirection::Backward);
        // ~21 m of longitude at this latitude, in Mercator units
        let length = first.length();
        assert!(length > 20.0 && length < 24.0, "length {length}");

        assert!(layer.segments[1].geometry.is_none());
        assert_eq!(layer.segments[1].multidigit_code, "");
        assert!(layer.segments[2].geometry.is_none());
        assert_eq!(layer.segments[2].multidigit(), MultiDigit::Yes);
    }

    #[test]
    fn test_write_updated_only_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let mut layer = layer_from(NAV, "STREETS_NAV_1.geojson");

        let written = layer
            .write_updated(&[], &[], dir.path(), "ACTUALIZADO_")
            .unwrap();
        assert!(written.is_empty());

        layer.segments[0].multidigit_code = "YES".to_string();
        let exceptions = vec![MultiDigit::No, MultiDigit::No, MultiDigit::Yes];
        let written = layer
            .write_updated(&[0], &exceptions, dir.path(), "ACTUALIZADO_")
            .unwrap();
        assert_eq!(written, vec![dir.path().join("ACTUALIZADO_STREETS_NAV_1.geojson")]);

        let reread = parse_collection(&fs::read_to_string(&written[0]).unwrap()).unwrap();
        let first = &reread.features[0];
        assert_eq!(first.property(MULTIDIGIT).unwrap(), "YES");
        assert_eq!(first.property(EXCEPTION_LEGIT).unwrap(), "NO");
        assert_eq!(reread.features[2].property(EXCEPTION_LEGIT).unwrap(), "YES");
        // Geometry is written back in lon/lat
        assert_eq!(reread.features[0].geometry, layer.files[0].collection.features[0].geometry);
    }

    #[test]
    fn test_load_requires_features() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.geojson");
        fs::write(&path, r#"{"type": "FeatureCollection", "features": []}"#).unwrap();
        let err = StreetLayer::load(&[path]).unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn test_multiple_files_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.geojson");
        let b = dir.path().join("b.geojson");
        fs::write(&a, NAV).unwrap();
        fs::write(&b, NAV).unwrap();

        let mut layer = StreetLayer::load(&[a, b]).unwrap();
        assert_eq!(layer.segments.len(), 6);
        assert_eq!(layer.files[1].offset, 3);

        let written = layer
            .write_updated(&[4], &[], dir.path(), "ACTUALIZADO_")
            .unwrap();
        assert_eq!(written, vec![dir.path().join("ACTUALIZADO_b.geojson")]);
    }

    #[test]
    fn test_load_with_reports_each_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.geojson");
        let b = dir.path().join("b.geojson");
        fs::write(&a, NAV).unwrap();
        fs::write(&b, NAV).unwrap();

        let mut seen = Vec::new();
        let layer = StreetLayer::load_with(&[a.clone(), b.clone()], |path| {
            seen.push(path.to_path_buf())
        })
        .unwrap();
        assert_eq!(seen, vec![a, b]);
        assert_eq!(layer.files.len(), 2);
    }
}
