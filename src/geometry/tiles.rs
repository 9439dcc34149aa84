//! Slippy-map tile math for satellite imagery lookups.

use serde::Serialize;

use super::projection::MAX_LATITUDE;

/// A tile address at a zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileId {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

/// Geographic bounds of a tile: north-west corner and south-east corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TileBounds {
    pub north: f64,
    pub west: f64,
    pub south: f64,
    pub east: f64,
}

impl TileId {
    /// Tile containing a lat/lon at `zoom`. Latitude is clamped to the
    /// Mercator limit.
    pub fn from_lat_lon(lat: f64, lon: f64, zoom: u8) -> Self {
        let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let lat_rad = lat.to_radians();
        let n = 2f64.powi(zoom as i32);
        let max = n as u32 - 1;

        let x = ((lon + 180.0) / 360.0 * n).floor();
        let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0
            * n)
            .floor();

        Self {
            x: (x.max(0.0) as u32).min(max),
            y: (y.max(0.0) as u32).min(max),
            zoom,
        }
    }

    /// North-west corner of the tile as (lat, lon)
    pub fn north_west(&self) -> (f64, f64) {
        corner_lat_lon(self.x, self.y, self.zoom)
    }

    pub fn bounds(&self) -> TileBounds {
        let (north, west) = corner_lat_lon(self.x, self.y, self.zoom);
        let (south, east) = corner_lat_lon(self.x + 1, self.y + 1, self.zoom);
        TileBounds {
            north,
            west,
            south,
            east,
        }
    }
}

/// Lat/lon of the north-west corner of tile column `x`, row `y`
fn corner_lat_lon(x: u32, y: u32, zoom: u8) -> (f64, f64) {
    let n = 2f64.powi(zoom as i32);
    let lon = x as f64 / n * 360.0 - 180.0;
    let lat = (std::f64::consts::PI * (1.0 - 2.0 * y as f64 / n))
        .sinh()
        .atan()
        .to_degrees();
    (lat, lon)
}

impl TileBounds {
    /// Pixel position of a lat/lon inside a square tile of `size` pixels.
    ///
    /// Linear interpolation between the corners, as tile viewers do.
    pub fn pixel(&self, lat: f64, lon: f64, size: u32) -> (i64, i64) {
        let x_rel = (lon - self.west) / (self.east - self.west);
        let y_rel = (self.north - lat) / (self.north - self.south);
        (
            (x_rel * size as f64) as i64,
            (y_rel * size as f64) as i64,
        )
    }

    /// Closed polygon WKT of the tile footprint (lon lat order)
    pub fn to_wkt(&self) -> String {
        format!(
            "POLYGON(({w} {n}, {e} {n}, {e} {s}, {w} {s}, {w} {n}))",
            w = self.west,
            n = self.north,
            e = self.east,
            s = self.south
        )
    }
}
