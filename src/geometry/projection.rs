//! Spherical Web Mercator (EPSG:3857) projection.

use geo::{Coord, LineString, MapCoords, Point};

/// WGS84 semi-major axis used by EPSG:3857
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude limit of the square Web Mercator world
pub const MAX_LATITUDE: f64 = 85.0511;

/// Project a lon/lat coordinate (degrees) into meters.
///
/// Latitude is clamped to the Mercator limit.
pub fn to_web_mercator(lon_lat: Coord<f64>) -> Coord<f64> {
    let lat = lon_lat.y.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    Coord {
        x: EARTH_RADIUS * lon_lat.x.to_radians(),
        y: EARTH_RADIUS * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln(),
    }
}

/// Inverse of [`to_web_mercator`], returning lon/lat degrees
pub fn to_geographic(xy: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (xy.x / EARTH_RADIUS).to_degrees(),
        y: (2.0 * (xy.y / EARTH_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees(),
    }
}

/// Projection for whole geometries
pub trait WebMercator {
    fn to_web_mercator(&self) -> Self;
    fn to_geographic(&self) -> Self;
}

impl WebMercator for LineString<f64> {
    fn to_web_mercator(&self) -> Self {
        self.map_coords(to_web_mercator)
    }

    fn to_geographic(&self) -> Self {
        self.map_coords(to_geographic)
    }
}

impl WebMercator for Point<f64> {
    fn to_web_mercator(&self) -> Self {
        Point(to_web_mercator(self.0))
    }

    fn to_geographic(&self) -> Self {
        Point(to_geographic(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    #[test]
    fn test_origin() {
        let p = to_web_mercator(coord! { x: 0.0, y: 0.0 });
        assert!(p.x.abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
    }

    #[test]
    fn test_known_values() {
        // 180 degrees of longitude spans half the equator
        let p = to_web_mercator(coord! { x: 180.0, y: 0.0 });
        assert!((p.x - 20_037_508.342789244).abs() < 1e-6);

        let p = to_web_mercator(coord! { x: -99.1332, y: 19.4326 });
        assert!((p.x - -11_035_457.34).abs() < 0.01);
        assert!((p.y - 2_205_934.36).abs() < 0.01);
    }

    #[test]
    fn test_round_trip() {
        let original = coord! { x: -99.1332, y: 19.4326 };
        let back = to_geographic(to_web_mercator(original));
        assert!((back.x - original.x).abs() < 1e-9);
        assert!((back.y - original.y).abs() < 1e-9);
    }

    #[test]
    fn test_latitude_clamped() {
        let pole = to_web_mercator(coord! { x: 0.0, y: 90.0 });
        let limit = to_web_mercator(coord! { x: 0.0, y: MAX_LATITUDE });
        assert_eq!(pole, limit);
        assert!(pole.y.is_finite());
    }
}
