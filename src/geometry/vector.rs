use geo::{Coord, LineString};

use crate::models::Side;

/// 2D cross product of `first -> last` with `first -> point`.
///
/// Positive when `point` lies to the left of the directed line.
pub fn cross(first: Coord<f64>, last: Coord<f64>, point: Coord<f64>) -> f64 {
    let d = last - first;
    let v = point - first;
    d.x * v.y - d.y * v.x
}

/// Side of `point` relative to the chord from the first to the last
/// coordinate of `line`. Intermediate vertices are ignored.
pub fn side_of_line(point: Coord<f64>, line: &LineString<f64>) -> Side {
    let (Some(first), Some(last)) = (line.0.first(), line.0.last()) else {
        return Side::Unknown;
    };
    if line.0.len() < 2 {
        return Side::Unknown;
    }

    let c = cross(*first, *last, point);
    if c > 0.0 {
        Side::Left
    } else if c < 0.0 {
        Side::Right
    } else {
        Side::Center
    }
}

/// Undirected angle of the chord from first to last coordinate, in
/// degrees within `[0, 180)`. `None` for lines with fewer than 2 coordinates.
pub fn line_angle(line: &LineString<f64>) -> Option<f64> {
    if line.0.len() < 2 {
        return None;
    }
    let first = line.0.first()?;
    let last = line.0.last()?;
    let degrees = (last.y - first.y).atan2(last.x - first.x).to_degrees();

    let angle = degrees.rem_euclid(180.0);
    // rem_euclid can round a tiny negative up to exactly 180
    Some(if angle >= 180.0 { 0.0 } else { angle })
}

/// Smallest difference between two undirected angles, in `[0, 90]`
pub fn angle_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs();
    if diff > 90.0 {
        180.0 - diff
    } else {
        diff
    }
}
