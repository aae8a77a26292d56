//! External event identifier
//!
//! Nine digits: day of year (3), then the first three digits of |x| and of
//! |y| of the origin footprint's centroid, decimal point removed and padded
//! with trailing zeros. Previously persisted identifiers were derived this
//! way, so the derivation must not change.
//!
//! Digits are taken from the shortest round-trip decimal rendering of the
//! coordinate. When that rendering cannot yield three digits (NaN, infinity,
//! a scientific-notation mantissa shorter than three digits) or there is no
//! centroid, the coordinate triples fall back to zeros.
//!
//! The identifier is not unique: two events starting on the same day of year
//! whose centroids share leading digits collide. Collisions are reported by
//! the attribution stage, not resolved.

use chrono::{Datelike, NaiveDate};
use geo::Point;

/// Derive the identifier from the origin footprint's date and centroid
pub fn derive_event_id(date: NaiveDate, centroid: Option<Point<f64>>) -> u32 {
    let day_prefix = date.ordinal() * 1_000_000;

    let digits = centroid.and_then(|c| Some((leading_digits(c.x())?, leading_digits(c.y())?)));

    match digits {
        Some((x, y)) => day_prefix + x * 1_000 + y,
        None => day_prefix,
    }
}

/// First three digits of |value|, right-padded with zeros
fn leading_digits(value: f64) -> Option<u32> {
    let value = value.abs();
    if !value.is_finite() {
        return None;
    }

    // Shortest round-trip rendering; scientific outside [1e-4, 1e16)
    let rendered = if value != 0.0 && !(1e-4..1e16).contains(&value) {
        format!("{value:e}")
    } else {
        format!("{value}")
    };

    let head: String = rendered.chars().filter(|&c| c != '.').take(3).collect();
    let padded = format!("{head:0<3}");

    if padded.bytes().all(|b| b.is_ascii_digit()) {
        padded.parse().ok()
    } else {
        None
    }
}
