//! Thermal-anomaly detections
//!
//! A detection is one satellite-reported candidate fire pixel, already
//! projected into the metric CRS used by every pipeline stage.

use chrono::NaiveDate;
use geo::Coord;
use serde::{Deserialize, Serialize};

use super::units::Meters;

/// Detection confidence class as reported by the VIIRS products
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[serde(alias = "l")]
    Low,
    #[serde(alias = "n")]
    Nominal,
    #[serde(alias = "h")]
    High,
}

/// A single thermal-anomaly observation
///
/// Immutable once ingested. Only the acquisition date matters to the
/// pipeline; finer timestamps are not carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Identifier unique within one pipeline run
    pub id: u64,
    /// Acquisition date
    pub date: NaiveDate,
    /// Projected position (meters)
    pub position: Coord<f64>,
    /// Detection confidence
    pub confidence: Confidence,
    /// Brightness temperature (K)
    pub brightness: f64,
    /// Fire radiative power (MW), when the product reports it
    #[serde(default)]
    pub frp: Option<f64>,
    /// Source product (e.g. `VIIRS_SNPP_NRT`)
    pub source: String,
}

impl Detection {
    /// Create a detection with nominal confidence and no FRP
    pub fn new(id: u64, date: NaiveDate, x: f64, y: f64) -> Self {
        Self {
            id,
            date,
            position: Coord { x, y },
            confidence: Confidence::Nominal,
            brightness: 0.0,
            frp: None,
            source: String::new(),
        }
    }

    /// Euclidean distance to another detection in the projected plane
    #[inline]
    pub fn distance_to(&self, other: &Detection) -> Meters {
        Meters::new((self.position.x - other.position.x).hypot(self.position.y - other.position.y))
    }

    /// Whole days from this detection to `later` (negative if `later` precedes it)
    #[inline]
    pub fn days_until(&self, later: &Detection) -> i64 {
        (later.date - self.date).num_days()
    }

    /// Whether both projected coordinates are finite
    pub fn has_finite_position(&self) -> bool {
        self.position.x.is_finite() && self.position.y.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn test_distance_and_day_difference() {
        let a = Detection::new(1, day(1), 0.0, 0.0);
        let b = Detection::new(2, day(4), 300.0, 400.0);

        assert_eq!(*a.distance_to(&b), 500.0);
        assert_eq!(a.days_until(&b), 3);
        assert_eq!(b.days_until(&a), -3);
    }

    #[test]
    fn test_confidence_accepts_short_codes() {
        let parsed: Confidence = serde_json::from_str("\"h\"").unwrap();
        assert_eq!(parsed, Confidence::High);
        let parsed: Confidence = serde_json::from_str("\"nominal\"").unwrap();
        assert_eq!(parsed, Confidence::Nominal);
    }

    #[test]
    fn test_non_finite_position_detected() {
        let bad = Detection::new(1, day(1), f64::NAN, 0.0);
        assert!(!bad.has_finite_position());
        assert!(Detection::new(2, day(1), 1.0, 2.0).has_finite_position());
    }
}
