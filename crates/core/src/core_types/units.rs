//! Semantic unit types for projected-plane quantities
//!
//! Detections arrive already projected into a metric CRS, so lengths are
//! meters and areas are square meters. Burned area is reported in hectares.
//! The newtypes keep the two area units from being mixed up when metrics are
//! summed across footprints.
//!
//! # Usage
//! ```
//! use fire_events_core::core_types::units::{Hectares, Meters};
//!
//! let area = Hectares::from_square_meters(25_000.0);
//! assert!((*area - 2.5).abs() < 1e-12);
//!
//! let edge = Meters::new(1500.0);
//! assert!(edge <= Meters::new(2000.0));
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Deref};

/// Square meters in one hectare
pub const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

// ============================================================================
// LENGTH
// ============================================================================

/// Length in projected CRS units (meters)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Meters(f64);

impl Eq for Meters {}

impl PartialOrd for Meters {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Meters {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Deref for Meters {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Meters {
    /// Create a new length
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Meters(value)
    }

    /// Raw value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for Meters {
    fn from(v: f64) -> Self {
        Meters(v)
    }
}

impl fmt::Display for Meters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} m", self.0)
    }
}

// ============================================================================
// AREA
// ============================================================================

/// Burned area in hectares (1 ha = 10,000 m²)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Hectares(f64);

impl Eq for Hectares {}

impl PartialOrd for Hectares {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Hectares {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Deref for Hectares {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Hectares {
    /// Zero area
    pub const ZERO: Hectares = Hectares(0.0);

    /// Create a new area in hectares
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Hectares(value)
    }

    /// Convert a planar area in square meters
    #[inline]
    #[must_use]
    pub fn from_square_meters(square_meters: f64) -> Self {
        Hectares(square_meters / SQUARE_METERS_PER_HECTARE)
    }

    /// Raw value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Back to square meters
    #[inline]
    #[must_use]
    pub fn to_square_meters(self) -> f64 {
        self.0 * SQUARE_METERS_PER_HECTARE
    }
}

impl From<f64> for Hectares {
    fn from(v: f64) -> Self {
        Hectares(v)
    }
}

impl Add for Hectares {
    type Output = Hectares;
    fn add(self, rhs: Hectares) -> Hectares {
        Hectares(self.0 + rhs.0)
    }
}

impl AddAssign for Hectares {
    fn add_assign(&mut self, rhs: Hectares) {
        self.0 += rhs.0;
    }
}

impl Sum for Hectares {
    fn sum<I: Iterator<Item = Hectares>>(iter: I) -> Hectares {
        iter.fold(Hectares::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Hectares> for Hectares {
    fn sum<I: Iterator<Item = &'a Hectares>>(iter: I) -> Hectares {
        iter.copied().sum()
    }
}

impl fmt::Display for Hectares {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} ha", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hectare_conversion() {
        assert_eq!(*Hectares::from_square_meters(10_000.0), 1.0);
        assert_eq!(Hectares::new(2.5).to_square_meters(), 25_000.0);
    }

    #[test]
    fn test_hectare_sum_is_ordered_add() {
        let parts = [Hectares::new(1.5), Hectares::new(2.0), Hectares::new(0.25)];
        let total: Hectares = parts.iter().sum();
        assert_eq!(total, Hectares::new(3.75));
    }

    #[test]
    fn test_total_ordering() {
        assert!(Hectares::new(9.99) < Hectares::new(10.0));
        assert_eq!(Meters::new(3.0).max(Meters::new(2.0)), Meters::new(3.0));
    }
}
