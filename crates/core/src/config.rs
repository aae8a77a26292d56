//! Pipeline configuration
//!
//! All thresholds used by the stages live here. The defaults are the values
//! previously persisted event identifiers were derived with; changing them
//! changes which events exist.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core_types::{Detection, Hectares, Meters};

/// Inclusive date window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Thresholds for clustering, footprint reconstruction and the large-event gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum forward gap in days between two linked detections
    pub time_lag_days: i64,

    /// Maximum distance between two linked detections (projected units)
    pub distance_threshold: f64,

    /// Groups with fewer detections are treated as noise
    pub min_event_detections: usize,

    /// Delaunay triangles with a longer edge are rejected (projected units)
    pub max_triangle_edge: f64,

    /// Delaunay triangles with a larger area are rejected (hectares)
    pub max_triangle_area_ha: f64,

    /// Events with at least this total area are "large" (hectares)
    pub large_event_threshold_ha: f64,

    /// Only detections inside this window are clustered
    pub season: Option<DateWindow>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            time_lag_days: 3,
            distance_threshold: 1000.0,
            min_event_detections: 5,
            max_triangle_edge: 2000.0,
            max_triangle_area_ha: 500.0,
            large_event_threshold_ha: 10.0,
            season: None,
        }
    }
}

impl PipelineConfig {
    /// Distance threshold as a length
    pub fn distance_limit(&self) -> Meters {
        Meters::new(self.distance_threshold)
    }

    /// Large-event threshold as an area
    pub fn large_event_threshold(&self) -> Hectares {
        Hectares::new(self.large_event_threshold_ha)
    }

    /// Whether a detection falls inside the configured season
    pub fn in_season(&self, detection: &Detection) -> bool {
        self.season.is_none_or(|window| window.contains(detection.date))
    }
}
