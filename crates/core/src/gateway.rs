//! Boundary contracts with the detection source and the event store
//!
//! The core never performs I/O itself. Callers fetch detections through a
//! [`DetectionSource`] before running the pipeline, then hand the rows picked
//! by [`select_new_rows`] to an [`EventStore`] afterwards.

use std::sync::Mutex;

use chrono::NaiveDate;
use geo::{Coord, Rect};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::attribution::FireEvent;
use crate::config::DateWindow;
use crate::core_types::{Detection, Footprint, Hectares};
use crate::error::{SourceError, StoreError};

/// One persisted footprint of a large event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintRow {
    pub event_id: u32,
    pub date: NaiveDate,
    pub province: String,
    pub canton: String,
    pub parish: String,
    pub area_individual: Hectares,
    pub area_total: Hectares,
    pub day_index: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: i64,
    pub geometry: Footprint,
}

impl FireEvent {
    /// Persistence rows for this event's areal footprints
    pub fn rows(&self) -> Vec<FootprintRow> {
        self.footprints
            .iter()
            .filter(|f| f.geometry.is_areal())
            .map(|f| FootprintRow {
                event_id: self.event_id,
                date: f.date,
                province: self.region.province.clone(),
                canton: self.region.canton.clone(),
                parish: self.region.parish.clone(),
                area_individual: f.area,
                area_total: self.total_area,
                day_index: f.day_index,
                start_date: self.start_date,
                end_date: self.end_date,
                duration_days: self.duration_days,
                geometry: f.geometry.clone(),
            })
            .collect()
    }
}

/// Rows of large events whose identifier is not already persisted
pub fn select_new_rows(events: &[FireEvent], existing: &FxHashSet<u32>) -> Vec<FootprintRow> {
    let mut skipped = 0usize;
    let rows: Vec<FootprintRow> = events
        .iter()
        .filter(|e| e.is_large)
        .filter(|e| {
            let known = existing.contains(&e.event_id);
            if known {
                debug!(event_id = e.event_id, "event already persisted");
                skipped += 1;
            }
            !known
        })
        .flat_map(FireEvent::rows)
        .collect();

    info!(rows = rows.len(), already_persisted = skipped, "selected rows for persistence");
    rows
}

/// Supplies raw detections, already projected into the pipeline's CRS
pub trait DetectionSource {
    /// Detections acquired inside `window` and positioned inside `bbox`
    ///
    /// # Errors
    /// Returns error if the catalog cannot be reached or parsed
    fn fetch(&self, window: DateWindow, bbox: Rect<f64>) -> Result<Vec<Detection>, SourceError>;
}

/// Whether a detection passes a source's window and bounding-box filters
pub fn matches_query(detection: &Detection, window: DateWindow, bbox: &Rect<f64>) -> bool {
    window.contains(detection.date) && covers(bbox, detection.position)
}

/// Boundary-inclusive containment
fn covers(bbox: &Rect<f64>, position: Coord<f64>) -> bool {
    (bbox.min().x..=bbox.max().x).contains(&position.x)
        && (bbox.min().y..=bbox.max().y).contains(&position.y)
}

impl DetectionSource for Vec<Detection> {
    fn fetch(&self, window: DateWindow, bbox: Rect<f64>) -> Result<Vec<Detection>, SourceError> {
        Ok(self
            .iter()
            .filter(|d| matches_query(d, window, &bbox))
            .cloned()
            .collect())
    }
}

/// Persistence and dedup gateway
///
/// Implementations must be safe to call from the service while another
/// thread reads its status.
pub trait EventStore {
    /// Every event identifier already persisted
    ///
    /// # Errors
    /// Returns error if the store cannot be read
    fn existing_event_ids(&self) -> Result<FxHashSet<u32>, StoreError>;

    /// Persist rows
    ///
    /// # Errors
    /// Returns error if the store cannot be written
    fn insert(&self, rows: &[FootprintRow]) -> Result<(), StoreError>;
}

/// Store kept in memory
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    rows: Mutex<Vec<FootprintRow>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with rows
    pub fn with_rows(rows: Vec<FootprintRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    /// Copy of every stored row
    ///
    /// # Errors
    /// Returns error if a writer panicked while holding the lock
    pub fn rows(&self) -> Result<Vec<FootprintRow>, StoreError> {
        self.rows
            .lock()
            .map(|rows| rows.clone())
            .map_err(|e| StoreError::Read(e.to_string()))
    }
}

impl EventStore for InMemoryEventStore {
    fn existing_event_ids(&self) -> Result<FxHashSet<u32>, StoreError> {
        let rows = self.rows.lock().map_err(|e| StoreError::Read(e.to_string()))?;
        Ok(rows.iter().map(|r| r.event_id).collect())
    }

    fn insert(&self, rows: &[FootprintRow]) -> Result<(), StoreError> {
        let mut stored = self.rows.lock().map_err(|e| StoreError::Write(e.to_string()))?;
        stored.extend_from_slice(rows);
        Ok(())
    }
}
