//! Per-event area and duration metrics

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core_types::{Footprint, Hectares};
use crate::polygon::DailyFootprint;

/// One exclusive footprint with its metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFootprint {
    pub date: NaiveDate,
    /// 1-based position within the event's own footprints
    pub day_index: u32,
    /// Area of this footprint alone
    pub area: Hectares,
    pub geometry: Footprint,
}

/// Event-level metrics over its exclusive footprints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetrics {
    pub footprints: Vec<EventFootprint>,
    /// Sum of the individual areas
    pub total_area: Hectares,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// `end - start + 1`
    pub duration_days: i64,
}

impl EventMetrics {
    /// Compute metrics; `None` for an event without footprints
    pub fn compute(mut footprints: Vec<DailyFootprint>) -> Option<Self> {
        footprints.sort_by_key(|f| f.date);

        let start_date = footprints.first()?.date;
        let end_date = footprints.last()?.date;

        let footprints: Vec<EventFootprint> = (1u32..)
            .zip(footprints)
            .map(|(day_index, f)| EventFootprint {
                date: f.date,
                day_index,
                area: f.geometry.area_hectares(),
                geometry: f.geometry,
            })
            .collect();

        let total_area = footprints.iter().map(|f| f.area).sum();

        Some(Self {
            footprints,
            total_area,
            start_date,
            end_date,
            duration_days: (end_date - start_date).num_days() + 1,
        })
    }
}
