//! Cumulative burn-footprint reconstruction
//!
//! For each event, detections are accumulated day by day and the footprint
//! as of each date is derived from every point seen so far:
//!
//! - one point: the point itself
//! - two points: their hull, a line
//! - three or more: the union of the capped Delaunay triangles
//!
//! The result is then unioned with the previous date's footprint, so the
//! cumulative geometry never shrinks. When the triangulation keeps nothing
//! or a geometric operation degenerates, the previous footprint is carried
//! forward unchanged.

pub mod triangulation;

pub use triangulation::{filtered_triangles, triangulated_footprint, TriangleFilter};

use chrono::NaiveDate;
use geo::{Coord, Line, Point};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clustering::EventGroup;
use crate::config::PipelineConfig;
use crate::core_types::Footprint;
use crate::error::GeometryError;

/// Footprint of one event on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyFootprint {
    pub event_seq: u32,
    pub date: NaiveDate,
    pub geometry: Footprint,
}

/// All footprints of one event, ascending by date
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventFootprints {
    pub event_seq: u32,
    pub footprints: Vec<DailyFootprint>,
}

impl EventFootprints {
    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }

    /// The last footprint's geometry
    pub fn latest(&self) -> Option<&Footprint> {
        self.footprints.last().map(|f| &f.geometry)
    }
}

/// Footprint of the accumulated points alone, before merging with history
fn derive_footprint(
    points: &[Coord<f64>],
    filter: &TriangleFilter,
) -> Result<Option<Footprint>, GeometryError> {
    match points {
        [] => Ok(None),
        [only] => Ok(Some(Footprint::Point(Point::from(*only)))),
        [a, b] if a == b => Ok(Some(Footprint::Point(Point::from(*a)))),
        [a, b] => Ok(Some(Footprint::Line(Line::new(*a, *b)))),
        _ => triangulated_footprint(points, filter),
    }
}

/// Build the cumulative per-date footprints of one event.
///
/// # Errors
/// Only unrecoverable geometry errors (non-finite coordinates) propagate;
/// degeneracies fall back to the previous footprint.
pub fn build_event_footprints(
    group: EventGroup,
    config: &PipelineConfig,
) -> Result<EventFootprints, GeometryError> {
    accumulate_footprints(group, config, Footprint::union)
}

/// Day-by-day accumulation with `merge` joining each date's footprint onto
/// the previous one
fn accumulate_footprints<M>(
    group: EventGroup,
    config: &PipelineConfig,
    merge: M,
) -> Result<EventFootprints, GeometryError>
where
    M: Fn(&Footprint, &Footprint) -> Result<Footprint, GeometryError>,
{
    let filter = TriangleFilter::from_config(config);
    let event_seq = group.event_seq;

    let mut detections = group.detections;
    detections.sort_by_key(|d| d.date);

    let mut accumulated: Vec<Coord<f64>> = Vec::with_capacity(detections.len());
    let mut previous: Option<Footprint> = None;
    let mut footprints = Vec::new();

    for day in detections.chunk_by(|a, b| a.date == b.date) {
        let date = day[0].date;
        accumulated.extend(day.iter().map(|d| d.position));

        let derived = derive_footprint(&accumulated, &filter).and_then(|current| {
            match (current, &previous) {
                (Some(current), Some(prev)) => merge(&current, prev).map(Some),
                (current, _) => Ok(current),
            }
        });

        let current = match derived {
            Ok(Some(footprint)) => Some(footprint),
            Ok(None) => previous.clone(),
            Err(e) if e.is_recoverable() => {
                warn!(event_seq, %date, error = %e, "falling back to previous footprint");
                previous.clone()
            }
            Err(e) => return Err(e),
        };

        if let Some(geometry) = current {
            debug!(
                event_seq,
                %date,
                points = accumulated.len(),
                kind = geometry.kind(),
                area_m2 = geometry.area(),
                holes = geometry.hole_count(),
                "cumulative footprint"
            );
            previous = Some(geometry.clone());
            footprints.push(DailyFootprint {
                event_seq,
                date,
                geometry,
            });
        }
    }

    Ok(EventFootprints {
        event_seq,
        footprints,
    })
}

/// Build cumulative footprints for every event, in parallel across events.
///
/// Events without any footprint are dropped. Output order follows input order.
///
/// # Errors
/// The first unrecoverable geometry error.
pub fn build_footprints(
    groups: Vec<EventGroup>,
    config: &PipelineConfig,
) -> Result<Vec<EventFootprints>, GeometryError> {
    let built: Vec<EventFootprints> = groups
        .into_par_iter()
        .map(|group| build_event_footprints(group, config))
        .collect::<Result<Vec<_>, _>>()?;

    let events: Vec<EventFootprints> = built.into_iter().filter(|e| !e.is_empty()).collect();

    info!(
        events = events.len(),
        footprints = events.iter().map(|e| e.footprints.len()).sum::<usize>(),
        "built cumulative footprints"
    );

    Ok(events)
}
