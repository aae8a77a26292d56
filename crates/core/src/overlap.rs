//! Overlap resolution across dates
//!
//! Turns an event's cumulative footprints into exclusive ones: each date
//! keeps only the area that no earlier date has already claimed. Dates that
//! add nothing new (no part above
//! [`AREA_TOLERANCE_M2`](crate::core_types::AREA_TOLERANCE_M2)) are dropped.
//! The claimed area is local to one event.
//!
//! Cumulative footprints never shrink, so the area claimed after a date is
//! that date's cumulative footprint. A date whose difference fails leaves the
//! claim where it was, and its growth is counted on the next date.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::core_types::Footprint;
use crate::error::GeometryError;
use crate::polygon::{DailyFootprint, EventFootprints};

/// Resolve one event's cumulative footprints into exclusive ones.
///
/// # Errors
/// Only unrecoverable geometry errors propagate; a degenerate difference
/// skips that date.
pub fn resolve_event_overlaps(event: EventFootprints) -> Result<EventFootprints, GeometryError> {
    carve_exclusive(event, Footprint::difference)
}

fn carve_exclusive<D>(event: EventFootprints, difference: D) -> Result<EventFootprints, GeometryError>
where
    D: Fn(&Footprint, &Footprint) -> Result<Option<Footprint>, GeometryError>,
{
    let event_seq = event.event_seq;
    let mut cumulative = event.footprints;
    cumulative.sort_by_key(|f| f.date);

    let mut claimed: Option<Footprint> = None;
    let mut exclusive = Vec::with_capacity(cumulative.len());

    for footprint in cumulative {
        let fresh = match &claimed {
            None => Some(footprint.geometry.clone()),
            Some(claimed) => match difference(&footprint.geometry, claimed) {
                Ok(fresh) => fresh,
                Err(e) if e.is_recoverable() => {
                    warn!(event_seq, date = %footprint.date, error = %e, "skipping date");
                    continue;
                }
                Err(e) => return Err(e),
            },
        };
        claimed = Some(footprint.geometry.clone());

        let Some(fresh) = fresh else {
            continue;
        };
        exclusive.push(DailyFootprint {
            geometry: fresh,
            ..footprint
        });
    }

    Ok(EventFootprints {
        event_seq,
        footprints: exclusive,
    })
}

/// Resolve overlaps for every event, in parallel across events.
///
/// Events left without any exclusive footprint are dropped.
///
/// # Errors
/// The first unrecoverable geometry error.
pub fn resolve_overlaps(events: Vec<EventFootprints>) -> Result<Vec<EventFootprints>, GeometryError> {
    let resolved: Vec<EventFootprints> = events
        .into_par_iter()
        .map(resolve_event_overlaps)
        .collect::<Result<Vec<_>, _>>()?;

    let events: Vec<EventFootprints> = resolved.into_iter().filter(|e| !e.is_empty()).collect();

    info!(
        events = events.len(),
        footprints = events.iter().map(|e| e.footprints.len()).sum::<usize>(),
        "resolved overlapping footprints"
    );

    Ok(events)
}
