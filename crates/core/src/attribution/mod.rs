//! Location and metrics attribution
//!
//! Each event is attributed to the administrative region that contains its
//! origin, the earliest exclusive footprint. Regions are tested in the
//! provider's iteration order and the first intersecting one wins; events
//! whose origin touches no region are discarded.
//!
//! Attributed events carry per-footprint and total areas, the date span, and
//! the external identifier derived from the origin footprint.

pub mod identifier;
pub mod metrics;

pub use identifier::derive_event_id;
pub use metrics::{EventFootprint, EventMetrics};

use chrono::NaiveDate;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::core_types::{AdminRegion, Footprint, Hectares, RegionNames, RegionProvider};
use crate::polygon::EventFootprints;

/// A fire event with its location and metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireEvent {
    /// External nine-digit identifier
    pub event_id: u32,
    /// Run-local sequence number from clustering
    pub event_seq: u32,
    /// Region containing the origin footprint
    pub region: RegionNames,
    /// Exclusive footprints, ascending by date
    pub footprints: Vec<EventFootprint>,
    pub total_area: Hectares,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: i64,
    /// Whether `total_area` reaches the large-event threshold
    pub is_large: bool,
}

impl FireEvent {
    /// The earliest exclusive footprint
    pub fn origin(&self) -> Option<&EventFootprint> {
        self.footprints.first()
    }
}

/// Outcome of attributing one batch
#[derive(Debug, Default)]
pub struct Attribution {
    /// Attributed events, in input order
    pub events: Vec<FireEvent>,
    /// Events whose origin intersects no region
    pub discarded: usize,
    /// Identifiers shared by more than one event of this batch
    pub id_collisions: usize,
}

impl Attribution {
    /// Events at or above the large-event threshold
    pub fn large_events(&self) -> impl Iterator<Item = &FireEvent> {
        self.events.iter().filter(|e| e.is_large)
    }
}

/// First region, in provider order, intersecting `origin`
pub fn locate<'a>(origin: &Footprint, regions: &'a [AdminRegion]) -> Option<&'a AdminRegion> {
    regions.iter().find(|region| region.intersects(origin))
}

/// Attribute one event, `None` when it has no footprint or no region
pub fn attribute_event(
    event: EventFootprints,
    regions: &[AdminRegion],
    config: &PipelineConfig,
) -> Option<FireEvent> {
    let event_seq = event.event_seq;
    let metrics = EventMetrics::compute(event.footprints)?;
    let origin = metrics.footprints.first()?;

    let Some(region) = locate(&origin.geometry, regions) else {
        debug!(event_seq, origin_date = %origin.date, "origin outside every region");
        return None;
    };

    let event_id = derive_event_id(origin.date, origin.geometry.centroid());
    let is_large = metrics.total_area >= config.large_event_threshold();

    Some(FireEvent {
        event_id,
        event_seq,
        region: region.names.clone(),
        footprints: metrics.footprints,
        total_area: metrics.total_area,
        start_date: metrics.start_date,
        end_date: metrics.end_date,
        duration_days: metrics.duration_days,
        is_large,
    })
}

/// Attribute every event, in parallel across events.
///
/// Identifier collisions inside the batch are logged and counted, never
/// resolved.
pub fn attribute_events<R>(
    events: Vec<EventFootprints>,
    regions: &R,
    config: &PipelineConfig,
) -> Attribution
where
    R: RegionProvider + ?Sized,
{
    let regions = regions.regions();
    let input = events.len();

    let attributed: Vec<FireEvent> = events
        .into_par_iter()
        .filter_map(|event| attribute_event(event, regions, config))
        .collect();

    let mut seen: FxHashMap<u32, u32> = FxHashMap::default();
    let mut id_collisions = 0;
    for event in &attributed {
        if let Some(first_seq) = seen.insert(event.event_id, event.event_seq) {
            id_collisions += 1;
            warn!(
                event_id = event.event_id,
                first_seq,
                event_seq = event.event_seq,
                "event identifier collision"
            );
        }
    }

    let discarded = input - attributed.len();
    info!(
        events = attributed.len(),
        discarded,
        large = attributed.iter().filter(|e| e.is_large).count(),
        id_collisions,
        "attributed events to regions"
    );

    Attribution {
        events: attributed,
        discarded,
        id_collisions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::DailyFootprint;
    use geo::{polygon, MultiPolygon, Point};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn square(x0: f64, y0: f64, side: f64) -> Footprint {
        Footprint::Polygon(polygon![
            (x: x0, y: y0),
            (x: x0 + side, y: y0),
            (x: x0 + side, y: y0 + side),
            (x: x0, y: y0 + side),
        ])
    }

    fn region(name: &str, x0: f64, side: f64) -> AdminRegion {
        let Footprint::Polygon(boundary) = square(x0, 0.0, side) else {
            unreachable!()
        };
        AdminRegion::new(
            RegionNames {
                province: format!("{name} province"),
                canton: format!("{name} canton"),
                parish: format!("{name} parish"),
            },
            MultiPolygon::new(vec![boundary]),
        )
    }

    fn event(event_seq: u32, footprints: Vec<(u32, Footprint)>) -> EventFootprints {
        EventFootprints {
            event_seq,
            footprints: footprints
                .into_iter()
                .map(|(d, geometry)| DailyFootprint {
                    event_seq,
                    date: day(d),
                    geometry,
                })
                .collect(),
        }
    }

    #[test]
    fn test_region_of_origin_wins() {
        // Origin lies in "west"; later growth reaches into "east"
        let regions = vec![region("west", 0.0, 1000.0), region("east", 1000.0, 1000.0)];
        let fire = event(1, vec![(1, square(100.0, 100.0, 200.0)), (3, square(900.0, 100.0, 400.0))]);

        let result = attribute_events(vec![fire], &regions, &PipelineConfig::default());
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].region.province, "west province");
    }

    #[test]
    fn test_first_matching_region_in_order() {
        let regions = vec![region("a", 0.0, 1000.0), region("b", 0.0, 1000.0)];
        let fire = event(1, vec![(1, square(10.0, 10.0, 50.0))]);

        let result = attribute_events(vec![fire], &regions, &PipelineConfig::default());
        assert_eq!(result.events[0].region.parish, "a parish");
    }

    #[test]
    fn test_event_outside_regions_is_discarded() {
        let regions = vec![region("only", 0.0, 100.0)];
        let fire = event(1, vec![(1, square(5000.0, 5000.0, 50.0))]);

        let result = attribute_events(vec![fire], &regions, &PipelineConfig::default());
        assert!(result.events.is_empty());
        assert_eq!(result.discarded, 1);
    }

    #[test]
    fn test_metrics_and_large_flag() {
        let regions = vec![region("r", 0.0, 2000.0)];
        // 1 ha then 9 ha more: exactly 10 ha is large
        let large = event(1, vec![(2, square(0.0, 0.0, 100.0)), (5, square(100.0, 0.0, 300.0))]);
        // 8 ha
        let small = event(2, vec![(1, square(1000.0, 1000.0, 200.0)), (2, square(1200.0, 1000.0, 200.0))]);

        let result = attribute_events(vec![large, small], &regions, &PipelineConfig::default());
        assert_eq!(result.events.len(), 2);

        let large = &result.events[0];
        assert_eq!(large.total_area, Hectares::new(10.0));
        assert_eq!(large.duration_days, 4);
        assert_eq!(large.start_date, day(2));
        assert_eq!(large.end_date, day(5));
        assert!(large.is_large);

        let small = &result.events[1];
        assert_eq!(small.total_area, Hectares::new(8.0));
        assert!(!small.is_large);
        assert_eq!(result.large_events().count(), 1);
    }

    #[test]
    fn test_identifier_from_origin() {
        let regions = vec![region("r", 0.0, 2000.0)];
        let fire = event(1, vec![(1, Footprint::Point(Point::new(123.0, 456.0))), (2, square(0.0, 0.0, 1000.0))]);

        let result = attribute_events(vec![fire], &regions, &PipelineConfig::default());
        // 2025-03-01 is day 60
        assert_eq!(result.events[0].event_id, 60_123_456);
        assert_eq!(result.events[0].origin().unwrap().day_index, 1);
    }

    #[test]
    fn test_collisions_are_counted_not_resolved() {
        let regions = vec![region("r", 0.0, 2000.0)];
        let a = event(1, vec![(1, Footprint::Point(Point::new(123.0, 456.0)))]);
        let b = event(2, vec![(1, Footprint::Point(Point::new(123.4, 456.7)))]);

        let result = attribute_events(vec![a, b], &regions, &PipelineConfig::default());
        assert_eq!(result.events.len(), 2);
        assert_eq!(result.events[0].event_id, result.events[1].event_id);
        assert_eq!(result.id_collisions, 1);
    }
}
