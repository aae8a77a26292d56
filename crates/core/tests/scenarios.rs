//! End-to-end scenarios over small hand-built detection sets

mod common;

use approx::assert_relative_eq;
use common::{burst, date, territory};
use fire_events_core::{
    build_footprints, cluster_detections, run_pipeline, select_new_rows, Detection, PipelineConfig,
    PipelineError, AREA_TOLERANCE_M2,
};
use rustc_hash::FxHashSet;

/// Six detections on 2025-01-01 and four on 2025-01-03, all within 50 units
fn two_day_fire() -> Vec<Detection> {
    let mut detections = burst(
        1,
        date(2025, 1, 1),
        0.0,
        0.0,
        &[(0.0, 0.0), (20.0, 5.0), (5.0, 20.0), (-15.0, 10.0), (-10.0, -15.0), (15.0, -15.0)],
    );
    detections.extend(burst(
        7,
        date(2025, 1, 3),
        0.0,
        0.0,
        &[(30.0, 30.0), (-30.0, 25.0), (-25.0, -30.0), (35.0, -30.0)],
    ));
    detections
}

#[test]
fn test_two_day_fire_is_one_event_with_two_footprints() {
    let config = PipelineConfig::default();

    let clustering = cluster_detections(two_day_fire(), &config);
    assert_eq!(clustering.groups.len(), 1);
    assert_eq!(clustering.groups[0].len(), 10);

    let cumulative = build_footprints(clustering.groups, &config).unwrap();
    assert_eq!(cumulative.len(), 1);
    let dates: Vec<_> = cumulative[0].footprints.iter().map(|f| f.date).collect();
    assert_eq!(dates, vec![date(2025, 1, 1), date(2025, 1, 3)]);

    let output = run_pipeline(two_day_fire(), &territory(10_000.0), &config).unwrap();
    let stats = output.stats();
    assert_eq!(stats.unique_events, 1);
    assert_eq!(stats.total_polygons, 2);
    // A few thousand square meters: well under the large-event threshold
    assert_eq!(stats.large_events, 0);

    let event = &output.events()[0];
    assert_eq!(event.start_date, date(2025, 1, 1));
    assert_eq!(event.end_date, date(2025, 1, 3));
    assert_eq!(event.duration_days, 3);
    assert_eq!(event.region.canton, "Portoviejo");
    // Day of year 1: the leading zeros drop out of the integer
    assert!(event.event_id < 1_000_000 * 2);
}

#[test]
fn test_four_detections_make_no_event() {
    let detections = burst(
        1,
        date(2025, 2, 10),
        500.0,
        500.0,
        &[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0), (100.0, 100.0)],
    );

    let clustering = cluster_detections(detections.clone(), &PipelineConfig::default());
    assert_eq!(clustering.groups_formed, 1);
    assert!(clustering.groups.is_empty());

    let err = run_pipeline(detections, &territory(10_000.0), &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::NoQualifyingEvents { min_detections: 5 }));
    assert!(err.is_empty_result());
}

#[test]
fn test_distant_pair_is_two_dropped_groups() {
    let detections = burst(1, date(2025, 3, 1), 0.0, 0.0, &[(0.0, 0.0), (1200.0, 0.0)]);

    let clustering = cluster_detections(detections, &PipelineConfig::default());
    assert_eq!(clustering.groups_formed, 2);
    assert_eq!(clustering.groups_dropped(), 2);
    assert!(clustering.groups.is_empty());
}

#[test]
fn test_eight_hectare_event_is_not_persisted() {
    // Right triangle with 400 m legs (8 ha) plus two interior detections
    let detections = burst(
        1,
        date(2025, 7, 4),
        0.0,
        0.0,
        &[(0.0, 0.0), (400.0, 0.0), (0.0, 400.0), (100.0, 100.0), (50.0, 200.0)],
    );

    let output = run_pipeline(detections, &territory(10_000.0), &PipelineConfig::default()).unwrap();
    let event = &output.events()[0];
    assert_relative_eq!(*event.total_area, 8.0, max_relative = 1e-6);
    assert!(!event.is_large);

    assert!(select_new_rows(output.events(), &FxHashSet::default()).is_empty());
}

#[test]
fn test_rerun_only_persists_unknown_events() {
    let mut detections = burst(
        1,
        date(2025, 7, 4),
        0.0,
        0.0,
        &[(0.0, 0.0), (400.0, 0.0), (0.0, 400.0), (400.0, 400.0), (200.0, 200.0)],
    );
    detections.extend(burst(
        10,
        date(2025, 7, 5),
        6000.0,
        0.0,
        &[(0.0, 0.0), (500.0, 0.0), (0.0, 500.0), (500.0, 500.0), (250.0, 250.0)],
    ));

    let output = run_pipeline(detections, &territory(10_000.0), &PipelineConfig::default()).unwrap();
    assert_eq!(output.attribution.large_events().count(), 2);

    let first_id = output.events()[0].event_id;
    let existing: FxHashSet<u32> = [first_id].into_iter().collect();
    let rows = select_new_rows(output.events(), &existing);

    assert!(!rows.is_empty());
    assert!(rows.iter().all(|r| r.event_id != first_id));
    assert!(rows.iter().all(|r| r.geometry.is_areal()));
}

/// Day 1 outlines the fire, day 2 only fills it in, day 3 spreads north-east
fn fire_with_a_quiet_day() -> Vec<Detection> {
    let mut detections = burst(
        1,
        date(2025, 8, 10),
        0.0,
        0.0,
        &[
            (0.0, 0.0),
            (523.7, -41.3),
            (811.9, 302.6),
            (640.2, 688.4),
            (97.3, 712.8),
            (-160.5, 351.1),
        ],
    );
    detections.extend(burst(
        7,
        date(2025, 8, 11),
        0.0,
        0.0,
        &[(250.3, 250.7), (480.1, 400.9), (300.6, 520.2)],
    ));
    detections.extend(burst(10, date(2025, 8, 12), 0.0, 0.0, &[(1100.4, 450.3), (900.7, 950.1)]));
    detections
}

#[test]
fn test_day_without_growth_is_not_a_fire_date() {
    let config = PipelineConfig::default();

    let clustering = cluster_detections(fire_with_a_quiet_day(), &config);
    let cumulative = build_footprints(clustering.groups, &config).unwrap();
    let areas: Vec<f64> = cumulative[0].footprints.iter().map(|f| f.geometry.area()).collect();
    assert_eq!(areas.len(), 3);
    assert_relative_eq!(areas[1], areas[0], max_relative = 1e-6);
    assert!(cumulative[0].footprints.iter().all(|f| f.geometry.hole_count() == 0));

    let output = run_pipeline(fire_with_a_quiet_day(), &territory(10_000.0), &config).unwrap();
    let event = &output.events()[0];
    let dates: Vec<_> = event.footprints.iter().map(|f| f.date).collect();
    assert_eq!(dates, vec![date(2025, 8, 10), date(2025, 8, 12)]);
    assert_eq!(event.footprints[1].day_index, 2);
    assert_eq!(event.end_date, date(2025, 8, 12));
    assert_eq!(event.duration_days, 3);
    assert_relative_eq!(*event.total_area * 10_000.0, areas[2], max_relative = 1e-6);

    let rows = select_new_rows(output.events(), &FxHashSet::default());
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| *r.area_individual * 10_000.0 > AREA_TOLERANCE_M2));
}
