//! Shared fixtures for the integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use fire_events_core::{AdminRegion, Detection, RegionNames};
use geo::{polygon, MultiPolygon};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One region covering +-half around the origin
pub fn territory(half: f64) -> Vec<AdminRegion> {
    let boundary = polygon![
        (x: -half, y: -half),
        (x: half, y: -half),
        (x: half, y: half),
        (x: -half, y: half),
    ];
    vec![AdminRegion::new(
        RegionNames {
            province: "Manabi".into(),
            canton: "Portoviejo".into(),
            parish: "Abdon Calderon".into(),
        },
        MultiPolygon::new(vec![boundary]),
    )]
}

/// Detections at `offsets` around `(cx, cy)` on one date, ids from `first_id`
pub fn burst(first_id: u64, date: NaiveDate, cx: f64, cy: f64, offsets: &[(f64, f64)]) -> Vec<Detection> {
    (first_id..)
        .zip(offsets)
        .map(|(id, (dx, dy))| Detection::new(id, date, cx + dx, cy + dy))
        .collect()
}
