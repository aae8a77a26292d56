//! End-to-end pipeline driver
//!
//! Runs the stages strictly in sequence, each consuming the previous stage's
//! output by value:
//!
//! 1. ingest: drop non-finite positions, apply the season window
//! 2. clustering
//! 3. cumulative footprints
//! 4. overlap resolution
//! 5. attribution and metrics
//!
//! A stage that leaves nothing to process ends the run with its own
//! [`PipelineError`] variant. The driver holds no state between runs; the
//! single-run guard lives in [`crate::service`].

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::attribution::{attribute_events, Attribution, FireEvent};
use crate::clustering::cluster_detections;
use crate::config::PipelineConfig;
use crate::core_types::{Detection, Hectares, RegionProvider};
use crate::error::PipelineError;
use crate::overlap::resolve_overlaps;
use crate::polygon::build_footprints;

/// Logs a stage's wall-clock time when dropped
pub struct StageTimer {
    start: Instant,
    stage: &'static str,
}

impl StageTimer {
    pub fn new(stage: &'static str) -> Self {
        Self {
            start: Instant::now(),
            stage,
        }
    }

    /// Elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        debug!(stage = self.stage, elapsed_ms = self.elapsed_ms(), "stage finished");
    }
}

/// Counters reported to the calling service layer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Attributed exclusive footprints
    pub total_polygons: usize,
    /// Attributed events
    pub unique_events: usize,
    /// Events at or above the large-event threshold
    pub large_events: usize,
    /// Sum of every attributed footprint's individual area
    pub total_area: Hectares,
    /// Rows handed to the store after dedup
    pub new_rows: usize,
    /// Events sharing a derived identifier with an earlier event of the run
    pub id_collisions: usize,
}

/// Result contract of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub success: bool,
    pub stats: Option<PipelineStats>,
    pub error: Option<String>,
}

impl PipelineSummary {
    pub fn succeeded(stats: PipelineStats) -> Self {
        Self {
            success: true,
            stats: Some(stats),
            error: None,
        }
    }

    /// Render a failure with its human-readable reason
    pub fn from_error(error: &PipelineError) -> Self {
        Self {
            success: false,
            stats: None,
            error: Some(error.to_string()),
        }
    }
}

/// Everything the core produces for one run
#[derive(Debug)]
pub struct PipelineOutput {
    pub attribution: Attribution,
    /// Detections dropped at ingest for a non-finite position
    pub rejected_detections: usize,
    /// Detections that went into clustering
    pub clustered_detections: usize,
    /// Groups that passed the minimum-size filter
    pub qualifying_groups: usize,
}

impl PipelineOutput {
    pub fn events(&self) -> &[FireEvent] {
        &self.attribution.events
    }

    /// Run counters, before any rows are persisted
    pub fn stats(&self) -> PipelineStats {
        let events = self.events();
        PipelineStats {
            total_polygons: events.iter().map(|e| e.footprints.len()).sum(),
            unique_events: events.len(),
            large_events: self.attribution.large_events().count(),
            total_area: events.iter().flat_map(|e| &e.footprints).map(|f| f.area).sum(),
            new_rows: 0,
            id_collisions: self.attribution.id_collisions,
        }
    }
}

/// Drop detections the geometry stages cannot handle, logging each one
fn drop_non_finite(detections: Vec<Detection>) -> (Vec<Detection>, usize) {
    let received = detections.len();
    let kept: Vec<Detection> = detections
        .into_iter()
        .filter(|d| {
            let finite = d.has_finite_position();
            if !finite {
                warn!(
                    id = d.id,
                    x = d.position.x,
                    y = d.position.y,
                    "dropping detection with non-finite position"
                );
            }
            finite
        })
        .collect();
    let dropped = received - kept.len();
    (kept, dropped)
}

/// Run every core stage over one batch of detections.
///
/// # Errors
/// One empty-result variant per stage and unrecoverable geometry errors.
/// Detections with a non-finite position are dropped, not fatal.
pub fn run_pipeline<R>(
    detections: Vec<Detection>,
    regions: &R,
    config: &PipelineConfig,
) -> Result<PipelineOutput, PipelineError>
where
    R: RegionProvider + ?Sized,
{
    let _run = StageTimer::new("pipeline");

    if detections.is_empty() {
        return Err(PipelineError::NoDetections);
    }
    let received = detections.len();
    let (detections, rejected_detections) = drop_non_finite(detections);

    let detections: Vec<Detection> = detections.into_iter().filter(|d| config.in_season(d)).collect();
    info!(received, rejected = rejected_detections, in_season = detections.len(), "ingested detections");
    if detections.is_empty() {
        return Err(PipelineError::NoDetections);
    }

    let clustered_detections = detections.len();
    let clustering = {
        let _t = StageTimer::new("clustering");
        cluster_detections(detections, config)
    };
    if clustering.groups.is_empty() {
        return Err(PipelineError::NoQualifyingEvents {
            min_detections: config.min_event_detections,
        });
    }
    let qualifying_groups = clustering.groups.len();

    let cumulative = {
        let _t = StageTimer::new("footprints");
        build_footprints(clustering.groups, config)?
    };
    if cumulative.is_empty() {
        return Err(PipelineError::NoFootprints);
    }

    let exclusive = {
        let _t = StageTimer::new("overlap");
        resolve_overlaps(cumulative)?
    };
    if exclusive.is_empty() {
        return Err(PipelineError::NoExclusiveFootprints);
    }

    let attribution = {
        let _t = StageTimer::new("attribution");
        attribute_events(exclusive, regions, config)
    };
    if attribution.events.is_empty() {
        return Err(PipelineError::NoAttributedEvents);
    }

    Ok(PipelineOutput {
        attribution,
        rejected_detections,
        clustered_detections,
        qualifying_groups,
    })
}
