//! Single-run guard and result cache around the pipeline
//!
//! The pipeline itself is stateless. Running two batches at once would race
//! the store's dedup read against the other batch's insert, so the service
//! admits one run at a time process-wide: a second caller gets an
//! "already in progress" summary immediately instead of blocking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use chrono::{DateTime, Utc};
use geo::Rect;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{DateWindow, PipelineConfig};
use crate::core_types::AdminRegion;
use crate::error::PipelineError;
use crate::gateway::{select_new_rows, DetectionSource, EventStore};
use crate::pipeline::{run_pipeline, PipelineStats, PipelineSummary};

/// `idle -> running -> idle` flag
#[derive(Debug, Default)]
pub struct ProcessingGuard {
    running: AtomicBool,
}

impl ProcessingGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The guard shared by every service in this process
    pub fn process_wide() -> Arc<Self> {
        static GUARD: OnceLock<Arc<ProcessingGuard>> = OnceLock::new();
        Arc::clone(GUARD.get_or_init(|| Arc::new(ProcessingGuard::new())))
    }

    /// Move to `running`, or `None` if a run is already in flight
    pub fn try_begin(&self) -> Option<ProcessingPermit<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ProcessingPermit { guard: self })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Held while a run is in flight; returns the guard to idle when dropped
#[derive(Debug)]
pub struct ProcessingPermit<'a> {
    guard: &'a ProcessingGuard,
}

impl ProcessingPermit<'_> {
    /// Return to idle
    pub fn end(self) {}
}

impl Drop for ProcessingPermit<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}

/// Last completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedRun {
    pub summary: PipelineSummary,
    pub completed_at: DateTime<Utc>,
}

impl CachedRun {
    /// Minutes since completion, one decimal
    pub fn age_minutes(&self, now: DateTime<Utc>) -> f64 {
        let minutes = (now - self.completed_at).num_milliseconds() as f64 / 60_000.0;
        (minutes * 10.0).round() / 10.0
    }
}

/// Service status report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub cache_available: bool,
    pub cache_age_minutes: Option<f64>,
    pub processing: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub stats: Option<PipelineStats>,
}

/// Runs source -> pipeline -> dedup gate -> store, one run at a time
///
/// Services built with [`PipelineService::new`] share
/// [`ProcessingGuard::process_wide`], so at most one of them runs at once.
pub struct PipelineService<S, E> {
    source: S,
    store: E,
    regions: Vec<AdminRegion>,
    config: PipelineConfig,
    guard: Arc<ProcessingGuard>,
    cache: Mutex<Option<CachedRun>>,
}

impl<S, E> PipelineService<S, E>
where
    S: DetectionSource,
    E: EventStore,
{
    pub fn new(source: S, store: E, regions: Vec<AdminRegion>, config: PipelineConfig) -> Self {
        Self {
            source,
            store,
            regions,
            config,
            guard: ProcessingGuard::process_wide(),
            cache: Mutex::new(None),
        }
    }

    /// Share `guard` instead of the process-wide one
    pub fn with_guard(mut self, guard: Arc<ProcessingGuard>) -> Self {
        self.guard = guard;
        self
    }

    pub fn guard(&self) -> &Arc<ProcessingGuard> {
        &self.guard
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &E {
        &self.store
    }

    /// Process one window, or report that a run is already in flight
    pub fn run(&self, window: DateWindow, bbox: Rect<f64>) -> PipelineSummary {
        let Some(permit) = self.guard.try_begin() else {
            warn!("pipeline run requested while another is in flight");
            return PipelineSummary::from_error(&PipelineError::AlreadyRunning);
        };

        let summary = match self.execute(window, bbox) {
            Ok(stats) => PipelineSummary::succeeded(stats),
            Err(e) => {
                warn!(error = %e, "pipeline run failed");
                PipelineSummary::from_error(&e)
            }
        };

        self.remember(&summary);
        permit.end();
        summary
    }

    fn execute(&self, window: DateWindow, bbox: Rect<f64>) -> Result<PipelineStats, PipelineError> {
        let detections = self.source.fetch(window, bbox)?;
        info!(
            start = %window.start,
            end = %window.end,
            detections = detections.len(),
            "fetched detections"
        );

        let output = run_pipeline(detections, &self.regions, &self.config)?;

        let existing = self.store.existing_event_ids()?;
        let rows = select_new_rows(output.events(), &existing);
        if !rows.is_empty() {
            self.store.insert(&rows)?;
        }

        let stats = PipelineStats {
            new_rows: rows.len(),
            ..output.stats()
        };
        info!(
            events = stats.unique_events,
            large = stats.large_events,
            new_rows = stats.new_rows,
            total_area_ha = *stats.total_area,
            "pipeline run complete"
        );
        Ok(stats)
    }

    fn remember(&self, summary: &PipelineSummary) {
        let cached = CachedRun {
            summary: summary.clone(),
            completed_at: Utc::now(),
        };
        match self.cache.lock() {
            Ok(mut slot) => *slot = Some(cached),
            Err(e) => warn!(error = %e, "result cache unavailable"),
        }
    }

    /// Summary of the last completed run
    pub fn cached(&self) -> Option<CachedRun> {
        self.cache.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn status(&self) -> ServiceStatus {
        let cached = self.cached();
        let now = Utc::now();
        ServiceStatus {
            cache_available: cached.is_some(),
            cache_age_minutes: cached.as_ref().map(|c| c.age_minutes(now)),
            processing: self.guard.is_running(),
            last_update: cached.as_ref().map(|c| c.completed_at),
            stats: cached.and_then(|c| c.summary.stats),
        }
    }
}
