//! Error types for the fire-event pipeline
//!
//! Geometry failures come in two kinds. A degeneracy (a triangulation that
//! cannot be built, a boolean operation that blows up on near-coincident
//! edges) is local to one event and date, and the stage falls back to the
//! last known-good geometry. A non-finite coordinate means corrupt input or
//! a bug, and propagates.
//!
//! Stage-level emptiness is reported with one variant per stage so the caller
//! can tell "nothing came in" from "nothing qualified".

use thiserror::Error;

/// Failure of a geometric operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// Recoverable: fall back to the previous geometry for this event/date
    #[error("geometric degeneracy: {0}")]
    Degenerate(String),
    /// Unexpected: a coordinate is NaN or infinite
    #[error("non-finite coordinate in {context}")]
    NonFinite { context: &'static str },
}

impl GeometryError {
    /// Whether the fallback policy applies
    pub fn is_recoverable(&self) -> bool {
        matches!(self, GeometryError::Degenerate(_))
    }
}

/// Failure of the persistence/dedup gateway
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read event store: {0}")]
    Read(String),
    #[error("failed to write event store: {0}")]
    Write(String),
}

/// Failure of the detection source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to fetch detections: {0}")]
    Fetch(String),
    #[error("failed to parse detections: {0}")]
    Parse(String),
}

/// Pipeline-level failure, rendered into the run summary
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no fire detections to process")]
    NoDetections,
    #[error("no event reached the minimum of {min_detections} detections")]
    NoQualifyingEvents { min_detections: usize },
    #[error("no footprint could be built for any event")]
    NoFootprints,
    #[error("overlap resolution left no footprints")]
    NoExclusiveFootprints,
    #[error("no event intersects a known administrative region")]
    NoAttributedEvents,
    #[error("processing already in progress")]
    AlreadyRunning,
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl PipelineError {
    /// Whether this is one of the per-stage "nothing to do" outcomes
    pub fn is_empty_result(&self) -> bool {
        matches!(
            self,
            PipelineError::NoDetections
                | PipelineError::NoQualifyingEvents { .. }
                | PipelineError::NoFootprints
                | PipelineError::NoExclusiveFootprints
                | PipelineError::NoAttributedEvents
        )
    }
}
