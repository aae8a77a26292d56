//! Fire Events Core Library
//!
//! Turns satellite thermal-anomaly detections into wildfire events: groups
//! of detections clustered in space and time, each carried as a sequence of
//! date-exclusive burn footprints, attributed to an administrative region
//! and scored by burned area and duration.
//!
//! ## Pipeline
//!
//! 1. [`clustering`]: spatio-temporal connected components over detections
//! 2. [`polygon`]: cumulative daily footprints from capped Delaunay triangles
//! 3. [`overlap`]: cumulative footprints become date-exclusive growth
//! 4. [`attribution`]: region join, metrics, external identifier
//! 5. [`gateway`]: large-event gate and dedup against the event store
//!
//! [`pipeline::run_pipeline`] drives stages 1-4; [`service::PipelineService`]
//! wraps the whole flow with the single-run guard and result cache.

// Core types and utilities
pub mod config;
pub mod core_types;
pub mod error;

// Pipeline stages
pub mod attribution;
pub mod clustering;
pub mod overlap;
pub mod polygon;

// Boundaries and drivers
pub mod gateway;
pub mod pipeline;
pub mod service;

// Re-export core types
pub use config::{DateWindow, PipelineConfig};
pub use core_types::{
    AdminRegion, Confidence, Detection, Footprint, Hectares, Meters, RegionNames, RegionProvider, AREA_TOLERANCE_M2,
};
pub use error::{GeometryError, PipelineError, SourceError, StoreError};

// Re-export stage entry points
pub use attribution::{attribute_events, Attribution, EventFootprint, FireEvent};
pub use clustering::{cluster_detections, Clustering, EventGroup};
pub use overlap::resolve_overlaps;
pub use polygon::{build_footprints, DailyFootprint, EventFootprints};

// Re-export boundary types
pub use gateway::{select_new_rows, DetectionSource, EventStore, FootprintRow, InMemoryEventStore};
pub use pipeline::{run_pipeline, PipelineOutput, PipelineStats, PipelineSummary};
pub use service::{PipelineService, ProcessingGuard, ServiceStatus};
