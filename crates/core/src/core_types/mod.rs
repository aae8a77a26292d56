//! Core types shared by every pipeline stage

pub mod detection;
pub mod footprint;
pub mod region;
pub mod units;

pub use detection::{Confidence, Detection};
pub use footprint::{Footprint, AREA_TOLERANCE_M2};
pub use region::{AdminRegion, RegionNames, RegionProvider};
pub use units::{Hectares, Meters, SQUARE_METERS_PER_HECTARE};
