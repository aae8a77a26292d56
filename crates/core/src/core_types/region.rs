//! Administrative regions used to attribute events

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

use super::footprint::Footprint;

/// Names of the administrative units an event is attributed to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RegionNames {
    /// First-level unit
    pub province: String,
    /// Second-level unit
    pub canton: String,
    /// Third-level unit
    pub parish: String,
}

/// One administrative polygon with its names, in the detections' CRS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminRegion {
    pub names: RegionNames,
    pub boundary: MultiPolygon<f64>,
}

impl AdminRegion {
    pub fn new(names: RegionNames, boundary: MultiPolygon<f64>) -> Self {
        Self { names, boundary }
    }

    /// Spatial-join predicate
    pub fn intersects(&self, footprint: &Footprint) -> bool {
        footprint.intersects_shape(&self.boundary)
    }
}

/// Supplies administrative regions, in a stable iteration order
pub trait RegionProvider {
    fn regions(&self) -> &[AdminRegion];
}

impl RegionProvider for Vec<AdminRegion> {
    fn regions(&self) -> &[AdminRegion] {
        self
    }
}

impl RegionProvider for [AdminRegion] {
    fn regions(&self) -> &[AdminRegion] {
        self
    }
}
