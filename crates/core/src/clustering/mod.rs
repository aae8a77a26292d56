//! Spatio-temporal event clustering
//!
//! Two detections A and B are linked when B is observed on the same day as A
//! or up to `time_lag_days` after it, and lies within `distance_threshold` of
//! A. Events are the connected components of that link graph.
//!
//! # Algorithm
//!
//! Detections are visited in ascending date order. Each unassigned detection
//! seeds a new group, which is then grown breadth-first: every member of the
//! current frontier claims its still-unassigned linked neighbours, and those
//! become the next frontier. Growth stops when a frontier claims nothing.
//!
//! The link test is directional in time. A frontier member may claim a
//! neighbour observed before it as long as that neighbour links forward to
//! it, so membership propagates both ways and the result is the undirected
//! transitive closure.
//! Exploration order only affects group numbering, which has no meaning
//! outside one run.
//!
//! Neighbour candidates come from an R-tree keyed by position; the date
//! window and the exact distance are then checked per candidate.

mod index;

pub use index::DetectionIndex;

use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::core_types::Detection;

/// Detections believed to belong to one fire
#[derive(Debug, Clone, PartialEq)]
pub struct EventGroup {
    /// Run-local sequence number, starting at 1
    pub event_seq: u32,
    /// Members, in date order
    pub detections: Vec<Detection>,
}

impl EventGroup {
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

/// Outcome of clustering one batch
#[derive(Debug, Default)]
pub struct Clustering {
    /// Groups that passed the minimum-size filter
    pub groups: Vec<EventGroup>,
    /// Number of detections clustered
    pub input_detections: usize,
    /// Number of connected components before filtering
    pub groups_formed: usize,
}

impl Clustering {
    /// Components rejected as noise
    pub fn groups_dropped(&self) -> usize {
        self.groups_formed - self.groups.len()
    }
}

/// Whether `later` is linked from `earlier`
#[inline]
pub fn is_linked(earlier: &Detection, later: &Detection, config: &PipelineConfig) -> bool {
    let gap = earlier.days_until(later);
    (0..=config.time_lag_days).contains(&gap)
        && earlier.distance_to(later) <= config.distance_limit()
}

/// Whether two detections are linked in either time direction
#[inline]
pub fn is_adjacent(a: &Detection, b: &Detection, config: &PipelineConfig) -> bool {
    is_linked(a, b, config) || is_linked(b, a, config)
}

/// Partition detections into event groups and drop the small ones.
///
/// Returns an empty `groups` list, not an error, when the input is empty or
/// every component is below `min_event_detections`.
pub fn cluster_detections(mut detections: Vec<Detection>, config: &PipelineConfig) -> Clustering {
    let input_detections = detections.len();
    if detections.is_empty() {
        return Clustering::default();
    }

    detections.sort_by_key(|d| d.date);
    let index = DetectionIndex::build(&detections);

    let mut assigned = vec![false; detections.len()];
    let mut components: Vec<Vec<usize>> = Vec::new();

    for seed in 0..detections.len() {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;

        let mut members = vec![seed];
        let mut frontier = vec![seed];

        while !frontier.is_empty() {
            let mut next = Vec::new();

            for &base in &frontier {
                let origin = &detections[base];
                for candidate in index.within(origin.position, config.distance_threshold) {
                    if !assigned[candidate] && is_adjacent(origin, &detections[candidate], config) {
                        assigned[candidate] = true;
                        next.push(candidate);
                    }
                }
            }

            members.extend_from_slice(&next);
            frontier = next;
        }

        components.push(members);
    }

    let groups_formed = components.len();

    // Move detections out by slot so each ends up owned by exactly one group
    let mut slots: Vec<Option<Detection>> = detections.into_iter().map(Some).collect();
    let mut groups = Vec::new();

    for (seq, mut members) in (1u32..).zip(components) {
        if members.len() < config.min_event_detections {
            continue;
        }
        members.sort_unstable();
        let detections: Vec<Detection> =
            members.iter().filter_map(|&slot| slots[slot].take()).collect();
        debug!(event_seq = seq, detections = detections.len(), "event group formed");
        groups.push(EventGroup {
            event_seq: seq,
            detections,
        });
    }

    info!(
        detections = input_detections,
        groups_formed,
        groups_kept = groups.len(),
        min_detections = config.min_event_detections,
        "clustered detections into events"
    );

    Clustering {
        groups,
        input_detections,
        groups_formed,
    }
}
