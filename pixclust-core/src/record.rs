//! Output records written for accepted clusters.

use crate::hit::EventStatus;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One member hit of an accepted cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterHitRecord {
    /// Event number of the hit.
    pub event_number: u64,
    /// Cluster ID, counting from 0 within the event.
    pub cluster_id: u32,
    /// Pixel column.
    pub column: u16,
    /// Pixel row.
    pub row: u16,
    /// Relative time bucket (BCID).
    pub time_bucket: i16,
    /// Time over threshold.
    pub tot: u16,
    /// Set on the seed hit of the cluster.
    pub is_seed: bool,
    /// Set if the TOT is at or above the late hit threshold.
    pub is_late: bool,
    /// Number of hits in the cluster.
    pub cluster_size: u16,
    /// Number of clusters written for the event.
    pub n_clusters: u32,
}

/// Per-cluster summary of an accepted cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterSummary {
    /// Event number of the cluster.
    pub event_number: u64,
    /// Cluster ID, counting from 0 within the event.
    pub cluster_id: u32,
    /// Number of hits.
    pub size: u16,
    /// Column of the seed hit.
    pub seed_column: u16,
    /// Row of the seed hit.
    pub seed_row: u16,
    /// Time bucket of the seed hit.
    pub seed_time_bucket: i16,
    /// Sum of TOT over all hits.
    pub total_tot: u32,
    /// Largest TOT of any hit.
    pub max_tot: u16,
    /// Weighted mean column.
    pub centroid_column: f32,
    /// Weighted mean row.
    pub centroid_row: f32,
    /// Sum of calibrated charge; zero without a charge calibration.
    pub total_charge: f32,
    /// Earliest time bucket of any hit.
    pub first_time_bucket: i16,
    /// Latest time bucket of any hit.
    pub last_time_bucket: i16,
    /// Event status of the hits.
    pub status: EventStatus,
}

impl ClusterSummary {
    /// Number of time buckets spanned by the cluster.
    #[must_use]
    pub fn time_span(&self) -> u16 {
        self.last_time_bucket.abs_diff(self.first_time_bucket) + 1
    }
}
