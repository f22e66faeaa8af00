//! pixclust-algorithms: Event-wise clustering of pixel detector hits.
//!
//! This crate provides:
//! - **`HitMap`** - dense (column, row, BCID) occupancy and index maps
//! - **`Clusterizer`** - bounded directional cluster growth, O(dx·dy·BCID) per hit
//! - **`ClusterOutput`** - result builder over caller-owned buffers
//! - Event stream helpers, sequential and rayon-parallel
//!
#![warn(missing_docs)]

mod cluster;
mod clusterizer;
mod events;
pub mod hit_map;
mod output;

pub use clusterizer::{Clusterizer, ClusterizerState, EventSummary};
pub use events::{
    check_event_order, cluster_event_stream, cluster_events_parallel, event_runs, EventRuns,
    StreamSummary,
};
pub use hit_map::HitMap;
pub use output::{ClusterOutput, EventClusters};

// Re-export core types
pub use pixclust_core::clustering::{ClusterizerConfig, ClusteringStatistics, MapGeometry};
