//! pixclust-core: Core types for event-wise pixel hit clustering.
//!
//! This crate provides the hit and output record types, the clusterizer
//! configuration, the charge calibration lookup and the error taxonomy
//! shared by the clustering engine.
//!

pub mod charge;
pub mod clustering;
pub mod error;
pub mod hit;
pub mod record;

pub use charge::{ChargeLookup, ChargeMap};
pub use clustering::{ClusterizerConfig, ClusteringStatistics, MapGeometry};
pub use error::{ClusteringError, ConfigError, Error, Result};
pub use hit::{EventStatus, Hit};
pub use record::{ClusterHitRecord, ClusterSummary};
