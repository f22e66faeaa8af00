//! Error types for pixclust-core.

use thiserror::Error;

/// Result type alias for pixclust operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for pixclust operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Clustering error.
    #[error("clustering error: {0}")]
    Clustering(#[from] ClusteringError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Invalid clustering window, threshold or map geometry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A cluster needs at least one hit.
    #[error("min_cluster_hits must be at least 1")]
    ZeroMinClusterHits,

    /// Upper size bound below the lower one.
    #[error("max_cluster_hits ({max}) is smaller than min_cluster_hits ({min})")]
    ClusterHitsRange { min: u16, max: u16 },

    /// A map dimension is zero.
    #[error("map geometry dimension `{0}` must be non-zero")]
    EmptyGeometry(&'static str),

    /// State buffers were allocated for a different geometry.
    #[error("clusterizer state was created for a different map geometry")]
    GeometryMismatch,
}

/// Errors raised while clustering one event.
///
/// Rejected clusters (too large, too small, too much TOT) are not errors;
/// they show up in the clustering statistics only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClusteringError {
    /// Invalid configuration detected before any hit was touched.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Hits of different events were passed in one call, or event runs are not increasing.
    #[error("hit {index} belongs to event {found}, expected event {expected}")]
    DataOrder {
        index: usize,
        expected: u64,
        found: u64,
    },

    /// Two hits occupy the same cell.
    #[error(
        "hits {first} and {second} share pixel ({column}, {row}) in time bucket {time_bucket}"
    )]
    DuplicateHit {
        column: u16,
        row: u16,
        time_bucket: i16,
        first: usize,
        second: usize,
    },

    /// Hit coordinate outside the configured map geometry.
    #[error("hit {index} at ({column}, {row}, {time_bucket}) is outside the hit map")]
    HitOutOfBounds {
        index: usize,
        column: u16,
        row: u16,
        time_bucket: i16,
    },

    /// Output buffers too small; results written before the overflow stay valid.
    #[error(
        "output buffers full after {clusters_written} clusters / {hits_written} hits, \
         {clusters_dropped} clusters dropped"
    )]
    Capacity {
        clusters_written: usize,
        hits_written: usize,
        clusters_dropped: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ClusteringError::DuplicateHit {
            column: 3,
            row: 7,
            time_bucket: 2,
            first: 0,
            second: 4,
        };
        assert_eq!(
            err.to_string(),
            "hits 0 and 4 share pixel (3, 7) in time bucket 2"
        );

        let err: Error = ConfigError::ZeroMinClusterHits.into();
        assert!(matches!(err, Error::Config(ConfigError::ZeroMinClusterHits)));
    }
}
