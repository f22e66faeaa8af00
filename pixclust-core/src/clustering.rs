//! Clustering configuration and statistics.

use crate::error::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dimensions of the hit map and charge table.
///
/// Coordinates are used as direct indices, so the bounds are exclusive:
/// a hit with `column == columns` is outside the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MapGeometry {
    /// Number of addressable columns.
    pub columns: u16,
    /// Number of addressable rows.
    pub rows: u16,
    /// Number of relative time buckets (BCIDs) per event.
    pub time_buckets: u16,
    /// Number of TOT codes covered by the charge table.
    pub tot_bins: u16,
}

impl Default for MapGeometry {
    fn default() -> Self {
        Self::fe_i4()
    }
}

impl MapGeometry {
    /// FE-I4 single chip: columns 1..=80, rows 1..=336, 16 BCIDs, 4-bit TOT.
    #[must_use]
    pub fn fe_i4() -> Self {
        Self {
            columns: 81,
            rows: 337,
            time_buckets: 16,
            tot_bins: 16,
        }
    }

    /// Creates a custom geometry.
    #[must_use]
    pub fn new(columns: u16, rows: u16, time_buckets: u16, tot_bins: u16) -> Self {
        Self {
            columns,
            rows,
            time_buckets,
            tot_bins,
        }
    }

    /// Number of cells in one time bucket.
    #[inline]
    #[must_use]
    pub fn plane_len(&self) -> usize {
        usize::from(self.columns) * usize::from(self.rows)
    }

    /// Number of cells in the full hit map.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.plane_len() * usize::from(self.time_buckets)
    }

    /// Returns true if any dimension is zero.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks that every dimension is non-zero.
    ///
    /// # Errors
    /// Returns [`ConfigError::EmptyGeometry`] naming the first zero dimension.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dims = [
            ("columns", self.columns),
            ("rows", self.rows),
            ("time_buckets", self.time_buckets),
            ("tot_bins", self.tot_bins),
        ];
        match dims.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(ConfigError::EmptyGeometry(name)),
            None => Ok(()),
        }
    }
}

/// Search windows and acceptance thresholds of the clusterizer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterizerConfig {
    /// Maximum column distance searched around a hit.
    pub dx: u16,
    /// Maximum row distance searched around a hit.
    pub dy: u16,
    /// Time window (in BCIDs) around the first hit of a cluster.
    pub d_bcid: u16,
    /// Clusters with fewer hits are omitted.
    pub min_cluster_hits: u16,
    /// Clusters with more hits are omitted.
    pub max_cluster_hits: u16,
    /// Clusters containing a hit above this TOT are omitted.
    pub max_cluster_hit_tot: u16,
    /// Hits at or above this TOT are flagged as late.
    pub late_hit_tot: u16,
    /// Hit map dimensions.
    pub geometry: MapGeometry,
}

impl Default for ClusterizerConfig {
    fn default() -> Self {
        Self {
            dx: 1,
            dy: 2,
            d_bcid: 4,
            min_cluster_hits: 1,
            max_cluster_hits: 9,
            max_cluster_hit_tot: 13,
            late_hit_tot: 14,
            geometry: MapGeometry::fe_i4(),
        }
    }
}

impl ClusterizerConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the column and row search distances.
    #[must_use]
    pub fn with_distance(mut self, dx: u16, dy: u16) -> Self {
        self.dx = dx;
        self.dy = dy;
        self
    }

    /// Sets the BCID window.
    #[must_use]
    pub fn with_bcid_window(mut self, d_bcid: u16) -> Self {
        self.d_bcid = d_bcid;
        self
    }

    /// Sets the minimum cluster size.
    #[must_use]
    pub fn with_min_cluster_hits(mut self, hits: u16) -> Self {
        self.min_cluster_hits = hits;
        self
    }

    /// Sets the maximum cluster size.
    #[must_use]
    pub fn with_max_cluster_hits(mut self, hits: u16) -> Self {
        self.max_cluster_hits = hits;
        self
    }

    /// Sets the maximum TOT allowed for any cluster hit.
    #[must_use]
    pub fn with_max_cluster_hit_tot(mut self, tot: u16) -> Self {
        self.max_cluster_hit_tot = tot;
        self
    }

    /// Sets the TOT from which a hit counts as late.
    #[must_use]
    pub fn with_late_hit_tot(mut self, tot: u16) -> Self {
        self.late_hit_tot = tot;
        self
    }

    /// Sets the hit map geometry.
    #[must_use]
    pub fn with_geometry(mut self, geometry: MapGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Validates windows, thresholds and geometry.
    ///
    /// Distances and TOT thresholds are unsigned and therefore always valid.
    ///
    /// # Errors
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_cluster_hits == 0 {
            return Err(ConfigError::ZeroMinClusterHits);
        }
        if self.max_cluster_hits < self.min_cluster_hits {
            return Err(ConfigError::ClusterHitsRange {
                min: self.min_cluster_hits,
                max: self.max_cluster_hits,
            });
        }
        self.geometry.validate()
    }
}

/// Counters accumulated over all events processed with one state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringStatistics {
    /// Events clustered.
    pub events_processed: usize,
    /// Hits consumed.
    pub hits_processed: usize,
    /// Hits in clusters written to the output.
    pub hits_clustered: usize,
    /// Hits in clusters that were omitted, for any reason.
    pub hits_rejected: usize,
    /// Clusters written to the output.
    pub clusters_found: usize,
    /// Clusters omitted because of their size.
    pub rejected_by_size: usize,
    /// Clusters omitted because a hit exceeded the TOT limit.
    pub rejected_by_tot: usize,
    /// Accepted clusters that did not fit into the output buffers.
    pub dropped_by_capacity: usize,
}

impl ClusteringStatistics {
    /// Total clusters formed, whatever their fate.
    #[must_use]
    pub fn clusters_formed(&self) -> usize {
        self.clusters_found + self.rejected_by_size + self.rejected_by_tot + self.dropped_by_capacity
    }

    /// Adds the counters of another statistics block.
    pub fn merge(&mut self, other: &Self) {
        self.events_processed += other.events_processed;
        self.hits_processed += other.hits_processed;
        self.hits_clustered += other.hits_clustered;
        self.hits_rejected += other.hits_rejected;
        self.clusters_found += other.clusters_found;
        self.rejected_by_size += other.rejected_by_size;
        self.rejected_by_tot += other.rejected_by_tot;
        self.dropped_by_capacity += other.dropped_by_capacity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ClusterizerConfig::default();
        assert_eq!(config.dx, 1);
        assert_eq!(config.dy, 2);
        assert_eq!(config.d_bcid, 4);
        assert_eq!(config.max_cluster_hits, 9);
        assert_eq!(config.geometry, MapGeometry::fe_i4());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ClusterizerConfig::new()
            .with_distance(2, 3)
            .with_bcid_window(0)
            .with_min_cluster_hits(2)
            .with_max_cluster_hits(50)
            .with_max_cluster_hit_tot(15)
            .with_late_hit_tot(12);

        assert_eq!((config.dx, config.dy), (2, 3));
        assert_eq!(config.d_bcid, 0);
        assert_eq!(config.min_cluster_hits, 2);
        assert_eq!(config.max_cluster_hits, 50);
        assert_eq!(config.max_cluster_hit_tot, 15);
        assert_eq!(config.late_hit_tot, 12);
    }

    #[test]
    fn test_config_validation() {
        let config = ClusterizerConfig::new().with_min_cluster_hits(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroMinClusterHits));

        let config = ClusterizerConfig::new()
            .with_min_cluster_hits(5)
            .with_max_cluster_hits(4);
        assert_eq!(
            config.validate(),
            Err(ConfigError::ClusterHitsRange { min: 5, max: 4 })
        );

        let config = ClusterizerConfig::new().with_geometry(MapGeometry::new(80, 336, 0, 16));
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyGeometry("time_buckets"))
        );
    }

    #[test]
    fn test_geometry_len() {
        let geometry = MapGeometry::new(4, 3, 2, 1);
        assert_eq!(geometry.plane_len(), 12);
        assert_eq!(geometry.len(), 24);
        assert!(!geometry.is_empty());
        assert!(MapGeometry::new(0, 3, 2, 1).is_empty());
    }

    #[test]
    fn test_statistics_merge() {
        let mut total = ClusteringStatistics::default();
        let part = ClusteringStatistics {
            events_processed: 1,
            hits_processed: 10,
            hits_clustered: 6,
            hits_rejected: 4,
            clusters_found: 3,
            rejected_by_size: 1,
            rejected_by_tot: 1,
            dropped_by_capacity: 0,
        };
        total.merge(&part);
        total.merge(&part);
        assert_eq!(total.hits_processed, 20);
        assert_eq!(total.hits_clustered + total.hits_rejected, 20);
        assert_eq!(total.clusters_formed(), 10);
    }
}
