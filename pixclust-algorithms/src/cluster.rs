//! Working cluster accumulator.
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

use pixclust_core::clustering::ClusterizerConfig;
use pixclust_core::hit::{EventStatus, Hit};
use pixclust_core::record::ClusterSummary;

/// Final state of a grown cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClusterFate {
    /// Written to the output.
    Accepted,
    /// Fewer than `min_cluster_hits` or more than `max_cluster_hits` hits.
    RejectedBySize,
    /// A hit exceeded `max_cluster_hit_tot`.
    RejectedByTot,
}

/// Accumulates one cluster while it grows.
#[derive(Debug, Clone)]
pub(crate) struct WorkingCluster {
    pub(crate) size: usize,
    pub(crate) tot_sum: u32,
    pub(crate) max_tot: u16,
    /// Input index of the first hit with the largest TOT.
    pub(crate) seed: usize,
    weight_sum: f64,
    weighted_column: f64,
    weighted_row: f64,
    column_sum: f64,
    row_sum: f64,
    pub(crate) charge: f64,
    pub(crate) first_time_bucket: i16,
    pub(crate) last_time_bucket: i16,
    pub(crate) status: EventStatus,
    pub(crate) abort: bool,
}

impl WorkingCluster {
    /// Opens a cluster at its first hit.
    pub(crate) fn seeded(index: usize, hit: &Hit, charge: Option<f32>, max_hit_tot: u16) -> Self {
        let mut cluster = Self {
            size: 0,
            tot_sum: 0,
            max_tot: hit.tot,
            seed: index,
            weight_sum: 0.0,
            weighted_column: 0.0,
            weighted_row: 0.0,
            column_sum: 0.0,
            row_sum: 0.0,
            charge: 0.0,
            first_time_bucket: hit.time_bucket,
            last_time_bucket: hit.time_bucket,
            status: EventStatus::OK,
            abort: false,
        };
        cluster.add(index, hit, charge, max_hit_tot);
        cluster
    }

    /// Folds a hit into the accumulators.
    ///
    /// The centroid is weighted by charge when a calibration is present and
    /// by TOT otherwise.
    pub(crate) fn add(&mut self, index: usize, hit: &Hit, charge: Option<f32>, max_hit_tot: u16) {
        self.size += 1;
        self.tot_sum = self.tot_sum.saturating_add(u32::from(hit.tot));
        if hit.tot > self.max_tot {
            self.max_tot = hit.tot;
            self.seed = index;
        }
        if hit.tot > max_hit_tot {
            self.abort = true;
        }

        let weight = match charge {
            Some(charge) => {
                self.charge += f64::from(charge);
                f64::from(charge)
            }
            None => f64::from(hit.tot),
        };
        let column = f64::from(hit.column);
        let row = f64::from(hit.row);
        self.weight_sum += weight;
        self.weighted_column += weight * column;
        self.weighted_row += weight * row;
        self.column_sum += column;
        self.row_sum += row;

        self.first_time_bucket = self.first_time_bucket.min(hit.time_bucket);
        self.last_time_bucket = self.last_time_bucket.max(hit.time_bucket);
        self.status |= hit.event_status;
    }

    /// Weighted centroid; the plain mean if all weights are zero.
    pub(crate) fn centroid(&self) -> (f64, f64) {
        if self.weight_sum > 0.0 {
            (
                self.weighted_column / self.weight_sum,
                self.weighted_row / self.weight_sum,
            )
        } else {
            let n = self.size.max(1) as f64;
            (self.column_sum / n, self.row_sum / n)
        }
    }

    /// Applies the acceptance policy.
    pub(crate) fn fate(&self, config: &ClusterizerConfig) -> ClusterFate {
        if self.abort {
            ClusterFate::RejectedByTot
        } else if self.size < usize::from(config.min_cluster_hits)
            || self.size > usize::from(config.max_cluster_hits)
        {
            ClusterFate::RejectedBySize
        } else {
            ClusterFate::Accepted
        }
    }

    /// Summary record; only meaningful for accepted clusters.
    pub(crate) fn summary(&self, hits: &[Hit], cluster_id: u32) -> ClusterSummary {
        let seed = &hits[self.seed];
        let (centroid_column, centroid_row) = self.centroid();
        ClusterSummary {
            event_number: seed.event_number,
            cluster_id,
            size: self.size as u16,
            seed_column: seed.column,
            seed_row: seed.row,
            seed_time_bucket: seed.time_bucket,
            total_tot: self.tot_sum,
            max_tot: self.max_tot,
            centroid_column: centroid_column as f32,
            centroid_row: centroid_row as f32,
            total_charge: self.charge as f32,
            first_time_bucket: self.first_time_bucket,
            last_time_bucket: self.last_time_bucket,
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tot_weighted_centroid() {
        let hits = [Hit::new(0, 1, 1, 0, 5), Hit::new(0, 1, 2, 0, 3)];
        let mut cluster = WorkingCluster::seeded(0, &hits[0], None, 13);
        cluster.add(1, &hits[1], None, 13);

        let (column, row) = cluster.centroid();
        assert_relative_eq!(column, 1.0);
        assert_relative_eq!(row, 1.375);
        assert_eq!(cluster.tot_sum, 8);
        assert_eq!(cluster.seed, 0);
    }

    #[test]
    fn test_charge_weighted_centroid() {
        let hits = [Hit::new(0, 2, 0, 0, 5), Hit::new(0, 4, 0, 0, 5)];
        let mut cluster = WorkingCluster::seeded(0, &hits[0], Some(1.0), 13);
        cluster.add(1, &hits[1], Some(3.0), 13);

        let (column, _) = cluster.centroid();
        assert_relative_eq!(column, 3.5);
        assert_relative_eq!(cluster.charge, 4.0);
    }

    #[test]
    fn test_zero_weight_falls_back_to_mean() {
        let hits = [Hit::new(0, 2, 2, 0, 0), Hit::new(0, 3, 4, 0, 0)];
        let mut cluster = WorkingCluster::seeded(0, &hits[0], None, 13);
        cluster.add(1, &hits[1], None, 13);

        let (column, row) = cluster.centroid();
        assert_relative_eq!(column, 2.5);
        assert_relative_eq!(row, 3.0);
    }

    #[test]
    fn test_seed_is_first_highest_tot() {
        let hits = [
            Hit::new(0, 1, 1, 0, 2),
            Hit::new(0, 1, 2, 0, 6),
            Hit::new(0, 1, 3, 0, 6),
        ];
        let mut cluster = WorkingCluster::seeded(0, &hits[0], None, 13);
        cluster.add(1, &hits[1], None, 13);
        cluster.add(2, &hits[2], None, 13);
        assert_eq!(cluster.seed, 1);
        assert_eq!(cluster.max_tot, 6);
    }

    #[test]
    fn test_fate() {
        let config = ClusterizerConfig::new()
            .with_min_cluster_hits(2)
            .with_max_cluster_hits(3)
            .with_max_cluster_hit_tot(10);

        let hits = [
            Hit::new(0, 1, 1, 0, 2),
            Hit::new(0, 1, 2, 1, 4),
            Hit::new(0, 1, 3, 2, 11),
        ];
        let mut cluster = WorkingCluster::seeded(0, &hits[0], None, config.max_cluster_hit_tot);
        assert_eq!(cluster.fate(&config), ClusterFate::RejectedBySize);

        cluster.add(1, &hits[1], None, config.max_cluster_hit_tot);
        assert_eq!(cluster.fate(&config), ClusterFate::Accepted);
        assert_eq!((cluster.first_time_bucket, cluster.last_time_bucket), (0, 1));

        cluster.add(2, &hits[2], None, config.max_cluster_hit_tot);
        assert!(cluster.abort);
        assert_eq!(cluster.fate(&config), ClusterFate::RejectedByTot);
    }
}
