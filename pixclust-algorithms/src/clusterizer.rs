//! Bounded directional clusterizer.
//!
//! Key characteristics:
//! - Runtime linear in `dx * dy * d_bcid * hits`
//! - Dense (column, row, BCID) hit map reused across events
//! - Directional search that stops at the first empty cell per direction
//! - Explicit LIFO work list instead of recursion
//!
//! Seeds are taken in input order. From every claimed hit the engine probes,
//! for each time bucket in the window around the cluster's first hit, the
//! same pixel and then eight rays in the column/row plane. A ray ends at the
//! first empty cell, at the map edge, or after `dx`/`dy` steps. Claimed hits
//! are removed from the map so no hit can join two clusters.
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use crate::cluster::{ClusterFate, WorkingCluster};
use crate::hit_map::HitMap;
use crate::output::ClusterOutput;
use log::{debug, trace, warn};
use pixclust_core::charge::{ChargeLookup, ChargeMap};
use pixclust_core::clustering::{ClusterizerConfig, ClusteringStatistics};
use pixclust_core::error::{ClusteringError, ConfigError};
use pixclust_core::hit::Hit;

/// Planar search directions, column-major.
const DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// A map cell on the work list.
#[derive(Debug, Clone, Copy)]
struct Cell {
    column: i32,
    row: i32,
    time_bucket: i32,
}

impl Cell {
    fn of(hit: &Hit) -> Self {
        Self {
            column: i32::from(hit.column),
            row: i32::from(hit.row),
            time_bucket: i32::from(hit.time_bucket),
        }
    }
}

/// Counts written for one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventSummary {
    /// Event number, `None` for an empty hit slice.
    pub event_number: Option<u64>,
    /// Hits consumed.
    pub hits: usize,
    /// Clusters written.
    pub clusters: usize,
    /// Cluster hit records written.
    pub cluster_hits: usize,
}

/// Reusable buffers of the clusterizer.
///
/// Create one per worker with [`Clusterizer::create_state`]. The hit map is
/// cleared within its touched bounds before every event call returns.
#[derive(Debug, Clone)]
pub struct ClusterizerState {
    map: HitMap,
    charge: Option<ChargeMap>,
    frontier: Vec<Cell>,
    members: Vec<usize>,
    n_clusters: usize,
    stats: ClusteringStatistics,
}

impl ClusterizerState {
    /// Copies a charge calibration into the state's charge table.
    ///
    /// Cluster centroids are charge weighted from then on.
    pub fn set_charge_calibration<L: ChargeLookup + ?Sized>(&mut self, lookup: &L) {
        let geometry = *self.map.geometry();
        self.charge
            .get_or_insert_with(|| ChargeMap::new(&geometry))
            .fill(lookup);
    }

    /// Installs an already filled charge table.
    ///
    /// # Errors
    /// [`ConfigError::GeometryMismatch`] if the table does not cover the
    /// state's map geometry.
    pub fn set_charge_map(&mut self, charge: ChargeMap) -> Result<(), ConfigError> {
        if !charge.fits(self.map.geometry()) {
            return Err(ConfigError::GeometryMismatch);
        }
        self.charge = Some(charge);
        Ok(())
    }

    /// Copies a table already checked against the geometry.
    pub(crate) fn install_charge(&mut self, charge: Option<&ChargeMap>) {
        self.charge = charge.cloned();
    }

    /// The loaded charge table, if any.
    #[must_use]
    pub fn charge_map(&self) -> Option<&ChargeMap> {
        self.charge.as_ref()
    }

    /// Drops the charge calibration; centroids fall back to TOT weighting.
    pub fn clear_charge_calibration(&mut self) {
        self.charge = None;
    }

    /// Returns true if a charge calibration is loaded.
    #[must_use]
    pub fn has_charge_calibration(&self) -> bool {
        self.charge.is_some()
    }

    /// Number of clusters written for the last event.
    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Counters over all events since the last reset.
    #[must_use]
    pub fn statistics(&self) -> ClusteringStatistics {
        self.stats
    }

    /// Clears the hit map and all counters; keeps the charge calibration.
    pub fn reset(&mut self) {
        self.map.reset_touched();
        self.frontier.clear();
        self.members.clear();
        self.n_clusters = 0;
        self.stats = ClusteringStatistics::default();
    }

    /// Removes the hit in `cell` from the map and folds it into the cluster.
    ///
    /// Returns `None` if the cell is empty, otherwise whether the map has
    /// run out of hits.
    fn claim(
        &mut self,
        column: i32,
        row: i32,
        time_bucket: i32,
        hits: &[Hit],
        cluster: &mut WorkingCluster,
        max_hit_tot: u16,
    ) -> Option<bool> {
        let (_, index) = self.map.get(column, row, time_bucket)?;
        let exhausted = self.map.remove(column, row, time_bucket);
        let hit = &hits[index];
        let charge = self
            .charge
            .as_ref()
            .map(|map| map.charge(hit.column, hit.row, hit.tot));
        cluster.add(index, hit, charge, max_hit_tot);
        self.members.push(index);
        self.frontier.push(Cell {
            column,
            row,
            time_bucket,
        });
        Some(exhausted)
    }
}

/// Event-wise hit clusterizer.
#[derive(Debug, Clone)]
pub struct Clusterizer {
    config: ClusterizerConfig,
}

impl Clusterizer {
    /// Creates a clusterizer after validating the configuration.
    ///
    /// # Errors
    /// Returns the first violated configuration constraint.
    pub fn new(config: ClusterizerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &ClusterizerConfig {
        &self.config
    }

    /// Allocates the hit map and work buffers.
    #[must_use]
    pub fn create_state(&self) -> ClusterizerState {
        ClusterizerState {
            map: HitMap::new(self.config.geometry),
            charge: None,
            frontier: Vec::with_capacity(64),
            members: Vec::with_capacity(64),
            n_clusters: 0,
            stats: ClusteringStatistics::default(),
        }
    }

    /// Clusters the hits of one event and appends accepted clusters to `output`.
    ///
    /// Every hit ends up in exactly one cluster, written or rejected.
    ///
    /// # Errors
    /// - [`ClusteringError::Config`] if `state` was created for another geometry.
    /// - [`ClusteringError::DataOrder`] if the hits span several events.
    /// - [`ClusteringError::HitOutOfBounds`] / [`ClusteringError::DuplicateHit`]
    ///   for hits the map cannot hold.
    /// - [`ClusteringError::Capacity`] if `output` filled up. All hits are still
    ///   consumed; records written before the overflow stay valid and the
    ///   counts in the error cover the whole output.
    #[allow(clippy::too_many_lines)]
    pub fn cluster_event(
        &self,
        hits: &[Hit],
        state: &mut ClusterizerState,
        output: &mut ClusterOutput<'_>,
    ) -> Result<EventSummary, ClusteringError> {
        if *state.map.geometry() != self.config.geometry {
            return Err(ConfigError::GeometryMismatch.into());
        }
        state.n_clusters = 0;

        let Some(first) = hits.first() else {
            state.stats.events_processed += 1;
            return Ok(EventSummary::default());
        };
        let event_number = first.event_number;
        if let Some((index, hit)) = hits
            .iter()
            .enumerate()
            .find(|(_, hit)| hit.event_number != event_number)
        {
            return Err(ClusteringError::DataOrder {
                index,
                expected: event_number,
                found: hit.event_number,
            });
        }

        if let Err(err) = Self::fill_map(hits, state) {
            state.map.reset_touched();
            return Err(err);
        }

        let first_record = output.n_cluster_hits();
        let mut next_seed = 0;
        let mut cluster_id: u32 = 0;
        let mut dropped = 0;

        while !state.map.is_empty() {
            while !state.map.exists(
                i32::from(hits[next_seed].column),
                i32::from(hits[next_seed].row),
                i32::from(hits[next_seed].time_bucket),
            ) {
                next_seed += 1;
            }

            let cluster = self.grow(hits, next_seed, state);
            let fate = cluster.fate(&self.config);
            let emitted = match fate {
                ClusterFate::Accepted if dropped == 0 => {
                    let written = output.emit(
                        &cluster,
                        hits,
                        &state.members,
                        cluster_id,
                        self.config.late_hit_tot,
                    );
                    if written {
                        cluster_id += 1;
                        state.stats.clusters_found += 1;
                    } else {
                        warn!(
                            "output full in event {event_number}: {} clusters / {} hits written",
                            output.n_clusters(),
                            output.n_cluster_hits()
                        );
                        dropped += 1;
                    }
                    written
                }
                ClusterFate::Accepted => {
                    dropped += 1;
                    false
                }
                ClusterFate::RejectedBySize => {
                    trace!(
                        "event {event_number}: cluster of {} hits rejected by size",
                        cluster.size
                    );
                    state.stats.rejected_by_size += 1;
                    false
                }
                ClusterFate::RejectedByTot => {
                    trace!(
                        "event {event_number}: cluster with max TOT {} rejected",
                        cluster.max_tot
                    );
                    state.stats.rejected_by_tot += 1;
                    false
                }
            };
            if emitted {
                state.stats.hits_clustered += cluster.size;
            } else {
                state.stats.hits_rejected += cluster.size;
            }
        }
        state.map.reset_touched();

        output.finish_event(first_record, cluster_id);
        state.n_clusters = cluster_id as usize;
        state.stats.events_processed += 1;
        state.stats.hits_processed += hits.len();
        state.stats.dropped_by_capacity += dropped;

        debug!(
            "event {event_number}: {} hits -> {cluster_id} clusters",
            hits.len()
        );

        if dropped > 0 {
            return Err(ClusteringError::Capacity {
                clusters_written: output.n_clusters(),
                hits_written: output.n_cluster_hits(),
                clusters_dropped: dropped,
            });
        }

        Ok(EventSummary {
            event_number: Some(event_number),
            hits: hits.len(),
            clusters: cluster_id as usize,
            cluster_hits: output.n_cluster_hits() - first_record,
        })
    }

    fn fill_map(hits: &[Hit], state: &mut ClusterizerState) -> Result<(), ClusteringError> {
        for (index, hit) in hits.iter().enumerate() {
            state
                .map
                .put(hit.column, hit.row, hit.time_bucket, hit.tot, index)?;
        }
        Ok(())
    }

    /// Grows a cluster from `seed`, removing every claimed hit from the map.
    ///
    /// On return `state.members` lists the claimed input indices in claim order.
    fn grow(&self, hits: &[Hit], seed: usize, state: &mut ClusterizerState) -> WorkingCluster {
        let dx = i32::from(self.config.dx);
        let dy = i32::from(self.config.dy);
        let d_bcid = i32::from(self.config.d_bcid);
        let last_bucket = i32::from(self.config.geometry.time_buckets) - 1;
        let max_hit_tot = self.config.max_cluster_hit_tot;

        let origin = Cell::of(&hits[seed]);
        let t_lo = (origin.time_bucket - d_bcid).max(0);
        let t_hi = (origin.time_bucket + d_bcid).min(last_bucket);

        state.frontier.clear();
        state.members.clear();
        let exhausted = state
            .map
            .remove(origin.column, origin.row, origin.time_bucket);
        let seed_charge = state
            .charge
            .as_ref()
            .map(|map| map.charge(hits[seed].column, hits[seed].row, hits[seed].tot));
        let mut cluster = WorkingCluster::seeded(seed, &hits[seed], seed_charge, max_hit_tot);
        state.members.push(seed);
        if exhausted {
            return cluster;
        }
        state.frontier.push(origin);

        'grow: while let Some(cell) = state.frontier.pop() {
            for time_bucket in t_lo..=t_hi {
                if time_bucket != cell.time_bucket
                    && state.claim(
                        cell.column,
                        cell.row,
                        time_bucket,
                        hits,
                        &mut cluster,
                        max_hit_tot,
                    ) == Some(true)
                {
                    break 'grow;
                }
                for (dc, dr) in DIRECTIONS {
                    let reach = match (dc, dr) {
                        (0, _) => dy,
                        (_, 0) => dx,
                        _ => dx.min(dy),
                    };
                    for step in 1..=reach {
                        match state.claim(
                            cell.column + dc * step,
                            cell.row + dr * step,
                            time_bucket,
                            hits,
                            &mut cluster,
                            max_hit_tot,
                        ) {
                            None => break,
                            Some(true) => break 'grow,
                            Some(false) => {}
                        }
                    }
                }
            }
        }
        state.frontier.clear();
        cluster
    }
}
