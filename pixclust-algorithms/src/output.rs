//! Result builder writing accepted clusters into caller-owned buffers.
#![allow(clippy::cast_possible_truncation)]

use crate::cluster::WorkingCluster;
use pixclust_core::hit::Hit;
use pixclust_core::record::{ClusterHitRecord, ClusterSummary};

/// Caller-provided output buffers with fill counters.
///
/// The declared capacity of each buffer is its slice length. Records are
/// appended cluster by cluster; a cluster that does not fit completely is
/// not written at all and the output is marked truncated. Nothing is ever
/// written past the end of either slice.
#[derive(Debug)]
pub struct ClusterOutput<'a> {
    hits: &'a mut [ClusterHitRecord],
    clusters: &'a mut [ClusterSummary],
    n_hits: usize,
    n_clusters: usize,
    truncated: bool,
}

impl<'a> ClusterOutput<'a> {
    /// Wraps empty output buffers.
    pub fn new(hits: &'a mut [ClusterHitRecord], clusters: &'a mut [ClusterSummary]) -> Self {
        Self {
            hits,
            clusters,
            n_hits: 0,
            n_clusters: 0,
            truncated: false,
        }
    }

    /// Capacity of the cluster hit buffer.
    #[must_use]
    pub fn hit_capacity(&self) -> usize {
        self.hits.len()
    }

    /// Capacity of the cluster summary buffer.
    #[must_use]
    pub fn cluster_capacity(&self) -> usize {
        self.clusters.len()
    }

    /// Cluster hit records written so far.
    #[must_use]
    pub fn cluster_hits(&self) -> &[ClusterHitRecord] {
        &self.hits[..self.n_hits]
    }

    /// Cluster summaries written so far.
    #[must_use]
    pub fn clusters(&self) -> &[ClusterSummary] {
        &self.clusters[..self.n_clusters]
    }

    /// Number of cluster hit records written.
    #[must_use]
    pub fn n_cluster_hits(&self) -> usize {
        self.n_hits
    }

    /// Number of cluster summaries written.
    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Returns true if a cluster was dropped for lack of space.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Forgets all written records so the buffers can be refilled.
    pub fn clear(&mut self) {
        self.n_hits = 0;
        self.n_clusters = 0;
        self.truncated = false;
    }

    /// Appends an accepted cluster.
    ///
    /// Returns false, writes nothing and marks the output truncated if either
    /// buffer lacks room for the whole cluster.
    pub(crate) fn emit(
        &mut self,
        cluster: &WorkingCluster,
        hits: &[Hit],
        members: &[usize],
        cluster_id: u32,
        late_hit_tot: u16,
    ) -> bool {
        if self.n_clusters + 1 > self.clusters.len() || self.n_hits + members.len() > self.hits.len()
        {
            self.truncated = true;
            return false;
        }

        self.clusters[self.n_clusters] = cluster.summary(hits, cluster_id);
        self.n_clusters += 1;

        let size = members.len() as u16;
        for (slot, &index) in self.hits[self.n_hits..].iter_mut().zip(members) {
            let hit = &hits[index];
            *slot = ClusterHitRecord {
                event_number: hit.event_number,
                cluster_id,
                column: hit.column,
                row: hit.row,
                time_bucket: hit.time_bucket,
                tot: hit.tot,
                is_seed: index == cluster.seed,
                is_late: hit.tot >= late_hit_tot,
                cluster_size: size,
                n_clusters: 0,
            };
        }
        self.n_hits += members.len();
        true
    }

    /// Back-fills the event's cluster count into its hit records.
    pub(crate) fn finish_event(&mut self, first_hit: usize, n_clusters: u32) {
        for record in &mut self.hits[first_hit..self.n_hits] {
            record.n_clusters = n_clusters;
        }
    }
}

/// Owned results of one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventClusters {
    /// Event number.
    pub event_number: u64,
    /// Member hits of the accepted clusters.
    pub hits: Vec<ClusterHitRecord>,
    /// Accepted cluster summaries.
    pub clusters: Vec<ClusterSummary>,
}

impl EventClusters {
    /// Number of accepted clusters.
    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.clusters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_hit_cluster(hits: &[Hit]) -> WorkingCluster {
        let mut cluster = WorkingCluster::seeded(0, &hits[0], None, 13);
        cluster.add(1, &hits[1], None, 13);
        cluster
    }

    #[test]
    fn test_emit_flags_seed_and_late() {
        let hits = [Hit::new(7, 1, 1, 0, 14), Hit::new(7, 1, 2, 0, 3)];
        let cluster = two_hit_cluster(&hits);

        let mut hit_buf = [ClusterHitRecord::default(); 4];
        let mut cluster_buf = [ClusterSummary::default(); 2];
        let mut output = ClusterOutput::new(&mut hit_buf, &mut cluster_buf);

        assert!(output.emit(&cluster, &hits, &[0, 1], 0, 14));
        output.finish_event(0, 1);

        assert_eq!(output.n_clusters(), 1);
        assert_eq!(output.n_cluster_hits(), 2);
        let records = output.cluster_hits();
        assert!(records[0].is_seed && records[0].is_late);
        assert!(!records[1].is_seed && !records[1].is_late);
        assert!(records.iter().all(|r| r.cluster_size == 2 && r.n_clusters == 1));
        assert_eq!(output.clusters()[0].event_number, 7);
        assert!(!output.is_truncated());
    }

    #[test]
    fn test_emit_never_overruns() {
        let hits = [Hit::new(0, 1, 1, 0, 5), Hit::new(0, 1, 2, 0, 3)];
        let cluster = two_hit_cluster(&hits);

        let mut hit_buf = [ClusterHitRecord::default(); 3];
        let mut cluster_buf = [ClusterSummary::default(); 4];
        let mut output = ClusterOutput::new(&mut hit_buf, &mut cluster_buf);

        assert!(output.emit(&cluster, &hits, &[0, 1], 0, 14));
        assert!(!output.emit(&cluster, &hits, &[0, 1], 1, 14));
        assert!(output.is_truncated());
        assert_eq!(output.n_clusters(), 1);
        assert_eq!(output.n_cluster_hits(), 2);

        output.clear();
        assert!(!output.is_truncated());
        assert!(output.cluster_hits().is_empty());
    }

    #[test]
    fn test_emit_respects_cluster_capacity() {
        let hits = [Hit::new(0, 1, 1, 0, 5), Hit::new(0, 1, 2, 0, 3)];
        let cluster = two_hit_cluster(&hits);

        let mut hit_buf = [ClusterHitRecord::default(); 8];
        let mut cluster_buf: [ClusterSummary; 0] = [];
        let mut output = ClusterOutput::new(&mut hit_buf, &mut cluster_buf);

        assert!(!output.emit(&cluster, &hits, &[0, 1], 0, 14));
        assert_eq!(output.n_cluster_hits(), 0);
        assert!(output.is_truncated());
    }
}
