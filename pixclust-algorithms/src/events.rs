//! Helpers for event-aligned hit streams holding several events.

use crate::clusterizer::{Clusterizer, ClusterizerState};
use crate::output::{ClusterOutput, EventClusters};
use pixclust_core::charge::ChargeMap;
use pixclust_core::error::{ClusteringError, ConfigError, Result};
use pixclust_core::hit::Hit;
use pixclust_core::record::{ClusterHitRecord, ClusterSummary};
use rayon::prelude::*;

/// Iterator over the runs of equal event number in a hit slice.
#[derive(Debug, Clone)]
pub struct EventRuns<'a> {
    rest: &'a [Hit],
}

impl<'a> Iterator for EventRuns<'a> {
    type Item = &'a [Hit];

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.first()?;
        let len = self
            .rest
            .iter()
            .position(|hit| hit.event_number != first.event_number)
            .unwrap_or(self.rest.len());
        let (run, rest) = self.rest.split_at(len);
        self.rest = rest;
        Some(run)
    }
}

/// Splits an event-aligned hit slice into per-event runs.
#[must_use]
pub fn event_runs(hits: &[Hit]) -> EventRuns<'_> {
    EventRuns { rest: hits }
}

/// Checks that event numbers never decrease, so every event is one run.
///
/// # Errors
/// [`ClusteringError::DataOrder`] at the first hit whose event number is
/// smaller than its predecessor's.
pub fn check_event_order(hits: &[Hit]) -> std::result::Result<(), ClusteringError> {
    match hits
        .windows(2)
        .position(|pair| pair[1].event_number < pair[0].event_number)
    {
        Some(pos) => Err(ClusteringError::DataOrder {
            index: pos + 1,
            expected: hits[pos].event_number,
            found: hits[pos + 1].event_number,
        }),
        None => Ok(()),
    }
}

/// Totals over a clustered hit stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Events clustered.
    pub events: usize,
    /// Clusters written.
    pub clusters: usize,
    /// Cluster hit records written.
    pub cluster_hits: usize,
}

/// Clusters every event of an event-aligned stream into one output.
///
/// Processing stops at the first error; records written for earlier events
/// stay valid in `output`.
///
/// # Errors
/// [`ClusteringError::DataOrder`] if event numbers decrease, otherwise the
/// first error of [`Clusterizer::cluster_event`].
pub fn cluster_event_stream(
    clusterizer: &Clusterizer,
    hits: &[Hit],
    state: &mut ClusterizerState,
    output: &mut ClusterOutput<'_>,
) -> Result<StreamSummary> {
    check_event_order(hits)?;

    let mut summary = StreamSummary::default();
    for run in event_runs(hits) {
        let event = clusterizer.cluster_event(run, state, output)?;
        summary.events += 1;
        summary.clusters += event.clusters;
        summary.cluster_hits += event.cluster_hits;
    }
    Ok(summary)
}

/// Clusters the events of a stream in parallel.
///
/// Each rayon worker owns its own [`ClusterizerState`], seeded with a copy
/// of `charge` when given; results come back in input order. Output buffers
/// are sized per event so they never overflow.
///
/// # Errors
/// [`ConfigError::GeometryMismatch`] if `charge` does not cover the
/// clusterizer's geometry, [`ClusteringError::DataOrder`] if event numbers
/// decrease, otherwise the first error of [`Clusterizer::cluster_event`].
pub fn cluster_events_parallel(
    clusterizer: &Clusterizer,
    hits: &[Hit],
    charge: Option<&ChargeMap>,
) -> Result<Vec<EventClusters>> {
    if charge.is_some_and(|map| !map.fits(&clusterizer.config().geometry)) {
        return Err(ConfigError::GeometryMismatch.into());
    }
    check_event_order(hits)?;

    let runs: Vec<&[Hit]> = event_runs(hits).collect();
    let events = runs
        .par_iter()
        .map_init(
            || {
                let mut state = clusterizer.create_state();
                state.install_charge(charge);
                state
            },
            |state, run| cluster_owned(clusterizer, run, state),
        )
        .collect::<std::result::Result<Vec<_>, ClusteringError>>()?;
    Ok(events)
}

fn cluster_owned(
    clusterizer: &Clusterizer,
    run: &[Hit],
    state: &mut ClusterizerState,
) -> std::result::Result<EventClusters, ClusteringError> {
    let mut hits = vec![ClusterHitRecord::default(); run.len()];
    let mut clusters = vec![ClusterSummary::default(); run.len()];

    let mut output = ClusterOutput::new(&mut hits, &mut clusters);
    clusterizer.cluster_event(run, state, &mut output)?;
    let (n_hits, n_clusters) = (output.n_cluster_hits(), output.n_clusters());

    hits.truncate(n_hits);
    clusters.truncate(n_clusters);
    Ok(EventClusters {
        event_number: run.first().map_or(0, |hit| hit.event_number),
        hits,
        clusters,
    })
}
