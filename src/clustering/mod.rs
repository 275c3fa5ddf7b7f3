//! Spatial clustering of incident locations.
//!
//! Every call to [`PointClusterer::fit`] returns a fresh, immutable
//! [`ClusterModel`]; nothing is retained between calls. Callers that need
//! the same grouping again keep the model (or the seed) themselves.

pub mod kmeans;

pub use kmeans::LloydKMeans;

use crate::error::PatrolResult;
use crate::incident::{Coordinate, Incident};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trait for clustering strategies
pub trait PointClusterer {
    /// Group `points` into at most `k` clusters. `k` is clamped to `[1, points.len()]`.
    fn fit(&self, points: &[Coordinate], k: usize) -> PatrolResult<ClusterModel>;
    fn name(&self) -> &str;
}

/// Clamp a requested cluster count to `[1, n]`. Returns 0 only when there are no points.
pub fn clamp_cluster_count(k: usize, n: usize) -> usize {
    if n == 0 {
        0
    } else {
        k.clamp(1, n)
    }
}

/// Result of one clustering run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterModel {
    /// Cluster id of each input point, in input order
    pub labels: Vec<usize>,
    /// Centroid of each cluster, indexed by cluster id
    pub centroids: Vec<Coordinate>,
    /// Number of relocation passes performed
    pub iterations: usize,
    /// Whether the assignment stopped changing before the iteration cap
    pub converged: bool,
    /// Number of empty clusters that had to be reseeded
    pub reseeds: usize,
    pub seed: u64,
    pub algorithm: String,
    pub trained_at: DateTime<Utc>,
}

impl ClusterModel {
    /// Model for an empty input.
    pub fn empty(seed: u64, algorithm: &str) -> Self {
        ClusterModel {
            labels: Vec::new(),
            centroids: Vec::new(),
            iterations: 0,
            converged: true,
            reseeds: 0,
            seed,
            algorithm: algorithm.to_string(),
            trained_at: Utc::now(),
        }
    }

    pub fn num_clusters(&self) -> usize {
        self.centroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Member count per cluster id.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }

    /// Nearest centroid for a new location (ties go to the lower id).
    pub fn predict(&self, point: &Coordinate) -> Option<usize> {
        let mut best = None;
        let mut best_dist = f64::INFINITY;
        for (c, centroid) in self.centroids.iter().enumerate() {
            let d = point.dist2(centroid);
            if d < best_dist {
                best_dist = d;
                best = Some(c);
            }
        }
        best
    }

    /// Map each incident id to its cluster. `incidents` must be the records the
    /// model was fitted on, in the same order.
    ///
    /// Ids are expected to be unique. When an id repeats, the later record's
    /// cluster replaces the earlier one and the assignment is shorter than
    /// `incidents`.
    pub fn assignment(&self, incidents: &[Incident]) -> ClusterAssignment {
        debug_assert_eq!(incidents.len(), self.labels.len());
        ClusterAssignment {
            clusters: incidents
                .iter()
                .zip(self.labels.iter())
                .map(|(incident, &label)| (incident.id, label))
                .collect(),
        }
    }
}

/// Incident id -> cluster id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    clusters: HashMap<u64, usize>,
}

impl ClusterAssignment {
    pub fn get(&self, incident_id: u64) -> Option<usize> {
        self.clusters.get(&incident_id).copied()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, usize)> + '_ {
        self.clusters.iter().map(|(&id, &c)| (id, c))
    }

    /// Sorted incident ids belonging to `cluster`.
    pub fn members(&self, cluster: usize) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .clusters
            .iter()
            .filter(|&(_, &c)| c == cluster)
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_model() -> ClusterModel {
        let mut model = ClusterModel::empty(42, "test");
        model.labels = vec![0, 1, 1, 0];
        model.centroids = vec![Coordinate::new(0.0, 0.0), Coordinate::new(2.0, 2.0)];
        model
    }

    #[test]
    fn test_clamp_cluster_count() {
        assert_eq!(clamp_cluster_count(5, 0), 0);
        assert_eq!(clamp_cluster_count(0, 3), 1);
        assert_eq!(clamp_cluster_count(10, 3), 3);
        assert_eq!(clamp_cluster_count(2, 3), 2);
    }

    #[test]
    fn test_predict_nearest_centroid() {
        let model = create_test_model();
        assert_eq!(model.predict(&Coordinate::new(0.1, 0.2)), Some(0));
        assert_eq!(model.predict(&Coordinate::new(1.9, 2.5)), Some(1));
        // equidistant goes to the lower id
        assert_eq!(model.predict(&Coordinate::new(1.0, 1.0)), Some(0));
        assert_eq!(ClusterModel::empty(1, "x").predict(&Coordinate::new(0.0, 0.0)), None);
    }

    #[test]
    fn test_assignment_covers_every_incident() {
        let model = create_test_model();
        let incidents: Vec<Incident> = (0..4).map(|i| Incident::new(100 + i, 0.0, 0.0)).collect();
        let assignment = model.assignment(&incidents);

        assert_eq!(assignment.len(), 4);
        assert_eq!(assignment.get(101), Some(1));
        assert_eq!(assignment.members(0), vec![100, 103]);
        assert_eq!(model.cluster_sizes(), vec![2, 2]);
    }

    #[test]
    fn test_assignment_duplicate_id_keeps_last() {
        let model = create_test_model();
        // labels are [0, 1, 1, 0]; id 7 appears in clusters 0 and then 1
        let incidents = vec![
            Incident::new(7, 0.0, 0.0),
            Incident::new(8, 2.0, 2.0),
            Incident::new(7, 2.0, 2.0),
            Incident::new(9, 0.0, 0.0),
        ];
        let assignment = model.assignment(&incidents);

        assert_eq!(assignment.len(), 3);
        assert_eq!(assignment.get(7), Some(1));
        assert_eq!(assignment.members(1), vec![7, 8]);
        assert_eq!(assignment.members(0), vec![9]);
    }
}
