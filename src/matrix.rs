//! Travel graph over hotspots.
//!
//! Distances are plain Euclidean distances between centroids in degree units.
//! Conversion to kilometres happens later, in [`crate::routing`].

use crate::hotspot::Hotspot;
use crate::incident::Coordinate;
use serde::{Deserialize, Serialize};

/// Symmetric pairwise distance matrix with a zero diagonal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    data: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    /// Build the matrix over hotspot centroids.
    pub fn from_hotspots(hotspots: &[Hotspot]) -> Self {
        let coords: Vec<Coordinate> = hotspots.iter().map(Hotspot::coordinate).collect();
        Self::from_coordinates(&coords)
    }

    pub fn from_coordinates(coords: &[Coordinate]) -> Self {
        let n = coords.len();
        let mut data = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in i + 1..n {
                let d = coords[i].distance(&coords[j]);
                data[i][j] = d;
                data[j][i] = d;
            }
        }

        DistanceMatrix { data }
    }

    /// Wrap precomputed rows. Panics if the rows do not form a square matrix.
    pub fn from_rows(data: Vec<Vec<f64>>) -> Self {
        let n = data.len();
        assert!(data.iter().all(|row| row.len() == n), "distance matrix must be square");
        DistanceMatrix { data }
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.data[i][j]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.data
    }

    /// Length of the closed tour visiting `order` and returning to its first node.
    pub fn tour_length(&self, order: &[usize]) -> f64 {
        if order.len() < 2 {
            return 0.0;
        }
        self.path_length(order) + self.distance(order[order.len() - 1], order[0])
    }

    /// Length of the open path through `order`.
    pub fn path_length(&self, order: &[usize]) -> f64 {
        order.windows(2).map(|w| self.distance(w[0], w[1])).sum()
    }

    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        let n = self.len();
        (0..n).all(|i| {
            self.data[i][i].abs() <= tolerance
                && (i + 1..n).all(|j| (self.data[i][j] - self.data[j][i]).abs() <= tolerance)
        })
    }

    pub fn statistics(&self) -> MatrixStatistics {
        let n = self.len();
        let mut sum = 0.0;
        let mut max = 0.0f64;
        let mut pairs = 0usize;
        for i in 0..n {
            for j in i + 1..n {
                sum += self.data[i][j];
                max = max.max(self.data[i][j]);
                pairs += 1;
            }
        }

        MatrixStatistics {
            nodes: n,
            avg_distance: if pairs > 0 { sum / pairs as f64 } else { 0.0 },
            max_distance: max,
        }
    }
}

/// Statistics about a distance matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixStatistics {
    pub nodes: usize,
    pub avg_distance: f64,
    pub max_distance: f64,
}

impl std::fmt::Display for MatrixStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Hotspots: {}", self.nodes)?;
        writeln!(f, "  Avg distance: {:.5} deg", self.avg_distance)?;
        writeln!(f, "  Max distance: {:.5} deg", self.max_distance)
    }
}
