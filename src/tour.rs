//! Tour representation and manipulation.
//!
//! A tour is stored as an open visiting order over hotspot indices; the
//! return edge to the first hotspot is implicit. [`Tour::cycle`] produces
//! the closed form handed to the route partitioner.

use crate::matrix::DistanceMatrix;
use serde::{Deserialize, Serialize};

/// Improvements smaller than this are treated as noise
pub const IMPROVEMENT_EPS: f64 = 1e-10;

/// A closed tour over hotspots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tour {
    /// Visiting order, each hotspot index exactly once
    pub order: Vec<usize>,
    /// Closed tour length in degree units
    pub length: f64,
    /// Strategy that produced this tour
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of improving moves applied (if applicable)
    pub iterations: Option<usize>,
}

impl Tour {
    pub fn new() -> Self {
        Tour {
            order: Vec::new(),
            length: 0.0,
            algorithm: String::new(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    pub fn from_order(matrix: &DistanceMatrix, order: Vec<usize>, algorithm: &str) -> Self {
        let length = matrix.tour_length(&order);
        Tour {
            order,
            length,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Recompute the length after the order changed.
    pub fn validate(&mut self, matrix: &DistanceMatrix) {
        self.length = matrix.tour_length(&self.order);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Closed cycle: the order followed by its first index. Tours of zero or
    /// one hotspot are returned as-is.
    pub fn cycle(&self) -> Vec<usize> {
        let mut cycle = self.order.clone();
        if cycle.len() >= 2 {
            cycle.push(cycle[0]);
        }
        cycle
    }

    /// Check that every index in `0..n` is visited exactly once.
    pub fn is_complete(&self, n: usize) -> bool {
        if self.order.len() != n {
            return false;
        }
        let mut seen = vec![false; n];
        for &node in &self.order {
            if node >= n || seen[node] {
                return false;
            }
            seen[node] = true;
        }
        true
    }

    pub fn position(&self, node: usize) -> Option<usize> {
        self.order.iter().position(|&n| n == node)
    }

    /// Length change of reversing `order[i + 1..=j]`.
    pub fn two_opt_delta(&self, matrix: &DistanceMatrix, i: usize, j: usize) -> f64 {
        let n = self.order.len();
        if i >= j || j >= n {
            return 0.0;
        }
        let a = self.order[i];
        let b = self.order[i + 1];
        let c = self.order[j];
        let d = self.order[(j + 1) % n];
        matrix.distance(a, c) + matrix.distance(b, d)
            - matrix.distance(a, b)
            - matrix.distance(c, d)
    }

    /// Apply a 2-opt move (reverse segment between i+1 and j)
    pub fn apply_two_opt(&mut self, i: usize, j: usize) {
        self.order[i + 1..=j].reverse();
    }

    /// Rotate so the tour starts at `node`. Length is unchanged.
    pub fn rotate_to(&mut self, node: usize) {
        if let Some(pos) = self.position(node) {
            self.order.rotate_left(pos);
        }
    }
}

impl Default for Tour {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Tour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Tour ({})", self.algorithm)?;
        writeln!(f, "  Length: {:.5} deg", self.length)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Improving moves: {}", iter)?;
        }
        writeln!(f, "  Cycle: {:?}", self.cycle())
    }
}
