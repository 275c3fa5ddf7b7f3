//! Heuristic tour solvers.
//!
//! A [`TourSolver`] turns a distance matrix into a closed tour. The provided
//! [`HeuristicTourSolver`] pairs a construction heuristic with an optional
//! local search; [`TourStrategy`] names the ready-made combinations.

pub mod construction;
pub mod local_search;

pub use construction::*;
pub use local_search::*;

use crate::matrix::DistanceMatrix;
use crate::tour::Tour;
use serde::{Deserialize, Serialize};

/// Trait for tour solving strategies
pub trait TourSolver {
    /// Build a tour visiting every node of `matrix` exactly once.
    fn solve(&self, matrix: &DistanceMatrix) -> Tour;
    fn name(&self) -> &str;
}

/// Construction followed by optional local improvement
pub struct HeuristicTourSolver {
    construction: Box<dyn ConstructionHeuristic + Send + Sync>,
    improvement: Option<Box<dyn LocalSearch + Send + Sync>>,
    name: String,
}

impl HeuristicTourSolver {
    pub fn new<C>(construction: C) -> Self
    where
        C: ConstructionHeuristic + Send + Sync + 'static,
    {
        let name = construction.name().to_string();
        HeuristicTourSolver {
            construction: Box::new(construction),
            improvement: None,
            name,
        }
    }

    pub fn with_improvement<L>(mut self, improvement: L) -> Self
    where
        L: LocalSearch + Send + Sync + 'static,
    {
        self.name = format!("{} + {}", self.construction.name(), improvement.name());
        self.improvement = Some(Box::new(improvement));
        self
    }
}

impl Default for HeuristicTourSolver {
    fn default() -> Self {
        TourStrategy::default().solver()
    }
}

impl TourSolver for HeuristicTourSolver {
    fn solve(&self, matrix: &DistanceMatrix) -> Tour {
        let start = std::time::Instant::now();
        let mut tour = self.construction.construct(matrix);

        if let Some(improvement) = &self.improvement {
            let before = tour.length;
            improvement.improve(matrix, &mut tour);
            log::debug!(
                "{}: {:.6} -> {:.6} deg",
                improvement.name(),
                before,
                tour.length
            );
        }

        tour.algorithm = self.name.clone();
        tour.computation_time = start.elapsed().as_secs_f64();
        tour
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Named solver configurations
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TourStrategy {
    /// Nearest neighbor construction only
    NearestNeighbor,
    /// Greedy edge construction only
    GreedyEdge,
    /// Farthest insertion construction only
    FarthestInsertion,
    /// Nearest neighbor followed by 2-opt
    TwoOpt,
    /// Nearest neighbor followed by 2-opt / Or-opt descent
    #[default]
    Vnd,
    /// Best of all constructions followed by 2-opt / Or-opt descent
    MultiStart,
}

impl TourStrategy {
    pub const ALL: [TourStrategy; 6] = [
        TourStrategy::NearestNeighbor,
        TourStrategy::GreedyEdge,
        TourStrategy::FarthestInsertion,
        TourStrategy::TwoOpt,
        TourStrategy::Vnd,
        TourStrategy::MultiStart,
    ];

    pub fn solver(self) -> HeuristicTourSolver {
        match self {
            TourStrategy::NearestNeighbor => {
                HeuristicTourSolver::new(NearestNeighborHeuristic::new())
            }
            TourStrategy::GreedyEdge => HeuristicTourSolver::new(GreedyEdgeHeuristic::new()),
            TourStrategy::FarthestInsertion => {
                HeuristicTourSolver::new(GreedyInsertionHeuristic::farthest())
            }
            TourStrategy::TwoOpt => HeuristicTourSolver::new(NearestNeighborHeuristic::new())
                .with_improvement(TwoOptSearch::new()),
            TourStrategy::Vnd => HeuristicTourSolver::new(NearestNeighborHeuristic::new())
                .with_improvement(VND::with_standard_operators()),
            TourStrategy::MultiStart => {
                HeuristicTourSolver::new(MultiStartConstruction::with_all_heuristics())
                    .with_improvement(VND::with_standard_operators())
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TourStrategy::NearestNeighbor => "nearest-neighbor",
            TourStrategy::GreedyEdge => "greedy-edge",
            TourStrategy::FarthestInsertion => "farthest-insertion",
            TourStrategy::TwoOpt => "two-opt",
            TourStrategy::Vnd => "vnd",
            TourStrategy::MultiStart => "multi-start",
        }
    }
}

impl std::fmt::Display for TourStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
