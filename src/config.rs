//! Planner configuration.
//!
//! Loaded from a JSON file when one is given; any field missing from the file
//! keeps its default.

use crate::clustering::kmeans::{DEFAULT_MAX_ITERATIONS, DEFAULT_SEED};
use crate::error::PatrolResult;
use crate::heuristics::TourStrategy;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub const DEFAULT_HOTSPOT_COUNT: usize = 5;
pub const DEFAULT_OFFICER_COUNT: usize = 1;
/// Cluster count used when surveying hotspots without planning routes
pub const DEFAULT_SURVEY_CLUSTERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Requested number of hotspots (clamped to the number of incidents)
    pub hotspot_count: usize,
    /// Number of officers to split the tour between
    pub officer_count: usize,
    /// Seed for the clustering initialisation
    pub seed: u64,
    /// Iteration cap for clustering
    pub max_iterations: usize,
    /// Tour heuristic
    pub strategy: TourStrategy,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            hotspot_count: DEFAULT_HOTSPOT_COUNT,
            officer_count: DEFAULT_OFFICER_COUNT,
            seed: DEFAULT_SEED,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            strategy: TourStrategy::default(),
        }
    }
}

impl PlannerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> PatrolResult<Self> {
        let file = File::open(&path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        log::debug!("Loaded planner config from {}", path.as_ref().display());
        Ok(config)
    }
}
