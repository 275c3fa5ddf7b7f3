//! Patrol Planner Library
//!
//! Turns geolocated incident records into patrol routes for a team of officers.
//!
//! # Pipeline
//!
//! - Cluster incident coordinates into hotspots (seeded Lloyd k-means)
//! - Build the pairwise hotspot distance matrix
//! - Find a short closed tour over the hotspots (construction + 2-opt / Or-opt)
//! - Cut the tour into one contiguous route per officer
//! - Estimate route distance (km) and patrol time (minutes)
//!
//! # Example
//!
//! ```no_run
//! use patrol_planner::config::PlannerConfig;
//! use patrol_planner::incident::{coordinates, load_incidents_csv};
//! use patrol_planner::planner::PatrolPlanner;
//!
//! let incidents = load_incidents_csv("incidents.csv").unwrap();
//!
//! let config = PlannerConfig {
//!     hotspot_count: 8,
//!     officer_count: 3,
//!     ..Default::default()
//! };
//! let plan = PatrolPlanner::new(config).plan(&coordinates(&incidents)).unwrap();
//!
//! println!("{}", plan);
//! ```

pub mod benchmark;
pub mod clustering;
pub mod config;
pub mod error;
pub mod heuristics;
pub mod hotspot;
pub mod incident;
pub mod matrix;
pub mod planner;
pub mod report;
pub mod routing;
pub mod tour;
pub mod visualization;

pub use config::PlannerConfig;
pub use error::{PatrolError, PatrolResult};
pub use hotspot::Hotspot;
pub use incident::{Coordinate, Incident};
pub use matrix::DistanceMatrix;
pub use planner::{
    build_distance_matrix, cluster_hotspots, partition_route, plan_patrol, solve_tour, PatrolPlan,
    PatrolPlanner,
};
pub use routing::OfficerRoute;
pub use tour::Tour;
