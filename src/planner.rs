//! End-to-end patrol planning.
//!
//! incidents -> clusters -> hotspots -> distance matrix -> tour -> officer routes
//!
//! The free functions use the default strategies (seeded Lloyd k-means,
//! nearest neighbor + VND). [`PatrolPlanner`] takes a [`PlannerConfig`] and
//! accepts custom strategies.

use crate::clustering::{ClusterAssignment, ClusterModel, LloydKMeans, PointClusterer};
use crate::config::PlannerConfig;
use crate::error::{PatrolError, PatrolResult};
use crate::heuristics::{HeuristicTourSolver, TourSolver};
use crate::hotspot::{self, Hotspot};
use crate::incident::{self, Coordinate, Incident};
use crate::matrix::DistanceMatrix;
use crate::routing::{self, OfficerRoute};
use crate::tour::Tour;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cluster `points` into `min(max(k, 1), n)` hotspots.
pub fn cluster_hotspots(points: &[Coordinate], k: usize) -> PatrolResult<Vec<Hotspot>> {
    let model = LloydKMeans::new().fit(points, k)?;
    Ok(hotspot::aggregate(points, &model.labels))
}

pub fn build_distance_matrix(hotspots: &[Hotspot]) -> DistanceMatrix {
    DistanceMatrix::from_hotspots(hotspots)
}

/// Closed cycle over the matrix nodes (`[]` for 0 nodes, `[0]` for one).
pub fn solve_tour(matrix: &DistanceMatrix) -> Vec<usize> {
    HeuristicTourSolver::default().solve(matrix).cycle()
}

pub fn partition_route(
    cycle: &[usize],
    hotspots: &[Hotspot],
    officer_count: usize,
) -> PatrolResult<Vec<OfficerRoute>> {
    routing::partition_route(cycle, hotspots, officer_count)
}

/// Whole pipeline with default strategies.
pub fn plan_patrol(
    points: &[Coordinate],
    k: usize,
    officer_count: usize,
) -> PatrolResult<Vec<OfficerRoute>> {
    let config = PlannerConfig {
        hotspot_count: k,
        officer_count,
        ..Default::default()
    };
    Ok(PatrolPlanner::new(config).plan(points)?.routes)
}

/// Configured planning pipeline
pub struct PatrolPlanner {
    config: PlannerConfig,
    clusterer: Box<dyn PointClusterer + Send + Sync>,
    solver: Box<dyn TourSolver + Send + Sync>,
}

impl PatrolPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        let clusterer = LloydKMeans::with_params(config.seed, config.max_iterations);
        let solver = config.strategy.solver();
        PatrolPlanner {
            config,
            clusterer: Box::new(clusterer),
            solver: Box::new(solver),
        }
    }

    pub fn with_clusterer<C>(mut self, clusterer: C) -> Self
    where
        C: PointClusterer + Send + Sync + 'static,
    {
        self.clusterer = Box::new(clusterer);
        self
    }

    pub fn with_solver<S: TourSolver + Send + Sync + 'static>(mut self, solver: S) -> Self {
        self.solver = Box::new(solver);
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn plan(&self, points: &[Coordinate]) -> PatrolResult<PatrolPlan> {
        if self.config.officer_count == 0 {
            return Err(PatrolError::InvalidOfficerCount(0));
        }

        let model = self.clusterer.fit(points, self.config.hotspot_count)?;
        let hotspots = hotspot::aggregate(points, &model.labels);
        let matrix = DistanceMatrix::from_hotspots(&hotspots);
        let tour = self.solver.solve(&matrix);
        let routes =
            routing::partition_route(&tour.cycle(), &hotspots, self.config.officer_count)?;

        log::info!(
            "Planned {} hotspots from {} points for {} officers ({}, {:.2} km tour)",
            hotspots.len(),
            points.len(),
            routes.len(),
            tour.algorithm,
            tour.length * routing::KM_PER_DEGREE
        );

        Ok(PatrolPlan {
            config: self.config.clone(),
            model,
            hotspots,
            tour,
            routes,
            generated_at: Utc::now(),
        })
    }

    /// Plan from incident records and also return which cluster each incident fell into.
    pub fn plan_incidents(
        &self,
        incidents: &[Incident],
    ) -> PatrolResult<(PatrolPlan, ClusterAssignment)> {
        let plan = self.plan(&incident::coordinates(incidents))?;
        let assignment = plan.model.assignment(incidents);
        Ok((plan, assignment))
    }
}

impl Default for PatrolPlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

/// Everything produced by one planning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatrolPlan {
    pub config: PlannerConfig,
    pub model: ClusterModel,
    pub hotspots: Vec<Hotspot>,
    pub tour: Tour,
    pub routes: Vec<OfficerRoute>,
    pub generated_at: DateTime<Utc>,
}

impl PatrolPlan {
    /// Sum of all officer route distances (the closing leg is not patrolled).
    pub fn total_distance_km(&self) -> f64 {
        self.routes.iter().map(|r| r.total_distance_km).sum()
    }

    pub fn total_time_mins(&self) -> u64 {
        self.routes.iter().map(|r| r.est_time_mins).sum()
    }

    /// Longest minus shortest officer route, in km.
    pub fn distance_imbalance_km(&self) -> f64 {
        let max = self.routes.iter().map(|r| r.total_distance_km).fold(0.0, f64::max);
        let min = self
            .routes
            .iter()
            .map(|r| r.total_distance_km)
            .fold(f64::INFINITY, f64::min);
        if self.routes.is_empty() {
            0.0
        } else {
            max - min
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::{NearestNeighborHeuristic, TourStrategy};
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn random_points(n: usize, seed: u64) -> Vec<Coordinate> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                Coordinate::new(
                    17.385 + rng.gen_range(-0.15..0.15),
                    78.4867 + rng.gen_range(-0.15..0.15),
                )
            })
            .collect()
    }

    #[test]
    fn test_scenario_no_points() {
        let hotspots = cluster_hotspots(&[], 5).unwrap();
        assert!(hotspots.is_empty());

        let routes = plan_patrol(&[], 5, 3).unwrap();
        assert_eq!(routes.len(), 3);
        assert!(routes.iter().all(|r| r.sequence.is_empty()));
        assert_eq!(routes.iter().map(|r| r.officer_id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_scenario_unit_square() {
        let points = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(1.0, 0.0),
            Coordinate::new(1.0, 1.0),
        ];
        let hotspots = cluster_hotspots(&points, 4).unwrap();
        assert_eq!(hotspots.len(), 4);

        let matrix = build_distance_matrix(&hotspots);
        let cycle = solve_tour(&matrix);
        assert_eq!(cycle.len(), 5);
        assert_eq!(cycle[0], cycle[4]);
        assert!((matrix.tour_length(&cycle[..4]) - 4.0).abs() < 1e-9);

        let routes = partition_route(&cycle, &hotspots, 1).unwrap();
        assert_eq!(routes.len(), 1);
        let ids: HashSet<usize> = routes[0].sequence.iter().map(|h| h.id).collect();
        assert_eq!(ids.len(), 4);
        // open path around three sides of the square
        assert!((routes[0].total_distance_km - 333.0).abs() < 1e-6);
    }

    #[test]
    fn test_scenario_line_two_officers() {
        let points: Vec<Coordinate> = (0..5)
            .map(|i| Coordinate::new(17.0, 78.0 + i as f64 * 0.01))
            .collect();
        let routes = plan_patrol(&points, 5, 2).unwrap();

        assert_eq!(routes[0].sequence.len(), 2);
        assert_eq!(routes[1].sequence.len(), 3);
    }

    #[test]
    fn test_scenario_coincident_points() {
        let points = vec![Coordinate::new(17.4, 78.5), Coordinate::new(17.4, 78.5)];
        let hotspots = cluster_hotspots(&points, 2).unwrap();

        assert_eq!(hotspots.len(), 2);
        assert!(hotspots.iter().all(|h| h.latitude.is_finite() && h.longitude.is_finite()));
        assert!(hotspots.iter().all(|h| h.count == 1));
    }

    #[test]
    fn test_hotspot_count_is_min_k_n() {
        let points = random_points(40, 5);
        for k in [1, 3, 10, 40, 90] {
            assert_eq!(cluster_hotspots(&points, k).unwrap().len(), k.min(40));
        }
        assert_eq!(cluster_hotspots(&points[..3], 0).unwrap().len(), 1);
    }

    #[test]
    fn test_solve_tour_is_permutation() {
        for n in 0..15 {
            let hotspots: Vec<Hotspot> = random_points(n, n as u64)
                .into_iter()
                .enumerate()
                .map(|(i, c)| Hotspot::new(i, c.latitude, c.longitude, 1))
                .collect();
            let cycle = solve_tour(&build_distance_matrix(&hotspots));

            match n {
                0 => assert!(cycle.is_empty()),
                1 => assert_eq!(cycle, vec![0]),
                _ => {
                    assert_eq!(cycle.len(), n + 1);
                    assert_eq!(cycle[0], cycle[n]);
                    let mut open = cycle[..n].to_vec();
                    open.sort_unstable();
                    assert_eq!(open, (0..n).collect::<Vec<_>>());
                }
            }
        }
    }

    #[test]
    fn test_routes_cover_all_hotspots_once() {
        let points = random_points(300, 11);
        for officers in 1..8 {
            let config = PlannerConfig {
                hotspot_count: 12,
                officer_count: officers,
                ..Default::default()
            };
            let plan = PatrolPlanner::new(config).plan(&points).unwrap();

            let visited: Vec<usize> = plan
                .routes
                .iter()
                .flat_map(|r| r.sequence.iter().map(|h| h.id))
                .collect();
            let unique: HashSet<usize> = visited.iter().copied().collect();
            assert_eq!(visited.len(), 12);
            assert_eq!(unique.len(), 12);

            // routes follow the tour
            let expected: Vec<usize> =
                plan.tour.order.iter().map(|&i| plan.hotspots[i].id).collect();
            assert_eq!(visited, expected);
            assert!(plan.routes.iter().all(|r| r.total_distance_km >= 0.0));
        }
    }

    #[test]
    fn test_invalid_inputs() {
        let points = random_points(10, 1);
        assert!(matches!(plan_patrol(&points, 3, 0), Err(PatrolError::InvalidOfficerCount(0))));
        assert!(matches!(plan_patrol(&[], 3, 0), Err(PatrolError::InvalidOfficerCount(0))));

        let mut bad = points.clone();
        bad[4].longitude = f64::INFINITY;
        assert!(matches!(
            plan_patrol(&bad, 3, 2),
            Err(PatrolError::InvalidCoordinate { index: 4, .. })
        ));
        assert!(cluster_hotspots(&bad, 3).is_err());
    }

    #[test]
    fn test_reproducible_plans() {
        let points = random_points(200, 21);
        let config = PlannerConfig {
            hotspot_count: 8,
            officer_count: 3,
            ..Default::default()
        };
        let a = PatrolPlanner::new(config.clone()).plan(&points).unwrap();
        let b = PatrolPlanner::new(config).plan(&points).unwrap();

        assert_eq!(a.hotspots, b.hotspots);
        assert_eq!(a.routes, b.routes);
    }

    #[test]
    fn test_custom_solver_and_assignment() {
        let incidents: Vec<Incident> = random_points(50, 2)
            .into_iter()
            .enumerate()
            .map(|(i, c)| Incident::new(1000 + i as u64, c.latitude, c.longitude))
            .collect();
        let planner = PatrolPlanner::new(PlannerConfig {
            hotspot_count: 6,
            officer_count: 2,
            strategy: TourStrategy::GreedyEdge,
            ..Default::default()
        })
        .with_solver(HeuristicTourSolver::new(NearestNeighborHeuristic::new()));

        let (plan, assignment) = planner.plan_incidents(&incidents).unwrap();
        assert_eq!(plan.tour.algorithm, "NearestNeighbor");
        assert_eq!(assignment.len(), 50);
        for hotspot in &plan.hotspots {
            assert_eq!(assignment.members(hotspot.id).len(), hotspot.count);
        }
    }

    /// Deals points out to clusters in input order.
    struct RoundRobinClusterer;

    impl PointClusterer for RoundRobinClusterer {
        fn fit(&self, points: &[Coordinate], k: usize) -> PatrolResult<ClusterModel> {
            let k = crate::clustering::clamp_cluster_count(k, points.len());
            let mut model = ClusterModel::empty(0, self.name());
            model.labels = (0..points.len()).map(|i| i % k).collect();
            model.centroids = hotspot::aggregate(points, &model.labels)
                .iter()
                .map(|h| h.coordinate())
                .collect();
            Ok(model)
        }

        fn name(&self) -> &str {
            "RoundRobin"
        }
    }

    #[test]
    fn test_custom_clusterer() {
        let points = random_points(10, 4);
        let plan = PatrolPlanner::new(PlannerConfig {
            hotspot_count: 3,
            officer_count: 2,
            ..Default::default()
        })
        .with_clusterer(RoundRobinClusterer)
        .plan(&points)
        .unwrap();

        assert_eq!(plan.model.algorithm, "RoundRobin");
        assert_eq!(plan.model.labels[..4], [0, 1, 2, 0]);
        let counts: Vec<usize> = plan.hotspots.iter().map(|h| h.count).collect();
        assert_eq!(counts, vec![4, 3, 3]);

        let routed: usize = plan.routes.iter().map(|r| r.sequence.len()).sum();
        assert_eq!(routed, 3);
    }

    #[test]
    fn test_plan_totals() {
        let points = random_points(100, 8);
        let plan = PatrolPlanner::new(PlannerConfig {
            hotspot_count: 9,
            officer_count: 3,
            ..Default::default()
        })
        .plan(&points)
        .unwrap();

        let sum: f64 = plan.routes.iter().map(|r| r.total_distance_km).sum();
        assert!((plan.total_distance_km() - sum).abs() < 1e-9);
        assert!(plan.distance_imbalance_km() >= 0.0);
        // open routes never exceed the closed tour
        assert!(plan.total_distance_km() <= plan.tour.length * routing::KM_PER_DEGREE + 1e-9);
    }
}
