//! Benchmarking of tour strategies on an incident set.
//!
//! Every (strategy, hotspot count, seed) combination is planned end to end.
//! Runs are independent and execute in parallel.

use crate::config::PlannerConfig;
use crate::error::PatrolResult;
use crate::heuristics::TourStrategy;
use crate::incident::Coordinate;
use crate::planner::PatrolPlanner;
use crate::routing::KM_PER_DEGREE;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Result of one planning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Strategy name
    pub strategy: String,
    /// Full solver name
    pub algorithm: String,
    /// Requested hotspot count
    pub hotspot_count: usize,
    /// Hotspots actually produced
    pub hotspots: usize,
    pub officers: usize,
    pub seed: u64,
    /// Closed tour length in km
    pub tour_km: f64,
    /// Sum of officer routes in km
    pub total_route_km: f64,
    pub longest_route_km: f64,
    pub shortest_route_km: f64,
    pub cluster_iterations: usize,
    /// Tour solving time in seconds
    pub tour_time: f64,
    /// End-to-end time in seconds
    pub total_time: f64,
}

/// Aggregated statistics for a strategy at one hotspot count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyStatistics {
    pub strategy: String,
    pub hotspot_count: usize,
    pub num_runs: usize,
    pub avg_tour_km: f64,
    pub std_tour_km: f64,
    pub best_tour_km: f64,
    pub worst_tour_km: f64,
    /// Average gap between longest and shortest officer route
    pub avg_imbalance_km: f64,
    pub avg_time: f64,
    pub total_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    pub strategies: Vec<TourStrategy>,
    pub hotspot_counts: Vec<usize>,
    pub officer_count: usize,
    /// Seeds 0..num_runs are used for clustering
    pub num_runs: usize,
    pub max_iterations: usize,
    /// Run in parallel
    pub parallel: bool,
    pub show_progress: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            strategies: TourStrategy::ALL.to_vec(),
            hotspot_counts: vec![5, 10, 20],
            officer_count: 2,
            num_runs: 5,
            max_iterations: crate::clustering::kmeans::DEFAULT_MAX_ITERATIONS,
            parallel: true,
            show_progress: true,
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<RunResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    fn jobs(&self) -> Vec<PlannerConfig> {
        let mut jobs = Vec::new();
        for &strategy in &self.config.strategies {
            for &hotspot_count in &self.config.hotspot_counts {
                for seed in 0..self.config.num_runs as u64 {
                    jobs.push(PlannerConfig {
                        hotspot_count,
                        officer_count: self.config.officer_count,
                        seed,
                        max_iterations: self.config.max_iterations,
                        strategy,
                    });
                }
            }
        }
        jobs
    }

    fn run_one(points: &[Coordinate], config: PlannerConfig) -> PatrolResult<RunResult> {
        let start = std::time::Instant::now();
        let planner = PatrolPlanner::new(config.clone());
        let plan = planner.plan(points)?;

        let route_km: Vec<f64> = plan.routes.iter().map(|r| r.total_distance_km).collect();
        Ok(RunResult {
            strategy: config.strategy.to_string(),
            algorithm: plan.tour.algorithm.clone(),
            hotspot_count: config.hotspot_count,
            hotspots: plan.hotspots.len(),
            officers: config.officer_count,
            seed: config.seed,
            tour_km: plan.tour.length * KM_PER_DEGREE,
            total_route_km: plan.total_distance_km(),
            longest_route_km: route_km.iter().cloned().fold(0.0, f64::max),
            shortest_route_km: route_km.iter().cloned().fold(f64::INFINITY, f64::min),
            cluster_iterations: plan.model.iterations,
            tour_time: plan.tour.computation_time,
            total_time: start.elapsed().as_secs_f64(),
        })
    }

    /// Run every configured combination on `points`.
    pub fn run(&mut self, points: &[Coordinate]) -> PatrolResult<()> {
        let jobs = self.jobs();
        log::info!("Running {} benchmark jobs on {} points", jobs.len(), points.len());

        let progress = if self.config.show_progress {
            let pb = ProgressBar::new(jobs.len() as u64);
            let template = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}";
            if let Ok(style) = ProgressStyle::with_template(template) {
                pb.set_style(style.progress_chars("##-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        let run = |config: &PlannerConfig| {
            let result = Self::run_one(points, config.clone());
            progress.inc(1);
            result
        };

        let results: PatrolResult<Vec<RunResult>> = if self.config.parallel {
            jobs.par_iter().map(run).collect()
        } else {
            jobs.iter().map(run).collect()
        };
        progress.finish_with_message("done");

        self.results.extend(results?);
        Ok(())
    }

    /// Compute statistics per (strategy, hotspot count), sorted by hotspot
    /// count then average tour length.
    pub fn compute_statistics(&self) -> Vec<StrategyStatistics> {
        let mut groups: BTreeMap<(usize, String), Vec<&RunResult>> = BTreeMap::new();
        for result in &self.results {
            groups
                .entry((result.hotspot_count, result.strategy.clone()))
                .or_default()
                .push(result);
        }

        let mut statistics: Vec<StrategyStatistics> = groups
            .into_iter()
            .map(|((hotspot_count, strategy), results)| {
                let tours: Vec<f64> = results.iter().map(|r| r.tour_km).collect();
                let imbalance: Vec<f64> = results
                    .iter()
                    .map(|r| r.longest_route_km - r.shortest_route_km)
                    .collect();
                let times: Vec<f64> = results.iter().map(|r| r.total_time).collect();

                // sample std dev is undefined for a single run
                let std_tour_km = if tours.len() > 1 { tours.iter().std_dev() } else { 0.0 };

                StrategyStatistics {
                    strategy,
                    hotspot_count,
                    num_runs: results.len(),
                    avg_tour_km: tours.iter().mean(),
                    std_tour_km,
                    best_tour_km: tours.iter().cloned().fold(f64::INFINITY, f64::min),
                    worst_tour_km: tours.iter().cloned().fold(0.0, f64::max),
                    avg_imbalance_km: imbalance.iter().mean(),
                    avg_time: times.iter().mean(),
                    total_time: times.iter().sum(),
                }
            })
            .collect();

        statistics.sort_by(|a, b| {
            a.hotspot_count
                .cmp(&b.hotspot_count)
                .then(a.avg_tour_km.total_cmp(&b.avg_tour_km))
        });

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> PatrolResult<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> PatrolResult<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("     Patrol Planner Benchmark Report\n");
        report.push_str("========================================\n\n");

        let stats = self.compute_statistics();
        let mut current: Option<usize> = None;

        for stat in &stats {
            if current != Some(stat.hotspot_count) {
                current = Some(stat.hotspot_count);
                report.push_str(&format!("\nHotspots: {}\n", stat.hotspot_count));
                report.push_str("-".repeat(86).as_str());
                report.push('\n');
                report.push_str(&format!(
                    "{:<20} {:>6} {:>12} {:>10} {:>12} {:>12} {:>10}\n",
                    "Strategy", "Runs", "Avg km", "Std km", "Best km", "Imbal. km", "Avg Time"
                ));
                report.push_str("-".repeat(86).as_str());
                report.push('\n');
            }

            report.push_str(&format!(
                "{:<20} {:>6} {:>12.2} {:>10.2} {:>12.2} {:>12.2} {:>10.4}\n",
                stat.strategy,
                stat.num_runs,
                stat.avg_tour_km,
                stat.std_tour_km,
                stat.best_tour_km,
                stat.avg_imbalance_km,
                stat.avg_time
            ));
        }

        if let Some(best) = self.results.iter().min_by(|a, b| a.tour_km.total_cmp(&b.tour_km)) {
            report.push_str(&format!(
                "\nShortest tour: {:.2} km ({}, {} hotspots, seed {})\n",
                best.tour_km, best.algorithm, best.hotspots, best.seed
            ));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[RunResult] {
        &self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn create_test_points() -> Vec<Coordinate> {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        (0..120)
            .map(|_| Coordinate::new(17.3 + rng.gen::<f64>() * 0.2, 78.4 + rng.gen::<f64>() * 0.2))
            .collect()
    }

    fn create_test_config() -> BenchmarkConfig {
        BenchmarkConfig {
            strategies: vec![TourStrategy::NearestNeighbor, TourStrategy::Vnd],
            hotspot_counts: vec![4, 8],
            officer_count: 2,
            num_runs: 3,
            show_progress: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.num_runs, 5);
        assert_eq!(config.strategies.len(), TourStrategy::ALL.len());
    }

    #[test]
    fn test_run_and_statistics() {
        let points = create_test_points();
        let mut benchmark = Benchmark::new(create_test_config());
        benchmark.run(&points).unwrap();

        assert_eq!(benchmark.results().len(), 2 * 2 * 3);
        assert!(benchmark.results().iter().all(|r| r.longest_route_km >= r.shortest_route_km));

        let stats = benchmark.compute_statistics();
        assert_eq!(stats.len(), 4);
        assert!(stats.iter().all(|s| s.num_runs == 3));
        assert!(stats.windows(2).all(|w| w[0].hotspot_count <= w[1].hotspot_count));

        // same seeds, same hotspots: VND never loses to its own construction
        for k in [4, 8] {
            let avg = |name: &str| {
                stats
                    .iter()
                    .find(|s| s.hotspot_count == k && s.strategy == name)
                    .map(|s| s.avg_tour_km)
                    .unwrap()
            };
            assert!(avg("vnd") <= avg("nearest-neighbor") + 1e-9);
        }
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let points = create_test_points();
        let mut parallel = Benchmark::new(create_test_config());
        parallel.run(&points).unwrap();
        let mut sequential = Benchmark::new(BenchmarkConfig {
            parallel: false,
            ..create_test_config()
        });
        sequential.run(&points).unwrap();

        let tours = |b: &Benchmark| b.results().iter().map(|r| r.tour_km).collect::<Vec<_>>();
        assert_eq!(tours(&parallel), tours(&sequential));
    }

    #[test]
    fn test_exports_and_report() {
        let points = create_test_points();
        let mut benchmark = Benchmark::new(BenchmarkConfig {
            num_runs: 1,
            ..create_test_config()
        });
        benchmark.run(&points).unwrap();

        let dir = tempfile::tempdir().unwrap();
        benchmark.export_to_csv(dir.path().join("results.csv")).unwrap();
        benchmark.export_statistics_csv(dir.path().join("statistics.csv")).unwrap();

        let results = std::fs::read_to_string(dir.path().join("results.csv")).unwrap();
        assert_eq!(results.lines().count(), 1 + 4);
        assert!(results.starts_with("strategy,algorithm,hotspot_count"));

        let stats = benchmark.compute_statistics();
        assert!(stats.iter().all(|s| s.std_tour_km == 0.0));

        let report = benchmark.generate_report();
        assert!(report.contains("Hotspots: 4"));
        assert!(report.contains("Hotspots: 8"));
        assert!(report.contains("Shortest tour"));
    }
}
