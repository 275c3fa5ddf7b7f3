//! Patrol Planner - Command Line Interface
//!
//! Hotspot detection and multi-officer patrol routing from incident CSV files.

use clap::{Parser, Subcommand, ValueEnum};
use patrol_planner::benchmark::{Benchmark, BenchmarkConfig};
use patrol_planner::clustering::kmeans::DEFAULT_MAX_ITERATIONS;
use patrol_planner::clustering::{LloydKMeans, PointClusterer};
use patrol_planner::config::{PlannerConfig, DEFAULT_SURVEY_CLUSTERS};
use patrol_planner::error::PatrolResult;
use patrol_planner::heuristics::{TourSolver, TourStrategy};
use patrol_planner::hotspot;
use patrol_planner::incident::{coordinates, load_incidents_csv, IncidentStatistics};
use patrol_planner::matrix::DistanceMatrix;
use patrol_planner::planner::PatrolPlanner;
use patrol_planner::report::save_json;
use patrol_planner::routing::KM_PER_DEGREE;
use patrol_planner::visualization::Visualizer;

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "patrol-planner")]
#[command(version = "1.0")]
#[command(about = "Incident hotspot clustering and patrol route planning")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster incidents into hotspots and split a patrol tour between officers
    Plan {
        /// Incident CSV (latitude/longitude columns)
        #[arg(short, long)]
        input: PathBuf,

        /// JSON config file; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of hotspots [default: 5]
        #[arg(long)]
        hotspots: Option<usize>,

        /// Number of officers [default: 1]
        #[arg(long)]
        officers: Option<usize>,

        /// Tour strategy [default: vnd]
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,

        /// Clustering seed [default: 42]
        #[arg(short, long)]
        seed: Option<u64>,

        /// Clustering iteration cap [default: 100]
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Write the full plan as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write one CSV row per route stop
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write an SVG map
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Write a PNG map (needs the `png` feature)
        #[arg(long)]
        png: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List hotspots without planning routes
    Hotspots {
        #[arg(short, long)]
        input: PathBuf,

        /// Number of clusters
        #[arg(short = 'k', long, default_value_t = DEFAULT_SURVEY_CLUSTERS)]
        clusters: usize,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Write hotspots as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarize an incident file
    Analyze {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compare tour strategies over several hotspot counts and seeds
    Benchmark {
        #[arg(short, long)]
        input: PathBuf,

        /// Hotspot counts to try
        #[arg(long, value_delimiter = ',', default_value = "5,10,20")]
        hotspot_counts: Vec<usize>,

        /// Number of officers
        #[arg(long, default_value = "2")]
        officers: usize,

        /// Number of seeds per combination
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Strategy {
    /// Nearest Neighbor construction
    Nn,
    /// Greedy edge construction
    GreedyEdge,
    /// Farthest insertion construction
    Farthest,
    /// Nearest Neighbor + 2-Opt
    TwoOpt,
    /// Nearest Neighbor + Variable Neighborhood Descent
    Vnd,
    /// Best construction + Variable Neighborhood Descent
    MultiStart,
}

impl From<Strategy> for TourStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Nn => TourStrategy::NearestNeighbor,
            Strategy::GreedyEdge => TourStrategy::GreedyEdge,
            Strategy::Farthest => TourStrategy::FarthestInsertion,
            Strategy::TwoOpt => TourStrategy::TwoOpt,
            Strategy::Vnd => TourStrategy::Vnd,
            Strategy::MultiStart => TourStrategy::MultiStart,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Plan {
            input,
            config,
            hotspots,
            officers,
            strategy,
            seed,
            max_iterations,
            output,
            csv,
            svg,
            png,
            verbose,
        } => load_config(config.as_deref()).and_then(|mut planner_config| {
            if let Some(k) = hotspots {
                planner_config.hotspot_count = k;
            }
            if let Some(m) = officers {
                planner_config.officer_count = m;
            }
            if let Some(s) = strategy {
                planner_config.strategy = s.into();
            }
            if let Some(s) = seed {
                planner_config.seed = s;
            }
            if let Some(it) = max_iterations {
                planner_config.max_iterations = it;
            }
            plan_routes(&input, planner_config, Outputs { json: output, csv, svg, png }, verbose)
        }),

        Commands::Hotspots {
            input,
            clusters,
            seed,
            output,
        } => list_hotspots(&input, clusters, seed, output),

        Commands::Analyze { input } => analyze_incidents(&input),

        Commands::Benchmark {
            input,
            hotspot_counts,
            officers,
            runs,
            output,
        } => run_benchmark(&input, hotspot_counts, officers, runs, &output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct Outputs {
    json: Option<PathBuf>,
    csv: Option<PathBuf>,
    svg: Option<PathBuf>,
    png: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> PatrolResult<PlannerConfig> {
    match path {
        Some(path) => PlannerConfig::from_file(path),
        None => Ok(PlannerConfig::default()),
    }
}

fn plan_routes(
    path: &Path,
    config: PlannerConfig,
    outputs: Outputs,
    verbose: bool,
) -> PatrolResult<()> {
    println!("Loading incidents from {:?}...", path);
    let incidents = load_incidents_csv(path)?;
    let points = coordinates(&incidents);

    if verbose {
        if let Some(stats) = IncidentStatistics::from_incidents(&incidents) {
            println!("{}", stats);
        }
        println!("Config: {:?}", config);
    }

    let plan = PatrolPlanner::new(config).plan(&points)?;

    println!("\n{}", plan);

    if verbose {
        println!("Cluster sizes: {:?}", plan.model.cluster_sizes());
        println!("Tour: {:?}", plan.tour.cycle());
        println!("Route imbalance: {:.2} km", plan.distance_imbalance_km());
    }

    if let Some(out_path) = outputs.json {
        plan.save_json(&out_path)?;
        println!("Plan saved to {:?}", out_path);
    }

    if let Some(csv_path) = outputs.csv {
        plan.save_routes_csv(&csv_path)?;
        println!("Routes saved to {:?}", csv_path);
    }

    if outputs.svg.is_some() || outputs.png.is_some() {
        let viz = Visualizer::new();
        let svg = viz.generate_svg(&plan, &points);

        if let Some(svg_path) = outputs.svg {
            viz.save_svg(&svg, &svg_path)?;
            println!("Map saved to {:?}", svg_path);
        }
        if let Some(png_path) = outputs.png {
            viz.save_png(&svg, &png_path)?;
            println!("Map saved to {:?}", png_path);
        }
    }

    Ok(())
}

fn list_hotspots(
    path: &Path,
    clusters: usize,
    seed: u64,
    output: Option<PathBuf>,
) -> PatrolResult<()> {
    let incidents = load_incidents_csv(path)?;
    let points = coordinates(&incidents);

    let model = LloydKMeans::with_params(seed, DEFAULT_MAX_ITERATIONS).fit(&points, clusters)?;
    let mut hotspots = hotspot::aggregate(&points, &model.labels);
    hotspots.sort_by(|a, b| b.count.cmp(&a.count).then(a.id.cmp(&b.id)));

    println!("========== Hotspots ==========\n");
    println!("{:<6} {:>12} {:>12} {:>10}", "Id", "Latitude", "Longitude", "Incidents");
    println!("{}", "-".repeat(44));
    for h in &hotspots {
        println!("{:<6} {:>12.6} {:>12.6} {:>10}", h.id, h.latitude, h.longitude, h.count);
    }

    if let Some(out_path) = output {
        save_json(&hotspots, &out_path)?;
        println!("\nHotspots saved to {:?}", out_path);
    }

    Ok(())
}

fn analyze_incidents(path: &Path) -> PatrolResult<()> {
    let incidents = load_incidents_csv(path)?;

    println!("========== Incident Analysis ==========\n");
    let Some(stats) = IncidentStatistics::from_incidents(&incidents) else {
        println!("No incidents.");
        return Ok(());
    };
    println!("{}", stats);

    let points = coordinates(&incidents);
    let model = LloydKMeans::new().fit(&points, DEFAULT_SURVEY_CLUSTERS)?;
    let hotspots = hotspot::aggregate(&points, &model.labels);
    let matrix = DistanceMatrix::from_hotspots(&hotspots);

    println!(
        "Clustering: {} hotspots, {} iterations, converged: {}, reseeds: {}",
        hotspots.len(),
        model.iterations,
        model.converged,
        model.reseeds
    );
    println!("{}", matrix.statistics());

    println!("Quick Tour Estimates:");
    for strategy in [TourStrategy::NearestNeighbor, TourStrategy::Vnd, TourStrategy::MultiStart] {
        let solver = strategy.solver();
        let tour = solver.solve(&matrix);
        println!(
            "  {:<35} {:>10.2} km ({:.4}s)",
            solver.name(),
            tour.length * KM_PER_DEGREE,
            tour.computation_time
        );
    }

    Ok(())
}

fn run_benchmark(
    path: &Path,
    hotspot_counts: Vec<usize>,
    officers: usize,
    runs: usize,
    output: &Path,
) -> PatrolResult<()> {
    println!("Loading incidents from {:?}...", path);
    let incidents = load_incidents_csv(path)?;
    let points = coordinates(&incidents);

    std::fs::create_dir_all(output)?;

    let config = BenchmarkConfig {
        hotspot_counts,
        officer_count: officers,
        num_runs: runs,
        ..Default::default()
    };

    let mut benchmark = Benchmark::new(config);
    benchmark.run(&points)?;

    let results_path = output.join("results.csv");
    benchmark.export_to_csv(&results_path)?;
    println!("\nResults exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    benchmark.export_statistics_csv(&stats_path)?;
    println!("Statistics exported to {:?}", stats_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report)?;
    println!("Report saved to {:?}", report_path);

    Ok(())
}
