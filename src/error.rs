//! Error type shared by the planning pipeline and its file adapters.

use thiserror::Error;

/// Errors produced by `patrol-planner`.
#[derive(Debug, Error)]
pub enum PatrolError {
    #[error("officer count must be at least 1, got {0}")]
    InvalidOfficerCount(usize),

    #[error("point {index} has a non-finite coordinate ({latitude}, {longitude})")]
    InvalidCoordinate {
        index: usize,
        latitude: f64,
        longitude: f64,
    },

    #[error("tour index {index} is out of range for {hotspots} hotspots")]
    InvalidTourIndex { index: usize, hotspots: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("render error: {0}")]
    Render(String),
}

pub type PatrolResult<T> = Result<T, PatrolError>;
