//! Local search improvement heuristics for patrol tours.
//!
//! This module implements:
//! - 2-opt (segment reversal)
//! - Or-opt (relocation of 1 to 3 consecutive hotspots, either orientation)
//! - Variable Neighborhood Descent chaining the operators above
//!
//! Only strictly improving moves are applied, so each operator terminates;
//! the pass caps bound the worst case.

use crate::matrix::DistanceMatrix;
use crate::tour::{Tour, IMPROVEMENT_EPS};

/// Trait for local search improvement methods
pub trait LocalSearch {
    fn improve(&self, matrix: &DistanceMatrix, tour: &mut Tour) -> bool;
    fn name(&self) -> &str;
}

fn record_moves(tour: &mut Tour, moves: usize) {
    tour.iterations = Some(tour.iterations.unwrap_or(0) + moves);
}

/// 2-Opt Local Search
///
/// Reverses segments of the tour to remove crossing edges.
pub struct TwoOptSearch {
    /// Use first improvement instead of best improvement
    pub first_improvement: bool,
    /// Maximum number of applied moves
    pub max_passes: usize,
}

impl TwoOptSearch {
    pub fn new() -> Self {
        TwoOptSearch {
            first_improvement: false,
            max_passes: 1000,
        }
    }

    pub fn first_improvement() -> Self {
        TwoOptSearch {
            first_improvement: true,
            max_passes: 1000,
        }
    }

    fn find_move(&self, matrix: &DistanceMatrix, tour: &Tour) -> Option<(usize, usize, f64)> {
        let n = tour.len();
        let mut best: Option<(usize, usize, f64)> = None;

        for i in 0..n - 2 {
            for j in i + 2..n {
                if i == 0 && j == n - 1 {
                    continue; // both removed edges would be the same
                }
                let delta = tour.two_opt_delta(matrix, i, j);
                if delta < -IMPROVEMENT_EPS && best.map_or(true, |(_, _, b)| delta < b) {
                    best = Some((i, j, delta));
                    if self.first_improvement {
                        return best;
                    }
                }
            }
        }

        best
    }
}

impl Default for TwoOptSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSearch for TwoOptSearch {
    fn improve(&self, matrix: &DistanceMatrix, tour: &mut Tour) -> bool {
        if tour.len() < 4 {
            return false;
        }

        let mut moves = 0;
        while moves < self.max_passes {
            match self.find_move(matrix, tour) {
                Some((i, j, delta)) => {
                    tour.apply_two_opt(i, j);
                    tour.length += delta;
                    moves += 1;
                }
                None => break,
            }
        }

        tour.validate(matrix);
        record_moves(tour, moves);
        moves > 0
    }

    fn name(&self) -> &str {
        if self.first_improvement {
            "2-Opt-FI"
        } else {
            "2-Opt-BI"
        }
    }
}

/// Or-Opt Local Search
///
/// Relocates segments of 1 up to `max_segment` consecutive hotspots to the
/// cheapest other edge, inserting them forwards or reversed.
pub struct OrOptSearch {
    pub max_segment: usize,
    /// Maximum number of applied moves
    pub max_passes: usize,
}

/// A segment relocation: take `len` nodes at `start`, insert them after
/// position `after` of the remaining order
struct Relocation {
    start: usize,
    len: usize,
    after: usize,
    reversed: bool,
    delta: f64,
}

impl OrOptSearch {
    pub fn new() -> Self {
        OrOptSearch {
            max_segment: 3,
            max_passes: 1000,
        }
    }

    fn find_move(&self, matrix: &DistanceMatrix, order: &[usize]) -> Option<Relocation> {
        let n = order.len();

        for len in 1..=self.max_segment {
            if n < len + 3 {
                break;
            }
            for start in 0..=n - len {
                let first = order[start];
                let last = order[start + len - 1];
                let prev = order[(start + n - 1) % n];
                let next = order[(start + len) % n];
                let removal_gain = matrix.distance(prev, first) + matrix.distance(last, next)
                    - matrix.distance(prev, next);

                let rest: Vec<usize> = order[..start]
                    .iter()
                    .chain(&order[start + len..])
                    .copied()
                    .collect();
                let m = rest.len();
                for after in 0..m {
                    let a = rest[after];
                    let b = rest[(after + 1) % m];
                    if a == prev && b == next {
                        continue;
                    }
                    let forward = matrix.distance(a, first) + matrix.distance(last, b);
                    let backward = matrix.distance(a, last) + matrix.distance(first, b);
                    let reversed = backward < forward;
                    let insertion = forward.min(backward) - matrix.distance(a, b);

                    let delta = insertion - removal_gain;
                    if delta < -IMPROVEMENT_EPS {
                        return Some(Relocation { start, len, after, reversed, delta });
                    }
                }
            }
        }

        None
    }

    fn apply(order: &mut Vec<usize>, mv: &Relocation) {
        let mut segment: Vec<usize> = order.drain(mv.start..mv.start + mv.len).collect();
        if mv.reversed {
            segment.reverse();
        }
        let at = mv.after + 1;
        order.splice(at..at, segment);
    }
}

impl Default for OrOptSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSearch for OrOptSearch {
    fn improve(&self, matrix: &DistanceMatrix, tour: &mut Tour) -> bool {
        let mut moves = 0;
        while moves < self.max_passes {
            match self.find_move(matrix, &tour.order) {
                Some(mv) => {
                    Self::apply(&mut tour.order, &mv);
                    tour.length += mv.delta;
                    moves += 1;
                }
                None => break,
            }
        }

        if moves > 0 {
            tour.rotate_to(0);
        }
        tour.validate(matrix);
        record_moves(tour, moves);
        moves > 0
    }

    fn name(&self) -> &str {
        "Or-Opt"
    }
}

/// Variable Neighborhood Descent (VND)
///
/// Applies the operators in order, restarting from the first one after every
/// improvement.
pub struct VND {
    operators: Vec<Box<dyn LocalSearch + Send + Sync>>,
    pub max_rounds: usize,
}

impl VND {
    pub fn with_standard_operators() -> Self {
        let operators: Vec<Box<dyn LocalSearch + Send + Sync>> = vec![
            Box::new(TwoOptSearch::first_improvement()),
            Box::new(OrOptSearch::new()),
        ];

        VND { operators, max_rounds: 100 }
    }
}

impl Default for VND {
    fn default() -> Self {
        Self::with_standard_operators()
    }
}

impl LocalSearch for VND {
    fn improve(&self, matrix: &DistanceMatrix, tour: &mut Tour) -> bool {
        let mut total_improved = false;
        let mut k = 0;
        let mut rounds = 0;

        while k < self.operators.len() && rounds < self.max_rounds {
            if self.operators[k].improve(matrix, tour) {
                total_improved = true;
                k = 0;
            } else {
                k += 1;
            }
            rounds += 1;
        }

        total_improved
    }

    fn name(&self) -> &str {
        "VND"
    }
}
