//! Tour construction heuristics.
//!
//! Every heuristic is deterministic: candidates are scanned in index order
//! and only a strictly better candidate replaces the current choice, so ties
//! go to the lower index. Constructed tours are rotated to start at hotspot 0.

use crate::matrix::DistanceMatrix;
use crate::tour::Tour;
use ordered_float::OrderedFloat;

pub trait ConstructionHeuristic {
    fn construct(&self, matrix: &DistanceMatrix) -> Tour;
    fn name(&self) -> &str;
}

/// Nearest Neighbor Heuristic
///
/// Builds a tour by repeatedly visiting the nearest unvisited hotspot.
pub struct NearestNeighborHeuristic {
    pub start: usize,
}

impl NearestNeighborHeuristic {
    pub fn new() -> Self {
        NearestNeighborHeuristic { start: 0 }
    }

    pub fn from_start(start: usize) -> Self {
        NearestNeighborHeuristic { start }
    }

    fn find_nearest(
        &self,
        matrix: &DistanceMatrix,
        current: usize,
        visited: &[bool],
    ) -> Option<usize> {
        let mut best = None;
        let mut best_dist = f64::INFINITY;
        for (node, _) in visited.iter().enumerate().filter(|&(_, &v)| !v) {
            let d = matrix.distance(current, node);
            if d < best_dist {
                best_dist = d;
                best = Some(node);
            }
        }
        best
    }
}

impl Default for NearestNeighborHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for NearestNeighborHeuristic {
    fn construct(&self, matrix: &DistanceMatrix) -> Tour {
        let start_time = std::time::Instant::now();
        let n = matrix.len();
        if n == 0 {
            return Tour::from_order(matrix, Vec::new(), self.name());
        }

        let mut current = self.start.min(n - 1);
        let mut visited = vec![false; n];
        visited[current] = true;
        let mut order = Vec::with_capacity(n);
        order.push(current);

        while let Some(next) = self.find_nearest(matrix, current, &visited) {
            visited[next] = true;
            order.push(next);
            current = next;
        }

        let mut tour = Tour::from_order(matrix, order, self.name());
        tour.rotate_to(0);
        tour.computation_time = start_time.elapsed().as_secs_f64();
        tour
    }

    fn name(&self) -> &str {
        "NearestNeighbor"
    }
}

/// Greedy Insertion Heuristic
///
/// Starts from hotspot 0 and repeatedly inserts a hotspot at the position
/// that causes the minimum increase in tour length. With `farthest_insertion`
/// the hotspot farthest from the partial tour is picked first.
pub struct GreedyInsertionHeuristic {
    pub farthest_insertion: bool,
}

impl GreedyInsertionHeuristic {
    pub fn new() -> Self {
        GreedyInsertionHeuristic {
            farthest_insertion: false,
        }
    }

    pub fn farthest() -> Self {
        GreedyInsertionHeuristic {
            farthest_insertion: true,
        }
    }

    /// Calculate insertion cost for a node after position `pos`
    fn insertion_cost(
        &self,
        matrix: &DistanceMatrix,
        tour: &[usize],
        node: usize,
        pos: usize,
    ) -> f64 {
        let prev = tour[pos];
        let next = tour[(pos + 1) % tour.len()];
        matrix.distance(prev, node) + matrix.distance(node, next) - matrix.distance(prev, next)
    }

    fn find_best_insertion(
        &self,
        matrix: &DistanceMatrix,
        tour: &[usize],
        node: usize,
    ) -> (usize, f64) {
        let mut best_pos = 0;
        let mut best_cost = f64::INFINITY;
        for pos in 0..tour.len() {
            let cost = self.insertion_cost(matrix, tour, node, pos);
            if cost < best_cost {
                best_cost = cost;
                best_pos = pos;
            }
        }
        (best_pos, best_cost)
    }

    /// Unvisited node farthest from the partial tour
    fn farthest_node(
        &self,
        matrix: &DistanceMatrix,
        tour: &[usize],
        in_tour: &[bool],
    ) -> Option<usize> {
        let mut best = None;
        let mut best_dist = f64::NEG_INFINITY;
        for node in (0..in_tour.len()).filter(|&n| !in_tour[n]) {
            let d = tour
                .iter()
                .map(|&t| matrix.distance(t, node))
                .fold(f64::INFINITY, f64::min);
            if d > best_dist {
                best_dist = d;
                best = Some(node);
            }
        }
        best
    }
}

impl Default for GreedyInsertionHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for GreedyInsertionHeuristic {
    fn construct(&self, matrix: &DistanceMatrix) -> Tour {
        let start = std::time::Instant::now();
        let n = matrix.len();
        if n == 0 {
            return Tour::from_order(matrix, Vec::new(), self.name());
        }

        let mut tour = vec![0];
        let mut in_tour = vec![false; n];
        in_tour[0] = true;

        while tour.len() < n {
            let (node, pos) = if self.farthest_insertion {
                let Some(node) = self.farthest_node(matrix, &tour, &in_tour) else {
                    break;
                };
                (node, self.find_best_insertion(matrix, &tour, node).0)
            } else {
                let mut best = (0, 0);
                let mut best_cost = f64::INFINITY;
                for node in (0..n).filter(|&n| !in_tour[n]) {
                    let (pos, cost) = self.find_best_insertion(matrix, &tour, node);
                    if cost < best_cost {
                        best_cost = cost;
                        best = (node, pos);
                    }
                }
                best
            };

            tour.insert(pos + 1, node);
            in_tour[node] = true;
        }

        let mut solution = Tour::from_order(matrix, tour, self.name());
        solution.computation_time = start.elapsed().as_secs_f64();
        solution
    }

    fn name(&self) -> &str {
        if self.farthest_insertion {
            "FarthestInsertion"
        } else {
            "CheapestInsertion"
        }
    }
}

/// Greedy Edge Heuristic
///
/// Scans all edges from shortest to longest and keeps an edge whenever both
/// endpoints still have degree < 2 and it does not close a sub-cycle. The
/// resulting Hamiltonian path is closed into a tour.
pub struct GreedyEdgeHeuristic;

impl GreedyEdgeHeuristic {
    pub fn new() -> Self {
        GreedyEdgeHeuristic
    }

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }
}

impl Default for GreedyEdgeHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for GreedyEdgeHeuristic {
    fn construct(&self, matrix: &DistanceMatrix) -> Tour {
        let start = std::time::Instant::now();
        let n = matrix.len();
        if n <= 3 {
            // every ordering of up to three nodes is the same cycle
            return Tour::from_order(matrix, (0..n).collect(), self.name());
        }

        let mut edges: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .collect();
        edges.sort_by_key(|&(i, j)| (OrderedFloat(matrix.distance(i, j)), i, j));

        let mut parent: Vec<usize> = (0..n).collect();
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::with_capacity(2); n];
        let mut accepted = 0;

        for (i, j) in edges {
            if accepted == n - 1 {
                break;
            }
            if adjacency[i].len() >= 2 || adjacency[j].len() >= 2 {
                continue;
            }
            let (ri, rj) = (Self::find(&mut parent, i), Self::find(&mut parent, j));
            if ri == rj {
                continue;
            }
            parent[ri] = rj;
            adjacency[i].push(j);
            adjacency[j].push(i);
            accepted += 1;
        }

        // walk the path from its lower-index endpoint
        let mut current = (0..n).find(|&v| adjacency[v].len() < 2).unwrap_or(0);
        let mut prev = usize::MAX;
        let mut order = Vec::with_capacity(n);
        loop {
            order.push(current);
            match adjacency[current].iter().copied().find(|&v| v != prev) {
                Some(next) if order.len() < n => {
                    prev = current;
                    current = next;
                }
                _ => break,
            }
        }

        let mut tour = Tour::from_order(matrix, order, self.name());
        tour.rotate_to(0);
        tour.computation_time = start.elapsed().as_secs_f64();
        tour
    }

    fn name(&self) -> &str {
        "GreedyEdge"
    }
}

/// Runs several construction heuristics and keeps the shortest tour
pub struct MultiStartConstruction {
    heuristics: Vec<Box<dyn ConstructionHeuristic + Send + Sync>>,
}

impl MultiStartConstruction {
    pub fn with_all_heuristics() -> Self {
        let heuristics: Vec<Box<dyn ConstructionHeuristic + Send + Sync>> = vec![
            Box::new(NearestNeighborHeuristic::new()),
            Box::new(GreedyEdgeHeuristic::new()),
            Box::new(GreedyInsertionHeuristic::new()),
            Box::new(GreedyInsertionHeuristic::farthest()),
        ];
        MultiStartConstruction { heuristics }
    }
}

impl Default for MultiStartConstruction {
    fn default() -> Self {
        Self::with_all_heuristics()
    }
}

impl ConstructionHeuristic for MultiStartConstruction {
    fn construct(&self, matrix: &DistanceMatrix) -> Tour {
        let start = std::time::Instant::now();
        let mut best: Option<Tour> = None;

        for heuristic in &self.heuristics {
            let tour = heuristic.construct(matrix);
            log::debug!("{}: length {:.6}", heuristic.name(), tour.length);
            match &best {
                Some(b) if b.length <= tour.length => {}
                _ => best = Some(tour),
            }
        }

        let mut best = best.unwrap_or_else(|| NearestNeighborHeuristic::new().construct(matrix));
        best.algorithm = format!("{}({})", self.name(), best.algorithm);
        best.computation_time = start.elapsed().as_secs_f64();
        best
    }

    fn name(&self) -> &str {
        "MultiStart"
    }
}
