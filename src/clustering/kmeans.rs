//! Lloyd's k-means over (latitude, longitude) pairs.

use super::{clamp_cluster_count, ClusterModel, PointClusterer};
use crate::error::PatrolResult;
use crate::incident::{validate_coordinates, Coordinate};
use chrono::Utc;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Iterative centroid relocation (Lloyd's algorithm).
///
/// Initial centroids are `k` distinct input points drawn from a ChaCha8
/// sequence seeded with `seed`, so identical input always yields identical
/// clusters. An assignment pass that leaves a cluster empty moves the point
/// farthest from its nearest live centroid into that cluster, which keeps every
/// cluster populated whenever there are at least `k` points.
#[derive(Debug, Clone)]
pub struct LloydKMeans {
    pub seed: u64,
    pub max_iterations: usize,
}

impl LloydKMeans {
    pub fn new() -> Self {
        LloydKMeans {
            seed: DEFAULT_SEED,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_params(seed: u64, max_iterations: usize) -> Self {
        LloydKMeans { seed, max_iterations }
    }
}

impl Default for LloydKMeans {
    fn default() -> Self {
        Self::new()
    }
}

impl PointClusterer for LloydKMeans {
    fn fit(&self, points: &[Coordinate], k: usize) -> PatrolResult<ClusterModel> {
        validate_coordinates(points)?;

        let n = points.len();
        if n == 0 {
            return Ok(ClusterModel::empty(self.seed, self.name()));
        }
        let k = clamp_cluster_count(k, n);

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut centroids: Vec<Coordinate> = rand::seq::index::sample(&mut rng, n, k)
            .into_iter()
            .map(|i| points[i])
            .collect();

        let mut labels = vec![0usize; n];
        let mut reseeds = update_assignments(points, &mut centroids, &mut labels);

        let mut iterations = 0;
        let mut converged = false;
        let mut next = vec![0usize; n];

        while iterations < self.max_iterations {
            iterations += 1;
            update_centroids(points, &labels, &mut centroids);
            reseeds += update_assignments(points, &mut centroids, &mut next);

            if next == labels {
                converged = true;
                break;
            }
            std::mem::swap(&mut labels, &mut next);
        }

        // reseeding may have left a centroid on a single point; recompute from the final labels
        update_centroids(points, &labels, &mut centroids);

        if converged {
            log::debug!(
                "k-means: n={} k={} converged after {} iterations ({} reseeds)",
                n,
                k,
                iterations,
                reseeds
            );
        } else {
            log::warn!(
                "k-means: n={} k={} hit the {} iteration cap without converging",
                n,
                k,
                self.max_iterations
            );
        }

        Ok(ClusterModel {
            labels,
            centroids,
            iterations,
            converged,
            reseeds,
            seed: self.seed,
            algorithm: self.name().to_string(),
            trained_at: Utc::now(),
        })
    }

    fn name(&self) -> &str {
        "LloydKMeans"
    }
}

/// Assign each point to its nearest centroid, then repopulate empty clusters.
/// Returns the number of reseeded clusters.
fn update_assignments(
    points: &[Coordinate],
    centroids: &mut [Coordinate],
    labels: &mut [usize],
) -> usize {
    let k = centroids.len();
    let mut counts = vec![0usize; k];
    let mut costs = vec![0.0; points.len()];

    for ((point, label), cost) in points.iter().zip(labels.iter_mut()).zip(costs.iter_mut()) {
        let mut min_dist = f64::INFINITY;
        let mut index = 0;
        for (c, centre) in centroids.iter().enumerate() {
            // squared distance is enough to rank
            let dist = point.dist2(centre);
            if dist < min_dist {
                min_dist = dist;
                index = c;
            }
        }
        *label = index;
        *cost = min_dist;
        counts[index] += 1;
    }

    let mut reseeds = 0;
    for c in 0..k {
        if counts[c] > 0 {
            continue;
        }

        // only take from clusters that stay non-empty; first index wins ties
        let donor = (0..points.len())
            .filter(|&i| counts[labels[i]] > 1)
            .fold(None, |best: Option<usize>, i| match best {
                Some(b) if costs[b] >= costs[i] => Some(b),
                _ => Some(i),
            });

        if let Some(i) = donor {
            log::debug!("k-means: cluster {} empty, reseeding at point {}", c, i);
            counts[labels[i]] -= 1;
            labels[i] = c;
            counts[c] = 1;
            centroids[c] = points[i];
            reseeds += 1;

            // costs are distances to the nearest live centroid, which now includes c
            for (point, cost) in points.iter().zip(costs.iter_mut()) {
                *cost = cost.min(point.dist2(&centroids[c]));
            }
        }
    }

    reseeds
}

fn update_centroids(points: &[Coordinate], labels: &[usize], centroids: &mut [Coordinate]) {
    let k = centroids.len();
    let mut sums = vec![(0.0, 0.0); k];
    let mut counts = vec![0usize; k];

    for (point, &label) in points.iter().zip(labels.iter()) {
        sums[label].0 += point.latitude;
        sums[label].1 += point.longitude;
        counts[label] += 1;
    }

    for ((centroid, (lat, lon)), &count) in centroids.iter_mut().zip(sums).zip(counts.iter()) {
        if count > 0 {
            *centroid = Coordinate::new(lat / count as f64, lon / count as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PatrolError;

    fn random_points(n: usize, seed: u64) -> Vec<Coordinate> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n)
            .map(|_| Coordinate::new(17.2 + rng.gen::<f64>() * 0.3, 78.3 + rng.gen::<f64>() * 0.3))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let model = LloydKMeans::new().fit(&[], 5).unwrap();
        assert!(model.is_empty());
        assert_eq!(model.num_clusters(), 0);
    }

    #[test]
    fn test_cluster_count_is_clamped() {
        let points = random_points(7, 1);
        for (k, expected) in [(0, 1), (1, 1), (3, 3), (7, 7), (50, 7)] {
            let model = LloydKMeans::new().fit(&points, k).unwrap();
            assert_eq!(model.num_clusters(), expected);
            assert!(model.cluster_sizes().iter().all(|&s| s > 0), "empty cluster for k={}", k);
        }
    }

    #[test]
    fn test_every_point_labelled() {
        let points = random_points(200, 3);
        let model = LloydKMeans::new().fit(&points, 10).unwrap();

        assert_eq!(model.labels.len(), 200);
        assert!(model.labels.iter().all(|&l| l < 10));
        assert_eq!(model.cluster_sizes().iter().sum::<usize>(), 200);
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let points = random_points(150, 9);
        let a = LloydKMeans::new().fit(&points, 6).unwrap();
        let b = LloydKMeans::new().fit(&points, 6).unwrap();

        assert_eq!(a.labels, b.labels);
        assert_eq!(a.centroids, b.centroids);
        assert_eq!(a.iterations, b.iterations);
    }

    #[test]
    fn test_coincident_points_are_reseeded() {
        let points = vec![Coordinate::new(17.4, 78.5), Coordinate::new(17.4, 78.5)];
        let model = LloydKMeans::new().fit(&points, 2).unwrap();

        assert_eq!(model.num_clusters(), 2);
        assert_eq!(model.cluster_sizes(), vec![1, 1]);
        assert!(model.reseeds > 0);
        assert!(model.centroids.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_reseed_uses_distance_to_nearest_live_centroid() {
        let points = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.0),
            Coordinate::new(10.0, 10.0),
            Coordinate::new(10.0, 10.1),
            Coordinate::new(-6.0, 0.0),
        ];
        let mut centroids = vec![Coordinate::new(0.0, 0.0); 3];
        let mut labels = vec![0; points.len()];

        let reseeds = update_assignments(&points, &mut centroids, &mut labels);

        // (10, 10.1) is farthest first; once it is live, (10, 10) sits next to it
        // and (-6, 0) becomes the farthest point
        assert_eq!(reseeds, 2);
        assert_eq!(labels, vec![0, 0, 0, 1, 2]);
        assert_eq!(centroids[1], Coordinate::new(10.0, 10.1));
        assert_eq!(centroids[2], Coordinate::new(-6.0, 0.0));
    }

    #[test]
    fn test_many_duplicates_fill_all_clusters() {
        let mut points = vec![Coordinate::new(1.0, 1.0); 10];
        points.push(Coordinate::new(5.0, 5.0));
        let model = LloydKMeans::new().fit(&points, 4).unwrap();

        assert_eq!(model.num_clusters(), 4);
        assert!(model.cluster_sizes().iter().all(|&s| s > 0));
    }

    #[test]
    fn test_separated_pairs() {
        let points = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(10.0, 10.0),
            Coordinate::new(0.0, 0.1),
            Coordinate::new(10.0, 10.1),
        ];
        let model = LloydKMeans::new().fit(&points, 2).unwrap();

        assert!(model.converged);
        assert_eq!(model.labels[0], model.labels[2]);
        assert_eq!(model.labels[1], model.labels[3]);
        assert_ne!(model.labels[0], model.labels[1]);
    }

    #[test]
    fn test_single_cluster_is_mean() {
        let points = vec![Coordinate::new(0.0, 0.0), Coordinate::new(2.0, 4.0)];
        let model = LloydKMeans::new().fit(&points, 1).unwrap();
        assert_eq!(model.centroids, vec![Coordinate::new(1.0, 2.0)]);
    }

    #[test]
    fn test_non_finite_rejected() {
        let points = vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, f64::NAN)];
        assert!(matches!(
            LloydKMeans::new().fit(&points, 2),
            Err(PatrolError::InvalidCoordinate { index: 1, .. })
        ));
    }
}
