//! Reduction of clusters to hotspots.

use crate::incident::Coordinate;
use serde::{Deserialize, Serialize};

/// Centroid and member count of one spatial cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    /// Cluster id this hotspot was built from
    pub id: usize,
    pub latitude: f64,
    pub longitude: f64,
    /// Number of incidents in the cluster
    pub count: usize,
}

impl Hotspot {
    pub fn new(id: usize, latitude: f64, longitude: f64, count: usize) -> Self {
        Hotspot { id, latitude, longitude, count }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Euclidean distance between centroids, in degrees.
    #[inline]
    pub fn distance(&self, other: &Hotspot) -> f64 {
        self.coordinate().distance(&other.coordinate())
    }
}

/// One hotspot per non-empty cluster, ordered by cluster id.
///
/// `labels[i]` is the cluster of `points[i]`. Clusters with no members are
/// skipped, so the result can be shorter than the highest label + 1.
pub fn aggregate(points: &[Coordinate], labels: &[usize]) -> Vec<Hotspot> {
    let slots = labels.iter().max().map_or(0, |&m| m + 1);
    let mut sums = vec![(0.0, 0.0, 0usize); slots];

    for (point, &label) in points.iter().zip(labels.iter()) {
        let slot = &mut sums[label];
        slot.0 += point.latitude;
        slot.1 += point.longitude;
        slot.2 += 1;
    }

    sums.into_iter()
        .enumerate()
        .filter(|(_, (_, _, count))| *count > 0)
        .map(|(id, (lat, lon, count))| {
            Hotspot::new(id, lat / count as f64, lon / count as f64, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_means_and_counts() {
        let points = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(2.0, 2.0),
            Coordinate::new(10.0, 10.0),
        ];
        let hotspots = aggregate(&points, &[0, 0, 1]);

        assert_eq!(hotspots.len(), 2);
        assert_eq!(hotspots[0], Hotspot::new(0, 1.0, 1.0, 2));
        assert_eq!(hotspots[1], Hotspot::new(1, 10.0, 10.0, 1));
    }

    #[test]
    fn test_aggregate_skips_unused_ids() {
        let points = vec![Coordinate::new(1.0, 1.0), Coordinate::new(3.0, 3.0)];
        let hotspots = aggregate(&points, &[2, 0]);

        let ids: Vec<usize> = hotspots.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![0, 2]);
        assert_eq!(hotspots.iter().map(|h| h.count).sum::<usize>(), 2);
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate(&[], &[]).is_empty());
    }

    #[test]
    fn test_hotspot_distance() {
        let a = Hotspot::new(0, 0.0, 0.0, 1);
        let b = Hotspot::new(1, 3.0, 4.0, 1);
        assert!((a.distance(&b) - 5.0).abs() < 1e-10);
    }
}
