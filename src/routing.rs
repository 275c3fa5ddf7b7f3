//! Splitting a tour into officer routes and estimating their cost.
//!
//! The split is by hotspot count, not by distance: officers 1..m-1 each get
//! `floor(N / m)` consecutive hotspots and the last officer takes the rest.
//! Officers can therefore end up with routes of very different length.

use crate::error::{PatrolError, PatrolResult};
use crate::hotspot::Hotspot;
use serde::{Deserialize, Serialize};

/// Flat-plane conversion from degrees to kilometres. Only reasonable over a
/// city-sized area.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Patrol pace assumption (about 6 km/h).
pub const MINUTES_PER_KM: f64 = 10.0;

/// One officer's share of the tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficerRoute {
    /// 1-based officer number
    pub officer_id: usize,
    /// Hotspots in visiting order
    pub sequence: Vec<Hotspot>,
    pub total_distance_km: f64,
    pub est_time_mins: u64,
}

impl OfficerRoute {
    /// Build a route and compute its metrics.
    pub fn new(officer_id: usize, sequence: Vec<Hotspot>) -> Self {
        let metrics = RouteMetrics::for_sequence(&sequence);
        OfficerRoute {
            officer_id,
            sequence,
            total_distance_km: metrics.distance_km,
            est_time_mins: metrics.time_mins,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Distance and time estimate of a hotspot sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteMetrics {
    pub distance_km: f64,
    pub time_mins: u64,
}

impl RouteMetrics {
    /// Sum of consecutive centroid distances, converted to km. The route is
    /// open: there is no return leg to the first hotspot.
    pub fn for_sequence(sequence: &[Hotspot]) -> Self {
        let degrees: f64 = sequence.windows(2).map(|w| w[0].distance(&w[1])).sum();
        Self::from_degrees(degrees)
    }

    pub fn from_degrees(degrees: f64) -> Self {
        let distance_km = degrees * KM_PER_DEGREE;
        RouteMetrics {
            distance_km,
            time_mins: (distance_km * MINUTES_PER_KM).round() as u64,
        }
    }
}

/// Drop the closing repeat of a cycle, if present.
pub fn open_path(cycle: &[usize]) -> &[usize] {
    match cycle {
        [first, .., last] if cycle.len() >= 2 && first == last => &cycle[..cycle.len() - 1],
        _ => cycle,
    }
}

/// Cut `path` into `officer_count` contiguous chunks in path order.
pub fn chunk_path(path: &[usize], officer_count: usize) -> PatrolResult<Vec<&[usize]>> {
    if officer_count == 0 {
        return Err(PatrolError::InvalidOfficerCount(officer_count));
    }

    let chunk = path.len() / officer_count;
    Ok((0..officer_count)
        .map(|i| {
            let start = i * chunk;
            let end = if i + 1 < officer_count { start + chunk } else { path.len() };
            &path[start..end]
        })
        .collect())
}

/// Split a closed cycle over `hotspots` into one route per officer.
///
/// `cycle` holds indices into `hotspots`; an index past the end is an
/// error. Officers beyond the number of hotspots still get an (empty) route.
pub fn partition_route(
    cycle: &[usize],
    hotspots: &[Hotspot],
    officer_count: usize,
) -> PatrolResult<Vec<OfficerRoute>> {
    let path = open_path(cycle);
    let chunks = chunk_path(path, officer_count)?;

    if let Some(&index) = path.iter().find(|&&node| node >= hotspots.len()) {
        return Err(PatrolError::InvalidTourIndex {
            index,
            hotspots: hotspots.len(),
        });
    }

    let routes: Vec<OfficerRoute> = chunks
        .into_iter()
        .enumerate()
        .map(|(i, nodes)| {
            let sequence = nodes.iter().map(|&node| hotspots[node].clone()).collect();
            OfficerRoute::new(i + 1, sequence)
        })
        .collect();

    for route in &routes {
        log::debug!(
            "officer {}: {} hotspots, {:.2} km, {} min",
            route.officer_id,
            route.sequence.len(),
            route.total_distance_km,
            route.est_time_mins
        );
    }

    Ok(routes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_hotspots(n: usize) -> Vec<Hotspot> {
        (0..n).map(|i| Hotspot::new(i, 0.0, i as f64 * 0.01, 1)).collect()
    }

    fn closed(order: &[usize]) -> Vec<usize> {
        let mut cycle = order.to_vec();
        if cycle.len() >= 2 {
            cycle.push(cycle[0]);
        }
        cycle
    }

    #[test]
    fn test_open_path() {
        assert_eq!(open_path(&[0, 2, 1, 0]), &[0, 2, 1]);
        assert_eq!(open_path(&[0]), &[0]);
        assert!(open_path(&[]).is_empty());
    }

    #[test]
    fn test_zero_officers_rejected() {
        assert!(matches!(
            partition_route(&[0, 1, 0], &line_hotspots(2), 0),
            Err(PatrolError::InvalidOfficerCount(0))
        ));
        assert!(chunk_path(&[], 0).is_err());
    }

    #[test]
    fn test_five_hotspots_two_officers() {
        let hotspots = line_hotspots(5);
        let routes = partition_route(&closed(&[0, 1, 2, 3, 4]), &hotspots, 2).unwrap();

        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].officer_id, 1);
        assert_eq!(routes[0].sequence.len(), 2);
        assert_eq!(routes[1].officer_id, 2);
        assert_eq!(routes[1].sequence.len(), 3);
    }

    #[test]
    fn test_chunk_size_law() {
        let path: Vec<usize> = (0..11).collect();
        for m in 1..15 {
            let chunks = chunk_path(&path, m).unwrap();
            assert_eq!(chunks.len(), m);
            for chunk in &chunks[..m - 1] {
                assert_eq!(chunk.len(), 11 / m);
            }
            assert_eq!(chunks[m - 1].len(), 11 - (m - 1) * (11 / m));

            let rejoined: Vec<usize> = chunks.concat();
            assert_eq!(rejoined, path);
        }
    }

    #[test]
    fn test_route_order_follows_tour() {
        let hotspots = line_hotspots(6);
        let order = [0, 3, 5, 4, 2, 1];
        let routes = partition_route(&closed(&order), &hotspots, 3).unwrap();

        let visited: Vec<usize> = routes
            .iter()
            .flat_map(|r| r.sequence.iter().map(|h| h.id))
            .collect();
        assert_eq!(visited, order.to_vec());
    }

    #[test]
    fn test_more_officers_than_hotspots() {
        let hotspots = line_hotspots(2);
        let routes = partition_route(&closed(&[0, 1]), &hotspots, 4).unwrap();

        assert_eq!(routes.len(), 4);
        assert!(routes[..3].iter().all(OfficerRoute::is_empty));
        assert_eq!(routes[3].sequence.len(), 2);
        assert_eq!(routes.iter().map(|r| r.officer_id).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_tour_index_out_of_range() {
        let hotspots = line_hotspots(3);
        let result = partition_route(&[0, 1, 5, 0], &hotspots, 2);
        assert!(matches!(
            result,
            Err(PatrolError::InvalidTourIndex { index: 5, hotspots: 3 })
        ));
    }

    #[test]
    fn test_empty_tour() {
        let routes = partition_route(&[], &[], 3).unwrap();
        assert_eq!(routes.len(), 3);
        assert!(routes
            .iter()
            .all(|r| r.is_empty() && r.total_distance_km == 0.0 && r.est_time_mins == 0));
    }

    #[test]
    fn test_metrics() {
        // 0.1 deg + 0.1 deg along a line = 22.2 km
        let sequence = vec![
            Hotspot::new(0, 0.0, 0.0, 1),
            Hotspot::new(1, 0.0, 0.1, 1),
            Hotspot::new(2, 0.0, 0.2, 1),
        ];
        let metrics = RouteMetrics::for_sequence(&sequence);
        assert!((metrics.distance_km - 22.2).abs() < 1e-9);
        assert_eq!(metrics.time_mins, 222);

        assert_eq!(RouteMetrics::for_sequence(&sequence[..1]).distance_km, 0.0);
        assert_eq!(RouteMetrics::for_sequence(&[]).time_mins, 0);
    }

    #[test]
    fn test_time_is_rounded() {
        // 0.0005 deg = 0.0555 km = 0.555 min
        assert_eq!(RouteMetrics::from_degrees(0.0005).time_mins, 1);
        // 0.0004 deg = 0.0444 km = 0.444 min
        assert_eq!(RouteMetrics::from_degrees(0.0004).time_mins, 0);
    }
}
