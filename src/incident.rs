//! Incident records and coordinates.
//!
//! Incidents arrive from the storage/ingestion layer as CSV exports. Only the
//! identifier and the location matter to the planner; the remaining columns are
//! carried along for reporting.

use crate::error::{PatrolError, PatrolResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A location in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate { latitude, longitude }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Squared Euclidean distance in degree space.
    #[inline]
    pub fn dist2(&self, other: &Coordinate) -> f64 {
        let dlat = self.latitude - other.latitude;
        let dlon = self.longitude - other.longitude;
        dlat * dlat + dlon * dlon
    }

    /// Euclidean distance in degree space.
    #[inline]
    pub fn distance(&self, other: &Coordinate) -> f64 {
        self.dist2(other).sqrt()
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Coordinate { latitude, longitude }
    }
}

/// A single incident record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: u64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_name: Option<String>,
}

impl Incident {
    pub fn new(id: u64, latitude: f64, longitude: f64) -> Self {
        Incident {
            id,
            latitude,
            longitude,
            crime_type: None,
            area_name: None,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Row layout accepted from CSV exports.
#[derive(Debug, Deserialize)]
struct IncidentRow {
    #[serde(default, alias = "crime_id")]
    id: Option<u64>,
    #[serde(alias = "lat")]
    latitude: f64,
    #[serde(alias = "lon", alias = "lng")]
    longitude: f64,
    #[serde(default)]
    crime_type: Option<String>,
    #[serde(default)]
    area_name: Option<String>,
}

/// Read incidents from a CSV file with a header row.
pub fn load_incidents_csv<P: AsRef<Path>>(path: P) -> PatrolResult<Vec<Incident>> {
    let file = File::open(&path)?;
    let incidents = read_incidents_csv(file)?;
    log::info!(
        "Loaded {} incidents from {}",
        incidents.len(),
        path.as_ref().display()
    );
    Ok(incidents)
}

/// Read incidents from any CSV source. Rows without an id are numbered by position.
pub fn read_incidents_csv<R: Read>(reader: R) -> PatrolResult<Vec<Incident>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut incidents = Vec::new();

    for (row_index, row) in reader.deserialize::<IncidentRow>().enumerate() {
        let row = row?;
        incidents.push(Incident {
            id: row.id.unwrap_or(row_index as u64),
            latitude: row.latitude,
            longitude: row.longitude,
            crime_type: row.crime_type.filter(|s| !s.is_empty()),
            area_name: row.area_name.filter(|s| !s.is_empty()),
        });
    }

    Ok(incidents)
}

pub fn coordinates(incidents: &[Incident]) -> Vec<Coordinate> {
    incidents.iter().map(Incident::coordinate).collect()
}

/// Reject NaN/infinite coordinates before they reach any numeric stage.
pub fn validate_coordinates(points: &[Coordinate]) -> PatrolResult<()> {
    match points.iter().position(|p| !p.is_finite()) {
        Some(index) => Err(PatrolError::InvalidCoordinate {
            index,
            latitude: points[index].latitude,
            longitude: points[index].longitude,
        }),
        None => Ok(()),
    }
}

/// Summary of an incident set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentStatistics {
    pub count: usize,
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
    pub mean_latitude: f64,
    pub mean_longitude: f64,
    /// Incidents per crime type; records without a type are not counted
    pub crime_type_counts: BTreeMap<String, usize>,
    /// Incidents per area; records without an area are not counted
    pub area_counts: BTreeMap<String, usize>,
}

impl IncidentStatistics {
    /// Returns `None` for an empty set.
    pub fn from_incidents(incidents: &[Incident]) -> Option<Self> {
        if incidents.is_empty() {
            return None;
        }

        let n = incidents.len() as f64;
        let mut crime_type_counts = BTreeMap::new();
        let mut area_counts = BTreeMap::new();
        for incident in incidents {
            if let Some(crime_type) = &incident.crime_type {
                *crime_type_counts.entry(crime_type.clone()).or_insert(0) += 1;
            }
            if let Some(area) = &incident.area_name {
                *area_counts.entry(area.clone()).or_insert(0) += 1;
            }
        }

        Some(IncidentStatistics {
            count: incidents.len(),
            min_latitude: incidents.iter().map(|i| i.latitude).fold(f64::INFINITY, f64::min),
            max_latitude: incidents.iter().map(|i| i.latitude).fold(f64::NEG_INFINITY, f64::max),
            min_longitude: incidents.iter().map(|i| i.longitude).fold(f64::INFINITY, f64::min),
            max_longitude: incidents.iter().map(|i| i.longitude).fold(f64::NEG_INFINITY, f64::max),
            mean_latitude: incidents.iter().map(|i| i.latitude).sum::<f64>() / n,
            mean_longitude: incidents.iter().map(|i| i.longitude).sum::<f64>() / n,
            crime_type_counts,
            area_counts,
        })
    }
}

impl std::fmt::Display for IncidentStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Incidents: {}", self.count)?;
        writeln!(f, "  Latitude:  {:.5} .. {:.5}", self.min_latitude, self.max_latitude)?;
        writeln!(f, "  Longitude: {:.5} .. {:.5}", self.min_longitude, self.max_longitude)?;
        writeln!(f, "  Mean location: ({:.5}, {:.5})", self.mean_latitude, self.mean_longitude)?;
        if !self.crime_type_counts.is_empty() {
            writeln!(f, "  By crime type:")?;
            for (crime_type, count) in &self.crime_type_counts {
                writeln!(f, "    {:<24} {:>6}", crime_type, count)?;
            }
        }
        if !self.area_counts.is_empty() {
            writeln!(f, "  By area:")?;
            for (area, count) in &self.area_counts {
                writeln!(f, "    {:<24} {:>6}", area, count)?;
            }
        }
        Ok(())
    }
}
