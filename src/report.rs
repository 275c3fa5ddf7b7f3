//! Plan exports: briefing sheets, per-stop CSV and JSON.

use crate::error::PatrolResult;
use crate::hotspot::Hotspot;
use crate::planner::PatrolPlan;
use crate::routing::{OfficerRoute, KM_PER_DEGREE};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One row of the routes CSV
#[derive(Debug, Clone, Serialize)]
pub struct RouteStopRow {
    pub officer_id: usize,
    /// 1-based position within the officer's route
    pub stop: usize,
    pub hotspot_id: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub incident_count: usize,
    pub route_distance_km: f64,
    pub route_time_mins: u64,
}

/// Flatten routes into one row per stop. Officers without stops produce no rows.
pub fn route_rows(routes: &[OfficerRoute]) -> Vec<RouteStopRow> {
    routes
        .iter()
        .flat_map(|route| {
            route.sequence.iter().enumerate().map(move |(i, h)| RouteStopRow {
                officer_id: route.officer_id,
                stop: i + 1,
                hotspot_id: h.id,
                latitude: h.latitude,
                longitude: h.longitude,
                incident_count: h.count,
                route_distance_km: route.total_distance_km,
                route_time_mins: route.est_time_mins,
            })
        })
        .collect()
}

pub fn write_routes_csv<W: Write>(routes: &[OfficerRoute], writer: W) -> PatrolResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in route_rows(routes) {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_routes_csv<P: AsRef<Path>>(routes: &[OfficerRoute], path: P) -> PatrolResult<()> {
    write_routes_csv(routes, File::create(&path)?)?;
    log::info!("Routes written to {}", path.as_ref().display());
    Ok(())
}

/// Pretty-printed JSON of any serializable value (plans, hotspot lists).
pub fn save_json<T: Serialize + ?Sized, P: AsRef<Path>>(value: &T, path: P) -> PatrolResult<()> {
    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    log::info!("JSON written to {}", path.as_ref().display());
    Ok(())
}

impl PatrolPlan {
    pub fn to_json(&self) -> PatrolResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> PatrolResult<()> {
        save_json(self, path)
    }

    pub fn save_routes_csv<P: AsRef<Path>>(&self, path: P) -> PatrolResult<()> {
        save_routes_csv(&self.routes, path)
    }
}

impl fmt::Display for Hotspot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Hotspot #{} ({:.6}, {:.6}) - {} incidents",
            self.id, self.latitude, self.longitude, self.count
        )
    }
}

/// Briefing sheet for one officer
impl fmt::Display for OfficerRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Patrol Briefing: Officer {}", self.officer_id)?;
        writeln!(
            f,
            "Distance: {:.2} km | Est. Time: {} mins",
            self.total_distance_km, self.est_time_mins
        )?;
        if self.sequence.is_empty() {
            return writeln!(f, "  (no hotspots assigned)");
        }
        writeln!(f, "Route:")?;
        for (i, h) in self.sequence.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, h)?;
        }
        Ok(())
    }
}

impl fmt::Display for PatrolPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "========== Patrol Plan ==========")?;
        writeln!(f, "Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(
            f,
            "Hotspots: {} (requested {}, {} clustering iterations{})",
            self.hotspots.len(),
            self.config.hotspot_count,
            self.model.iterations,
            if self.model.converged { "" } else { ", not converged" }
        )?;
        writeln!(
            f,
            "Tour: {} ({:.2} km closed)",
            self.tour.algorithm,
            self.tour.length * KM_PER_DEGREE
        )?;
        writeln!(
            f,
            "Officers: {} | Total: {:.2} km, {} mins",
            self.routes.len(),
            self.total_distance_km(),
            self.total_time_mins()
        )?;
        for route in &self.routes {
            writeln!(f)?;
            write!(f, "{}", route)?;
        }
        Ok(())
    }
}
