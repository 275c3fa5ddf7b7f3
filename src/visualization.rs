//! SVG maps of patrol plans.
//!
//! Longitude is drawn on the x axis and latitude on the y axis (north up).
//! Each officer's route gets its own colour.

use crate::error::{PatrolError, PatrolResult};
use crate::incident::Coordinate;
use crate::planner::PatrolPlan;
use std::fs::File;
use std::io::Write;
use std::path::Path;
#[cfg(feature = "png")]
use resvg::tiny_skia::{Pixmap, Transform};
#[cfg(feature = "png")]
use resvg::usvg::{self, TreeParsing};

const ROUTE_COLORS: [&str; 8] = [
    "#e74c3c", "#3498db", "#2ecc71", "#9b59b6", "#f39c12", "#1abc9c", "#d35400", "#34495e",
];

pub fn route_color(officer_id: usize) -> &'static str {
    ROUTE_COLORS[officer_id.saturating_sub(1) % ROUTE_COLORS.len()]
}

/// SVG visualization generator
pub struct Visualizer {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub incident_radius: f64,
    pub hotspot_radius: f64,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            incident_radius: 2.0,
            hotspot_radius: 9.0,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map of incidents, hotspots and officer routes.
    pub fn generate_svg(&self, plan: &PatrolPlan, incidents: &[Coordinate]) -> String {
        let mut svg = String::new();

        let mut all: Vec<Coordinate> =
            incidents.iter().filter(|c| c.is_finite()).copied().collect();
        all.extend(plan.hotspots.iter().map(|h| h.coordinate()));
        let (min_lon, max_lon, min_lat, max_lat) = bounds(&all);

        let span = (max_lon - min_lon).max(max_lat - min_lat).max(1e-6);
        let scale = (self.width.min(self.height) - 2.0 * self.margin) / span;
        let transform = |c: &Coordinate| -> (f64, f64) {
            let x = self.margin + (c.longitude - min_lon) * scale;
            let y = self.height - self.margin - (c.latitude - min_lat) * scale;
            (x, y)
        };

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .incident {{ fill: #95a5a6; fill-opacity: 0.5; }}
    .hotspot {{ stroke: #2c3e50; stroke-width: 2; }}
    .route {{ stroke-width: 3; fill: none; stroke-linejoin: round; }}
    .label {{ font-family: Arial; font-size: 10px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            self.width, self.height, self.width, self.height
        ));

        svg.push_str(&format!(
            concat!(
                r#"<text x="{}" y="25" class="title">"#,
                "Hotspots: {} | Officers: {} | Total: {:.2} km</text>\n"
            ),
            self.margin,
            plan.hotspots.len(),
            plan.routes.len(),
            plan.total_distance_km()
        ));

        for c in incidents.iter().filter(|c| c.is_finite()) {
            let (x, y) = transform(c);
            svg.push_str(&format!(
                r#"<circle cx="{:.2}" cy="{:.2}" r="{}" class="incident"/>
"#,
                x, y, self.incident_radius
            ));
        }

        for route in plan.routes.iter().filter(|r| r.sequence.len() > 1) {
            let points: Vec<String> = route
                .sequence
                .iter()
                .map(|h| {
                    let (x, y) = transform(&h.coordinate());
                    format!("{:.2},{:.2}", x, y)
                })
                .collect();
            svg.push_str(&format!(
                r#"<polyline points="{}" class="route" stroke="{}"/>
"#,
                points.join(" "),
                route_color(route.officer_id)
            ));
        }

        // area grows with incident count
        let max_count = plan.hotspots.iter().map(|h| h.count).max().unwrap_or(1).max(1) as f64;
        for route in &plan.routes {
            let color = route_color(route.officer_id);
            for (stop, hotspot) in route.sequence.iter().enumerate() {
                let (x, y) = transform(&hotspot.coordinate());
                let share = (hotspot.count as f64 / max_count).sqrt();
                let radius = self.hotspot_radius * (0.5 + 0.5 * share);
                svg.push_str(&format!(
                    r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" class="hotspot" fill="{}"/>
<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}.{}</text>
"#,
                    x,
                    y,
                    radius,
                    color,
                    x,
                    y - radius - 3.0,
                    route.officer_id,
                    stop + 1
                ));
            }
        }

        let legend_y = self.height - 30.0;
        for (i, route) in plan.routes.iter().enumerate() {
            let x = self.margin + i as f64 * 110.0;
            svg.push_str(&format!(
                r#"<rect x="{}" y="{}" width="15" height="15" fill="{}"/>
<text x="{}" y="{}" class="label">Officer {} ({:.1} km)</text>
"#,
                x,
                legend_y,
                route_color(route.officer_id),
                x + 20.0,
                legend_y + 12.0,
                route.officer_id,
                route.total_distance_km
            ));
        }

        svg.push_str("</svg>");

        svg
    }

    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> PatrolResult<()> {
        let mut file = File::create(&path)?;
        file.write_all(svg.as_bytes())?;
        log::info!("SVG map written to {}", path.as_ref().display());
        Ok(())
    }

    /// Rasterise an SVG with resvg.
    #[cfg(feature = "png")]
    pub fn save_png<P: AsRef<Path>>(&self, svg: &str, path: P) -> PatrolResult<()> {
        let opt = usvg::Options::default();
        let tree = usvg::Tree::from_str(svg, &opt)
            .map_err(|e| PatrolError::Render(format!("usvg parse error: {}", e)))?;

        let mut pixmap = Pixmap::new(self.width as u32, self.height as u32)
            .ok_or_else(|| PatrolError::Render("failed to create pixmap".to_string()))?;
        resvg::render(&tree, resvg::FitTo::Original, Transform::default(), pixmap.as_mut())
            .ok_or_else(|| PatrolError::Render("resvg render failed".to_string()))?;
        pixmap
            .save_png(path.as_ref())
            .map_err(|e| PatrolError::Render(format!("save_png failed: {}", e)))?;

        log::info!("PNG map written to {}", path.as_ref().display());
        Ok(())
    }

    #[cfg(not(feature = "png"))]
    pub fn save_png<P: AsRef<Path>>(&self, _svg: &str, _path: P) -> PatrolResult<()> {
        Err(PatrolError::Render(
            "PNG output needs the `png` feature".to_string(),
        ))
    }
}

/// (min_lon, max_lon, min_lat, max_lat); all zero for no points.
fn bounds(points: &[Coordinate]) -> (f64, f64, f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }

    let mut min_lon = f64::INFINITY;
    let mut max_lon = f64::NEG_INFINITY;
    let mut min_lat = f64::INFINITY;
    let mut max_lat = f64::NEG_INFINITY;

    for c in points {
        min_lon = min_lon.min(c.longitude);
        max_lon = max_lon.max(c.longitude);
        min_lat = min_lat.min(c.latitude);
        max_lat = max_lat.max(c.latitude);
    }

    (min_lon, max_lon, min_lat, max_lat)
}
