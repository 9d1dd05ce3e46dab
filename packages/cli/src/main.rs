#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI toolchain for the waterlog map platform.
//!
//! Runs the API server, inspects ward boundary files, and runs the
//! aggregation pass offline against a JSON file of report seeds —
//! useful for tuning the scoring policy against historical data without
//! standing up the server.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use waterlog_map_analytics::aggregate::{self, AggregationInput};
use waterlog_map_analytics::heatmap;
use waterlog_map_analytics_models::{RiskCategory, RiskWeights, ScoredWard};
use waterlog_map_geography::loader::load_ward_boundaries;
use waterlog_map_geography_models::{Ward, WardBoundary, WardShape};
use waterlog_map_report_models::{Report, ReportSeverity, ReportStatus};
use waterlog_map_server::config::ServerConfig;
use waterlog_map_spatial::WardIndex;

#[derive(Parser)]
#[command(name = "waterlog_map_cli", about = "Waterlog map toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the API server.
    Serve,
    /// Parse a ward boundary file and report what it contains.
    LoadWards {
        /// Path to the ward boundary GeoJSON file.
        #[arg(long)]
        geojson: PathBuf,
    },
    /// Run the aggregation pass offline and print scored wards.
    Score {
        /// Path to the ward boundary GeoJSON file.
        #[arg(long)]
        geojson: PathBuf,
        /// Path to a JSON array of report seeds.
        #[arg(long)]
        reports: Option<PathBuf>,
    },
    /// Run the aggregation pass offline and write the hotspot
    /// FeatureCollection to a file.
    Heatmap {
        /// Path to the ward boundary GeoJSON file.
        #[arg(long)]
        geojson: PathBuf,
        /// Path to a JSON array of report seeds.
        #[arg(long)]
        reports: Option<PathBuf>,
        /// Output path for the GeoJSON heatmap.
        #[arg(long)]
        output: PathBuf,
    },
}

/// A historical report row for offline scoring: coordinates are all
/// that matters; everything else is optional.
#[derive(Debug, Deserialize)]
struct ReportSeed {
    latitude: f64,
    longitude: f64,
    title: Option<String>,
    description: Option<String>,
    severity: Option<ReportSeverity>,
    status: Option<ReportStatus>,
}

impl ReportSeed {
    fn into_report(self, id: i64) -> Report {
        Report {
            id,
            user_id: 0,
            title: self.title.unwrap_or_else(|| "Imported report".to_string()),
            description: self
                .description
                .unwrap_or_else(|| "Imported from a report seed file".to_string()),
            latitude: self.latitude,
            longitude: self.longitude,
            address: None,
            ward_id: None,
            status: self.status.unwrap_or(ReportStatus::Open),
            severity: self.severity.unwrap_or_default(),
            assigned_agency: None,
            image_path: None,
            resolution_image_path: None,
            upvote_count: 0,
            comment_count: 0,
            created_at: Utc::now(),
            updated_at: None,
            resolved_at: None,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve => {
            let config = ServerConfig::from_env();
            actix_web::rt::System::new().block_on(waterlog_map_server::run(config))?;
        }
        Command::LoadWards { geojson } => load_wards(&geojson)?,
        Command::Score { geojson, reports } => score(&geojson, reports.as_deref())?,
        Command::Heatmap {
            geojson,
            reports,
            output,
        } => write_heatmap(&geojson, reports.as_deref(), &output)?,
    }

    Ok(())
}

fn load_wards(geojson: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let boundaries = load_ward_boundaries(geojson)?;

    println!("{} wards:", boundaries.len());
    for boundary in &boundaries {
        let area = waterlog_map_geography::area::area_sq_km(&boundary.polygon);
        println!(
            "  {:>6}  {:<30} {:>8.2} km²",
            boundary.ward_number, boundary.ward_name, area
        );
    }

    Ok(())
}

fn score(geojson: &Path, reports: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let (wards, _, scored) = run_pass(geojson, reports)?;

    println!(
        "{:>6}  {:<30} {:>10}  {:>7}  {}",
        "ward", "name", "density", "score", "category"
    );
    for (ward, scored) in wards.iter().zip(&scored) {
        println!(
            "{:>6}  {:<30} {:>10.3}  {:>7.1}  {}",
            ward.ward_number,
            ward.ward_name,
            scored.incident_density,
            scored.risk_score,
            RiskCategory::from_score(scored.risk_score)
        );
    }

    Ok(())
}

fn write_heatmap(
    geojson: &Path,
    reports: Option<&Path>,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut wards, shapes, scored) = run_pass(geojson, reports)?;

    for (ward, scored) in wards.iter_mut().zip(&scored) {
        ward.risk_score = scored.risk_score;
        ward.incident_density = scored.incident_density;
        ward.elevation_avg = scored.elevation_avg;
        ward.slope_avg = scored.slope_avg;
    }

    let collection = heatmap::hotspot_collection(&wards, &shapes);
    std::fs::write(output, serde_json::to_string_pretty(&collection)?)?;
    log::info!("Saved heatmap to {}", output.display());

    Ok(())
}

/// Loads boundaries and seeds, then runs one aggregation pass.
fn run_pass(
    geojson: &Path,
    reports: Option<&Path>,
) -> Result<(Vec<Ward>, Vec<WardShape>, Vec<ScoredWard>), Box<dyn std::error::Error>> {
    let boundaries = load_ward_boundaries(geojson)?;
    let (wards, shapes) = register_offline(&boundaries);
    let index = WardIndex::from_shapes(&shapes);

    let reports = match reports {
        Some(path) => read_seeds(path)?,
        None => Vec::new(),
    };
    log::info!(
        "Scoring {} wards against {} reports",
        wards.len(),
        reports.len()
    );

    let terrain = BTreeMap::new();
    let input = AggregationInput {
        reports: &reports,
        wards: &wards,
        shapes: &shapes,
        terrain: &terrain,
        weights: RiskWeights::default(),
    };
    let scored = aggregate::recompute(&input, &index);

    Ok((wards, shapes, scored))
}

/// Assigns sequential ids to loaded boundaries without a store.
fn register_offline(boundaries: &[WardBoundary]) -> (Vec<Ward>, Vec<WardShape>) {
    let mut wards = Vec::with_capacity(boundaries.len());
    let mut shapes = Vec::with_capacity(boundaries.len());

    for (index, boundary) in boundaries.iter().enumerate() {
        let id = index as i64 + 1;
        wards.push(Ward::new(
            id,
            boundary.ward_number.clone(),
            boundary.ward_name.clone(),
        ));
        shapes.push(WardShape {
            ward_id: id,
            polygon: boundary.polygon.clone(),
        });
    }

    (wards, shapes)
}

fn read_seeds(path: &Path) -> Result<Vec<Report>, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let seeds: Vec<ReportSeed> = serde_json::from_str(&raw)?;

    Ok(seeds
        .into_iter()
        .enumerate()
        .map(|(index, seed)| seed.into_report(index as i64 + 1))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_parse_with_minimal_fields() {
        let seeds: Vec<ReportSeed> = serde_json::from_str(
            r#"[
                { "latitude": 28.61, "longitude": 77.21 },
                { "latitude": 28.7, "longitude": 77.1, "severity": "CRITICAL", "status": "RESOLVED" }
            ]"#,
        )
        .unwrap();

        let first = seeds
            .into_iter()
            .enumerate()
            .map(|(i, s)| s.into_report(i as i64 + 1))
            .collect::<Vec<_>>();

        assert_eq!(first[0].severity, ReportSeverity::Medium);
        assert_eq!(first[0].status, ReportStatus::Open);
        assert_eq!(first[1].severity, ReportSeverity::Critical);
        assert_eq!(first[1].status, ReportStatus::Resolved);
    }

    #[test]
    fn offline_registration_assigns_sequential_ids() {
        use geo::{Coord, LineString, MultiPolygon, Polygon};

        let ring = LineString::from(vec![
            Coord { x: 77.0, y: 28.0 },
            Coord { x: 77.1, y: 28.0 },
            Coord { x: 77.1, y: 28.1 },
            Coord { x: 77.0, y: 28.1 },
            Coord { x: 77.0, y: 28.0 },
        ]);
        let boundary = WardBoundary {
            ward_number: "001".to_string(),
            ward_name: "Narela".to_string(),
            polygon: MultiPolygon(vec![Polygon::new(ring, vec![])]),
        };

        let (wards, shapes) = register_offline(&[boundary]);
        assert_eq!(wards[0].id, 1);
        assert_eq!(shapes[0].ward_id, 1);
    }
}
