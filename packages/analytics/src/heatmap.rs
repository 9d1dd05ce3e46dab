//! `GeoJSON` `FeatureCollection` builders for the map endpoints.
//!
//! The hotspot collection carries one polygon feature per ward with the
//! risk score and category in its properties; the report collection
//! carries one point feature per (optionally status-filtered) report.

use std::collections::BTreeMap;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use waterlog_map_analytics_models::RiskCategory;
use waterlog_map_geography_models::{Ward, WardShape};
use waterlog_map_report_models::{Report, ReportStatus};

/// Builds the ward hotspot collection.
///
/// Wards without a registered geometry are skipped with a warning; the
/// map cannot render them anyway.
#[must_use]
pub fn hotspot_collection(wards: &[Ward], shapes: &[WardShape]) -> FeatureCollection {
    let shapes_by_id: BTreeMap<i64, &WardShape> =
        shapes.iter().map(|s| (s.ward_id, s)).collect();

    let features = wards
        .iter()
        .filter_map(|ward| {
            let Some(shape) = shapes_by_id.get(&ward.id) else {
                log::warn!(
                    "Ward {} ({}) has no geometry, omitted from hotspots",
                    ward.ward_number,
                    ward.ward_name
                );
                return None;
            };

            let mut properties = JsonObject::new();
            properties.insert("id".to_string(), ward.id.into());
            properties.insert("ward_number".to_string(), ward.ward_number.clone().into());
            properties.insert("ward_name".to_string(), ward.ward_name.clone().into());
            properties.insert("risk_score".to_string(), ward.risk_score.into());
            properties.insert(
                "risk_category".to_string(),
                RiskCategory::from_score(ward.risk_score).to_string().into(),
            );

            Some(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::from(&shape.polygon))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            })
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Builds the report point collection, optionally filtered by status.
#[must_use]
pub fn report_collection(reports: &[Report], status: Option<ReportStatus>) -> FeatureCollection {
    let features = reports
        .iter()
        .filter(|r| status.is_none_or(|s| r.status == s))
        .map(|report| {
            let mut properties = JsonObject::new();
            properties.insert("id".to_string(), report.id.into());
            properties.insert("title".to_string(), report.title.clone().into());
            properties.insert("status".to_string(), report.status.to_string().into());
            properties.insert("severity".to_string(), report.severity.to_string().into());
            properties.insert("upvote_count".to_string(), report.upvote_count.into());
            properties.insert(
                "created_at".to_string(),
                report.created_at.to_rfc3339().into(),
            );

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![
                    report.longitude,
                    report.latitude,
                ]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use geo::{Coord, LineString, MultiPolygon, Polygon};
    use waterlog_map_report_models::ReportSeverity;

    use super::*;

    fn shape(ward_id: i64) -> WardShape {
        let ring = LineString::from(vec![
            Coord { x: 77.0, y: 28.0 },
            Coord { x: 77.1, y: 28.0 },
            Coord { x: 77.1, y: 28.1 },
            Coord { x: 77.0, y: 28.1 },
            Coord { x: 77.0, y: 28.0 },
        ]);
        WardShape {
            ward_id,
            polygon: MultiPolygon(vec![Polygon::new(ring, vec![])]),
        }
    }

    fn scored_ward(id: i64, risk_score: f64) -> Ward {
        let mut ward = Ward::new(id, format!("{id:03}"), format!("Ward {id}"));
        ward.risk_score = risk_score;
        ward
    }

    fn report(id: i64, status: ReportStatus) -> Report {
        Report {
            id,
            user_id: 7,
            title: "Waterlogged service lane".to_string(),
            description: "Ankle-deep water for two days now".to_string(),
            latitude: 28.05,
            longitude: 77.05,
            address: None,
            ward_id: Some(1),
            status,
            severity: ReportSeverity::High,
            assigned_agency: None,
            image_path: None,
            resolution_image_path: None,
            upvote_count: 3,
            comment_count: 0,
            created_at: Utc.with_ymd_and_hms(2024, 7, 2, 9, 30, 0).unwrap(),
            updated_at: None,
            resolved_at: None,
        }
    }

    #[test]
    fn hotspot_features_carry_score_and_category() {
        let collection = hotspot_collection(&[scored_ward(1, 80.0)], &[shape(1)]);
        assert_eq!(collection.features.len(), 1);

        let props = collection.features[0].properties.as_ref().unwrap();
        assert_eq!(props["ward_number"], "001");
        assert_eq!(props["ward_name"], "Ward 1");
        assert!((props["risk_score"].as_f64().unwrap() - 80.0).abs() < 1e-9);
        assert_eq!(props["risk_category"], "CRITICAL");
    }

    #[test]
    fn wards_without_geometry_are_omitted() {
        let collection = hotspot_collection(&[scored_ward(1, 10.0), scored_ward(2, 20.0)], &[shape(1)]);
        assert_eq!(collection.features.len(), 1);
    }

    #[test]
    fn report_features_carry_expected_properties() {
        let collection = report_collection(&[report(1, ReportStatus::Open)], None);
        let feature = &collection.features[0];

        let props = feature.properties.as_ref().unwrap();
        assert_eq!(props["id"], 1);
        assert_eq!(props["status"], "OPEN");
        assert_eq!(props["severity"], "HIGH");
        assert_eq!(props["upvote_count"], 3);
        assert!(props["created_at"].as_str().unwrap().starts_with("2024-07-02"));

        let Some(Geometry {
            value: Value::Point(coords),
            ..
        }) = &feature.geometry
        else {
            panic!("expected point geometry");
        };
        assert!((coords[0] - 77.05).abs() < 1e-9);
        assert!((coords[1] - 28.05).abs() < 1e-9);
    }

    #[test]
    fn status_filter_limits_report_features() {
        let reports = vec![
            report(1, ReportStatus::Open),
            report(2, ReportStatus::Resolved),
            report(3, ReportStatus::Open),
        ];
        let open = report_collection(&reports, Some(ReportStatus::Open));
        assert_eq!(open.features.len(), 2);
        let all = report_collection(&reports, None);
        assert_eq!(all.features.len(), 3);
    }
}
