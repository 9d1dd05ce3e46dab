//! Parses ward boundaries from a `GeoJSON` `FeatureCollection`.
//!
//! Municipal boundary exports disagree on property naming, so the ward
//! number is read from `ward_no`, `WARD_NO`, or `ward_number` (falling
//! back to the feature index) and the name from `ward_name` or
//! `WARD_NAME` (falling back to `"Ward {number}"`). Features with
//! missing or non-polygon geometry are skipped with a warning rather
//! than failing the whole load.

use std::path::Path;

use geo::MultiPolygon;
use geojson::GeoJson;
use waterlog_map_geography_models::WardBoundary;

use crate::GeoError;

/// Loads ward boundaries from a `GeoJSON` file on disk.
///
/// # Errors
///
/// Returns [`GeoError`] if the file cannot be read, is not valid
/// `GeoJSON`, or yields no usable ward polygons.
pub fn load_ward_boundaries(path: &Path) -> Result<Vec<WardBoundary>, GeoError> {
    let raw = std::fs::read_to_string(path)?;
    let boundaries = parse_ward_boundaries(&raw)?;

    if boundaries.is_empty() {
        return Err(GeoError::Empty {
            path: path.display().to_string(),
        });
    }

    log::info!(
        "Loaded {} ward boundaries from {}",
        boundaries.len(),
        path.display()
    );
    Ok(boundaries)
}

/// Parses ward boundaries from a `GeoJSON` string.
///
/// # Errors
///
/// Returns [`GeoError`] if the string is not valid `GeoJSON`.
pub fn parse_ward_boundaries(raw: &str) -> Result<Vec<WardBoundary>, GeoError> {
    let geojson: GeoJson = raw.parse()?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Ok(Vec::new());
    };

    let mut boundaries = Vec::new();

    for (index, feature) in collection.features.into_iter().enumerate() {
        let ward_number = string_property(
            feature.properties.as_ref(),
            &["ward_no", "WARD_NO", "ward_number"],
        )
        .unwrap_or_else(|| format!("{}", index + 1));

        let ward_name = string_property(feature.properties.as_ref(), &["ward_name", "WARD_NAME"])
            .unwrap_or_else(|| format!("Ward {ward_number}"));

        let Some(geometry) = feature.geometry else {
            log::warn!("Ward {ward_number}: feature has no geometry, skipping");
            continue;
        };

        let Some(polygon) = geometry_to_multipolygon(geometry) else {
            log::warn!("Ward {ward_number}: geometry is not a polygon, skipping");
            continue;
        };

        boundaries.push(WardBoundary {
            ward_number,
            ward_name,
            polygon,
        });
    }

    Ok(boundaries)
}

/// Reads the first present property from a list of candidate keys,
/// accepting either string or numeric JSON values.
fn string_property(
    properties: Option<&geojson::JsonObject>,
    keys: &[&str],
) -> Option<String> {
    let props = properties?;
    for key in keys {
        match props.get(*key) {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => {
                return Some(s.trim().to_string());
            }
            Some(serde_json::Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn geometry_to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}
