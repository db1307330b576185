//! GeoJSON road datasets
//!
//! A FeatureCollection of `LineString` features, one feature per road
//! segment. Attribute names follow the common OSM and GIS export spellings.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use geojson::{Feature, GeoJson, JsonObject, JsonValue, Value, feature::Id};
use log::{debug, info, warn};

use super::builder::{SkipReason, SkippedSegment};
use super::de::{Oneway, json_f64, parse_flood_flag, parse_tags};
use crate::Error;
use crate::geometry::Coordinate;
use crate::model::{ElevationStats, RoadSegment};

const ID_KEYS: &[&str] = &["id", "osm_id", "segment_id"];
const ROAD_CLASS_KEYS: &[&str] = &["highway", "road_class"];
const SPEED_KEYS: &[&str] = &["maxspeed", "speed_limit"];
const LENGTH_KEYS: &[&str] = &["length_m", "length"];
const MEAN_ELEVATION_KEYS: &[&str] = &["elevation_mean", "elev_mean"];
const FLOOD_KEYS: &[&str] = &["flooded", "flood", "is_flooded"];

/// Reads road segments from a GeoJSON file
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not GeoJSON
pub fn read_geojson_segments(
    path: &Path,
) -> Result<(Vec<RoadSegment>, Vec<SkippedSegment>), Error> {
    let text = fs::read_to_string(path)?;
    parse_geojson_segments(&text)
}

/// Parses road segments from GeoJSON text.
///
/// Features that are not usable road segments are returned as skipped
/// entries instead of failing the whole dataset.
///
/// # Errors
///
/// Returns an error if the text is not a GeoJSON feature or feature
/// collection
pub fn parse_geojson_segments(
    text: &str,
) -> Result<(Vec<RoadSegment>, Vec<SkippedSegment>), Error> {
    let features = match GeoJson::from_str(text)? {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(Error::InvalidData(
                "Expected a GeoJSON FeatureCollection of road segments, got a bare geometry"
                    .to_string(),
            ));
        }
    };

    let mut segments = Vec::with_capacity(features.len());
    let mut skipped = Vec::new();
    for (index, feature) in features.iter().enumerate() {
        match segment_from_feature(feature, index) {
            Ok(segment) => segments.push(segment),
            Err(entry) => {
                warn!("Skipping road segment {}: {:?}", entry.id, entry.reason);
                skipped.push(entry);
            }
        }
    }

    info!(
        "Parsed {} road segments from GeoJSON ({} features skipped)",
        segments.len(),
        skipped.len()
    );
    Ok((segments, skipped))
}

fn segment_from_feature(feature: &Feature, index: usize) -> Result<RoadSegment, SkippedSegment> {
    let empty = JsonObject::new();
    let properties = feature.properties.as_ref().unwrap_or(&empty);
    let id = feature_id(feature, properties, index);

    let skip = |reason| SkippedSegment {
        id: id.clone(),
        reason,
    };

    let positions = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::LineString(positions)) => positions,
        Some(other) => {
            return Err(skip(SkipReason::UnsupportedGeometry(
                other.type_name().to_string(),
            )));
        }
        None => return Err(skip(SkipReason::UnsupportedGeometry("null".to_string()))),
    };

    let mut geometry = Vec::with_capacity(positions.len());
    for position in positions {
        match position.as_slice() {
            [lon, lat, ..] => geometry.push(Coordinate::new(*lat, *lon)),
            _ => return Err(skip(SkipReason::InvalidCoordinate)),
        }
    }

    let oneway = lookup(properties, &["oneway"]).map_or(Oneway::TwoWay, Oneway::from_json);
    if oneway == Oneway::Reverse {
        debug!("Segment {id} is one-way against its geometry; reversing it");
        geometry.reverse();
    }
    let mut segment =
        RoadSegment::new(id.clone(), geometry).with_oneway(oneway != Oneway::TwoWay);

    if let Some(name) = lookup(properties, &["name"]).and_then(JsonValue::as_str) {
        if !name.trim().is_empty() {
            segment = segment.with_name(name.trim());
        }
    }
    if let Some(class) = lookup(properties, ROAD_CLASS_KEYS).and_then(JsonValue::as_str) {
        segment = segment.with_road_class(class.trim());
    }
    if let Some(speed) = lookup(properties, SPEED_KEYS).and_then(json_f64) {
        if speed > 0.0 {
            segment = segment.with_speed_limit(speed);
        }
    }
    if let Some(surface) = lookup(properties, &["surface"]).and_then(JsonValue::as_str) {
        segment.surface = Some(surface.to_string());
    }
    if let Some(length) = lookup(properties, LENGTH_KEYS).and_then(json_f64) {
        segment = segment.with_length(length);
    }
    if let Some(elevation) = elevation(properties) {
        segment = segment.with_elevation(elevation);
    }
    segment.flooded = lookup(properties, FLOOD_KEYS).is_some_and(parse_flood_flag);
    if let Some(tags) = properties.get("tags") {
        segment.tags = parse_tags(tags);
    }
    if let Some(JsonValue::String(raw)) = properties.get("maxspeed") {
        // Unit-suffixed limits stay resolvable through the tag
        segment.tags.entry("maxspeed".to_string()).or_insert_with(|| raw.clone());
    }

    Ok(segment)
}

fn lookup<'a>(properties: &'a JsonObject, keys: &[&str]) -> Option<&'a JsonValue> {
    keys.iter()
        .filter_map(|key| properties.get(*key))
        .find(|value| !value.is_null())
}

fn feature_id(feature: &Feature, properties: &JsonObject, index: usize) -> String {
    if let Some(value) = lookup(properties, ID_KEYS) {
        match value {
            JsonValue::String(s) if !s.trim().is_empty() => return s.trim().to_string(),
            JsonValue::Number(n) => return n.to_string(),
            _ => {}
        }
    }
    match &feature.id {
        Some(Id::String(s)) => s.clone(),
        Some(Id::Number(n)) => n.to_string(),
        None => index.to_string(),
    }
}

fn elevation(properties: &JsonObject) -> Option<ElevationStats> {
    let mean = lookup(properties, MEAN_ELEVATION_KEYS).and_then(json_f64);
    let min = lookup(properties, &["elevation_min", "elev_min"]).and_then(json_f64);
    let max = lookup(properties, &["elevation_max", "elev_max"]).and_then(json_f64);
    match (mean, min, max) {
        (None, None, None) => None,
        (Some(mean), None, None) => Some(ElevationStats::flat(mean)),
        (mean, Some(min), Some(max)) => {
            Some(ElevationStats::new(mean.unwrap_or((min + max) / 2.0), min, max))
        }
        (mean, min, max) => {
            let known = mean.or(min).or(max)?;
            Some(ElevationStats::new(
                mean.unwrap_or(known),
                min.unwrap_or(known),
                max.unwrap_or(known),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": 7,
                "geometry": {"type": "LineString", "coordinates": [[100.0, 13.0], [100.001, 13.0]]},
                "properties": {
                    "name": "Rama IV",
                    "highway": "primary",
                    "oneway": "yes",
                    "maxspeed": "30 mph",
                    "elevation_mean": 4.0,
                    "elevation_min": 2.0,
                    "elevation_max": 6.0,
                    "flooded": "false",
                    "tags": "\"lanes\"=>\"3\""
                }
            },
            {
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[100.001, 13.0], [100.002, 13.0]]},
                "properties": {"osm_id": "w42", "is_flooded": 1, "oneway": -1, "length": "140.5"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [100.0, 13.0]},
                "properties": {}
            },
            {
                "type": "Feature",
                "geometry": null,
                "properties": {"id": "nothing"}
            }
        ]
    }"#;

    #[test]
    fn reads_attributes_and_aliases() {
        let (segments, skipped) = parse_geojson_segments(DATASET).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(skipped.len(), 2);

        let first = &segments[0];
        assert_eq!(first.id, "7");
        assert_eq!(first.name.as_deref(), Some("Rama IV"));
        assert_eq!(first.road_class, "primary");
        assert!(first.oneway);
        assert!(!first.flooded);
        assert!((first.effective_speed_limit_kmh() - 48.280_32).abs() < 1e-3);
        assert!((first.elevation.gain_m() - 4.0).abs() < 1e-9);
        assert_eq!(first.lanes(), Some(3));
        assert_eq!(first.geometry[0], Coordinate::new(13.0, 100.0));

        let second = &segments[1];
        assert_eq!(second.id, "w42");
        assert!(second.flooded);
        assert!(second.oneway);
        // `-1`: digitised west to east, travelled east to west
        assert_eq!(second.geometry[0], Coordinate::new(13.0, 100.002));
        assert_eq!(second.geometry[1], Coordinate::new(13.0, 100.001));
        assert!((second.length_m - 140.5).abs() < 1e-9);
    }

    #[test]
    fn skipped_features_say_why() {
        let (_, skipped) = parse_geojson_segments(DATASET).unwrap();
        assert_eq!(skipped[0].id, "2");
        assert_eq!(
            skipped[0].reason,
            SkipReason::UnsupportedGeometry("Point".to_string())
        );
        assert_eq!(skipped[1].id, "nothing");
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_geojson_segments("not json").is_err());
        assert!(parse_geojson_segments(r#"{"type": "Point", "coordinates": [0, 0]}"#).is_err());
    }

    #[test]
    fn elevation_from_partial_attributes() {
        let mut props = JsonObject::new();
        props.insert("elev_mean".to_string(), JsonValue::from(12.0));
        assert_eq!(elevation(&props), Some(ElevationStats::flat(12.0)));

        props.insert("elevation_max".to_string(), JsonValue::from(20.0));
        let stats = elevation(&props).unwrap();
        assert!((stats.min_m - 12.0).abs() < 1e-9);
        assert!((stats.max_m - 20.0).abs() < 1e-9);
    }
}
