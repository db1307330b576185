//! CSV exports of a spatial road table, geometry as WKT

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, info, warn};
use serde::Deserialize;
use wkt::TryFromWkt;

use super::builder::{SkipReason, SkippedSegment};
use super::de::{Oneway, deserialize_flag, deserialize_optional_f64, parse_tag_text};
use crate::Error;
use crate::geometry::Coordinate;
use crate::model::{ElevationStats, RoadSegment};

/// One row of a road table export
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawSegmentRow {
    #[serde(alias = "osm_id", alias = "segment_id")]
    pub id: String,
    pub name: String,
    #[serde(alias = "highway")]
    pub road_class: String,
    pub oneway: String,
    #[serde(alias = "maxspeed")]
    pub speed_limit: String,
    pub surface: String,
    #[serde(alias = "length", deserialize_with = "deserialize_optional_f64")]
    pub length_m: Option<f64>,
    #[serde(alias = "elev_mean", deserialize_with = "deserialize_optional_f64")]
    pub elevation_mean: Option<f64>,
    #[serde(alias = "elev_min", deserialize_with = "deserialize_optional_f64")]
    pub elevation_min: Option<f64>,
    #[serde(alias = "elev_max", deserialize_with = "deserialize_optional_f64")]
    pub elevation_max: Option<f64>,
    #[serde(alias = "flood", alias = "is_flooded", deserialize_with = "deserialize_flag")]
    pub flooded: bool,
    pub tags: String,
    #[serde(alias = "wkt", alias = "geom")]
    pub geometry: String,
}

impl RawSegmentRow {
    fn into_segment(self, row: usize) -> Result<RoadSegment, SkippedSegment> {
        let id = if self.id.trim().is_empty() {
            row.to_string()
        } else {
            self.id.trim().to_string()
        };

        let line = geo::LineString::<f64>::try_from_wkt_str(self.geometry.trim()).map_err(|e| {
            SkippedSegment {
                id: id.clone(),
                reason: SkipReason::UnsupportedGeometry(e.to_string()),
            }
        })?;
        let mut geometry: Vec<Coordinate> = line.coords().map(|c| Coordinate::from(*c)).collect();

        let oneway = Oneway::from_text(&self.oneway);
        if oneway == Oneway::Reverse {
            debug!("Segment {id} is one-way against its geometry; reversing it");
            geometry.reverse();
        }

        let mut segment = RoadSegment::new(id, geometry).with_oneway(oneway != Oneway::TwoWay);
        if !self.name.trim().is_empty() {
            segment = segment.with_name(self.name.trim());
        }
        if !self.road_class.trim().is_empty() {
            segment = segment.with_road_class(self.road_class.trim());
        }
        if !self.surface.trim().is_empty() {
            segment.surface = Some(self.surface.trim().to_string());
        }
        if let Some(length) = self.length_m {
            segment = segment.with_length(length);
        }
        segment.tags = parse_tag_text(&self.tags);
        let speed = self.speed_limit.trim();
        if !speed.is_empty() {
            match speed.parse::<f64>() {
                Ok(kmh) if kmh.is_finite() && kmh > 0.0 => segment = segment.with_speed_limit(kmh),
                _ => {
                    segment
                        .tags
                        .entry("maxspeed".to_string())
                        .or_insert_with(|| speed.to_string());
                }
            }
        }
        let known = self
            .elevation_mean
            .or(self.elevation_min)
            .or(self.elevation_max);
        if let Some(known) = known {
            let min = self.elevation_min.unwrap_or(known);
            let max = self.elevation_max.unwrap_or(known);
            let mean = self.elevation_mean.unwrap_or((min + max) / 2.0);
            segment = segment.with_elevation(ElevationStats::new(mean, min, max));
        }
        segment.flooded = self.flooded;

        Ok(segment)
    }
}

/// Reads road segments from a CSV file with a WKT geometry column
///
/// # Errors
///
/// Returns an error if the file cannot be opened or has no header row
pub fn read_csv_segments(path: &Path) -> Result<(Vec<RoadSegment>, Vec<SkippedSegment>), Error> {
    let file = File::open(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to open file '{}': {}", path.display(), e),
        )
    })?;
    parse_csv_segments(file)
}

/// Parses road segments from CSV data
///
/// # Errors
///
/// Returns an error if the header cannot be read or lacks a geometry column
pub fn parse_csv_segments(
    reader: impl Read,
) -> Result<(Vec<RoadSegment>, Vec<SkippedSegment>), Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers()?;
    if !headers
        .iter()
        .any(|h| matches!(h, "geometry" | "wkt" | "geom"))
    {
        return Err(Error::InvalidData(
            "CSV road dataset has no geometry column".to_string(),
        ));
    }

    let mut segments = Vec::new();
    let mut skipped = Vec::new();
    for (row, record) in reader.deserialize::<RawSegmentRow>().enumerate() {
        let parsed = record
            .map_err(|e| SkippedSegment {
                id: row.to_string(),
                reason: SkipReason::InvalidAttributes(e.to_string()),
            })
            .and_then(|raw| raw.into_segment(row));
        match parsed {
            Ok(segment) => segments.push(segment),
            Err(entry) => {
                warn!("Skipping road segment {}: {:?}", entry.id, entry.reason);
                skipped.push(entry);
            }
        }
    }

    info!(
        "Parsed {} road segments from CSV ({} rows skipped)",
        segments.len(),
        skipped.len()
    );
    Ok((segments, skipped))
}
