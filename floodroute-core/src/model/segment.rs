//! Road segments, the unit of import

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{Coordinate, polyline_length_m};
use crate::loading::de::parse_speed;
use crate::Meters;

/// Elevation statistics of a segment in metres
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ElevationStats {
    pub mean_m: f64,
    pub min_m: f64,
    pub max_m: f64,
}

impl ElevationStats {
    pub fn new(mean_m: f64, min_m: f64, max_m: f64) -> Self {
        Self {
            mean_m,
            min_m: min_m.min(max_m),
            max_m: max_m.max(min_m),
        }
    }

    /// Flat terrain at a single height
    pub fn flat(elevation_m: f64) -> Self {
        Self::new(elevation_m, elevation_m, elevation_m)
    }

    /// Difference between the highest and the lowest point
    pub fn gain_m(&self) -> Meters {
        (self.max_m - self.min_m).max(0.0)
    }
}

/// Road segment as imported from a line-feature dataset
///
/// Loaded once and immutable afterwards. Segments sharing an endpoint share a
/// graph node but never an identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadSegment {
    /// Stable identifier from the source dataset
    pub id: String,
    pub name: Option<String>,
    /// Road class tag (`primary`, `residential`, ...)
    pub road_class: String,
    pub oneway: bool,
    pub speed_limit_kmh: Option<f64>,
    pub surface: Option<String>,
    /// Length in metres, precomputed by the source or derived from geometry
    pub length_m: Meters,
    pub elevation: ElevationStats,
    pub flooded: bool,
    /// Free-form tags (`maxspeed`, `lanes`, ...)
    pub tags: BTreeMap<String, String>,
    pub geometry: Vec<Coordinate>,
}

impl RoadSegment {
    /// Two-way unflooded segment on flat terrain at sea level
    pub fn new(id: impl Into<String>, geometry: Vec<Coordinate>) -> Self {
        let length_m = polyline_length_m(&geometry);
        Self {
            id: id.into(),
            name: None,
            road_class: "unclassified".to_string(),
            oneway: false,
            speed_limit_kmh: None,
            surface: None,
            length_m,
            elevation: ElevationStats::default(),
            flooded: false,
            tags: BTreeMap::new(),
            geometry,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_road_class(mut self, road_class: impl Into<String>) -> Self {
        self.road_class = road_class.into();
        self
    }

    #[must_use]
    pub fn with_oneway(mut self, oneway: bool) -> Self {
        self.oneway = oneway;
        self
    }

    #[must_use]
    pub fn with_flooded(mut self, flooded: bool) -> Self {
        self.flooded = flooded;
        self
    }

    #[must_use]
    pub fn with_speed_limit(mut self, kmh: f64) -> Self {
        self.speed_limit_kmh = Some(kmh);
        self
    }

    #[must_use]
    pub fn with_elevation(mut self, elevation: ElevationStats) -> Self {
        self.elevation = elevation;
        self
    }

    /// Overrides the geometric length with a dataset-provided one
    #[must_use]
    pub fn with_length(mut self, length_m: Meters) -> Self {
        if length_m.is_finite() && length_m > 0.0 {
            self.length_m = length_m;
        }
        self
    }

    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Speed limit in km/h: `maxspeed` tag, then the attribute, then a
    /// default for the road class
    pub fn effective_speed_limit_kmh(&self) -> f64 {
        self.tags
            .get("maxspeed")
            .and_then(|raw| parse_speed(raw))
            .or(self.speed_limit_kmh.filter(|s| s.is_finite() && *s > 0.0))
            .unwrap_or_else(|| default_speed_kmh(&self.road_class))
    }

    pub fn lanes(&self) -> Option<u32> {
        self.tags.get("lanes").and_then(|l| l.trim().parse().ok())
    }

    pub fn elevation_gain_m(&self) -> Meters {
        self.elevation.gain_m()
    }

    /// Elevation gain per metre of length
    pub fn grade(&self) -> f64 {
        if self.length_m > 0.0 {
            self.elevation_gain_m() / self.length_m
        } else {
            0.0
        }
    }
}

/// Typical urban speeds when the dataset carries no limit
fn default_speed_kmh(road_class: &str) -> f64 {
    match road_class {
        "motorway" | "motorway_link" => 100.0,
        "trunk" | "trunk_link" => 80.0,
        "primary" | "primary_link" => 60.0,
        "secondary" | "secondary_link" => 50.0,
        "tertiary" | "tertiary_link" => 40.0,
        "service" | "living_street" => 20.0,
        "footway" | "path" | "pedestrian" | "steps" | "track" => 10.0,
        _ => 30.0,
    }
}
