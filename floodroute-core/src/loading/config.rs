use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cost::{CostModel, TravelMode};
use crate::risk::RiskConfig;
use crate::{DEFAULT_COORDINATE_PRECISION, Error};

/// Complete engine configuration. Every section falls back to its defaults,
/// so an empty document is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub network: NetworkConfig,
    pub snapping: SnapConfig,
    pub search: SearchConfig,
    pub cost: CostModel,
    pub alternatives: AlternativesConfig,
    pub risk: RiskConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), Error> {
        self.network.validate()?;
        self.snapping.validate()?;
        self.cost.validate()?;
        self.alternatives.validate()?;
        self.risk.validate()
    }
}

/// Supported road dataset encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    /// GeoJSON FeatureCollection of LineStrings
    GeoJson,
    /// CSV export of a spatial table with a WKT `geometry` column
    Csv,
}

impl DatasetFormat {
    /// Guesses the format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "geojson" | "json" => Some(DatasetFormat::GeoJson),
            "csv" => Some(DatasetFormat::Csv),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Road dataset to load
    pub path: Option<PathBuf>,
    /// Dataset format, inferred from the extension when unset
    pub format: Option<DatasetFormat>,
    /// Decimal places kept when merging segment endpoints
    pub coordinate_precision: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            path: None,
            format: None,
            coordinate_precision: DEFAULT_COORDINATE_PRECISION,
        }
    }
}

impl NetworkConfig {
    /// Format to read `path` with
    pub fn resolved_format(&self, path: &Path) -> Result<DatasetFormat, Error> {
        self.format
            .or_else(|| DatasetFormat::from_path(path))
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "Cannot infer dataset format of '{}', set network.format",
                    path.display()
                ))
            })
    }

    fn validate(&self) -> Result<(), Error> {
        if !(1..=9).contains(&self.coordinate_precision) {
            return Err(Error::InvalidConfig(format!(
                "network.coordinate_precision must be between 1 and 9, got {}",
                self.coordinate_precision
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Default search radius for request endpoints
    pub max_radius_m: f64,
    /// Larger radii tried, in order, when the first snap fails
    pub retry_radii_m: Vec<f64>,
    /// Radius used when snapping alternative-route waypoints
    pub waypoint_radius_m: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            max_radius_m: 2_000.0,
            retry_radii_m: Vec::new(),
            waypoint_radius_m: 1_000.0,
        }
    }
}

impl SnapConfig {
    fn validate(&self) -> Result<(), Error> {
        let radii = std::iter::once(self.max_radius_m)
            .chain(std::iter::once(self.waypoint_radius_m))
            .chain(self.retry_radii_m.iter().copied());
        for radius in radii {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "snapping radii must be positive, got {radius}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// A* with a straight-line heuristic instead of plain Dijkstra
    pub use_heuristic: bool,
    /// Node expansions allowed per search
    pub max_expansions: Option<usize>,
    /// Wall-clock budget per search
    pub time_budget_ms: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            use_heuristic: true,
            max_expansions: Some(1_000_000),
            time_budget_ms: None,
        }
    }
}

impl SearchConfig {
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternativesConfig {
    /// Sideways waypoint offsets as fractions of the straight-line distance
    pub offset_fractions: Vec<f64>,
    /// Try Yen's k shortest paths before waypoint offsets
    pub use_k_shortest: bool,
    /// Paths requested from the k shortest search
    pub k_shortest_paths: usize,
    /// The shortest candidate is only labelled direct when it is at least
    /// this much shorter than the safest one
    pub direct_min_separation_m: f64,
    pub default_count: usize,
    pub default_mode: TravelMode,
}

impl Default for AlternativesConfig {
    fn default() -> Self {
        Self {
            offset_fractions: vec![0.08, -0.08, 0.15, -0.15],
            use_k_shortest: true,
            k_shortest_paths: 4,
            direct_min_separation_m: 100.0,
            default_count: 3,
            default_mode: TravelMode::Car,
        }
    }
}

impl AlternativesConfig {
    fn validate(&self) -> Result<(), Error> {
        if self.offset_fractions.iter().any(|f| !f.is_finite()) {
            return Err(Error::InvalidConfig(
                "alternatives.offset_fractions must be finite".to_string(),
            ));
        }
        if !self.direct_min_separation_m.is_finite() || self.direct_min_separation_m < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "alternatives.direct_min_separation_m must be non-negative, got {}",
                self.direct_min_separation_m
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_inferred_from_extension() {
        assert_eq!(
            DatasetFormat::from_path(Path::new("roads.GeoJSON")),
            Some(DatasetFormat::GeoJson)
        );
        assert_eq!(
            DatasetFormat::from_path(Path::new("/data/roads.csv")),
            Some(DatasetFormat::Csv)
        );
        assert_eq!(DatasetFormat::from_path(Path::new("roads.shp")), None);
    }

    #[test]
    fn explicit_format_wins() {
        let config = NetworkConfig {
            format: Some(DatasetFormat::Csv),
            ..NetworkConfig::default()
        };
        assert_eq!(
            config.resolved_format(Path::new("roads.txt")).unwrap(),
            DatasetFormat::Csv
        );
        assert!(NetworkConfig::default()
            .resolved_format(Path::new("roads.txt"))
            .is_err());
    }

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_radius() {
        let mut config = EngineConfig::default();
        config.snapping.retry_radii_m = vec![5_000.0, 0.0];
        assert!(config.validate().is_err());
    }
}
