//! Flood exposure of routes

mod analyzer;
mod point_score;
mod weather;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use analyzer::{FloodRiskAnalyzer, FloodRiskAssessment};
pub use point_score::{PointRisk, PointRiskClass, PointScoring};
pub use weather::{NeutralReason, WeatherImpact, WeatherObservation, WeatherPolicy, WeatherSource};

use crate::{Error, Meters};

/// Route-level flood risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Half-width of the corridor around a route
    pub buffer_m: Meters,
    /// Flooded pieces are tested against the corridor in steps of this size
    pub sample_step_m: Meters,
    /// Flooded percentage from which a route is MEDIUM risk
    pub medium_from_pct: f64,
    /// Flooded percentage from which a route is HIGH risk
    pub high_from_pct: f64,
    pub weather: WeatherPolicy,
    pub points: PointScoring,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            buffer_m: 50.0,
            sample_step_m: 5.0,
            medium_from_pct: 10.0,
            high_from_pct: 30.0,
            weather: WeatherPolicy::default(),
            points: PointScoring::default(),
        }
    }
}

impl RiskConfig {
    pub fn risk_level(&self, flooded_percentage: f64) -> RiskLevel {
        if flooded_percentage >= self.high_from_pct {
            RiskLevel::High
        } else if flooded_percentage >= self.medium_from_pct {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        for (name, value) in [("buffer_m", self.buffer_m), ("sample_step_m", self.sample_step_m)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "risk.{name} must be positive, got {value}"
                )));
            }
        }
        let ordered = (0.0..=100.0).contains(&self.medium_from_pct)
            && (0.0..=100.0).contains(&self.high_from_pct)
            && self.medium_from_pct <= self.high_from_pct;
        if !ordered {
            return Err(Error::InvalidConfig(format!(
                "risk thresholds must satisfy 0 <= medium ({}) <= high ({}) <= 100",
                self.medium_from_pct, self.high_from_pct
            )));
        }
        self.weather.validate()?;
        self.points.validate()
    }
}
