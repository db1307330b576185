//! Additive flood risk score for single route points

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::geometry::{Coordinate, haversine_m};

/// Risk class of a scored point
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum PointRiskClass {
    Safe,
    Caution,
    Risky,
    Avoid,
}

impl PointRiskClass {
    /// Safe ≤ 24, Caution ≤ 49, Risky ≤ 74, Avoid above
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=24 => PointRiskClass::Safe,
            25..=49 => PointRiskClass::Caution,
            50..=74 => PointRiskClass::Risky,
            _ => PointRiskClass::Avoid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointRisk {
    pub coordinate: Coordinate,
    pub elevation_m: Option<f64>,
    /// Grade from the previous point in percent, negative downhill
    pub slope_pct: Option<f64>,
    pub score: u8,
    pub class: PointRiskClass,
}

/// Points added per risk factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointScoring {
    pub low_elevation_below_m: f64,
    pub low_elevation_points: u8,
    /// Downhill grade (percent, negative) steeper than this scores
    pub descent_below_pct: f64,
    pub descent_points: u8,
    pub moderate_rain_mm: f64,
    pub moderate_rain_points: u8,
    pub heavy_rain_mm: f64,
    pub heavy_rain_points: u8,
}

impl Default for PointScoring {
    fn default() -> Self {
        Self {
            low_elevation_below_m: 5.0,
            low_elevation_points: 25,
            descent_below_pct: -5.0,
            descent_points: 10,
            moderate_rain_mm: 10.0,
            moderate_rain_points: 25,
            heavy_rain_mm: 20.0,
            heavy_rain_points: 40,
        }
    }
}

impl PointScoring {
    /// Score of one point. Missing elevation or slope add nothing.
    pub fn score(&self, elevation_m: Option<f64>, slope_pct: Option<f64>, rainfall_mm: f64) -> u8 {
        let mut score: u16 = 0;
        if elevation_m.is_some_and(|e| e < self.low_elevation_below_m) {
            score += u16::from(self.low_elevation_points);
        }
        if slope_pct.is_some_and(|s| s < self.descent_below_pct) {
            score += u16::from(self.descent_points);
        }
        if rainfall_mm >= self.heavy_rain_mm {
            score += u16::from(self.heavy_rain_points);
        } else if rainfall_mm >= self.moderate_rain_mm {
            score += u16::from(self.moderate_rain_points);
        }
        u8::try_from(score.min(100)).unwrap_or(100)
    }

    /// Scores every point of a polyline. `elevations` is matched to
    /// `coordinates` by position; missing entries count as unknown.
    pub fn score_points(
        &self,
        coordinates: &[Coordinate],
        elevations: &[Option<f64>],
        rainfall_mm: f64,
    ) -> Vec<PointRisk> {
        let elevation_at = |i: usize| elevations.get(i).copied().flatten();
        coordinates
            .iter()
            .enumerate()
            .map(|(i, coordinate)| {
                let elevation_m = elevation_at(i);
                let slope_pct = i.checked_sub(1).and_then(|prev| {
                    let run = haversine_m(coordinates[prev], *coordinate);
                    let rise = elevation_m? - elevation_at(prev)?;
                    (run > 0.0).then(|| rise / run * 100.0)
                });
                let score = self.score(elevation_m, slope_pct, rainfall_mm);
                PointRisk {
                    coordinate: *coordinate,
                    elevation_m,
                    slope_pct,
                    score,
                    class: PointRiskClass::from_score(score),
                }
            })
            .collect()
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        let values = [
            self.low_elevation_below_m,
            self.descent_below_pct,
            self.moderate_rain_mm,
            self.heavy_rain_mm,
        ];
        if values.iter().any(|v| !v.is_finite()) || self.moderate_rain_mm > self.heavy_rain_mm {
            return Err(Error::InvalidConfig(
                "risk.points thresholds must be finite with moderate_rain_mm <= heavy_rain_mm"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
