//! Mode- and hazard-sensitive segment costs
//!
//! Every search variant and the terrain reporting go through [`CostModel`], so
//! a segment is priced the same way everywhere.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::RoadSegment;
use crate::{Error, Meters, Seconds};

/// Travel mode of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Car,
    Motorcycle,
    Walking,
}

impl TravelMode {
    pub const COUNT: usize = 3;
    pub const ALL: [TravelMode; Self::COUNT] =
        [TravelMode::Car, TravelMode::Motorcycle, TravelMode::Walking];

    pub(crate) fn index(self) -> usize {
        match self {
            TravelMode::Car => 0,
            TravelMode::Motorcycle => 1,
            TravelMode::Walking => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Car => "car",
            TravelMode::Motorcycle => "motorcycle",
            TravelMode::Walking => "walking",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "car" | "driving" | "drive" | "auto" => Ok(TravelMode::Car),
            "motorcycle" | "motorbike" | "moto" | "scooter" => Ok(TravelMode::Motorcycle),
            "walking" | "walk" | "foot" | "pedestrian" => Ok(TravelMode::Walking),
            other => Err(Error::InvalidData(format!("Unknown travel mode '{other}'"))),
        }
    }
}

/// Traversal cost of a whole segment together with the speed used for
/// travel-time estimates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentCost {
    pub traversal_cost: f64,
    pub speed_kmh: f64,
}

/// Cost factors and speed caps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    /// Multiplier for flooded segments (penalised, never forbidden)
    pub flood_factor: f64,
    /// Cost increase per 100 m of mean elevation
    pub elevation_weight: f64,
    /// Cost increase per unit of grade (gain / length)
    pub slope_weight: f64,
    pub car_factor: f64,
    pub motorcycle_factor: f64,
    pub walking_factor: f64,
    /// Extra walking penalty above `walking_highland_threshold_m`
    pub walking_highland_factor: f64,
    pub walking_highland_threshold_m: f64,
    pub flooded_speed_cap_kmh: f64,
    pub steep_speed_cap_kmh: f64,
    /// Elevation gain above which the steep-road speed cap applies
    pub steep_gain_threshold_m: f64,
    pub min_speed_kmh: f64,
    pub walking_speed_kmh: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            flood_factor: 2.5,
            elevation_weight: 0.1,
            slope_weight: 10.0,
            car_factor: 1.0,
            motorcycle_factor: 0.9,
            walking_factor: 2.0,
            walking_highland_factor: 1.5,
            walking_highland_threshold_m: 50.0,
            flooded_speed_cap_kmh: 25.0,
            steep_speed_cap_kmh: 35.0,
            steep_gain_threshold_m: 20.0,
            min_speed_kmh: 10.0,
            walking_speed_kmh: 5.0,
        }
    }
}

impl CostModel {
    /// Cost of traversing the whole segment and the speed used on it
    pub fn cost(&self, segment: &RoadSegment, mode: TravelMode) -> SegmentCost {
        SegmentCost {
            traversal_cost: segment.length_m * self.cost_factor(segment, mode),
            speed_kmh: self.speed_kmh(segment, mode),
        }
    }

    /// Cost per metre: flood × terrain × mode
    pub fn cost_factor(&self, segment: &RoadSegment, mode: TravelMode) -> f64 {
        self.flood_factor(segment) * self.terrain_factor(segment) * self.mode_factor(segment, mode)
    }

    pub fn flood_factor(&self, segment: &RoadSegment) -> f64 {
        if segment.flooded {
            self.flood_factor
        } else {
            1.0
        }
    }

    /// Absolute elevation and steepness both make a segment more expensive
    pub fn terrain_factor(&self, segment: &RoadSegment) -> f64 {
        let elevation = 1.0 + segment.elevation.mean_m / 100.0 * self.elevation_weight;
        let slope = 1.0 + segment.grade() * self.slope_weight;
        elevation * slope
    }

    pub fn mode_factor(&self, segment: &RoadSegment, mode: TravelMode) -> f64 {
        match mode {
            TravelMode::Car => self.car_factor,
            TravelMode::Motorcycle => self.motorcycle_factor,
            TravelMode::Walking => {
                if segment.elevation.mean_m > self.walking_highland_threshold_m {
                    self.walking_factor * self.walking_highland_factor
                } else {
                    self.walking_factor
                }
            }
        }
    }

    /// Speed in km/h: the segment's limit with flood and slope caps, floored at
    /// `min_speed_kmh`. Walking is a flat pace.
    pub fn speed_kmh(&self, segment: &RoadSegment, mode: TravelMode) -> f64 {
        if mode == TravelMode::Walking {
            return self.walking_speed_kmh;
        }
        let mut speed = segment.effective_speed_limit_kmh();
        if segment.flooded {
            speed = speed.min(self.flooded_speed_cap_kmh);
        }
        if segment.elevation_gain_m() > self.steep_gain_threshold_m {
            speed = speed.min(self.steep_speed_cap_kmh);
        }
        speed.max(self.min_speed_kmh)
    }

    /// Speed for connector legs that do not follow a road
    pub fn fallback_speed_kmh(&self, mode: TravelMode) -> f64 {
        match mode {
            TravelMode::Walking => self.walking_speed_kmh,
            TravelMode::Car | TravelMode::Motorcycle => self.min_speed_kmh,
        }
    }

    /// Per-mode factor ignoring terrain and flooding
    pub fn base_mode_factor(&self, mode: TravelMode) -> f64 {
        match mode {
            TravelMode::Car => self.car_factor,
            TravelMode::Motorcycle => self.motorcycle_factor,
            TravelMode::Walking => self.walking_factor,
        }
    }

    /// Travel time for `distance_m` at `speed_kmh`
    pub fn travel_time_s(distance_m: Meters, speed_kmh: f64) -> Seconds {
        if speed_kmh <= 0.0 {
            return 0.0;
        }
        distance_m / (speed_kmh / 3.6)
    }

    /// Client-facing breakdown of how a segment is priced
    pub fn terrain_summary(&self, segment: &RoadSegment) -> TerrainSummary {
        TerrainSummary {
            segment_id: segment.id.clone(),
            mean_elevation_m: segment.elevation.mean_m,
            elevation_gain_m: segment.elevation_gain_m(),
            grade_pct: segment.grade() * 100.0,
            flooded: segment.flooded,
            flood_factor: self.flood_factor(segment),
            terrain_factor: self.terrain_factor(segment),
            speeds_kmh: TravelMode::ALL.map(|mode| (mode, self.speed_kmh(segment, mode))),
            costs: TravelMode::ALL.map(|mode| (mode, self.cost(segment, mode).traversal_cost)),
        }
    }

    /// Rejects models that would make costs negative or let the A* heuristic
    /// overestimate
    pub fn validate(&self) -> Result<(), Error> {
        let non_negative = [
            ("elevation_weight", self.elevation_weight),
            ("slope_weight", self.slope_weight),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "cost.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        let at_least_one = [
            ("flood_factor", self.flood_factor),
            ("walking_highland_factor", self.walking_highland_factor),
        ];
        for (name, value) in at_least_one {
            if !value.is_finite() || value < 1.0 {
                return Err(Error::InvalidConfig(format!(
                    "cost.{name} must be at least 1.0, got {value}"
                )));
            }
        }
        let positive = [
            ("car_factor", self.car_factor),
            ("motorcycle_factor", self.motorcycle_factor),
            ("walking_factor", self.walking_factor),
            ("min_speed_kmh", self.min_speed_kmh),
            ("walking_speed_kmh", self.walking_speed_kmh),
            ("flooded_speed_cap_kmh", self.flooded_speed_cap_kmh),
            ("steep_speed_cap_kmh", self.steep_speed_cap_kmh),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "cost.{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// How a segment is priced, for display next to a route
#[derive(Debug, Clone, Serialize)]
pub struct TerrainSummary {
    pub segment_id: String,
    pub mean_elevation_m: f64,
    pub elevation_gain_m: f64,
    pub grade_pct: f64,
    pub flooded: bool,
    pub flood_factor: f64,
    pub terrain_factor: f64,
    pub speeds_kmh: [(TravelMode, f64); TravelMode::COUNT],
    pub costs: [(TravelMode, f64); TravelMode::COUNT],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Coordinate;
    use crate::model::ElevationStats;

    fn segment(length: f64) -> RoadSegment {
        RoadSegment::new(
            "s",
            vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.001)],
        )
        .with_length(length)
        .with_speed_limit(50.0)
    }

    #[test]
    fn flat_segment_costs_its_length() {
        let model = CostModel::default();
        let cost = model.cost(&segment(100.0), TravelMode::Car);
        assert!((cost.traversal_cost - 100.0).abs() < 1e-9);
        assert!((cost.speed_kmh - 50.0).abs() < 1e-9);
    }

    #[test]
    fn flooding_raises_cost_for_every_mode() {
        let model = CostModel::default();
        let dry = segment(100.0).with_elevation(ElevationStats::new(60.0, 55.0, 65.0));
        let wet = dry.clone().with_flooded(true);
        for mode in TravelMode::ALL {
            let a = model.cost(&dry, mode).traversal_cost;
            let b = model.cost(&wet, mode).traversal_cost;
            assert!(b > a, "{mode}: flooded {b} <= dry {a}");
            assert!((b / a - 2.5).abs() < 1e-9);
        }
    }

    #[test]
    fn terrain_factor_combines_height_and_slope() {
        let model = CostModel::default();
        // mean 200 m -> 1.2; gain 10 m over 100 m -> 2.0
        let s = segment(100.0).with_elevation(ElevationStats::new(200.0, 195.0, 205.0));
        assert!((model.terrain_factor(&s) - 2.4).abs() < 1e-9);
    }

    #[test]
    fn terrain_summary_prices_every_mode() {
        let model = CostModel::default();
        let s = segment(100.0)
            .with_elevation(ElevationStats::new(60.0, 55.0, 65.0))
            .with_flooded(true);
        let summary = model.terrain_summary(&s);

        assert_eq!(summary.segment_id, "s");
        assert!(summary.flooded);
        assert!((summary.elevation_gain_m - 10.0).abs() < 1e-9);
        assert!((summary.grade_pct - 10.0).abs() < 1e-9);
        assert!((summary.flood_factor - 2.5).abs() < 1e-9);
        // (1 + 0.06) * (1 + 0.1 * 10)
        assert!((summary.terrain_factor - 2.12).abs() < 1e-9);

        let expected_costs = [
            (TravelMode::Car, 530.0),
            (TravelMode::Motorcycle, 477.0),
            (TravelMode::Walking, 1590.0),
        ];
        for ((mode, cost), (expected_mode, expected)) in summary.costs.iter().zip(expected_costs) {
            assert_eq!(*mode, expected_mode);
            assert!((cost - expected).abs() < 1e-6, "{mode}: {cost}");
        }
        let speeds: Vec<f64> = summary.speeds_kmh.iter().map(|(_, v)| *v).collect();
        assert_eq!(speeds, vec![25.0, 25.0, 5.0]);
    }

    #[test]
    fn walking_is_penalised_on_high_ground() {
        let model = CostModel::default();
        let low = segment(100.0).with_elevation(ElevationStats::flat(10.0));
        let high = segment(100.0).with_elevation(ElevationStats::flat(60.0));
        assert!((model.mode_factor(&low, TravelMode::Walking) - 2.0).abs() < 1e-9);
        assert!((model.mode_factor(&high, TravelMode::Walking) - 3.0).abs() < 1e-9);
        assert!((model.mode_factor(&high, TravelMode::Motorcycle) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn speed_caps_and_floor() {
        let model = CostModel::default();
        let flooded = segment(100.0).with_flooded(true);
        assert!((model.speed_kmh(&flooded, TravelMode::Car) - 25.0).abs() < 1e-9);

        let steep = segment(100.0).with_elevation(ElevationStats::new(30.0, 10.0, 40.0));
        assert!((model.speed_kmh(&steep, TravelMode::Car) - 35.0).abs() < 1e-9);

        let crawl = segment(100.0).with_speed_limit(3.0);
        assert!((model.speed_kmh(&crawl, TravelMode::Motorcycle) - 10.0).abs() < 1e-9);
        assert!((model.speed_kmh(&flooded, TravelMode::Walking) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn mode_parsing_accepts_aliases() {
        assert_eq!("Driving".parse::<TravelMode>().unwrap(), TravelMode::Car);
        assert_eq!("foot".parse::<TravelMode>().unwrap(), TravelMode::Walking);
        assert!("hovercraft".parse::<TravelMode>().is_err());
    }

    #[test]
    fn validation_rejects_discounting_floods() {
        let model = CostModel {
            flood_factor: 0.5,
            ..CostModel::default()
        };
        assert!(model.validate().is_err());
        assert!(CostModel::default().validate().is_ok());
    }

    #[test]
    fn travel_time_uses_metres_per_second() {
        assert!((CostModel::travel_time_s(1000.0, 36.0) - 100.0).abs() < 1e-9);
        assert!(CostModel::travel_time_s(1000.0, 0.0).abs() < f64::EPSILON);
    }
}
