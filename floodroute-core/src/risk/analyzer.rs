use log::trace;
use rstar::RTree;
use rstar::primitives::Line;
use serde::Serialize;

use super::point_score::PointRisk;
use super::weather::WeatherImpact;
use super::{RiskConfig, RiskLevel};
use crate::geometry::{Coordinate, polyline_length_m};
use crate::routing::Route;
use crate::{Meters, RoadNetwork};

/// Flood exposure of one route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloodRiskAssessment {
    /// Share of the route running along flooded roads, weather-scaled and
    /// clamped to 0..=100
    pub flooded_percentage: f64,
    pub flooded_distance_m: Meters,
    pub route_distance_m: Meters,
    pub risk_level: RiskLevel,
    pub weather_impact: WeatherImpact,
    pub buffer_m: Meters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<PointRisk>>,
}

/// Scores routes against the flooded segments of a network
#[derive(Debug, Clone, Copy)]
pub struct FloodRiskAnalyzer<'a> {
    network: &'a RoadNetwork,
    config: &'a RiskConfig,
}

impl<'a> FloodRiskAnalyzer<'a> {
    pub fn new(network: &'a RoadNetwork, config: &'a RiskConfig) -> Self {
        Self { network, config }
    }

    /// Assesses a planned route. With `with_points`, every route point is
    /// scored as well, using elevations derived from the traversed segments.
    pub fn assess_route(
        &self,
        route: &Route,
        buffer_m: Option<Meters>,
        weather: &WeatherImpact,
        with_points: bool,
    ) -> FloodRiskAssessment {
        let mut assessment =
            self.assess_polyline(&route.coordinates, route.distance_m, buffer_m, weather);
        if with_points {
            assessment.points = Some(self.config.points.score_points(
                &route.coordinates,
                &route.elevation_profile(),
                weather.rainfall_mm,
            ));
        }
        assessment
    }

    /// Assesses an arbitrary coordinate sequence, e.g. a route planned
    /// elsewhere
    pub fn assess_coordinates(
        &self,
        coordinates: &[Coordinate],
        buffer_m: Option<Meters>,
        weather: &WeatherImpact,
    ) -> FloodRiskAssessment {
        let length = polyline_length_m(coordinates);
        self.assess_polyline(coordinates, length, buffer_m, weather)
    }

    fn assess_polyline(
        &self,
        coordinates: &[Coordinate],
        route_distance_m: Meters,
        buffer_m: Option<Meters>,
        weather: &WeatherImpact,
    ) -> FloodRiskAssessment {
        let buffer_m = buffer_m
            .filter(|b| b.is_finite() && *b > 0.0)
            .unwrap_or(self.config.buffer_m);

        let flooded_distance_m = if route_distance_m > 0.0 {
            self.corridor_flooded_distance(coordinates, buffer_m)
                .min(route_distance_m)
        } else {
            0.0
        };
        let flooded_percentage = if route_distance_m > 0.0 {
            (flooded_distance_m / route_distance_m * 100.0 * weather.multiplier).clamp(0.0, 100.0)
        } else {
            0.0
        };

        FloodRiskAssessment {
            flooded_percentage,
            flooded_distance_m,
            route_distance_m,
            risk_level: self.config.risk_level(flooded_percentage),
            weather_impact: *weather,
            buffer_m,
            points: None,
        }
    }

    /// Length of flooded road inside the corridor of half-width `buffer_m`
    /// around the polyline.
    ///
    /// Flooded pieces near the route are cut into samples of at most
    /// `sample_step_m`; a sample counts when its midpoint lies inside the
    /// corridor.
    pub fn corridor_flooded_distance(&self, coordinates: &[Coordinate], buffer_m: Meters) -> Meters {
        let projection = self.network.projection();
        let projected: Vec<[f64; 2]> = coordinates
            .iter()
            .filter(|c| c.is_valid())
            .map(|c| projection.project(*c))
            .collect();
        if projected.len() < 2 {
            return 0.0;
        }

        let corridor = RTree::bulk_load(
            projected
                .windows(2)
                .map(|pair| Line::new(pair[0], pair[1]))
                .collect(),
        );

        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for p in &projected {
            for axis in 0..2 {
                min[axis] = min[axis].min(p[axis] - buffer_m);
                max[axis] = max[axis].max(p[axis] + buffer_m);
            }
        }

        let step = self.config.sample_step_m;
        let buffer_2 = buffer_m * buffer_m;
        let mut flooded = 0.0;
        let mut pieces = 0usize;
        for piece in self.network.flood_pieces_in(min, max) {
            pieces += 1;
            let (from, to) = (piece.geom().from, piece.geom().to);
            let dx = to[0] - from[0];
            let dy = to[1] - from[1];
            let length = dx.hypot(dy);
            if length <= 0.0 {
                continue;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let samples = (length / step).ceil().max(1.0) as usize;
            #[allow(clippy::cast_precision_loss)]
            let sample_length = length / samples as f64;
            for k in 0..samples {
                #[allow(clippy::cast_precision_loss)]
                let t = (k as f64 + 0.5) / samples as f64;
                let midpoint = [from[0] + dx * t, from[1] + dy * t];
                if corridor
                    .locate_within_distance(midpoint, buffer_2)
                    .next()
                    .is_some()
                {
                    flooded += sample_length;
                }
            }
        }
        trace!("{pieces} flooded pieces near the route, {flooded:.1} m inside the corridor");
        flooded
    }
}
