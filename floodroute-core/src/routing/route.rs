//! Routes as returned to callers

use itertools::Itertools;
use serde::Serialize;

use super::search::PathResult;
use crate::cost::{CostModel, TravelMode};
use crate::geometry::{Coordinate, haversine_m, polyline_length_m};
use crate::model::ElevationStats;
use crate::{Meters, NodeId, RoadNetwork, Seconds};

/// Per-edge breakdown of a route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSegmentInfo {
    /// Dataset id of the traversed segment, `None` for connectors
    pub segment_id: Option<String>,
    pub road_name: Option<String>,
    pub road_class: Option<String>,
    pub distance_m: Meters,
    pub duration_s: Seconds,
    pub speed_kmh: f64,
    pub elevation: Option<ElevationStats>,
    pub flooded: bool,
    /// Straight link between a requested coordinate and its snapped node
    pub connector: bool,
}

impl RouteSegmentInfo {
    fn connector(distance_m: Meters, speed_kmh: f64) -> Self {
        Self {
            segment_id: None,
            road_name: None,
            road_class: None,
            distance_m,
            duration_s: CostModel::travel_time_s(distance_m, speed_kmh),
            speed_kmh,
            elevation: None,
            flooded: false,
            connector: true,
        }
    }
}

/// A route from origin to destination
#[derive(Debug, Clone, Serialize)]
pub struct Route {
    /// Requested origin first, requested destination last
    pub coordinates: Vec<Coordinate>,
    /// Graph nodes along the route, connectors excluded
    #[serde(skip)]
    pub nodes: Vec<NodeId>,
    pub distance_m: Meters,
    pub duration_s: Seconds,
    /// Search cost of the graph part of the route
    pub cost: f64,
    pub mode: TravelMode,
    pub segments: Vec<RouteSegmentInfo>,
}

impl Route {
    /// Expands a found path into a route between the requested coordinates.
    ///
    /// When `origin` or `destination` differ from the snapped path ends, a
    /// connector is added whose duration uses the speed of the adjacent
    /// edge.
    pub fn from_path(
        network: &RoadNetwork,
        path: &PathResult,
        mode: TravelMode,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Self {
        let fallback_speed = network.cost_model().fallback_speed_kmh(mode);
        let first_speed = path
            .hops
            .first()
            .map_or(fallback_speed, |h| network.speed_kmh(h.segment, mode));
        let last_speed = path
            .hops
            .last()
            .map_or(fallback_speed, |h| network.speed_kmh(h.segment, mode));

        let mut coordinates = Vec::with_capacity(path.nodes.len() + 2);
        let mut segments = Vec::with_capacity(path.hops.len() + 2);

        let node_coordinates: Vec<Coordinate> = path
            .nodes
            .iter()
            .filter_map(|n| network.coordinate(*n))
            .collect();

        match node_coordinates.first() {
            Some(start) => {
                if *start != origin {
                    coordinates.push(origin);
                    segments.push(RouteSegmentInfo::connector(
                        haversine_m(origin, *start),
                        first_speed,
                    ));
                }
                coordinates.push(*start);
            }
            None => coordinates.push(origin),
        }

        for (hop, to) in path.hops.iter().zip(node_coordinates.iter().skip(1)) {
            let Some(segment) = network.segment(hop.segment) else {
                continue;
            };
            let speed_kmh = network.speed_kmh(hop.segment, mode);
            segments.push(RouteSegmentInfo {
                segment_id: Some(segment.id.clone()),
                road_name: segment.name.clone(),
                road_class: Some(segment.road_class.clone()),
                distance_m: hop.length_m,
                duration_s: CostModel::travel_time_s(hop.length_m, speed_kmh),
                speed_kmh,
                elevation: Some(segment.elevation),
                flooded: segment.flooded,
                connector: false,
            });
            coordinates.push(*to);
        }

        if let Some(end) = coordinates.last().copied()
            && end != destination
        {
            segments.push(RouteSegmentInfo::connector(
                haversine_m(end, destination),
                last_speed,
            ));
            coordinates.push(destination);
        }

        let distance_m = segments.iter().map(|s| s.distance_m).sum();
        let duration_s = segments.iter().map(|s| s.duration_s).sum();

        Self {
            coordinates,
            nodes: path.nodes.clone(),
            distance_m,
            duration_s,
            cost: path.cost,
            mode,
            segments,
        }
    }

    /// Great-circle length of the route polyline
    pub fn geometric_length_m(&self) -> Meters {
        polyline_length_m(&self.coordinates)
    }

    pub fn flooded_distance_m(&self) -> Meters {
        self.segments
            .iter()
            .filter(|s| s.flooded)
            .map(|s| s.distance_m)
            .sum()
    }

    /// Elevation at every route coordinate, taken from the mean elevation of
    /// the segment arriving at it (or leaving it, for the first point and
    /// after connectors)
    pub fn elevation_profile(&self) -> Vec<Option<f64>> {
        let mean = |idx: usize| -> Option<f64> {
            self.segments
                .get(idx)
                .and_then(|s| s.elevation)
                .map(|e| e.mean_m)
        };
        (0..self.coordinates.len())
            .map(|i| {
                let arriving = i.checked_sub(1).and_then(mean);
                arriving.or_else(|| mean(i))
            })
            .collect()
    }

    /// Elevation and flooding summary for display next to the route
    pub fn terrain_summary(&self) -> RouteTerrainSummary {
        let profile = self.elevation_profile();
        let known: Vec<f64> = profile.iter().flatten().copied().collect();

        let weighted: Vec<(f64, f64)> = self
            .segments
            .iter()
            .filter_map(|s| s.elevation.map(|e| (e.mean_m, s.distance_m)))
            .collect();
        let weight: f64 = weighted.iter().map(|(_, d)| d).sum();
        let mean_elevation_m = (weight > 0.0)
            .then(|| weighted.iter().map(|(e, d)| e * d).sum::<f64>() / weight);

        let mut cumulative_gain_m = 0.0;
        let mut steepest_grade_pct: f64 = 0.0;
        for ((a, pa), (b, pb)) in self
            .coordinates
            .iter()
            .zip(&profile)
            .tuple_windows()
        {
            if let (Some(ea), Some(eb)) = (pa, pb) {
                let rise = eb - ea;
                if rise > 0.0 {
                    cumulative_gain_m += rise;
                }
                let run = haversine_m(*a, *b);
                if run > 0.0 {
                    let grade = rise / run * 100.0;
                    if grade.abs() > steepest_grade_pct.abs() {
                        steepest_grade_pct = grade;
                    }
                }
            }
        }

        RouteTerrainSummary {
            min_elevation_m: known.iter().copied().reduce(f64::min),
            max_elevation_m: known.iter().copied().reduce(f64::max),
            mean_elevation_m,
            cumulative_gain_m,
            steepest_grade_pct,
            flooded_distance_m: self.flooded_distance_m(),
            flooded_segments: self.segments.iter().filter(|s| s.flooded).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteTerrainSummary {
    pub min_elevation_m: Option<f64>,
    pub max_elevation_m: Option<f64>,
    /// Distance-weighted mean over the traversed segments
    pub mean_elevation_m: Option<f64>,
    pub cumulative_gain_m: f64,
    /// Signed grade of the steepest stretch, in percent
    pub steepest_grade_pct: f64,
    pub flooded_distance_m: Meters,
    pub flooded_segments: usize,
}
