//! Risk-differentiated alternative routes
//!
//! Candidates come from Yen's k shortest paths and, when those are too few,
//! from detours through waypoints offset sideways from the direct line. Each
//! candidate is scored for flood exposure, then the ranked set is labelled
//! safest / balanced / direct.

mod k_shortest;
mod selection;
mod waypoints;

use chrono::{DateTime, Utc};
use hashbrown::HashSet;
use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

pub use k_shortest::k_shortest_paths;
pub use selection::{RouteLabel, Selection, select_labels};

use super::planner::{Endpoint, RoutePlanner, SnapFailure};
use super::route::Route;
use super::search::{PathResult, SearchOutcome, UnreachableReason};
use crate::cost::TravelMode;
use crate::geometry::Coordinate;
use crate::risk::{FloodRiskAnalyzer, FloodRiskAssessment, WeatherImpact, WeatherObservation};
use crate::{Error, Meters, NodeId};

pub const MIN_ALTERNATIVES: usize = 2;
pub const MAX_ALTERNATIVES: usize = 5;

/// How a candidate was generated
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateSource {
    ShortestPath,
    KShortest { rank: usize },
    Waypoint { offset_fraction: f64 },
}

/// A request for alternative routes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlternativesRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    /// Clamped to 2..=5; the configured default when unset
    pub desired_count: Option<usize>,
    pub mode: Option<TravelMode>,
    /// Corridor half-width for the flood analysis
    pub buffer_m: Option<Meters>,
    pub weather: Option<WeatherObservation>,
    /// Reference time for judging weather staleness
    pub as_of: Option<DateTime<Utc>>,
    pub max_snap_radius_m: Option<Meters>,
    /// Also score every route point
    pub with_points: bool,
}

impl AlternativesRequest {
    pub fn new(origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            origin,
            destination,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_count(mut self, desired_count: usize) -> Self {
        self.desired_count = Some(desired_count);
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: TravelMode) -> Self {
        self.mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_buffer(mut self, buffer_m: Meters) -> Self {
        self.buffer_m = Some(buffer_m);
        self
    }

    #[must_use]
    pub fn with_weather(mut self, weather: WeatherObservation) -> Self {
        self.weather = Some(weather);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LabeledRoute {
    pub label: RouteLabel,
    pub route: Route,
    pub risk: FloodRiskAssessment,
    pub source: CandidateSource,
    /// Same candidate as an earlier route in the set
    pub duplicate: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlternativeSet {
    /// Safest first
    pub routes: Vec<LabeledRoute>,
    /// Distinct candidates scored before labelling
    pub candidates_considered: usize,
    /// Fewer distinct candidates than labels; some routes are duplicates
    pub degenerate: bool,
    pub weather_impact: WeatherImpact,
}

impl AlternativeSet {
    pub fn get(&self, label: RouteLabel) -> Option<&LabeledRoute> {
        self.routes.iter().find(|r| r.label == label)
    }

    pub fn safest(&self) -> Option<&LabeledRoute> {
        self.get(RouteLabel::Safest)
    }
}

#[derive(Debug, Clone)]
pub enum AlternativesOutcome {
    Found(AlternativeSet),
    Unreachable(UnreachableReason),
    SnapFailed(SnapFailure),
}

struct Candidate {
    source: CandidateSource,
    path: PathResult,
}

struct Scored {
    source: CandidateSource,
    route: Route,
    risk: FloodRiskAssessment,
}

/// Computes a labelled set of alternative routes.
///
/// # Errors
///
/// Returns an error only for internal inconsistencies of the network
pub fn compute_alternatives(
    planner: &RoutePlanner<'_>,
    request: &AlternativesRequest,
) -> Result<AlternativesOutcome, Error> {
    let config = planner.config();
    let network = planner.network();
    let desired = request
        .desired_count
        .unwrap_or(config.alternatives.default_count)
        .clamp(MIN_ALTERNATIVES, MAX_ALTERNATIVES);
    let mode = request.mode.unwrap_or(config.alternatives.default_mode);
    let radius = request
        .max_snap_radius_m
        .unwrap_or(config.snapping.max_radius_m);

    let start = match planner.snap(request.origin, Endpoint::Origin, radius) {
        Ok(snapped) => snapped,
        Err(failure) => return Ok(AlternativesOutcome::SnapFailed(failure)),
    };
    let goal = match planner.snap(request.destination, Endpoint::Destination, radius) {
        Ok(snapped) => snapped,
        Err(failure) => return Ok(AlternativesOutcome::SnapFailed(failure)),
    };

    let first = match planner.search(start.node, goal.node, mode)? {
        SearchOutcome::Found(path) => path,
        SearchOutcome::Unreachable(reason) => return Ok(AlternativesOutcome::Unreachable(reason)),
    };

    let mut candidates = Vec::new();
    if config.alternatives.use_k_shortest {
        let k = config.alternatives.k_shortest_paths.max(desired);
        let paths = k_shortest_paths(
            network,
            first,
            k,
            mode,
            config.search.use_heuristic,
            &planner.limits(),
        )?;
        candidates.extend(paths.into_iter().enumerate().map(|(rank, path)| Candidate {
            source: if rank == 0 {
                CandidateSource::ShortestPath
            } else {
                CandidateSource::KShortest { rank }
            },
            path,
        }));
    } else {
        candidates.push(Candidate {
            source: CandidateSource::ShortestPath,
            path: first,
        });
    }

    if distinct(&candidates).len() < desired {
        let detours = waypoints::waypoint_paths(
            planner,
            &start,
            &goal,
            request.origin,
            request.destination,
            mode,
        )?;
        candidates.extend(detours.into_iter().map(|(offset_fraction, path)| Candidate {
            source: CandidateSource::Waypoint { offset_fraction },
            path,
        }));
    }

    let keep = distinct(&candidates);
    let candidates: Vec<Candidate> = candidates
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| keep.contains(idx))
        .map(|(_, candidate)| candidate)
        .collect();

    let weather = config
        .risk
        .weather
        .assess(request.weather.as_ref(), request.as_of);
    let analyzer = FloodRiskAnalyzer::new(network, &config.risk);
    let mut scored: Vec<Scored> = candidates
        .into_par_iter()
        .map(|candidate| {
            let route = Route::from_path(
                network,
                &candidate.path,
                mode,
                request.origin,
                request.destination,
            );
            let risk = analyzer.assess_route(&route, request.buffer_m, &weather, request.with_points);
            Scored {
                source: candidate.source,
                route,
                risk,
            }
        })
        .collect();

    // Stable, so full ties keep generation order
    scored.sort_by(|a, b| {
        a.risk
            .flooded_percentage
            .total_cmp(&b.risk.flooded_percentage)
            .then(a.route.distance_m.total_cmp(&b.route.distance_m))
    });

    let distances: Vec<f64> = scored.iter().map(|s| s.route.distance_m).collect();
    let selections = select_labels(
        &distances,
        desired,
        config.alternatives.direct_min_separation_m,
    );
    let degenerate = scored.len() < desired.min(3);
    if degenerate {
        debug!(
            "Only {} distinct candidates for {desired} alternatives",
            scored.len()
        );
    }

    let routes = selections
        .iter()
        .filter_map(|selection| {
            let candidate = scored.get(selection.index)?;
            Some(LabeledRoute {
                label: selection.label,
                route: candidate.route.clone(),
                risk: candidate.risk.clone(),
                source: candidate.source,
                duplicate: selection.duplicate,
            })
        })
        .collect();

    info!(
        "Alternatives ({mode}): {} candidates, {} labelled",
        scored.len(),
        selections.len()
    );

    Ok(AlternativesOutcome::Found(AlternativeSet {
        routes,
        candidates_considered: scored.len(),
        degenerate,
        weather_impact: weather,
    }))
}

/// Indices of the first candidate of each distinct node sequence
fn distinct(candidates: &[Candidate]) -> Vec<usize> {
    let mut seen: HashSet<&[NodeId]> = HashSet::new();
    candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| seen.insert(c.path.nodes.as_slice()))
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoadNetwork;
    use crate::cost::CostModel;
    use crate::loading::{EngineConfig, build_network};
    use crate::model::RoadSegment;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon)
    }

    /// Three west-east ways 1 km long: straight and flooded in the middle,
    /// and two bows to the north, the farther one dry
    fn network() -> RoadNetwork {
        let segments = vec![
            RoadSegment::new("w", vec![c(0.0, 0.0), c(0.0, 0.004)]),
            RoadSegment::new("flood", vec![c(0.0, 0.004), c(0.0, 0.005)]).with_flooded(true),
            RoadSegment::new("e", vec![c(0.0, 0.005), c(0.0, 0.009)]),
            RoadSegment::new(
                "near",
                vec![c(0.0, 0.0), c(0.0015, 0.0045), c(0.0, 0.009)],
            ),
            RoadSegment::new("far", vec![c(0.0, 0.0), c(0.004, 0.0045), c(0.0, 0.009)]),
        ];
        build_network(segments, 6, CostModel::default()).0
    }

    #[test]
    fn labels_span_safest_to_direct() {
        let network = network();
        let config = EngineConfig::default();
        let planner = RoutePlanner::new(&network, &config);
        let request = AlternativesRequest::new(c(0.0, 0.0), c(0.0, 0.009)).with_count(3);

        let AlternativesOutcome::Found(set) = compute_alternatives(&planner, &request).unwrap()
        else {
            panic!("expected alternatives");
        };
        assert_eq!(set.routes.len(), 3);
        assert!(!set.degenerate);

        let safest = set.safest().unwrap();
        let direct = set.get(RouteLabel::Direct).unwrap();
        assert!(safest.risk.flooded_percentage.abs() < f64::EPSILON);
        assert!(direct.risk.flooded_percentage > 0.0);
        assert!(direct.route.distance_m < safest.route.distance_m);
        for route in &set.routes {
            assert!(route.risk.flooded_percentage >= safest.risk.flooded_percentage);
        }
    }

    #[test]
    fn desired_count_is_clamped() {
        let network = network();
        let config = EngineConfig::default();
        let planner = RoutePlanner::new(&network, &config);

        let request = AlternativesRequest::new(c(0.0, 0.0), c(0.0, 0.009)).with_count(1);
        let AlternativesOutcome::Found(set) = compute_alternatives(&planner, &request).unwrap()
        else {
            panic!("expected alternatives");
        };
        let labels: Vec<RouteLabel> = set.routes.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec![RouteLabel::Safest, RouteLabel::Direct]);
    }

    #[test]
    fn snap_failure_is_reported() {
        let network = network();
        let config = EngineConfig::default();
        let planner = RoutePlanner::new(&network, &config);
        let request = AlternativesRequest::new(c(0.0, 0.0), c(0.5, 0.5));
        assert!(matches!(
            compute_alternatives(&planner, &request).unwrap(),
            AlternativesOutcome::SnapFailed(SnapFailure {
                endpoint: Endpoint::Destination,
                ..
            })
        ));
    }
}
