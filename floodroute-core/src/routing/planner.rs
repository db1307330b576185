//! Single-route planning: snapping, search and route assembly

use std::fmt;

use log::debug;
use serde::Serialize;

use super::route::Route;
use super::search::{
    CancelFlag, SearchLimits, SearchOutcome, UnreachableReason, shortest_path,
};
use crate::cost::TravelMode;
use crate::geometry::Coordinate;
use crate::loading::EngineConfig;
use crate::model::SnappedNode;
use crate::{Error, Meters, NodeId, RoadNetwork};

/// Which request coordinate could not be snapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Origin,
    Destination,
    Waypoint,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Endpoint::Origin => "origin",
            Endpoint::Destination => "destination",
            Endpoint::Waypoint => "waypoint",
        })
    }
}

/// No graph node close enough to a request coordinate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapFailure {
    pub endpoint: Endpoint,
    pub coordinate: Coordinate,
    /// Largest radius tried
    pub radius_m: Meters,
    /// Distance to the nearest node at any range, `None` for invalid
    /// coordinates or an empty network
    pub nearest_distance_m: Option<Meters>,
}

impl fmt::Display for SnapFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no road within {:.0} m of the {}",
            self.radius_m, self.endpoint
        )?;
        if let Some(distance) = self.nearest_distance_m {
            write!(f, " (nearest is {distance:.0} m away)")?;
        }
        Ok(())
    }
}

/// Outcome of a single route request
#[derive(Debug, Clone)]
pub enum RouteOutcome {
    Found(Route),
    Unreachable(UnreachableReason),
    SnapFailed(SnapFailure),
}

impl RouteOutcome {
    pub fn route(&self) -> Option<&Route> {
        match self {
            RouteOutcome::Found(route) => Some(route),
            _ => None,
        }
    }

    pub fn into_route(self) -> Option<Route> {
        match self {
            RouteOutcome::Found(route) => Some(route),
            _ => None,
        }
    }
}

/// A single route request
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub mode: TravelMode,
    /// Overrides the configured snapping radius
    pub max_snap_radius_m: Option<Meters>,
}

impl RouteRequest {
    pub fn new(origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            origin,
            destination,
            mode: TravelMode::default(),
            max_snap_radius_m: None,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: TravelMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_max_snap_radius(mut self, radius_m: Meters) -> Self {
        self.max_snap_radius_m = Some(radius_m);
        self
    }
}

/// Plans routes over one network snapshot with one configuration
#[derive(Debug, Clone)]
pub struct RoutePlanner<'a> {
    network: &'a RoadNetwork,
    config: &'a EngineConfig,
    cancel: Option<CancelFlag>,
}

impl<'a> RoutePlanner<'a> {
    pub fn new(network: &'a RoadNetwork, config: &'a EngineConfig) -> Self {
        Self {
            network,
            config,
            cancel: None,
        }
    }

    /// Searches started by this planner stop once `cancel` is set
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn network(&self) -> &'a RoadNetwork {
        self.network
    }

    pub fn config(&self) -> &'a EngineConfig {
        self.config
    }

    /// Fresh limits for one search; the time budget starts now
    pub fn limits(&self) -> SearchLimits {
        let search = &self.config.search;
        let mut limits = SearchLimits {
            max_expansions: search.max_expansions,
            deadline: None,
            cancel: self.cancel.clone(),
        };
        if let Some(budget) = search.time_budget() {
            limits = limits.with_time_budget(budget);
        }
        limits
    }

    /// Snaps `coordinate` within `radius_m`, then within each larger
    /// configured retry radius.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapFailure`] when no node lies within the largest radius
    pub fn snap(
        &self,
        coordinate: Coordinate,
        endpoint: Endpoint,
        radius_m: Meters,
    ) -> Result<SnappedNode, SnapFailure> {
        let nearest = self.network.nearest_node_unbounded(coordinate);
        let mut tried = radius_m;
        let radii = std::iter::once(radius_m).chain(
            self.config
                .snapping
                .retry_radii_m
                .iter()
                .copied()
                .filter(|r| *r > radius_m),
        );
        for radius in radii {
            tried = tried.max(radius);
            if let Some(snapped) = nearest.filter(|s| s.is_within(radius)) {
                if radius > radius_m {
                    debug!("Snapped {endpoint} after widening the radius to {radius} m");
                }
                return Ok(snapped);
            }
        }
        Err(SnapFailure {
            endpoint,
            coordinate,
            radius_m: tried,
            nearest_distance_m: nearest.map(|s| s.distance_m),
        })
    }

    /// Cheapest path between two graph nodes
    ///
    /// # Errors
    ///
    /// Returns an error if either node is not part of the network
    pub fn search(
        &self,
        start: NodeId,
        goal: NodeId,
        mode: TravelMode,
    ) -> Result<SearchOutcome, Error> {
        shortest_path(
            self.network,
            start,
            goal,
            mode,
            self.config.search.use_heuristic,
            &self.limits(),
        )
    }

    /// Computes the cheapest route for a request.
    ///
    /// No route, or no road near an endpoint, are ordinary outcomes, not
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns an error only for internal inconsistencies of the network
    pub fn route(&self, request: &RouteRequest) -> Result<RouteOutcome, Error> {
        let radius = request
            .max_snap_radius_m
            .unwrap_or(self.config.snapping.max_radius_m);

        let start = match self.snap(request.origin, Endpoint::Origin, radius) {
            Ok(snapped) => snapped,
            Err(failure) => return Ok(RouteOutcome::SnapFailed(failure)),
        };
        let goal = match self.snap(request.destination, Endpoint::Destination, radius) {
            Ok(snapped) => snapped,
            Err(failure) => return Ok(RouteOutcome::SnapFailed(failure)),
        };

        match self.search(start.node, goal.node, request.mode)? {
            SearchOutcome::Found(path) => Ok(RouteOutcome::Found(Route::from_path(
                self.network,
                &path,
                request.mode,
                request.origin,
                request.destination,
            ))),
            SearchOutcome::Unreachable(reason) => {
                debug!("No {} route: {reason}", request.mode);
                Ok(RouteOutcome::Unreachable(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostModel;
    use crate::loading::build_network;
    use crate::model::RoadSegment;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon)
    }

    fn network() -> RoadNetwork {
        let segments = vec![RoadSegment::new(
            "ab",
            vec![c(0.0, 0.0), c(0.0, 0.001)],
        )];
        build_network(segments, 6, CostModel::default()).0
    }

    #[test]
    fn snap_retries_with_wider_radii() {
        let network = network();
        let mut config = EngineConfig::default();
        config.snapping.retry_radii_m = vec![50.0, 500.0, 5_000.0];
        let planner = RoutePlanner::new(&network, &config);

        // ~222 m north of a
        let far = c(0.002, 0.0);
        let snapped = planner.snap(far, Endpoint::Origin, 100.0).unwrap();
        assert_eq!(snapped.coordinate, c(0.0, 0.0));

        config.snapping.retry_radii_m.clear();
        let planner = RoutePlanner::new(&network, &config);
        let failure = planner.snap(far, Endpoint::Origin, 100.0).unwrap_err();
        assert_eq!(failure.endpoint, Endpoint::Origin);
        assert!((failure.radius_m - 100.0).abs() < f64::EPSILON);
        assert!((failure.nearest_distance_m.unwrap() - 222.4).abs() < 1.0);
    }

    #[test]
    fn route_reports_snap_failure_per_endpoint() {
        let network = network();
        let config = EngineConfig::default();
        let planner = RoutePlanner::new(&network, &config);

        let request = RouteRequest::new(c(0.0, 0.0), c(1.0, 1.0)).with_max_snap_radius(500.0);
        match planner.route(&request).unwrap() {
            RouteOutcome::SnapFailed(failure) => {
                assert_eq!(failure.endpoint, Endpoint::Destination);
            }
            other => panic!("expected a snap failure, got {other:?}"),
        }

        let request = RouteRequest::new(c(f64::NAN, 0.0), c(0.0, 0.001));
        match planner.route(&request).unwrap() {
            RouteOutcome::SnapFailed(failure) => {
                assert_eq!(failure.endpoint, Endpoint::Origin);
                assert!(failure.nearest_distance_m.is_none());
            }
            other => panic!("expected a snap failure, got {other:?}"),
        }
    }

    #[test]
    fn cancelled_planner_reports_unreachable() {
        let network = network();
        let config = EngineConfig::default();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let planner = RoutePlanner::new(&network, &config).with_cancel(cancel);

        let request = RouteRequest::new(c(0.0, 0.0), c(0.0, 0.001));
        assert!(matches!(
            planner.route(&request).unwrap(),
            RouteOutcome::Unreachable(UnreachableReason::Cancelled)
        ));
    }
}
