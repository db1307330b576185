use std::sync::Arc;

use chrono::Utc;
use floodroute_core::RoadNetwork;
use floodroute_core::geometry::Coordinate;
use floodroute_core::loading::{BuildReport, EngineConfig, build_network, load_network};
use floodroute_core::model::RoadSegment;
use floodroute_core::risk::{FloodRiskAnalyzer, FloodRiskAssessment, WeatherObservation};
use floodroute_core::routing::{
    AlternativesOutcome, AlternativesRequest, CancelFlag, RouteOutcome, RoutePlanner,
    RouteRequest, compute_alternatives,
};
use log::{info, warn};
use rayon::prelude::*;

use crate::{Error, NetworkHandle};

/// Route planning service over a shared network
#[derive(Debug, Clone)]
pub struct RouteEngine {
    config: Arc<EngineConfig>,
    network: NetworkHandle,
}

impl RouteEngine {
    /// Wraps an already built network
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation
    pub fn new(config: EngineConfig, network: RoadNetwork) -> Result<Self, Error> {
        Self::with_handle(config, NetworkHandle::new(network))
    }

    /// Shares `handle` with other engines or a reloader
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation
    pub fn with_handle(config: EngineConfig, handle: NetworkHandle) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            network: handle,
        })
    }

    /// Loads the dataset named in `config.network`
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset cannot be loaded or has no routable
    /// segment
    pub fn from_config(config: EngineConfig) -> Result<(Self, BuildReport), Error> {
        let (network, report) = load_network(&config)?;
        Ok((Self::new(config, network)?, report))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn handle(&self) -> &NetworkHandle {
        &self.network
    }

    pub fn network(&self) -> Arc<RoadNetwork> {
        self.network.snapshot()
    }

    /// Cheapest route between two coordinates
    ///
    /// # Errors
    ///
    /// Returns an error only for internal inconsistencies of the network
    pub fn compute_route(&self, request: &RouteRequest) -> Result<RouteOutcome, Error> {
        let network = self.network.snapshot();
        Ok(RoutePlanner::new(&network, &self.config).route(request)?)
    }

    /// Like [`RouteEngine::compute_route`], stopping early once `cancel` is
    /// set
    ///
    /// # Errors
    ///
    /// Returns an error only for internal inconsistencies of the network
    pub fn compute_route_cancellable(
        &self,
        request: &RouteRequest,
        cancel: CancelFlag,
    ) -> Result<RouteOutcome, Error> {
        let network = self.network.snapshot();
        Ok(RoutePlanner::new(&network, &self.config)
            .with_cancel(cancel)
            .route(request)?)
    }

    /// Labelled, flood-scored alternatives. Weather is judged against the
    /// current time unless the request fixes one.
    ///
    /// # Errors
    ///
    /// Returns an error only for internal inconsistencies of the network
    pub fn compute_alternatives(
        &self,
        request: &AlternativesRequest,
    ) -> Result<AlternativesOutcome, Error> {
        let network = self.network.snapshot();
        let planner = RoutePlanner::new(&network, &self.config);
        if request.as_of.is_some() {
            return Ok(compute_alternatives(&planner, request)?);
        }
        let request = AlternativesRequest {
            as_of: Some(Utc::now()),
            ..request.clone()
        };
        Ok(compute_alternatives(&planner, &request)?)
    }

    /// Routes a batch in parallel over one network snapshot
    pub fn compute_routes(&self, requests: &[RouteRequest]) -> Vec<Result<RouteOutcome, Error>> {
        let network = self.network.snapshot();
        let planner = RoutePlanner::new(&network, &self.config);
        requests
            .par_iter()
            .map(|request| planner.route(request).map_err(Error::from))
            .collect()
    }

    /// Flood exposure of a coordinate sequence routed elsewhere
    pub fn assess_coordinates(
        &self,
        coordinates: &[Coordinate],
        buffer_m: Option<f64>,
        weather: Option<&WeatherObservation>,
    ) -> FloodRiskAssessment {
        let network = self.network.snapshot();
        let impact = self.config.risk.weather.assess(weather, Some(Utc::now()));
        FloodRiskAnalyzer::new(&network, &self.config.risk).assess_coordinates(
            coordinates,
            buffer_m,
            &impact,
        )
    }

    /// Rebuilds the network from the configured dataset and publishes it.
    /// The current network stays in service if loading fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset cannot be loaded
    pub fn reload(&self) -> Result<BuildReport, Error> {
        let (network, report) = load_network(&self.config).inspect_err(|e| {
            warn!("Reload failed, keeping the current network: {e}");
        })?;
        self.network.replace(network);
        Ok(report)
    }

    /// Builds a network from in-memory segments and publishes it
    ///
    /// # Errors
    ///
    /// Returns [`floodroute_core::Error::EmptyNetwork`] if no segment is
    /// routable; the current network stays in service
    pub fn reload_from_segments(&self, segments: Vec<RoadSegment>) -> Result<BuildReport, Error> {
        let (network, report) = build_network(
            segments,
            self.config.network.coordinate_precision,
            self.config.cost.clone(),
        );
        if network.is_empty() {
            warn!(
                "Rebuilt network is empty ({} segments skipped), keeping the current one",
                report.skipped.len()
            );
            return Err(floodroute_core::Error::EmptyNetwork.into());
        }
        self.network.replace(network);
        info!("Reloaded {} segments", report.segments_loaded);
        Ok(report)
    }
}
