//! Path search, route construction and alternatives

pub mod alternatives;
pub mod planner;
pub mod route;
pub mod search;
pub mod source;
mod to_geojson;

pub use alternatives::{
    AlternativeSet, AlternativesOutcome, AlternativesRequest, CandidateSource, LabeledRoute,
    RouteLabel, compute_alternatives,
};
pub use planner::{Endpoint, RouteOutcome, RoutePlanner, RouteRequest, SnapFailure};
pub use route::{Route, RouteSegmentInfo, RouteTerrainSummary};
pub use search::{
    CancelFlag, PathResult, SearchLimits, SearchOutcome, UnreachableReason, astar, dijkstra,
    shortest_path,
};
pub use source::{GraphSource, Hop, RestrictedSource};
