pub use crate::DEFAULT_COORDINATE_PRECISION;

// Network data and loading
pub use crate::geometry::Coordinate;
pub use crate::loading::{BuildReport, EngineConfig, build_network, load_network};
pub use crate::model::{ElevationStats, RoadNetwork, RoadSegment, SnappedNode};

// Costs and routing
pub use crate::cost::{CostModel, TravelMode};
pub use crate::routing::{
    AlternativeSet, AlternativesOutcome, AlternativesRequest, CancelFlag, LabeledRoute, Route,
    RouteLabel, RouteOutcome, RoutePlanner, RouteRequest, UnreachableReason,
    compute_alternatives,
};

// Flood risk
pub use crate::risk::{
    FloodRiskAnalyzer, FloodRiskAssessment, RiskConfig, RiskLevel, WeatherImpact,
    WeatherObservation,
};

pub use crate::{Meters, NodeId, SegmentIdx, Seconds};
