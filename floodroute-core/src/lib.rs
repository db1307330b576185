//! Terrain- and flood-aware route planning over line-segment road networks.
//!
//! The crate is split the same way the data flows: [`loading`] turns road
//! datasets into an immutable [`RoadNetwork`], [`cost`] prices every segment
//! for a travel mode, [`routing`] searches the graph and builds alternatives,
//! and [`risk`] scores routes against flooded roads.

pub mod cost;
pub mod error;
pub mod geometry;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod risk;
pub mod routing;

pub use error::Error;
pub use model::RoadNetwork;

/// Index of a segment inside [`RoadNetwork::segments`]
pub type SegmentIdx = usize;

/// Graph node identifier
pub type NodeId = petgraph::graph::NodeIndex;

/// Distance in metres
pub type Meters = f64;

/// Duration in seconds
pub type Seconds = f64;

/// Default number of decimal places kept when merging segment endpoints
/// (1e-6 degrees is roughly 0.1 m).
pub const DEFAULT_COORDINATE_PRECISION: u32 = 6;
