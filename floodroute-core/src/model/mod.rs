//! Road network data model

pub mod network;
pub mod segment;

pub use network::{GraphNode, RoadEdge, RoadNetwork, SegmentTouch, SnappedNode};
pub use segment::{ElevationStats, RoadSegment};
