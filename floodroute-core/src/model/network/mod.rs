//! Routable graph built from road segments

pub mod components;
pub mod graph;
mod index;

pub use components::{GraphNode, RoadEdge, SegmentTouch};
pub use graph::{RoadNetwork, SnappedNode};
