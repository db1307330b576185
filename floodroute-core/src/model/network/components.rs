//! Road graph components - nodes and directed edges

use crate::geometry::Coordinate;
use crate::{Meters, SegmentIdx};

/// Position of a node inside one segment's vertex list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentTouch {
    pub segment: SegmentIdx,
    pub position: usize,
}

/// Road graph node
#[derive(Debug, Clone)]
pub struct GraphNode {
    /// Node coordinates after endpoint merging
    pub coordinate: Coordinate,
    /// Every segment vertex that was merged into this node
    pub touches: Vec<SegmentTouch>,
}

/// Directed hop between two consecutive vertices of one segment
#[derive(Debug, Clone, Copy)]
pub struct RoadEdge {
    /// Owning segment, for cost and attribute lookup
    pub segment: SegmentIdx,
    /// Vertex index the hop starts from in segment order
    pub position: usize,
    /// Great-circle length of the hop
    pub length_m: Meters,
    /// Whether the hop runs against the segment's digitised direction
    pub reversed: bool,
}
