use log::trace;
use petgraph::graph::DiGraph;
use rstar::primitives::{GeomWithData, Line};
use rstar::{AABB, RTree};

use super::components::{GraphNode, RoadEdge};
use super::index::{FloodPiece, IndexedNode};
use crate::cost::{CostModel, TravelMode};
use crate::geometry::{Coordinate, LocalProjection, haversine_m};
use crate::model::RoadSegment;
use crate::{Meters, NodeId, SegmentIdx};

/// Nodes closer than this are treated as the same place by [`RoadNetwork::node_at`]
const NODE_LOOKUP_TOLERANCE_M: Meters = 0.5;

/// Graph node a coordinate was snapped to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnappedNode {
    pub node: NodeId,
    pub coordinate: Coordinate,
    /// Great-circle distance from the requested coordinate
    pub distance_m: Meters,
}

impl SnappedNode {
    pub fn is_within(&self, radius_m: Meters) -> bool {
        self.distance_m <= radius_m
    }
}

/// Immutable routable road network
///
/// Built once from a segment set. A rebuild produces a new value; nothing
/// here is mutated after construction, so a network can be shared freely
/// between threads.
#[derive(Debug)]
pub struct RoadNetwork {
    pub(crate) graph: DiGraph<GraphNode, RoadEdge>,
    segments: Vec<RoadSegment>,
    cost_model: CostModel,
    /// Cost per metre of each segment, by travel mode
    factors: Vec<[f64; TravelMode::COUNT]>,
    speeds: Vec<[f64; TravelMode::COUNT]>,
    /// Smallest factor over all segments, by travel mode
    min_factors: [f64; TravelMode::COUNT],
    projection: LocalProjection,
    node_index: RTree<IndexedNode>,
    flood_index: RTree<FloodPiece>,
}

impl RoadNetwork {
    /// Precomputes per-segment costs and spatial indices for a built graph
    pub(crate) fn assemble(
        graph: DiGraph<GraphNode, RoadEdge>,
        segments: Vec<RoadSegment>,
        cost_model: CostModel,
    ) -> Self {
        let projection = LocalProjection::for_points(graph.node_weights().map(|n| &n.coordinate));

        let factors: Vec<[f64; TravelMode::COUNT]> = segments
            .iter()
            .map(|s| TravelMode::ALL.map(|mode| cost_model.cost_factor(s, mode)))
            .collect();
        let speeds = segments
            .iter()
            .map(|s| TravelMode::ALL.map(|mode| cost_model.speed_kmh(s, mode)))
            .collect();

        let mut min_factors = TravelMode::ALL.map(|mode| cost_model.base_mode_factor(mode));
        if !factors.is_empty() {
            min_factors = [f64::INFINITY; TravelMode::COUNT];
            for row in &factors {
                for (min, factor) in min_factors.iter_mut().zip(row) {
                    *min = min.min(*factor);
                }
            }
        }

        let node_index = RTree::bulk_load(
            graph
                .node_indices()
                .map(|idx| GeomWithData::new(projection.project(graph[idx].coordinate), idx))
                .collect(),
        );

        let flood_index = RTree::bulk_load(
            segments
                .iter()
                .enumerate()
                .filter(|(_, s)| s.flooded)
                .flat_map(|(idx, s)| {
                    s.geometry.windows(2).filter_map(move |pair| {
                        let from = projection.project(pair[0]);
                        let to = projection.project(pair[1]);
                        (pair[0].is_finite() && pair[1].is_finite())
                            .then(|| GeomWithData::new(Line::new(from, to), idx))
                    })
                })
                .collect(),
        );

        Self {
            graph,
            segments,
            cost_model,
            factors,
            speeds,
            min_factors,
            projection,
            node_index,
            flood_index,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn segments(&self) -> &[RoadSegment] {
        &self.segments
    }

    pub fn segment(&self, idx: SegmentIdx) -> Option<&RoadSegment> {
        self.segments.get(idx)
    }

    /// Looks a segment up by its dataset identifier
    pub fn segment_by_id(&self, id: &str) -> Option<(SegmentIdx, &RoadSegment)> {
        self.segments.iter().enumerate().find(|(_, s)| s.id == id)
    }

    pub fn node(&self, node: NodeId) -> Option<&GraphNode> {
        self.graph.node_weight(node)
    }

    pub fn coordinate(&self, node: NodeId) -> Option<Coordinate> {
        self.graph.node_weight(node).map(|n| n.coordinate)
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    pub fn projection(&self) -> &LocalProjection {
        &self.projection
    }

    pub(crate) fn cost_factor(&self, segment: SegmentIdx, mode: TravelMode) -> f64 {
        self.factors[segment][mode.index()]
    }

    pub(crate) fn speed_kmh(&self, segment: SegmentIdx, mode: TravelMode) -> f64 {
        self.speeds[segment][mode.index()]
    }

    pub(crate) fn min_cost_factor(&self, mode: TravelMode) -> f64 {
        self.min_factors[mode.index()]
    }

    pub fn flooded_segment_count(&self) -> usize {
        self.segments.iter().filter(|s| s.flooded).count()
    }

    /// Nearest graph node within `max_radius_m`, or `None` when nothing is
    /// that close
    pub fn nearest_node(&self, target: Coordinate, max_radius_m: Meters) -> Option<SnappedNode> {
        let snapped = self.nearest_node_unbounded(target)?;
        if snapped.is_within(max_radius_m) {
            Some(snapped)
        } else {
            trace!(
                "Nearest node to {target:?} is {:.1} m away (limit {max_radius_m} m)",
                snapped.distance_m
            );
            None
        }
    }

    /// Nearest graph node at any distance. The reported distance tells the
    /// caller whether it is usable.
    pub fn nearest_node_unbounded(&self, target: Coordinate) -> Option<SnappedNode> {
        if !target.is_valid() {
            return None;
        }
        let nearest = self
            .node_index
            .nearest_neighbor(&self.projection.project(target))?;
        let node = nearest.data;
        let coordinate = self.graph[node].coordinate;
        Some(SnappedNode {
            node,
            coordinate,
            distance_m: haversine_m(target, coordinate),
        })
    }

    /// Node sitting exactly at `coordinate`, if any
    pub fn node_at(&self, coordinate: Coordinate) -> Option<NodeId> {
        self.nearest_node(coordinate, NODE_LOOKUP_TOLERANCE_M)
            .map(|snapped| snapped.node)
    }

    /// Flooded segment pieces whose bounding boxes touch the given projected
    /// envelope
    pub(crate) fn flood_pieces_in(
        &self,
        min: [f64; 2],
        max: [f64; 2],
    ) -> impl Iterator<Item = &FloodPiece> {
        self.flood_index
            .locate_in_envelope_intersecting(&AABB::from_corners(min, max))
    }
}
