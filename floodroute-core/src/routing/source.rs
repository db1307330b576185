//! Graph views the path search runs on

use fixedbitset::FixedBitSet;
use hashbrown::HashSet;
use petgraph::graph::EdgeIndex;
use petgraph::visit::EdgeRef;

use crate::cost::TravelMode;
use crate::geometry::Coordinate;
use crate::{Meters, NodeId, RoadNetwork, SegmentIdx};

/// One directed edge as seen by the search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hop {
    pub source: NodeId,
    pub target: NodeId,
    pub edge: EdgeIndex,
    pub segment: SegmentIdx,
    pub length_m: Meters,
}

/// Anything the best-first search can expand.
///
/// Implementors must report hop lengths no shorter than the great-circle
/// distance between the hop's endpoints, and cost factors no lower than
/// [`GraphSource::min_cost_factor`], otherwise A* loses optimality.
pub trait GraphSource {
    /// Upper bound on node indices, for dense per-node arrays
    fn node_bound(&self) -> usize;

    fn coordinate(&self, node: NodeId) -> Option<Coordinate>;

    /// Outgoing hops of `node`
    fn hops(&self, node: NodeId) -> impl Iterator<Item = Hop> + '_;

    /// Cost per metre of a segment
    fn cost_factor(&self, segment: SegmentIdx, mode: TravelMode) -> f64;

    /// Lower bound of [`GraphSource::cost_factor`] over the whole graph
    fn min_cost_factor(&self, mode: TravelMode) -> f64;

    fn hop_cost(&self, hop: &Hop, mode: TravelMode) -> f64 {
        hop.length_m * self.cost_factor(hop.segment, mode)
    }
}

impl GraphSource for RoadNetwork {
    fn node_bound(&self) -> usize {
        self.graph.node_count()
    }

    fn coordinate(&self, node: NodeId) -> Option<Coordinate> {
        RoadNetwork::coordinate(self, node)
    }

    fn hops(&self, node: NodeId) -> impl Iterator<Item = Hop> + '_ {
        self.graph.edges(node).map(|edge| Hop {
            source: edge.source(),
            target: edge.target(),
            edge: edge.id(),
            segment: edge.weight().segment,
            length_m: edge.weight().length_m,
        })
    }

    fn cost_factor(&self, segment: SegmentIdx, mode: TravelMode) -> f64 {
        RoadNetwork::cost_factor(self, segment, mode)
    }

    fn min_cost_factor(&self, mode: TravelMode) -> f64 {
        RoadNetwork::min_cost_factor(self, mode)
    }
}

/// A graph with some nodes and edges removed, without copying it.
///
/// Used by the k shortest paths search to block the prefix and the edges
/// of already found paths.
#[derive(Debug)]
pub struct RestrictedSource<'a, G> {
    inner: &'a G,
    banned_nodes: FixedBitSet,
    banned_edges: HashSet<EdgeIndex>,
}

impl<'a, G: GraphSource> RestrictedSource<'a, G> {
    pub fn new(inner: &'a G) -> Self {
        Self {
            inner,
            banned_nodes: FixedBitSet::with_capacity(inner.node_bound()),
            banned_edges: HashSet::new(),
        }
    }

    pub fn ban_node(&mut self, node: NodeId) {
        if node.index() < self.banned_nodes.len() {
            self.banned_nodes.insert(node.index());
        }
    }

    pub fn ban_edge(&mut self, edge: EdgeIndex) {
        self.banned_edges.insert(edge);
    }

    pub fn is_banned(&self, node: NodeId) -> bool {
        self.banned_nodes.contains(node.index())
    }
}

impl<G: GraphSource> GraphSource for RestrictedSource<'_, G> {
    fn node_bound(&self) -> usize {
        self.inner.node_bound()
    }

    fn coordinate(&self, node: NodeId) -> Option<Coordinate> {
        self.inner.coordinate(node)
    }

    fn hops(&self, node: NodeId) -> impl Iterator<Item = Hop> + '_ {
        let blocked = self.is_banned(node);
        self.inner
            .hops(node)
            .filter(move |hop| {
                !blocked && !self.is_banned(hop.target) && !self.banned_edges.contains(&hop.edge)
            })
    }

    fn cost_factor(&self, segment: SegmentIdx, mode: TravelMode) -> f64 {
        self.inner.cost_factor(segment, mode)
    }

    fn min_cost_factor(&self, mode: TravelMode) -> f64 {
        self.inner.min_cost_factor(mode)
    }
}
