//! Best-first shortest path search (Dijkstra / A*)

mod state;

use std::collections::BinaryHeap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::{Duration, Instant};

use log::{debug, trace};
use serde::Serialize;

use self::state::State;
use super::source::{GraphSource, Hop};
use crate::cost::TravelMode;
use crate::geometry::haversine_m;
use crate::{Error, NodeId};

/// Deadline and cancellation are polled once per this many expansions
const LIMIT_CHECK_INTERVAL: usize = 256;

/// Shared flag that stops running searches
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, AtomicOrdering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::Relaxed)
    }
}

/// Resource limits of a single search
#[derive(Debug, Clone, Default)]
pub struct SearchLimits {
    pub max_expansions: Option<usize>,
    pub deadline: Option<Instant>,
    pub cancel: Option<CancelFlag>,
}

impl SearchLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = Some(max_expansions);
        self
    }

    #[must_use]
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.deadline = Instant::now().checked_add(budget);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn interrupted(&self) -> Option<UnreachableReason> {
        if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
            return Some(UnreachableReason::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(UnreachableReason::DeadlineExceeded);
        }
        None
    }
}

/// Why no path was returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnreachableReason {
    /// Every reachable node was expanded without meeting the goal
    FrontierExhausted,
    ExpansionBudget,
    DeadlineExceeded,
    Cancelled,
}

impl fmt::Display for UnreachableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnreachableReason::FrontierExhausted => "destination is not reachable from the origin",
            UnreachableReason::ExpansionBudget => "search expansion budget exhausted",
            UnreachableReason::DeadlineExceeded => "search time budget exceeded",
            UnreachableReason::Cancelled => "search cancelled",
        };
        f.write_str(text)
    }
}

/// Node and hop sequence of a found path
#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    /// Visited nodes, start and goal included
    pub nodes: Vec<NodeId>,
    /// `nodes.len() - 1` hops joining consecutive nodes
    pub hops: Vec<Hop>,
    pub cost: f64,
    pub expansions: usize,
}

impl PathResult {
    pub fn trivial(node: NodeId) -> Self {
        Self {
            nodes: vec![node],
            hops: Vec::new(),
            cost: 0.0,
            expansions: 0,
        }
    }

    pub fn start(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn goal(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    pub fn length_m(&self) -> f64 {
        self.hops.iter().map(|h| h.length_m).sum()
    }

    /// Rebuilds a path from a hop sequence
    pub fn from_hops<G: GraphSource>(
        graph: &G,
        start: NodeId,
        hops: Vec<Hop>,
        mode: TravelMode,
    ) -> Self {
        let mut nodes = Vec::with_capacity(hops.len() + 1);
        nodes.push(start);
        nodes.extend(hops.iter().map(|h| h.target));
        let cost = hops.iter().map(|h| graph.hop_cost(h, mode)).sum();
        Self {
            nodes,
            hops,
            cost,
            expansions: 0,
        }
    }

    /// Joins `self` (ending at a waypoint) with `next` (starting there).
    ///
    /// The waypoint appears once in the result. When the two legs double
    /// back over the same node around the waypoint, the out-and-back spur
    /// is cut off.
    pub fn stitch<G: GraphSource>(mut self, next: PathResult, graph: &G, mode: TravelMode) -> Self {
        let start = self.start().or(next.start());
        let expansions = self.expansions + next.expansions;
        let mut next_hops = next.hops;
        let mut skip = 0;
        while let (Some(last), Some(first)) =
            (self.hops.last().copied(), next_hops.get(skip).copied())
        {
            if last.source != first.target {
                break;
            }
            self.hops.pop();
            skip += 1;
        }
        let mut hops = self.hops;
        hops.extend(next_hops.drain(skip..));
        let mut joined = match start {
            Some(start) => PathResult::from_hops(graph, start, hops, mode),
            None => PathResult {
                nodes: Vec::new(),
                hops,
                cost: 0.0,
                expansions: 0,
            },
        };
        joined.expansions = expansions;
        joined
    }
}

/// Result of a search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(PathResult),
    Unreachable(UnreachableReason),
}

impl SearchOutcome {
    pub fn found(self) -> Option<PathResult> {
        match self {
            SearchOutcome::Found(path) => Some(path),
            SearchOutcome::Unreachable(_) => None,
        }
    }
}

/// Plain Dijkstra, no heuristic
pub fn dijkstra<G: GraphSource>(
    graph: &G,
    start: NodeId,
    goal: NodeId,
    mode: TravelMode,
    limits: &SearchLimits,
) -> Result<SearchOutcome, Error> {
    shortest_path(graph, start, goal, mode, false, limits)
}

/// A* guided by the straight-line distance times the graph's cheapest cost
/// factor
pub fn astar<G: GraphSource>(
    graph: &G,
    start: NodeId,
    goal: NodeId,
    mode: TravelMode,
    limits: &SearchLimits,
) -> Result<SearchOutcome, Error> {
    shortest_path(graph, start, goal, mode, true, limits)
}

/// Cheapest path from `start` to `goal` for the given travel mode.
///
/// Ties between equal estimates are broken by push order, so repeated
/// searches over the same graph return the same path.
///
/// # Errors
///
/// Returns [`Error::InvalidNodeIndex`] if either node is not in the graph
pub fn shortest_path<G: GraphSource>(
    graph: &G,
    start: NodeId,
    goal: NodeId,
    mode: TravelMode,
    use_heuristic: bool,
    limits: &SearchLimits,
) -> Result<SearchOutcome, Error> {
    let bound = graph.node_bound();
    if start.index() >= bound || goal.index() >= bound {
        return Err(Error::InvalidNodeIndex);
    }
    if start == goal {
        return Ok(SearchOutcome::Found(PathResult::trivial(start)));
    }

    let goal_coordinate = graph.coordinate(goal).ok_or(Error::InvalidNodeIndex)?;
    let min_factor = graph.min_cost_factor(mode);
    let heuristic = |node: NodeId| -> f64 {
        if !use_heuristic {
            return 0.0;
        }
        graph
            .coordinate(node)
            .map_or(0.0, |c| haversine_m(c, goal_coordinate) * min_factor)
    };

    let mut best = vec![f64::INFINITY; bound];
    let mut parent: Vec<Option<Hop>> = vec![None; bound];
    let mut heap = BinaryHeap::new();
    let mut seq: u64 = 0;
    let mut expansions: usize = 0;

    best[start.index()] = 0.0;
    heap.push(State {
        estimate: heuristic(start),
        cost: 0.0,
        seq,
        node: start,
    });

    while let Some(State { cost, node, .. }) = heap.pop() {
        // Skip if we've found a better path
        if cost > best[node.index()] {
            continue;
        }

        if node == goal {
            let path = reconstruct(&parent, start, goal, cost, expansions);
            debug!(
                "Path found: {} hops, cost {:.1}, {} expansions",
                path.hops.len(),
                path.cost,
                expansions
            );
            return Ok(SearchOutcome::Found(path));
        }

        if expansions % LIMIT_CHECK_INTERVAL == 0 {
            if let Some(reason) = limits.interrupted() {
                debug!("Search stopped after {expansions} expansions: {reason}");
                return Ok(SearchOutcome::Unreachable(reason));
            }
        }
        if limits.max_expansions.is_some_and(|max| expansions >= max) {
            debug!("Search hit the expansion budget of {expansions}");
            return Ok(SearchOutcome::Unreachable(
                UnreachableReason::ExpansionBudget,
            ));
        }
        expansions += 1;

        for hop in graph.hops(node) {
            let next = hop.target;
            let next_cost = cost + graph.hop_cost(&hop, mode);
            if next_cost < best[next.index()] {
                best[next.index()] = next_cost;
                parent[next.index()] = Some(hop);
                seq += 1;
                heap.push(State {
                    estimate: next_cost + heuristic(next),
                    cost: next_cost,
                    seq,
                    node: next,
                });
            }
        }
    }

    trace!("Frontier exhausted after {expansions} expansions");
    Ok(SearchOutcome::Unreachable(
        UnreachableReason::FrontierExhausted,
    ))
}

fn reconstruct(
    parent: &[Option<Hop>],
    start: NodeId,
    goal: NodeId,
    cost: f64,
    expansions: usize,
) -> PathResult {
    let mut hops = Vec::new();
    let mut current = goal;
    while current != start {
        let Some(hop) = parent[current.index()] else {
            break;
        };
        hops.push(hop);
        current = hop.source;
    }
    hops.reverse();

    let mut nodes = Vec::with_capacity(hops.len() + 1);
    nodes.push(start);
    nodes.extend(hops.iter().map(|h| h.target));
    PathResult {
        nodes,
        hops,
        cost,
        expansions,
    }
}
