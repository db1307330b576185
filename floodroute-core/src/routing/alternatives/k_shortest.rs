//! Yen's k shortest loopless paths

use log::debug;

use crate::Error;
use crate::cost::TravelMode;
use crate::routing::search::{
    PathResult, SearchLimits, SearchOutcome, UnreachableReason, shortest_path,
};
use crate::routing::source::{GraphSource, Hop, RestrictedSource};

fn same_edges(a: &[Hop], b: &[Hop]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.edge == y.edge)
}

/// Up to `k` loopless paths in ascending cost order, starting from the
/// already known cheapest path `first`.
///
/// Stops early when the graph has no further loopless path or a search is
/// cancelled or runs out of time; the paths found so far are returned.
///
/// # Errors
///
/// Returns an error if the path refers to nodes outside the graph
pub fn k_shortest_paths<G: GraphSource>(
    graph: &G,
    first: PathResult,
    k: usize,
    mode: TravelMode,
    use_heuristic: bool,
    limits: &SearchLimits,
) -> Result<Vec<PathResult>, Error> {
    let (Some(start), Some(goal)) = (first.start(), first.goal()) else {
        return Ok(Vec::new());
    };
    let mut found = vec![first];
    if start == goal {
        return Ok(found);
    }
    let mut pending: Vec<PathResult> = Vec::new();

    while found.len() < k {
        let Some(previous) = found.last() else {
            break;
        };
        let previous = previous.clone();

        for spur_idx in 0..previous.hops.len() {
            let spur_node = previous.nodes[spur_idx];
            let root = &previous.hops[..spur_idx];

            let mut restricted = RestrictedSource::new(graph);
            for path in &found {
                if path.hops.len() > spur_idx && same_edges(&path.hops[..spur_idx], root) {
                    restricted.ban_edge(path.hops[spur_idx].edge);
                }
            }
            for node in &previous.nodes[..spur_idx] {
                restricted.ban_node(*node);
            }

            let spur = match shortest_path(&restricted, spur_node, goal, mode, use_heuristic, limits)?
            {
                SearchOutcome::Found(spur) => spur,
                SearchOutcome::Unreachable(
                    reason @ (UnreachableReason::Cancelled | UnreachableReason::DeadlineExceeded),
                ) => {
                    debug!("k shortest paths stopped early: {reason}");
                    return Ok(found);
                }
                SearchOutcome::Unreachable(_) => continue,
            };

            let mut hops = root.to_vec();
            hops.extend(spur.hops);
            let candidate = PathResult::from_hops(graph, start, hops, mode);
            let known = found
                .iter()
                .chain(&pending)
                .any(|p| same_edges(&p.hops, &candidate.hops));
            if !known {
                pending.push(candidate);
            }
        }

        // Cheapest pending path, earliest on ties
        let Some(best) = pending
            .iter()
            .enumerate()
            .min_by(|(ia, a), (ib, b)| a.cost.total_cmp(&b.cost).then(ia.cmp(ib)))
            .map(|(idx, _)| idx)
        else {
            break;
        };
        found.push(pending.remove(best));
    }

    Ok(found)
}
