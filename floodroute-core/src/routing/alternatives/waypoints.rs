//! Candidates forced through waypoints offset sideways from the straight
//! origin-destination line

use log::debug;
use rayon::prelude::*;

use crate::Error;
use crate::cost::TravelMode;
use crate::geometry::{Coordinate, perpendicular_offset};
use crate::model::SnappedNode;
use crate::routing::planner::{Endpoint, RoutePlanner};
use crate::routing::search::{PathResult, SearchOutcome};

/// One path per offset fraction that could be routed, in fraction order.
///
/// Each path is the origin→waypoint leg stitched to the waypoint→destination
/// leg. Waypoints that do not snap, snap onto an endpoint, or cannot be
/// reached are skipped.
pub(crate) fn waypoint_paths(
    planner: &RoutePlanner<'_>,
    start: &SnappedNode,
    goal: &SnappedNode,
    origin: Coordinate,
    destination: Coordinate,
    mode: TravelMode,
) -> Result<Vec<(f64, PathResult)>, Error> {
    let config = planner.config();
    let radius = config.snapping.waypoint_radius_m;

    let paths: Vec<Option<(f64, PathResult)>> = config
        .alternatives
        .offset_fractions
        .par_iter()
        .map(|&fraction| {
            let target = perpendicular_offset(origin, destination, fraction);
            let waypoint = match planner.snap(target, Endpoint::Waypoint, radius) {
                Ok(snapped) => snapped,
                Err(failure) => {
                    debug!("Skipping offset {fraction}: {failure}");
                    return Ok(None);
                }
            };
            if waypoint.node == start.node || waypoint.node == goal.node {
                return Ok(None);
            }

            let SearchOutcome::Found(first) = planner.search(start.node, waypoint.node, mode)?
            else {
                return Ok(None);
            };
            let SearchOutcome::Found(second) = planner.search(waypoint.node, goal.node, mode)?
            else {
                return Ok(None);
            };
            let stitched = first.stitch(second, planner.network(), mode);
            Ok(Some((fraction, stitched)))
        })
        .collect::<Result<_, Error>>()?;

    Ok(paths.into_iter().flatten().collect())
}
