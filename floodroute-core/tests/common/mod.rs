#![allow(dead_code)]

use floodroute_core::cost::CostModel;
use floodroute_core::geometry::Coordinate;
use floodroute_core::loading::build_network;
use floodroute_core::model::{RoadNetwork, RoadSegment};

/// Grid spacing in degrees (~111 m at the equator)
pub const STEP: f64 = 0.001;

pub fn c(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon)
}

pub fn grid_coordinate(row: usize, col: usize) -> Coordinate {
    c(row as f64 * STEP, col as f64 * STEP)
}

/// Segments of a `size` × `size` street grid. `flooded` and `oneway` decide
/// per segment id (`h{row}_{col}` / `v{row}_{col}`).
pub fn grid_segments(
    size: usize,
    flooded: impl Fn(&str) -> bool,
    oneway: impl Fn(&str) -> bool,
) -> Vec<RoadSegment> {
    let mut segments = Vec::new();
    for row in 0..size {
        for col in 0..size {
            let from = grid_coordinate(row, col);
            if col + 1 < size {
                let id = format!("h{row}_{col}");
                segments.push(
                    RoadSegment::new(&id, vec![from, grid_coordinate(row, col + 1)])
                        .with_flooded(flooded(&id))
                        .with_oneway(oneway(&id)),
                );
            }
            if row + 1 < size {
                let id = format!("v{row}_{col}");
                segments.push(
                    RoadSegment::new(&id, vec![from, grid_coordinate(row + 1, col)])
                        .with_flooded(flooded(&id))
                        .with_oneway(oneway(&id)),
                );
            }
        }
    }
    segments
}

pub fn grid(size: usize) -> RoadNetwork {
    build_network(grid_segments(size, |_| false, |_| false), 6, CostModel::default()).0
}

pub fn network(segments: Vec<RoadSegment>) -> RoadNetwork {
    build_network(segments, 6, CostModel::default()).0
}
