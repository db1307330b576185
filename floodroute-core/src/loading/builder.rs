use std::path::Path;

use hashbrown::HashMap;
use log::{debug, info, warn};
use petgraph::graph::DiGraph;

use super::config::{DatasetFormat, EngineConfig};
use super::{csv, geojson};
use crate::cost::CostModel;
use crate::geometry::{Coordinate, haversine_m};
use crate::model::{GraphNode, RoadEdge, RoadNetwork, RoadSegment, SegmentTouch};
use crate::{Error, NodeId};

/// Why a segment was left out of the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    TooFewVertices,
    InvalidCoordinate,
    /// All vertices collapse onto one node after endpoint merging
    Degenerate,
    UnsupportedGeometry(String),
    InvalidAttributes(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSegment {
    pub id: String,
    pub reason: SkipReason,
}

/// Summary of a network build
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub segments_loaded: usize,
    pub nodes: usize,
    pub edges: usize,
    pub skipped: Vec<SkippedSegment>,
}

impl BuildReport {
    pub(crate) fn skip(&mut self, id: impl Into<String>, reason: SkipReason) {
        let id = id.into();
        warn!("Skipping road segment {id}: {reason:?}");
        self.skipped.push(SkippedSegment { id, reason });
    }
}

/// Node merge key: coordinates rounded to a fixed number of decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CoordKey(i64, i64);

impl CoordKey {
    #[allow(clippy::cast_possible_truncation)]
    fn new(c: Coordinate, scale: f64) -> Self {
        CoordKey((c.lat * scale).round() as i64, (c.lon * scale).round() as i64)
    }
}

/// Builds a routable network from road segments.
///
/// Malformed segments are skipped and reported, never fatal. Building is
/// linear in the total number of vertices.
pub fn build_network(
    segments: impl IntoIterator<Item = RoadSegment>,
    precision: u32,
    cost_model: CostModel,
) -> (RoadNetwork, BuildReport) {
    let mut report = BuildReport::default();
    let scale = 10f64.powi(i32::try_from(precision).unwrap_or(6));

    let mut graph: DiGraph<GraphNode, RoadEdge> = DiGraph::new();
    let mut nodes_by_key: HashMap<CoordKey, NodeId> = HashMap::new();
    let mut kept: Vec<RoadSegment> = Vec::new();

    for segment in segments {
        if segment.geometry.len() < 2 {
            report.skip(&segment.id, SkipReason::TooFewVertices);
            continue;
        }
        if segment.geometry.iter().any(|c| !c.is_valid()) {
            report.skip(&segment.id, SkipReason::InvalidCoordinate);
            continue;
        }

        let keys: Vec<CoordKey> = segment
            .geometry
            .iter()
            .map(|c| CoordKey::new(*c, scale))
            .collect();
        if keys.iter().all(|k| *k == keys[0]) {
            report.skip(&segment.id, SkipReason::Degenerate);
            continue;
        }

        let segment_idx = kept.len();
        let mut previous: Option<(NodeId, usize)> = None;

        for (position, (key, coordinate)) in keys.iter().zip(&segment.geometry).enumerate() {
            let node = *nodes_by_key.entry(*key).or_insert_with(|| {
                graph.add_node(GraphNode {
                    coordinate: *coordinate,
                    touches: Vec::new(),
                })
            });
            graph[node].touches.push(SegmentTouch {
                segment: segment_idx,
                position,
            });

            if let Some((prev_node, prev_position)) = previous {
                if prev_node == node {
                    // Consecutive duplicate vertex, nothing to connect
                    continue;
                }
                let length_m = haversine_m(graph[prev_node].coordinate, graph[node].coordinate);
                graph.add_edge(
                    prev_node,
                    node,
                    RoadEdge {
                        segment: segment_idx,
                        position: prev_position,
                        length_m,
                        reversed: false,
                    },
                );
                if !segment.oneway {
                    graph.add_edge(
                        node,
                        prev_node,
                        RoadEdge {
                            segment: segment_idx,
                            position: prev_position,
                            length_m,
                            reversed: true,
                        },
                    );
                }
            }
            previous = Some((node, position));
        }

        kept.push(segment);
    }

    report.segments_loaded = kept.len();
    report.nodes = graph.node_count();
    report.edges = graph.edge_count();
    info!(
        "Built road graph: {} segments, {} nodes, {} edges ({} segments skipped)",
        report.segments_loaded,
        report.nodes,
        report.edges,
        report.skipped.len()
    );

    (RoadNetwork::assemble(graph, kept, cost_model), report)
}

/// Reads road segments from a dataset file
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a dataset of the
/// given format at all
pub fn read_segments(
    path: &Path,
    format: DatasetFormat,
) -> Result<(Vec<RoadSegment>, Vec<SkippedSegment>), Error> {
    match format {
        DatasetFormat::GeoJson => geojson::read_geojson_segments(path),
        DatasetFormat::Csv => csv::read_csv_segments(path),
    }
}

/// Loads the dataset named in the configuration and builds the network
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the dataset cannot be
/// parsed, or it holds no routable segment
pub fn load_network(config: &EngineConfig) -> Result<(RoadNetwork, BuildReport), Error> {
    config.validate()?;

    let path = config
        .network
        .path
        .as_deref()
        .ok_or_else(|| Error::InvalidConfig("network.path is not set".to_string()))?;
    if !path.exists() {
        return Err(Error::InvalidData(format!(
            "Road dataset not found: {}",
            path.display()
        )));
    }
    let format = config.network.resolved_format(path)?;

    info!("Loading road dataset ({format:?}): {}", path.display());
    let (segments, parse_skipped) = read_segments(path, format)?;

    let (network, mut report) = build_network(
        segments,
        config.network.coordinate_precision,
        config.cost.clone(),
    );
    let mut skipped = parse_skipped;
    skipped.append(&mut report.skipped);
    report.skipped = skipped;

    if network.is_empty() {
        return Err(Error::EmptyNetwork);
    }

    // Parsing allocates heavily and glibc keeps freed pages around; give
    // them back once the network is built.
    //
    // # Safety
    //
    // Safe on linux with the glibc allocator, which the cfg attribute checks
    // at compile time.
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    unsafe {
        if libc::malloc_trim(0) == 0 {
            debug!("No heap memory released after network build");
        } else {
            debug!("Trimmed unused heap memory after network build");
        }
    }

    Ok((network, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon)
    }

    #[test]
    fn shared_endpoints_become_one_node() {
        let segments = vec![
            RoadSegment::new("a", vec![c(0.0, 0.0), c(0.0, 0.001)]),
            // Digitised independently, 3e-8 degrees off
            RoadSegment::new("b", vec![c(0.000_000_03, 0.001), c(0.0, 0.002)]),
        ];
        let (network, report) = build_network(segments, 6, CostModel::default());
        assert_eq!(network.node_count(), 3);
        assert_eq!(network.edge_count(), 4);
        assert!(report.skipped.is_empty());

        let shared = network.node_at(c(0.0, 0.001)).unwrap();
        assert_eq!(network.node(shared).unwrap().touches.len(), 2);
    }

    #[test]
    fn oneway_emits_forward_edges_only() {
        let segments = vec![
            RoadSegment::new("a", vec![c(0.0, 0.0), c(0.0, 0.001), c(0.0, 0.002)])
                .with_oneway(true),
        ];
        let (network, _) = build_network(segments, 6, CostModel::default());
        assert_eq!(network.node_count(), 3);
        assert_eq!(network.edge_count(), 2);
        assert!(network.graph.edge_weights().all(|e| !e.reversed));
    }

    #[test]
    fn malformed_segments_are_skipped_not_fatal() {
        let segments = vec![
            RoadSegment::new("short", vec![c(0.0, 0.0)]),
            RoadSegment::new("nan", vec![c(f64::NAN, 0.0), c(0.0, 0.001)]),
            RoadSegment::new("dot", vec![c(0.0, 0.0), c(0.000_000_1, 0.0)]),
            RoadSegment::new("ok", vec![c(0.0, 0.0), c(0.0, 0.001)]),
        ];
        let (network, report) = build_network(segments, 6, CostModel::default());
        assert_eq!(network.segment_count(), 1);
        assert_eq!(network.segments()[0].id, "ok");
        let reasons: Vec<_> = report.skipped.iter().map(|s| s.reason.clone()).collect();
        assert_eq!(
            reasons,
            vec![
                SkipReason::TooFewVertices,
                SkipReason::InvalidCoordinate,
                SkipReason::Degenerate
            ]
        );
    }

    #[test]
    fn repeated_vertices_do_not_create_self_loops() {
        let segments = vec![RoadSegment::new(
            "a",
            vec![c(0.0, 0.0), c(0.0, 0.0), c(0.0, 0.001)],
        )];
        let (network, _) = build_network(segments, 6, CostModel::default());
        assert_eq!(network.edge_count(), 2);
        assert!(network
            .graph
            .edge_indices()
            .all(|e| {
                let (a, b) = network.graph.edge_endpoints(e).unwrap();
                a != b
            }));
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let segments = vec![
            RoadSegment::new("a", vec![c(0.0, 0.0), c(0.0, 0.001)]),
            RoadSegment::new("b", vec![c(0.0, 0.001), c(0.001, 0.001)]),
        ];
        let (first, _) = build_network(segments.clone(), 6, CostModel::default());
        let (second, _) = build_network(segments, 6, CostModel::default());
        assert_eq!(first.node_count(), second.node_count());
        assert_eq!(first.edge_count(), second.edge_count());
        for node in first.graph.node_indices() {
            assert_eq!(first.coordinate(node), second.coordinate(node));
        }
    }
}
