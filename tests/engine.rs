use std::fs;
use std::thread;

use floodroute::prelude::*;
use floodroute::{Error, NetworkHandle, RouteEngine, load_config};
use floodroute_core::routing::RouteLabel;

const DATASET: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"id": "west", "name": "River Road"},
     "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.004, 0.0]]}},
    {"type": "Feature", "properties": {"id": "ford", "flooded": "yes"},
     "geometry": {"type": "LineString", "coordinates": [[0.004, 0.0], [0.005, 0.0]]}},
    {"type": "Feature", "properties": {"id": "east"},
     "geometry": {"type": "LineString", "coordinates": [[0.005, 0.0], [0.009, 0.0]]}},
    {"type": "Feature", "properties": {"id": "hill", "highway": "residential"},
     "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.0045, 0.004], [0.009, 0.0]]}},
    {"type": "Feature", "properties": {"id": "broken"},
     "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}}
  ]
}"#;

fn c(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon)
}

fn engine_from_files() -> (tempfile::TempDir, RouteEngine, BuildReport) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("roads.geojson"), DATASET).unwrap();
    let config_path = dir.path().join("floodroute.toml");
    fs::write(
        &config_path,
        "[network]\npath = \"roads.geojson\"\n\n[alternatives]\ndefault_count = 2\n",
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    let (engine, report) = RouteEngine::from_config(config).unwrap();
    (dir, engine, report)
}

#[test]
fn loads_dataset_named_in_toml() {
    let (_dir, engine, report) = engine_from_files();
    assert_eq!(report.segments_loaded, 4);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].id, "broken");
    assert_eq!(engine.network().flooded_segment_count(), 1);
    assert_eq!(engine.config().alternatives.default_count, 2);
}

#[test]
fn computes_route_and_alternatives() {
    let (_dir, engine, _) = engine_from_files();

    let route = engine
        .compute_route(&RouteRequest::new(c(0.0, 0.0), c(0.0, 0.009)))
        .unwrap()
        .into_route()
        .unwrap();
    assert!(route.segments.iter().any(|s| s.road_name.as_deref() == Some("River Road")));

    let request = AlternativesRequest::new(c(0.0, 0.0), c(0.0, 0.009))
        .with_weather(WeatherObservation::new(12.0, 12.0));
    let AlternativesOutcome::Found(set) = engine.compute_alternatives(&request).unwrap() else {
        panic!("expected alternatives");
    };
    assert_eq!(set.routes.len(), 2);
    assert!((set.weather_impact.multiplier - 1.5).abs() < f64::EPSILON);
    assert!(set.safest().unwrap().risk.flooded_percentage.abs() < f64::EPSILON);
    let direct = set.get(RouteLabel::Direct).unwrap();
    assert!(direct.risk.flooded_percentage > 0.0);
    assert!(direct.risk.risk_level >= RiskLevel::Medium);
}

#[test]
fn cancelled_request_stops_before_searching() {
    let (_dir, engine, _) = engine_from_files();
    let request = RouteRequest::new(c(0.0, 0.0), c(0.0, 0.009));

    let cancel = CancelFlag::new();
    cancel.cancel();
    assert!(matches!(
        engine.compute_route_cancellable(&request, cancel).unwrap(),
        RouteOutcome::Unreachable(UnreachableReason::Cancelled)
    ));

    let untouched = engine
        .compute_route_cancellable(&request, CancelFlag::new())
        .unwrap()
        .into_route()
        .unwrap();
    let plain = engine.compute_route(&request).unwrap().into_route().unwrap();
    assert!((untouched.distance_m - plain.distance_m).abs() < f64::EPSILON);
}

#[test]
fn assesses_coordinates_routed_elsewhere() {
    let (_dir, engine, _) = engine_from_files();
    // Straight along River Road, through the ford
    let along = [c(0.0, 0.0), c(0.0, 0.009)];

    let dry_sky = engine.assess_coordinates(&along, None, None);
    assert!((dry_sky.flooded_percentage - 100.0 / 9.0).abs() < 1.0);
    assert!(dry_sky.points.is_none());

    let storm = WeatherObservation::new(25.0, 25.0);
    let stormy = engine.assess_coordinates(&along, None, Some(&storm));
    assert!((stormy.weather_impact.multiplier - 2.0).abs() < f64::EPSILON);
    assert!((stormy.flooded_percentage - 2.0 * dry_sky.flooded_percentage).abs() < 1e-6);
    assert!(stormy.risk_level >= dry_sky.risk_level);

    // A kilometre north of every road
    let away = [c(0.01, 0.0), c(0.01, 0.009)];
    let clean = engine.assess_coordinates(&away, None, Some(&storm));
    assert!(clean.flooded_distance_m.abs() < f64::EPSILON);
    assert_eq!(clean.risk_level, RiskLevel::Low);
}

#[test]
fn batch_matches_single_requests() {
    let (_dir, engine, _) = engine_from_files();
    let requests = vec![
        RouteRequest::new(c(0.0, 0.0), c(0.0, 0.009)),
        RouteRequest::new(c(0.0, 0.009), c(0.0, 0.0)).with_mode(TravelMode::Walking),
        RouteRequest::new(c(0.0, 0.0), c(1.0, 1.0)),
    ];
    let results = engine.compute_routes(&requests);
    assert_eq!(results.len(), 3);
    for (request, result) in requests.iter().zip(&results) {
        let single = engine.compute_route(request).unwrap();
        let batched = result.as_ref().unwrap();
        assert_eq!(
            single.route().map(|r| r.distance_m),
            batched.route().map(|r| r.distance_m)
        );
    }
    assert!(matches!(results[2], Ok(RouteOutcome::SnapFailed(_))));
}

#[test]
fn reload_swaps_network_for_new_requests_only() {
    let (_dir, engine, _) = engine_from_files();
    let before = engine.network();

    let report = engine
        .reload_from_segments(vec![RoadSegment::new(
            "only",
            vec![c(0.0, 0.0), c(0.0, 0.009)],
        )])
        .unwrap();
    assert_eq!(report.segments_loaded, 1);

    // Snapshots taken earlier keep the old graph
    assert_eq!(before.segment_count(), 4);
    assert_eq!(engine.network().segment_count(), 1);

    let route = engine
        .compute_route(&RouteRequest::new(c(0.0, 0.0), c(0.0, 0.009)))
        .unwrap()
        .into_route()
        .unwrap();
    assert_eq!(route.segments.len(), 1);

    assert!(matches!(
        engine.reload_from_segments(Vec::new()),
        Err(Error::Core(floodroute_core::Error::EmptyNetwork))
    ));
    assert_eq!(engine.network().segment_count(), 1);

    // The configured dataset is still on disk
    engine.reload().unwrap();
    assert_eq!(engine.network().segment_count(), 4);
}

#[test]
fn handle_is_shared_across_threads() {
    let network = build_network(
        vec![RoadSegment::new("a", vec![c(0.0, 0.0), c(0.0, 0.001)])],
        DEFAULT_COORDINATE_PRECISION,
        CostModel::default(),
    )
    .0;
    let handle = NetworkHandle::new(network);
    let engine = RouteEngine::with_handle(EngineConfig::default(), handle.clone()).unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    let outcome = engine
                        .compute_route(&RouteRequest::new(c(0.0, 0.0), c(0.0, 0.001)))
                        .unwrap();
                    assert!(outcome.route().is_some());
                }
            })
        })
        .collect();

    let replacement = build_network(
        vec![
            RoadSegment::new("a", vec![c(0.0, 0.0), c(0.0, 0.001)]),
            RoadSegment::new("b", vec![c(0.0, 0.001), c(0.0, 0.002)]),
        ],
        DEFAULT_COORDINATE_PRECISION,
        CostModel::default(),
    )
    .0;
    let previous = handle.replace(replacement);
    assert_eq!(previous.segment_count(), 1);

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(engine.network().segment_count(), 2);
}
