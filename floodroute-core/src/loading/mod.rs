//! This module is responsible for reading road datasets (GeoJSON, CSV/WKT)
//! and building the routable road network.

mod builder;
mod config;
pub mod csv;
pub mod de;
pub mod geojson;

pub use builder::{
    BuildReport, SkipReason, SkippedSegment, build_network, load_network, read_segments,
};
pub use config::{
    AlternativesConfig, DatasetFormat, EngineConfig, NetworkConfig, SearchConfig, SnapConfig,
};
