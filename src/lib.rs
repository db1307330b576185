//! Flood-aware route planning engine.
//!
//! Wraps [`floodroute_core`] with a swappable network handle, TOML
//! configuration and the two request entry points, [`RouteEngine::compute_route`]
//! and [`RouteEngine::compute_alternatives`].

pub mod config;
pub mod engine;
pub mod error;
pub mod handle;

pub use config::{load_config, parse_config};
pub use engine::RouteEngine;
pub use error::Error;
pub use handle::NetworkHandle;

pub use floodroute_core::prelude;
