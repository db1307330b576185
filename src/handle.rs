use std::sync::Arc;

use floodroute_core::RoadNetwork;
use log::info;
use parking_lot::RwLock;

/// Shared, atomically replaceable road network.
///
/// Requests take a snapshot and keep using it even if a reload publishes a
/// newer network meanwhile.
#[derive(Debug, Clone)]
pub struct NetworkHandle {
    current: Arc<RwLock<Arc<RoadNetwork>>>,
}

impl NetworkHandle {
    pub fn new(network: RoadNetwork) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(network))),
        }
    }

    /// The network currently published
    pub fn snapshot(&self) -> Arc<RoadNetwork> {
        Arc::clone(&self.current.read())
    }

    /// Publishes a fully built network and returns the previous one
    pub fn replace(&self, network: RoadNetwork) -> Arc<RoadNetwork> {
        let (segments, nodes) = (network.segment_count(), network.node_count());
        let previous = std::mem::replace(&mut *self.current.write(), Arc::new(network));
        info!("Published road network: {segments} segments, {nodes} nodes");
        previous
    }
}
