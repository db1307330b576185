//! R-tree entries, all in the network's local metre projection

use rstar::primitives::{GeomWithData, Line};

use crate::{NodeId, SegmentIdx};

/// Graph node position for snapping queries
pub(crate) type IndexedNode = GeomWithData<[f64; 2], NodeId>;

/// One vertex pair of a flooded segment, for corridor intersection
pub(crate) type FloodPiece = GeomWithData<Line<[f64; 2]>, SegmentIdx>;
