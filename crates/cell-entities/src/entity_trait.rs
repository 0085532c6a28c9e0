use as_any::AsAny;
use cell_core::{CellRole, NodeId, PoolCounts};
use cell_saps::SapMsg;

use crate::MessageQueue;
use crate::stats::NodeStats;

/// Trait for the nodes of the network (MS, BS, SC, Gateway, HLR)
/// Used by MessageRouter for passing events to the role state machines
pub trait CellEntityTrait: Send + AsAny {
    /// Address of this node
    fn node(&self) -> NodeId;

    fn role(&self) -> CellRole;

    /// Handle one event. Processes at most one state transition; follow-up work
    /// is queued as internal primitives on `queue`.
    fn rx_prim(&mut self, queue: &mut MessageQueue, message: SapMsg);

    fn stats(&self) -> &NodeStats;

    /// Occupancy of the node's resource pool, if it has one
    fn pool_counts(&self) -> Option<PoolCounts> {
        None
    }
}
