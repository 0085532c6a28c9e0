use cell_core::{CellRole, NodeId};
use cell_entities::{CellEntityTrait, MessageQueue, NodeStats};
use cell_pdus::{L3Message, decode};
use cell_saps::{SapMsg, SapMsgInner};

/// A network node sink for testing purposes
/// Collects all received SapMsg messages for later inspection
pub struct Sink {
    node: NodeId,
    role: CellRole,
    msgqueue: Vec<SapMsg>,
    stats: NodeStats,
}

impl Sink {
    pub fn new(node: NodeId, role: CellRole) -> Self {
        Self {
            node,
            role,
            msgqueue: vec![],
            stats: NodeStats::new(),
        }
    }

    pub fn take_msgqueue(&mut self) -> Vec<SapMsg> {
        std::mem::take(&mut self.msgqueue)
    }
}

impl CellEntityTrait for Sink {
    fn node(&self) -> NodeId {
        self.node
    }

    fn role(&self) -> CellRole {
        self.role
    }

    fn rx_prim(&mut self, _queue: &mut MessageQueue, message: SapMsg) {
        tracing::debug!("rx_prim: {:?}", message);
        self.msgqueue.push(message);
    }

    fn stats(&self) -> &NodeStats {
        &self.stats
    }
}

/// Decodes every transport message in `msgs` that is an M
pub fn decode_all<M: L3Message>(msgs: &[SapMsg]) -> Vec<M> {
    msgs.iter()
        .filter_map(|m| match &m.msg {
            SapMsgInner::TransportUnitdataInd(prim) => decode::<M>(&prim.bytes).ok().map(|(_, pdu)| pdu),
            _ => None,
        })
        .collect()
}
