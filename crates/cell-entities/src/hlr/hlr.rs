use std::collections::HashMap;

use cell_config::CfgHlr;
use cell_core::{CellRole, Imsi, NodeId, SimTime, unimplemented_log};
use cell_pdus::map::enums::map_msg_type::MapMsgType;
use cell_pdus::map::pdus::cancel_location::{CancelLocation, PurgeMs};
use cell_pdus::map::pdus::update_location::{UpdateLocation, UpdateLocationAck};
use cell_pdus::{ProtocolDiscriminator, TiField, peek};
use cell_saps::{SapMsg, SapMsgInner};

use crate::codec;
use crate::stats::{Counter, NodeStats};
use crate::{CellEntityTrait, MessageQueue};

/// Which SC currently serves a subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlrRecord {
    pub sc: NodeId,
    pub updated: SimTime,
}

/// Home location register
pub struct Hlr {
    node: NodeId,
    records: HashMap<Imsi, HlrRecord>,
    stats: NodeStats,
}

impl Hlr {
    pub fn new(cfg: &CfgHlr) -> Self {
        Self {
            node: cfg.node,
            records: HashMap::new(),
            stats: NodeStats::new(),
        }
    }

    pub fn record(&self, imsi: Imsi) -> Option<&HlrRecord> {
        self.records.get(&imsi)
    }

    pub fn num_records(&self) -> usize {
        self.records.len()
    }

    fn rx_update_location(&mut self, queue: &mut MessageQueue, src: NodeId, pdu: UpdateLocation) {
        let record = HlrRecord {
            sc: pdu.sc,
            updated: queue.now(),
        };
        if let Some(old) = self.records.insert(pdu.imsi, record) {
            if old.sc != pdu.sc {
                tracing::info!("imsi {} moved from sc {} to sc {}", pdu.imsi, old.sc, pdu.sc);
                queue.send_pdu(old.sc, TiField::NONE, &CancelLocation { imsi: pdu.imsi });
            }
        } else {
            tracing::info!("imsi {} registered at sc {}", pdu.imsi, pdu.sc);
        }
        self.stats.inc(Counter::HlrUpdates);
        queue.send_pdu(src, TiField::NONE, &UpdateLocationAck { imsi: pdu.imsi });
    }

    fn rx_purge(&mut self, pdu: PurgeMs) {
        match self.records.get(&pdu.imsi) {
            Some(rec) if rec.sc == pdu.sc => {
                tracing::info!("imsi {} purged by sc {}", pdu.imsi, pdu.sc);
                self.records.remove(&pdu.imsi);
            }
            // Already registered elsewhere
            Some(_) => tracing::debug!("stale purge of imsi {} from sc {}", pdu.imsi, pdu.sc),
            None => tracing::debug!("purge of unknown imsi {}", pdu.imsi),
        }
    }

    fn rx_transport(&mut self, queue: &mut MessageQueue, src: NodeId, bytes: Vec<u8>) {
        let (header, msg_type) = match peek(&bytes) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!("Failed parsing header from {}: {:?}", src, e);
                self.stats.inc(Counter::DroppedMessages);
                return;
            }
        };
        if header.pd != ProtocolDiscriminator::Map {
            tracing::warn!("unexpected {} message from {}", header.pd, src);
            self.stats.inc(Counter::DroppedMessages);
            return;
        }
        match MapMsgType::try_from(msg_type) {
            Ok(MapMsgType::UpdateLocation) => {
                if let Some((_, pdu)) = codec::parse::<UpdateLocation>(&bytes) {
                    self.rx_update_location(queue, src, pdu);
                }
            }
            Ok(MapMsgType::PurgeMs) => {
                if let Some((_, pdu)) = codec::parse::<PurgeMs>(&bytes) {
                    self.rx_purge(pdu);
                }
            }
            _ => {
                tracing::warn!("unexpected MAP message type {:#04x} from {}", msg_type, src);
                self.stats.inc(Counter::DroppedMessages);
            }
        }
    }
}

impl CellEntityTrait for Hlr {
    fn node(&self) -> NodeId {
        self.node
    }

    fn role(&self) -> CellRole {
        CellRole::Hlr
    }

    fn rx_prim(&mut self, queue: &mut MessageQueue, message: SapMsg) {
        tracing::trace!("rx_prim: {:?} {} from {}", message.get_sap(), message.kind(), message.get_source());
        let src = message.get_source();
        match message.msg {
            SapMsgInner::TransportUnitdataInd(prim) => self.rx_transport(queue, src, prim.bytes),
            other => unimplemented_log!("primitive {:?}", other),
        }
    }

    fn stats(&self) -> &NodeStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use cell_core::{Sap, debug};
    use cell_pdus::{L3Message, decode, encode};
    use cell_saps::transport::TransportUnitdataInd;

    use super::*;

    const HLR: NodeId = 1;
    const SC_1: NodeId = 3;
    const SC_2: NodeId = 4;
    const IMSI: Imsi = 262_01_0000001001;

    fn deliver<M: L3Message>(hlr: &mut Hlr, src: NodeId, pdu: &M) -> Vec<(NodeId, Vec<u8>)> {
        let mut queue = MessageQueue::new(HLR, SimTime(1000));
        let bytes = encode(TiField::NONE, pdu).expect("encodable");
        let msg = SapMsg {
            sap: Sap::TransportSap,
            src,
            dest: HLR,
            time: SimTime(1000),
            msg: SapMsgInner::TransportUnitdataInd(TransportUnitdataInd { bytes }),
        };
        hlr.rx_prim(&mut queue, msg);
        queue.take_sent()
    }

    #[test]
    fn test_update_location_acked() {
        debug::setup_logging_verbose();
        let mut hlr = Hlr::new(&CfgHlr { node: HLR });

        let sent = deliver(&mut hlr, SC_1, &UpdateLocation { imsi: IMSI, sc: SC_1 });
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, SC_1);
        let (_, ack) = decode::<UpdateLocationAck>(&sent[0].1).expect("ack");
        assert_eq!(ack.imsi, IMSI);

        let record = hlr.record(IMSI).expect("record");
        assert_eq!(record.sc, SC_1);
        assert_eq!(record.updated, SimTime(1000));
        assert_eq!(hlr.stats().get(Counter::HlrUpdates), 1);
    }

    #[test]
    fn test_move_to_other_sc_cancels_old_registration() {
        debug::setup_logging_verbose();
        let mut hlr = Hlr::new(&CfgHlr { node: HLR });
        deliver(&mut hlr, SC_1, &UpdateLocation { imsi: IMSI, sc: SC_1 });

        // Same SC again: no cancel
        let sent = deliver(&mut hlr, SC_1, &UpdateLocation { imsi: IMSI, sc: SC_1 });
        assert_eq!(sent.len(), 1);

        let sent = deliver(&mut hlr, SC_2, &UpdateLocation { imsi: IMSI, sc: SC_2 });
        assert_eq!(sent.len(), 2);
        let cancel = sent.iter().find(|(dest, _)| *dest == SC_1).expect("cancel to old sc");
        let (_, cancel) = decode::<CancelLocation>(&cancel.1).expect("cancel location");
        assert_eq!(cancel.imsi, IMSI);
        assert!(sent.iter().any(|(dest, _)| *dest == SC_2));
        assert_eq!(hlr.record(IMSI).map(|r| r.sc), Some(SC_2));
    }

    #[test]
    fn test_purge_only_from_serving_sc() {
        debug::setup_logging_verbose();
        let mut hlr = Hlr::new(&CfgHlr { node: HLR });
        deliver(&mut hlr, SC_2, &UpdateLocation { imsi: IMSI, sc: SC_2 });

        let sent = deliver(&mut hlr, SC_1, &PurgeMs { imsi: IMSI, sc: SC_1 });
        assert!(sent.is_empty());
        assert_eq!(hlr.num_records(), 1);

        deliver(&mut hlr, SC_2, &PurgeMs { imsi: IMSI, sc: SC_2 });
        assert_eq!(hlr.num_records(), 0);

        // Unknown subscriber is ignored
        deliver(&mut hlr, SC_2, &PurgeMs { imsi: IMSI, sc: SC_2 });
        assert_eq!(hlr.num_records(), 0);
    }

    #[test]
    fn test_unexpected_map_message_dropped() {
        debug::setup_logging_verbose();
        let mut hlr = Hlr::new(&CfgHlr { node: HLR });
        let sent = deliver(&mut hlr, SC_1, &UpdateLocationAck { imsi: IMSI });
        assert!(sent.is_empty());
        assert_eq!(hlr.stats().get(Counter::DroppedMessages), 1);
        assert_eq!(hlr.num_records(), 0);
    }
}
