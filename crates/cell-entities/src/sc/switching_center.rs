use std::collections::HashMap;
use std::time::Duration;

use cell_config::{CfgSc, SharedConfig};
use cell_core::admission::SimpleMaxUserPolicy;
use cell_core::{
    CellId, CellRole, ChanRef, Imsi, Lac, NodeId, PoolCounts, PoolOwner, ResourcePool, Sap, SimTime, TimerRegistry, TxnId,
    unimplemented_log,
};
use cell_pdus::bssmap::enums::bssmap_msg_type::BssmapMsgType;
use cell_pdus::bssmap::pdus::clear::{ClearCommand, ClearComplete, ClearRequest};
use cell_pdus::bssmap::pdus::dtap::{DtapDown, DtapUp};
use cell_pdus::gtp::enums::gtp_msg_type::GtpMsgType;
use cell_pdus::map::enums::map_msg_type::MapMsgType;
use cell_pdus::{Cause, L3Message, ProtocolDiscriminator, TiField, encode, peek};
use cell_saps::call_leg::{CallLegInd, LegEvent};
use cell_saps::{SapMsg, SapMsgInner};

use crate::codec;
use crate::components::{TableErr, TransactionTable};
use crate::sc::sc_txn::{LegRole, ScCcState, ScHandover, ScKey, ScService, ScTimer, ScTimerOwner, ScTxn};
use crate::stats::{Counter, NodeStats};
use crate::{CellEntityTrait, MessageQueue};

/// Visitor location record: where a registered subscriber can be reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlrRecord {
    pub ms: NodeId,
    pub bs: NodeId,
    pub cell: CellId,
    pub lac: Lac,
    pub last_update: SimTime,
}

/// Where an uplink message came from
#[derive(Debug, Clone, Copy)]
pub(super) struct Uplink {
    pub bs: NodeId,
    pub ms: NodeId,
    pub chan_ref: ChanRef,
    pub cell: CellId,
}

impl Uplink {
    pub fn key(&self) -> ScKey {
        ScKey::Conn { ms: self.ms, chan_ref: self.chan_ref }
    }
}

/// Switching center with its visitor location register: location updates,
/// call switching between legs, packet data relay to the gateway and handover
/// coordination between base stations
pub struct SwitchingCenter {
    pub(super) config: SharedConfig,
    pub(super) node: NodeId,
    pub(super) hlr: NodeId,
    pub(super) gateway: Option<NodeId>,
    pub(super) circuits: ResourcePool,
    pub(super) txns: TransactionTable<ScKey, ScTxn>,
    pub(super) vlr: HashMap<Imsi, VlrRecord>,
    pub(super) timers: TimerRegistry<ScTimerOwner, ScTimer>,
    pub(super) handovers: HashMap<u8, ScHandover>,
    pub(super) next_ho_ref: u8,
    pub(super) next_gtp_seq: u16,
    pub(super) stats: NodeStats,
}

impl SwitchingCenter {
    pub fn new(config: SharedConfig, cfg: &CfgSc) -> Self {
        let c = config.config();
        let policy = Box::new(SimpleMaxUserPolicy { max_users: cfg.circuits });
        Self {
            node: cfg.node,
            hlr: cfg.hlr,
            gateway: cfg.gateway,
            circuits: ResourcePool::new(cfg.circuits, 0, policy),
            txns: TransactionTable::new(c.limits.max_active_app_per_sc),
            vlr: HashMap::new(),
            timers: TimerRegistry::new(),
            handovers: HashMap::new(),
            next_ho_ref: 0,
            next_gtp_seq: 0,
            stats: NodeStats::new(),
            config,
        }
    }

    pub fn vlr_record(&self, imsi: Imsi) -> Option<&VlrRecord> {
        self.vlr.get(&imsi)
    }

    pub fn num_vlr_records(&self) -> usize {
        self.vlr.len()
    }

    pub fn num_txns(&self) -> usize {
        self.txns.len()
    }

    pub fn circuits(&self) -> &ResourcePool {
        &self.circuits
    }

    pub fn num_handovers(&self) -> usize {
        self.handovers.len()
    }

    /// States of the call legs of `imsi`
    pub fn call_states(&self, imsi: Imsi) -> Vec<ScCcState> {
        self.txns
            .iter()
            .filter(|(_, _, t)| t.imsi == imsi)
            .filter_map(|(_, _, t)| t.call().map(|c| c.state))
            .collect()
    }

    /// Registered subscriber served by MS node `ms`
    pub(super) fn imsi_of_ms(&self, ms: NodeId) -> Option<Imsi> {
        self.vlr.iter().find(|(_, rec)| rec.ms == ms).map(|(imsi, _)| *imsi)
    }

    pub(super) fn lac_of_bs(&self, bs: NodeId) -> Lac {
        self.config.config().bs(bs).map(|c| c.lac).unwrap_or(0)
    }

    pub(super) fn owner(id: TxnId) -> PoolOwner {
        id as PoolOwner
    }

    fn timer_duration(&self, timer: ScTimer) -> Duration {
        let cfg = self.config.config();
        let t = &cfg.timers;
        match timer {
            ScTimer::T301 => t.t301,
            ScTimer::T303 => t.t303,
            ScTimer::T305 => t.t305,
            ScTimer::T308 => t.t308,
            ScTimer::T310 => t.t310,
            ScTimer::T3113 => t.t3113,
            ScTimer::T3Response => t.t3_response,
            ScTimer::T3395 => t.t3395,
            ScTimer::T3103 => t.t3103,
            ScTimer::VlrLifetime => t.vlr_lifetime,
        }
    }

    pub(super) fn arm(&mut self, queue: &mut MessageQueue, owner: ScTimerOwner, timer: ScTimer) {
        let delay = self.timer_duration(timer);
        self.timers.set(queue, owner, timer, delay, ());
    }

    pub(super) fn disarm(&mut self, queue: &mut MessageQueue, owner: ScTimerOwner, timer: ScTimer) {
        self.timers.cancel(queue, owner, timer);
    }

    /// Sends an MM, CC or SM message to the MS over the BS that relayed `up`
    pub(super) fn send_dtap<M: L3Message>(&self, queue: &mut MessageQueue, up: &Uplink, ti: TiField, pdu: &M) {
        let payload = match encode(ti, pdu) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed encoding {}: {:?}", pdu, e);
                return;
            }
        };
        tracing::debug!("-> ms {} {:?}", up.ms, pdu);
        let down = DtapDown {
            ms: up.ms,
            chan_ref: up.chan_ref,
            payload,
        };
        queue.send_pdu(up.bs, TiField::NONE, &down);
    }

    /// Uplink address of a transaction that has a channel
    pub(super) fn uplink_of(&self, id: TxnId) -> Option<Uplink> {
        let txn = self.txns.get(id)?;
        Some(Uplink {
            bs: txn.bs,
            ms: txn.ms,
            chan_ref: txn.chan_ref?,
            cell: txn.cell,
        })
    }

    pub(super) fn send_dtap_txn<M: L3Message>(&self, queue: &mut MessageQueue, id: TxnId, ti: TiField, pdu: &M) {
        match self.uplink_of(id) {
            Some(up) => self.send_dtap(queue, &up, ti, pdu),
            None => tracing::warn!("txn {} has no channel, dropping {}", id, pdu),
        }
    }

    pub(super) fn create_txn(&mut self, key: ScKey, txn: ScTxn) -> Result<TxnId, TableErr> {
        let res = self.txns.create(key, txn);
        if res == Err(TableErr::Exhausted) {
            tracing::warn!("transaction table full, refusing {:?}", key);
            self.stats.inc(Counter::TableExhausted);
        }
        res
    }

    /// Frees a transaction with its circuit and timers. The linked call leg is
    /// told with `peer_event`. Releasing twice is harmless.
    pub(super) fn release_txn(&mut self, queue: &mut MessageQueue, id: TxnId, peer_event: Option<LegEvent>) {
        let Some((key, txn)) = self.txns.release(id) else {
            return;
        };
        self.circuits.release_owner(Self::owner(id));
        self.timers.cancel_owner(queue, ScTimerOwner::Txn(id));
        tracing::debug!("released txn {} {:?}", id, key);
        if let ScKey::Conn { ms, chan_ref } = key {
            self.drop_handover_of(queue, ms, chan_ref);
        }

        if let ScService::Call(call) = &txn.service {
            if call.leg == LegRole::Mo {
                if call.connected {
                    self.stats.inc(Counter::CallsCleared);
                } else {
                    self.stats.inc(Counter::CallsFailed);
                }
            }
            if let (Some(peer), Some(event)) = (call.peer, peer_event) {
                self.unlink_peer(peer);
                queue.push_local(Sap::CallLegSap, SapMsgInner::CallLegInd(CallLegInd { leg: peer, event }));
            } else if let Some(peer) = call.peer {
                self.unlink_peer(peer);
            }
        }
    }

    fn unlink_peer(&mut self, peer: TxnId) {
        if let Some(call) = self.txns.get_mut(peer).and_then(|t| t.call_mut()) {
            call.peer = None;
        }
    }

    /// Ends a transaction the network gives up on: the BS is told to free the channel
    pub(super) fn abort_txn(&mut self, queue: &mut MessageQueue, id: TxnId, cause: Cause, peer_event: Option<LegEvent>) {
        if let Some(up) = self.uplink_of(id) {
            let cmd = ClearCommand {
                ms: up.ms,
                chan_ref: up.chan_ref,
                cause,
            };
            queue.send_pdu(up.bs, TiField::NONE, &cmd);
        }
        self.release_txn(queue, id, peer_event);
    }

    fn rx_timer(&mut self, queue: &mut MessageQueue, handle: u64) {
        let Some(expired) = self.timers.on_expiry(handle) else {
            return;
        };
        self.stats.inc(Counter::TimerExpiries);
        match (expired.owner, expired.timer) {
            (ScTimerOwner::Vlr(imsi), ScTimer::VlrLifetime) => self.on_vlr_lifetime(queue, imsi),
            (ScTimerOwner::Handover(ho_ref), ScTimer::T3103) => self.on_t3103(queue, ho_ref),
            (ScTimerOwner::Txn(id), ScTimer::T3113) => self.on_t3113(queue, id),
            (ScTimerOwner::Txn(id), t @ (ScTimer::T301 | ScTimer::T303 | ScTimer::T310)) => {
                self.on_cc_guard_expiry(queue, id, t)
            }
            (ScTimerOwner::Txn(id), ScTimer::T305) => self.on_t305(queue, id),
            (ScTimerOwner::Txn(id), ScTimer::T308) => self.on_t308(queue, id),
            (ScTimerOwner::Txn(id), ScTimer::T3Response) => self.on_t3_response(queue, id),
            (ScTimerOwner::Txn(id), ScTimer::T3395) => self.on_t3395(queue, id),
            (owner, timer) => unimplemented_log!("timer {:?} for {:?}", timer, owner),
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

        match header.pd {
            ProtocolDiscriminator::Bssmap => match BssmapMsgType::try_from(msg_type) {
                Ok(BssmapMsgType::DtapUp) => self.rx_dtap_up(queue, src, &bytes),
                Ok(BssmapMsgType::ClearRequest) => self.rx_clear_request(queue, &bytes),
                Ok(BssmapMsgType::ClearComplete) => {
                    if codec::parse::<ClearComplete>(&bytes).is_none() {
                        self.stats.inc(Counter::DroppedMessages);
                    }
                }
                Ok(BssmapMsgType::HandoverRequired) => self.rx_handover_required(queue, src, &bytes),
                Ok(BssmapMsgType::HandoverRequestAck) => self.rx_handover_request_ack(queue, &bytes),
                Ok(BssmapMsgType::HandoverFailure) => self.rx_bss_handover_failure(queue, src, &bytes),
                Ok(BssmapMsgType::HandoverComplete) => self.rx_bss_handover_complete(queue, &bytes),
                _ => {
                    tracing::warn!("unexpected BSSMAP message type {:#04x} from {}", msg_type, src);
                    self.stats.inc(Counter::DroppedMessages);
                }
            },
            ProtocolDiscriminator::Map if src == self.hlr => match MapMsgType::try_from(msg_type) {
                Ok(MapMsgType::UpdateLocationAck) => self.rx_update_location_ack(&bytes),
                Ok(MapMsgType::CancelLocation) => self.rx_cancel_location(queue, &bytes),
                _ => {
                    tracing::warn!("unexpected MAP message type {:#04x}", msg_type);
                    self.stats.inc(Counter::DroppedMessages);
                }
            },
            ProtocolDiscriminator::Gtp if Some(src) == self.gateway => match GtpMsgType::try_from(msg_type) {
                Ok(GtpMsgType::CreatePdpContextResponse) => self.rx_create_pdp_response(queue, &bytes),
                Ok(GtpMsgType::DeletePdpContextRequest) => self.rx_gateway_delete_request(queue, &bytes),
                Ok(GtpMsgType::DeletePdpContextResponse) => self.rx_delete_pdp_response(&bytes),
                _ => {
                    tracing::warn!("unexpected GTP message type {:#04x}", msg_type);
                    self.stats.inc(Counter::DroppedMessages);
                }
            },
            pd => {
                tracing::warn!("unexpected {} message from {}", pd, src);
                self.stats.inc(Counter::DroppedMessages);
            }
        }
    }

    /// Demultiplexes a relayed MS message to MM, CC or SM
    fn rx_dtap_up(&mut self, queue: &mut MessageQueue, src: NodeId, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<DtapUp>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let up = Uplink {
            bs: src,
            ms: pdu.ms,
            chan_ref: pdu.chan_ref,
            cell: pdu.cell,
        };
        let (header, msg_type) = match peek(&pdu.payload) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!("Failed parsing relayed header from ms {}: {:?}", up.ms, e);
                self.stats.inc(Counter::DroppedMessages);
                return;
            }
        };
        match header.pd {
            ProtocolDiscriminator::Mm => self.rx_mm(queue, &up, msg_type, &pdu.payload),
            ProtocolDiscriminator::Cc => self.rx_cc(queue, &up, msg_type, &pdu.payload),
            ProtocolDiscriminator::Sm => self.rx_sm(queue, &up, msg_type, &pdu.payload),
            pd => {
                tracing::warn!("unexpected {} message relayed from ms {}", pd, up.ms);
                self.stats.inc(Counter::DroppedMessages);
            }
        }
    }

    /// The BS lost or released a connection. Unknown connections were already
    /// cleared here and are ignored.
    fn rx_clear_request(&mut self, queue: &mut MessageQueue, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<ClearRequest>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let key = ScKey::Conn { ms: pdu.ms, chan_ref: pdu.chan_ref };
        let Some(id) = self.txns.lookup(&key) else {
            tracing::debug!("clear request for {:?} without transaction", key);
            return;
        };
        tracing::info!("connection {:?} lost: {}", key, pdu.cause);
        let pdp_active = self.txns.get(id).and_then(|t| t.pdp()).is_some();
        if pdp_active {
            self.pdp_connection_lost(queue, id);
        }
        let event = LegEvent::Disconnected(leg_cause(Cause::RadioInterfaceFailure));
        self.release_txn(queue, id, Some(event));
    }
}

impl CellEntityTrait for SwitchingCenter {
    fn node(&self) -> NodeId {
        self.node
    }

    fn role(&self) -> CellRole {
        CellRole::Sc
    }

    fn rx_prim(&mut self, queue: &mut MessageQueue, message: SapMsg) {
        tracing::trace!("rx_prim: {:?} {} from {}", message.get_sap(), message.kind(), message.get_source());
        let src = message.get_source();
        match message.msg {
            SapMsgInner::TransportUnitdataInd(prim) => self.rx_transport(queue, src, prim.bytes),
            SapMsgInner::TimerExpiryInd(prim) => self.rx_timer(queue, prim.handle),
            SapMsgInner::CallLegInd(prim) => self.rx_call_leg_ind(queue, prim.leg, prim.event),
            other => {
                tracing::warn!("unexpected primitive {:?}", other);
                self.stats.inc(Counter::DroppedMessages);
            }
        }
    }

    fn stats(&self) -> &NodeStats {
        &self.stats
    }

    fn pool_counts(&self) -> Option<PoolCounts> {
        Some(self.circuits.counts())
    }
}

pub(super) fn leg_cause(cause: Cause) -> u8 {
    cause.into_raw() as u8
}

pub(super) fn cause_from_leg(raw: u8) -> Cause {
    Cause::try_from(raw as u64).unwrap_or(Cause::NormalClearing)
}

pub(super) fn new_txn(up: &Uplink, imsi: Imsi, now: SimTime, service: ScService) -> ScTxn {
    ScTxn {
        ms: up.ms,
        imsi,
        bs: up.bs,
        cell: up.cell,
        chan_ref: Some(up.chan_ref),
        created: now,
        service,
    }
}

pub(super) fn is_clearing(state: ScCcState) -> bool {
    matches!(state, ScCcState::DisconnectIndication | ScCcState::ReleaseRequest)
}
