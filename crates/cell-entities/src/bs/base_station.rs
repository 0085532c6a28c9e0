use std::collections::HashMap;
use std::time::Duration;

use cell_config::{CfgBs, SharedConfig};
use cell_core::{
    CellId, CellRole, ChanRef, Lac, NodeId, PoolCounts, PoolOwner, ResourceKind, ResourcePool, TimerRegistry, TxnId,
    unimplemented_log,
};
use cell_pdus::bssmap::enums::bssmap_msg_type::BssmapMsgType;
use cell_pdus::rr::enums::rr_msg_type::RrMsgType;
use cell_pdus::{L3Message, ProtocolDiscriminator, TiField, peek};
use cell_saps::{SapMsg, SapMsgInner};

use crate::components::TransactionTable;
use crate::stats::{Counter, NodeStats};
use crate::{CellEntityTrait, MessageQueue};

/// A radio connection is identified by the MS and the reference it chose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BsKey {
    pub ms: NodeId,
    pub chan_ref: ChanRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BsTxnState {
    /// Assigned, waiting for AssignmentComplete under T3101
    Tentative,
    Active,
    /// Reserved for an MS handing over from another BS
    Incoming,
}

#[derive(Debug, Clone)]
pub struct BsTxn {
    pub cell: CellId,
    pub kind: ResourceKind,
    pub state: BsTxnState,
    pub channels: Vec<u16>,
    /// New channels reserved for a handover between cells of this BS.
    /// Held together with `channels` until the handover ends.
    pub ho_channels: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoSourceState {
    /// HandoverRequired sent, T7 running
    Pending,
    /// HandoverCommand relayed to the MS, T8 running
    Proceeding,
}

/// Outgoing handover of one MS
#[derive(Debug, Clone)]
pub struct HoSource {
    pub state: HoSourceState,
    pub ho_ref: Option<u8>,
    pub target_cell: CellId,
}

/// Incoming handover, reserved at this BS
#[derive(Debug, Clone)]
pub struct HoTarget {
    pub ms: NodeId,
    pub cell: CellId,
    /// Source cell is served by this BS too
    pub intra: bool,
    pub txns: Vec<TxnId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BsTimerOwner {
    Txn(TxnId),
    Handover(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BsTimer {
    T3101,
    T7,
    T8,
}

/// Base station: allocates radio channels, relays MS signalling to the SC and
/// runs both sides of handover
pub struct BaseStation {
    pub(super) config: SharedConfig,
    pub(super) node: NodeId,
    pub(super) sc: NodeId,
    pub(super) lac: Lac,
    pub(super) cells: Vec<CellId>,
    pub(super) pool: ResourcePool,
    pub(super) txns: TransactionTable<BsKey, BsTxn>,
    pub(super) timers: TimerRegistry<BsTimerOwner, BsTimer>,
    pub(super) ho_out: HashMap<NodeId, HoSource>,
    pub(super) ho_in: HashMap<u8, HoTarget>,
    pub(super) stats: NodeStats,
}

impl BaseStation {
    pub fn new(config: SharedConfig, cfg: &CfgBs) -> Self {
        let c = config.config();
        let policy = c.admission.build_policy(cfg.channels, c.seed ^ cfg.node as u64);
        let pool = ResourcePool::new(cfg.channels, cfg.channel_bandwidth_kbps, policy);
        tracing::debug!("bs {}: {} channels, admission {}", cfg.node, cfg.channels, pool.policy_name());
        Self {
            node: cfg.node,
            sc: cfg.sc,
            lac: cfg.lac,
            cells: cfg.cells.clone(),
            pool,
            txns: TransactionTable::new(c.limits.max_active_app_per_bs),
            timers: TimerRegistry::new(),
            ho_out: HashMap::new(),
            ho_in: HashMap::new(),
            stats: NodeStats::new(),
            config,
        }
    }

    pub fn lac(&self) -> Lac {
        self.lac
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    pub fn num_txns(&self) -> usize {
        self.txns.len()
    }

    pub fn num_active_timers(&self) -> usize {
        self.timers.num_active()
    }

    pub fn txn_state(&self, ms: NodeId, chan_ref: ChanRef) -> Option<BsTxnState> {
        let id = self.txns.lookup(&BsKey { ms, chan_ref })?;
        self.txns.get(id).map(|t| t.state)
    }

    /// Channels held by a connection: current ones, then any reserved for handover
    pub fn txn_channels(&self, ms: NodeId, chan_ref: ChanRef) -> Option<(Vec<u16>, Vec<u16>)> {
        let id = self.txns.lookup(&BsKey { ms, chan_ref })?;
        self.txns.get(id).map(|t| (t.channels.clone(), t.ho_channels.clone()))
    }

    pub fn handover_in_progress(&self, ms: NodeId) -> bool {
        self.ho_out.contains_key(&ms) || self.ho_in.values().any(|h| h.ms == ms)
    }

    pub(super) fn owner(id: TxnId) -> PoolOwner {
        id as PoolOwner
    }

    fn timer_duration(&self, timer: BsTimer) -> Duration {
        let cfg = self.config.config();
        match timer {
            BsTimer::T3101 => cfg.timers.t3101,
            BsTimer::T7 => cfg.timers.t7,
            BsTimer::T8 => cfg.timers.t8,
        }
    }

    pub(super) fn arm(&mut self, queue: &mut MessageQueue, owner: BsTimerOwner, timer: BsTimer) {
        let delay = self.timer_duration(timer);
        self.timers.set(queue, owner, timer, delay, ());
    }

    pub(super) fn send_sc<M: L3Message>(&self, queue: &mut MessageQueue, pdu: &M) {
        queue.send_pdu(self.sc, TiField::NONE, pdu);
    }

    /// Frees a connection with everything it holds, including its part in an
    /// incoming handover. Unknown ids are ignored.
    pub(super) fn release_txn(&mut self, queue: &mut MessageQueue, id: TxnId) -> Option<(BsKey, BsTxn)> {
        let (key, txn) = self.txns.release(id)?;
        let owner = Self::owner(id);
        let released = self.pool.release(owner, &txn.channels) + self.pool.release(owner, &txn.ho_channels);
        self.timers.cancel_owner(queue, BsTimerOwner::Txn(id));
        self.ho_in.retain(|ho_ref, target| {
            target.txns.retain(|t| *t != id);
            if target.txns.is_empty() {
                tracing::debug!("incoming handover {} of ms {} has no connection left", ho_ref, target.ms);
            }
            !target.txns.is_empty()
        });
        tracing::debug!("released txn {} {:?}, {} channel(s)", id, key, released);
        self.stats.inc(Counter::ChannelsReleased);
        Some((key, txn))
    }

    /// Drops the outgoing handover of `ms` once it has no connection left here
    pub(super) fn forget_handover_if_idle(&mut self, queue: &mut MessageQueue, ms: NodeId) {
        if self.txns.iter().any(|(_, key, _)| key.ms == ms) {
            return;
        }
        if self.ho_out.remove(&ms).is_some() {
            tracing::debug!("dropping handover context of ms {}", ms);
        }
        self.timers.cancel_owner(queue, BsTimerOwner::Handover(ms));
    }

    fn rx_timer(&mut self, queue: &mut MessageQueue, handle: u64) {
        let Some(expired) = self.timers.on_expiry(handle) else {
            return;
        };
        self.stats.inc(Counter::TimerExpiries);
        match (expired.owner, expired.timer) {
            (BsTimerOwner::Txn(id), BsTimer::T3101) => self.on_t3101(queue, id),
            (BsTimerOwner::Handover(ms), BsTimer::T7) => self.on_t7(queue, ms),
            (BsTimerOwner::Handover(ms), BsTimer::T8) => self.on_t8(queue, ms),
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
            ProtocolDiscriminator::Rr => match RrMsgType::try_from(msg_type) {
                Ok(RrMsgType::ChannelRequest) => self.rx_channel_request(queue, src, &bytes),
                Ok(RrMsgType::AssignmentComplete) => self.rx_assignment_complete(queue, src, &bytes),
                Ok(RrMsgType::ChannelRelease) => self.rx_channel_release(queue, src, &bytes),
                Ok(RrMsgType::UplinkData) => self.rx_uplink_data(queue, src, &bytes),
                Ok(RrMsgType::MeasurementReport) => self.rx_measurement_report(queue, src, &bytes),
                Ok(RrMsgType::HandoverComplete) => self.rx_rr_handover_complete(queue, src, &bytes),
                Ok(RrMsgType::HandoverFailure) => self.rx_rr_handover_failure(queue, src, &bytes),
                _ => {
                    tracing::warn!("unexpected RR message type {:#04x} from {}", msg_type, src);
                    self.stats.inc(Counter::DroppedMessages);
                }
            },
            ProtocolDiscriminator::Bssmap if src == self.sc => match BssmapMsgType::try_from(msg_type) {
                Ok(BssmapMsgType::DtapDown) => self.rx_dtap_down(queue, &bytes),
                Ok(BssmapMsgType::Paging) => self.rx_paging(queue, &bytes),
                Ok(BssmapMsgType::ClearCommand) => self.rx_clear_command(queue, &bytes),
                Ok(BssmapMsgType::HandoverRequiredReject) => self.rx_handover_required_reject(queue, &bytes),
                Ok(BssmapMsgType::HandoverCommand) => self.rx_bss_handover_command(queue, &bytes),
                Ok(BssmapMsgType::HandoverRequest) => self.rx_handover_request(queue, &bytes),
                Ok(BssmapMsgType::HandoverCancel) => self.rx_handover_cancel(queue, &bytes),
                _ => {
                    tracing::warn!("unexpected BSSMAP message type {:#04x}", msg_type);
                    self.stats.inc(Counter::DroppedMessages);
                }
            },
            pd => {
                tracing::warn!("unexpected {} message from {}", pd, src);
                self.stats.inc(Counter::DroppedMessages);
            }
        }
    }
}

impl CellEntityTrait for BaseStation {
    fn node(&self) -> NodeId {
        self.node
    }

    fn role(&self) -> CellRole {
        CellRole::Bs
    }

    fn rx_prim(&mut self, queue: &mut MessageQueue, message: SapMsg) {
        tracing::trace!("rx_prim: {:?} {} from {}", message.get_sap(), message.kind(), message.get_source());
        let src = message.get_source();
        match message.msg {
            SapMsgInner::TransportUnitdataInd(prim) => self.rx_transport(queue, src, prim.bytes),
            SapMsgInner::TimerExpiryInd(prim) => self.rx_timer(queue, prim.handle),
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
        Some(self.pool.counts())
    }
}
