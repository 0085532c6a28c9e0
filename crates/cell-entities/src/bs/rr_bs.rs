use cell_core::{AdmissionPurpose, AllocStage, NodeId, TxnId};
use cell_pdus::Cause;
use cell_pdus::TiField;
use cell_pdus::bssmap::pdus::clear::ClearRequest;
use cell_pdus::bssmap::pdus::dtap::DtapUp;
use cell_pdus::rr::pdus::assignment_complete::AssignmentComplete;
use cell_pdus::rr::pdus::channel_release::ChannelRelease;
use cell_pdus::rr::pdus::channel_request::ChannelRequest;
use cell_pdus::rr::pdus::dedicated_data::UplinkData;
use cell_pdus::rr::pdus::immediate_assignment::{ImmediateAssignment, ImmediateAssignmentReject};

use crate::MessageQueue;
use crate::bs::base_station::{BaseStation, BsKey, BsTimer, BsTimerOwner, BsTxn, BsTxnState};
use crate::codec;
use crate::components::TableErr;
use crate::stats::Counter;

impl BaseStation {
    fn send_assignment_reject(&self, queue: &mut MessageQueue, ms: NodeId, chan_ref: u8, cause: Cause) {
        queue.send_pdu(ms, TiField::NONE, &ImmediateAssignmentReject { chan_ref, cause });
    }

    pub(super) fn rx_channel_request(&mut self, queue: &mut MessageQueue, src: NodeId, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<ChannelRequest>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        if !self.cells.contains(&pdu.cell) {
            tracing::warn!("channel request from {} for cell {} not served here", src, pdu.cell);
            self.stats.inc(Counter::DroppedMessages);
            return;
        }

        let key = BsKey { ms: src, chan_ref: pdu.chan_ref };
        if let Some(id) = self.txns.lookup(&key) {
            let Some(txn) = self.txns.get(id) else {
                return;
            };
            if txn.state == BsTxnState::Tentative {
                // Repeated request, our assignment may have been too slow
                let ia = ImmediateAssignment {
                    chan_ref: pdu.chan_ref,
                    cell: txn.cell,
                    channels: txn.channels.clone(),
                };
                queue.send_pdu(src, TiField::NONE, &ia);
                return;
            }
            tracing::warn!("channel request for busy connection {:?}, replacing it", key);
            self.release_txn(queue, id);
        }

        let count = u16::from(pdu.count).max(self.pool.slots_for_bandwidth(pdu.bandwidth_kbps));
        let txn = BsTxn {
            cell: pdu.cell,
            kind: pdu.kind,
            state: BsTxnState::Tentative,
            channels: Vec::new(),
            ho_channels: Vec::new(),
        };
        let id = match self.txns.create(key, txn) {
            Ok(id) => id,
            Err(TableErr::Exhausted) => {
                tracing::warn!("transaction table full, rejecting {:?}", key);
                self.stats.inc(Counter::TableExhausted);
                self.send_assignment_reject(queue, src, pdu.chan_ref, Cause::Congestion);
                return;
            }
            Err(TableErr::DuplicateKey) => return,
        };

        let owner = Self::owner(id);
        match self
            .pool
            .try_allocate(owner, count, pdu.kind, AllocStage::Tentative, AdmissionPurpose::NewRequest)
        {
            Ok(channels) => {
                tracing::info!(
                    "{} channel(s) {:?} for ms {} ({}, {})",
                    channels.len(),
                    channels,
                    src,
                    pdu.est_cause,
                    pdu.kind
                );
                self.stats.inc(Counter::ChannelsAdmitted);
                let ia = ImmediateAssignment {
                    chan_ref: pdu.chan_ref,
                    cell: pdu.cell,
                    channels: channels.clone(),
                };
                if let Some(txn) = self.txns.get_mut(id) {
                    txn.channels = channels;
                }
                queue.send_pdu(src, TiField::NONE, &ia);
                self.arm(queue, BsTimerOwner::Txn(id), BsTimer::T3101);
            }
            Err(e) => {
                tracing::info!("channel request from ms {} rejected: {}", src, e);
                self.stats.inc(Counter::AdmissionRejects);
                self.txns.release(id);
                self.send_assignment_reject(queue, src, pdu.chan_ref, Cause::Congestion);
            }
        }
    }

    pub(super) fn rx_assignment_complete(&mut self, queue: &mut MessageQueue, src: NodeId, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<AssignmentComplete>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let key = BsKey { ms: src, chan_ref: pdu.chan_ref };
        let Some(id) = self.txns.lookup(&key) else {
            tracing::debug!("assignment complete for unknown {:?}", key);
            return;
        };
        let Some(txn) = self.txns.get_mut(id) else {
            return;
        };
        if txn.state != BsTxnState::Tentative {
            return;
        }
        if let Err(e) = self.pool.confirm(Self::owner(id), &txn.channels) {
            tracing::warn!("cannot confirm channels of {:?}: {:?}", key, e);
            return;
        }
        txn.state = BsTxnState::Active;
        self.timers.cancel(queue, BsTimerOwner::Txn(id), BsTimer::T3101);
        tracing::debug!("connection {:?} active", key);
    }

    /// The MS never took the assigned channels into use
    pub(super) fn on_t3101(&mut self, queue: &mut MessageQueue, id: TxnId) {
        if self.txns.get(id).map(|t| t.state) != Some(BsTxnState::Tentative) {
            return;
        }
        tracing::info!("T3101 expired, releasing tentative channels of txn {}", id);
        self.stats.inc(Counter::AssignmentTimeouts);
        self.release_txn(queue, id);
    }

    pub(super) fn rx_channel_release(&mut self, queue: &mut MessageQueue, src: NodeId, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<ChannelRelease>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let key = BsKey { ms: src, chan_ref: pdu.chan_ref };
        let Some(id) = self.txns.lookup(&key) else {
            tracing::debug!("release of unknown {:?}, ignoring", key);
            return;
        };
        let Some((_, txn)) = self.release_txn(queue, id) else {
            return;
        };
        if txn.state == BsTxnState::Active {
            let req = ClearRequest {
                ms: src,
                chan_ref: pdu.chan_ref,
                cause: pdu.cause,
            };
            self.send_sc(queue, &req);
        }
        self.forget_handover_if_idle(queue, src);
    }

    /// Relays an MS message on a confirmed channel to the SC
    pub(super) fn rx_uplink_data(&mut self, queue: &mut MessageQueue, src: NodeId, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<UplinkData>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let key = BsKey { ms: src, chan_ref: pdu.chan_ref };
        let cell = match self.txns.lookup(&key).and_then(|id| self.txns.get(id)) {
            Some(txn) if txn.state == BsTxnState::Active => txn.cell,
            _ => {
                tracing::warn!("uplink data on unconfirmed channel {:?}, dropping", key);
                self.stats.inc(Counter::DroppedMessages);
                return;
            }
        };
        let up = DtapUp {
            ms: src,
            chan_ref: pdu.chan_ref,
            cell,
            payload: pdu.payload,
        };
        self.send_sc(queue, &up);
    }
}
