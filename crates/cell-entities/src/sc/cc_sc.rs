use cell_core::{AdmissionPurpose, AllocStage, Imsi, ResourceKind, Sap, TxnId};
use cell_pdus::bssmap::pdus::clear::ClearCommand;
use cell_pdus::bssmap::pdus::paging::Paging;
use cell_pdus::cc::enums::cc_msg_type::CcMsgType;
use cell_pdus::cc::pdus::call_clearing::{Disconnect, Release, ReleaseComplete};
use cell_pdus::cc::pdus::call_progress::{Alerting, CallConfirmed, CallProceeding, Connect, ConnectAck};
use cell_pdus::cc::pdus::setup::Setup;
use cell_pdus::mm::pdus::cm_service_request::CmServiceRequest;
use cell_pdus::mm::pdus::cm_service_response::{CmServiceAccept, CmServiceReject};
use cell_pdus::{Cause, L3Message, TiField};
use cell_saps::SapMsgInner;
use cell_saps::call_leg::{CallLegInd, LegEvent};

use crate::MessageQueue;
use crate::codec;
use crate::components::TableErr;
use crate::sc::sc_txn::{LegRole, ScCall, ScCcState, ScKey, ScService, ScTimer, ScTimerOwner, ScTxn};
use crate::sc::switching_center::{SwitchingCenter, Uplink, cause_from_leg, is_clearing, leg_cause, new_txn};
use crate::stats::Counter;

const CC_TIMERS: [ScTimer; 6] = [
    ScTimer::T301,
    ScTimer::T303,
    ScTimer::T305,
    ScTimer::T308,
    ScTimer::T310,
    ScTimer::T3113,
];

impl SwitchingCenter {
    fn call_state(&self, id: TxnId) -> Option<ScCcState> {
        self.txns.get(id).and_then(|t| t.call()).map(|c| c.state)
    }

    fn set_call_state(&mut self, id: TxnId, state: ScCcState) {
        if let Some(call) = self.txns.get_mut(id).and_then(|t| t.call_mut()) {
            tracing::debug!("leg {}: {} -> {}", id, call.state, state);
            call.state = state;
        }
    }

    fn call_ti(&self, id: TxnId) -> TiField {
        self.txns.get(id).and_then(|t| t.call()).map(|c| c.ti).unwrap_or(TiField::NONE)
    }

    fn cancel_cc_timers(&mut self, queue: &mut MessageQueue, id: TxnId) {
        for timer in CC_TIMERS {
            self.disarm(queue, ScTimerOwner::Txn(id), timer);
        }
    }

    fn send_cc<M: L3Message>(&self, queue: &mut MessageQueue, id: TxnId, pdu: &M) {
        let ti = self.call_ti(id);
        self.send_dtap_txn(queue, id, ti, pdu);
    }

    fn notify_leg(&self, queue: &mut MessageQueue, id: TxnId, event: LegEvent) {
        if let Some(peer) = self.txns.get(id).and_then(|t| t.call()).and_then(|c| c.peer) {
            queue.push_local(Sap::CallLegSap, SapMsgInner::CallLegInd(CallLegInd { leg: peer, event }));
        }
    }

    /// Accepts a call request from a registered subscriber
    pub(super) fn rx_cm_service_request(&mut self, queue: &mut MessageQueue, up: &Uplink, pdu: CmServiceRequest) {
        let Some(record) = self.vlr.get_mut(&pdu.imsi) else {
            tracing::info!("service request from unknown imsi {}", pdu.imsi);
            self.send_dtap(queue, up, TiField::NONE, &CmServiceReject { cause: Cause::ImsiUnknownInVlr });
            return;
        };
        record.ms = up.ms;
        record.bs = up.bs;
        record.cell = up.cell;

        let txn = new_txn(up, pdu.imsi, queue.now(), ScService::Call(ScCall::new(LegRole::Mo, ScCcState::Null)));
        match self.create_txn(up.key(), txn) {
            Ok(id) => {
                tracing::debug!("service request of imsi {} accepted as leg {}", pdu.imsi, id);
                self.send_dtap(queue, up, TiField::NONE, &CmServiceAccept);
            }
            Err(e) => {
                let cause = match e {
                    TableErr::Exhausted => Cause::Congestion,
                    TableErr::DuplicateKey => Cause::MessageNotCompatibleWithState,
                };
                self.send_dtap(queue, up, TiField::NONE, &CmServiceReject { cause });
            }
        }
    }

    /// The paged subscriber answered: the terminating leg gets its channel
    pub(super) fn rx_paging_response(&mut self, queue: &mut MessageQueue, up: &Uplink, imsi: Imsi) {
        let paging_key = ScKey::Paging { imsi };
        let leg = self
            .txns
            .lookup(&paging_key)
            .filter(|id| self.call_state(*id) == Some(ScCcState::Paging));
        let Some(id) = leg else {
            tracing::info!("stale paging response from imsi {}, clearing", imsi);
            let cmd = ClearCommand {
                ms: up.ms,
                chan_ref: up.chan_ref,
                cause: Cause::NormalRelease,
            };
            queue.send_pdu(up.bs, TiField::NONE, &cmd);
            return;
        };
        if let Err(e) = self.txns.rekey(id, up.key()) {
            tracing::warn!("cannot attach leg {} to {:?}: {:?}", id, up.key(), e);
            return;
        }
        self.disarm(queue, ScTimerOwner::Txn(id), ScTimer::T3113);

        let Some(txn) = self.txns.get_mut(id) else {
            return;
        };
        txn.ms = up.ms;
        txn.bs = up.bs;
        txn.cell = up.cell;
        txn.chan_ref = Some(up.chan_ref);
        let Some(call) = txn.call_mut() else {
            return;
        };
        call.ti = TiField::originator((id & 0x07) as u8);
        let caller = call.other_party.unwrap_or(0);

        tracing::info!("imsi {} answered paging, offering call from {}", imsi, caller);
        let setup = Setup {
            party: caller,
            kind: ResourceKind::Voice,
            bandwidth_kbps: 0,
        };
        self.send_cc(queue, id, &setup);
        self.set_call_state(id, ScCcState::CallPresent);
        self.arm(queue, ScTimerOwner::Txn(id), ScTimer::T303);
    }

    pub(super) fn rx_cc(&mut self, queue: &mut MessageQueue, up: &Uplink, msg_type: u64, bytes: &[u8]) {
        let id = self.txns.lookup(&up.key());
        let Some((id, state, leg)) = id.and_then(|id| self.txns.get(id).and_then(|t| t.call()).map(|c| (id, c.state, c.leg)))
        else {
            if matches!(CcMsgType::try_from(msg_type), Ok(CcMsgType::ReleaseComplete)) {
                tracing::debug!("release complete from ms {} for cleared call", up.ms);
                return;
            }
            tracing::warn!("call control message from ms {} without call", up.ms);
            self.stats.inc(Counter::DroppedMessages);
            let rc = ReleaseComplete { cause: Cause::InvalidTransactionId };
            self.send_dtap(queue, up, TiField::NONE, &rc);
            return;
        };

        match (CcMsgType::try_from(msg_type), leg) {
            (Ok(CcMsgType::Setup), LegRole::Mo) if state == ScCcState::Null => {
                if let Some((ti, pdu)) = codec::parse::<Setup>(bytes) {
                    self.rx_setup(queue, id, ti.reply(), pdu);
                }
            }
            (Ok(CcMsgType::CallConfirmed), LegRole::Mt) if state == ScCcState::CallPresent => {
                if codec::parse::<CallConfirmed>(bytes).is_some() {
                    self.disarm(queue, ScTimerOwner::Txn(id), ScTimer::T303);
                    self.set_call_state(id, ScCcState::CallConfirmed);
                    self.arm(queue, ScTimerOwner::Txn(id), ScTimer::T310);
                }
            }
            (Ok(CcMsgType::Alerting), LegRole::Mt)
                if matches!(state, ScCcState::CallPresent | ScCcState::CallConfirmed) =>
            {
                if codec::parse::<Alerting>(bytes).is_some() {
                    self.disarm(queue, ScTimerOwner::Txn(id), ScTimer::T303);
                    self.disarm(queue, ScTimerOwner::Txn(id), ScTimer::T310);
                    self.set_call_state(id, ScCcState::CallReceived);
                    self.arm(queue, ScTimerOwner::Txn(id), ScTimer::T301);
                    self.notify_leg(queue, id, LegEvent::Alerting);
                }
            }
            (Ok(CcMsgType::Connect), LegRole::Mt)
                if matches!(state, ScCcState::CallPresent | ScCcState::CallConfirmed | ScCcState::CallReceived) =>
            {
                if codec::parse::<Connect>(bytes).is_some() {
                    self.cancel_cc_timers(queue, id);
                    self.send_cc(queue, id, &ConnectAck);
                    self.leg_connected(id);
                    self.stats.inc(Counter::CallsConnected);
                    self.notify_leg(queue, id, LegEvent::Connected);
                }
            }
            (Ok(CcMsgType::ConnectAck), LegRole::Mo) if state == ScCcState::Active => {
                codec::parse::<ConnectAck>(bytes);
            }
            (Ok(CcMsgType::Disconnect), _) if !is_clearing(state) => {
                let Some((_, pdu)) = codec::parse::<Disconnect>(bytes) else {
                    return;
                };
                tracing::info!("leg {} disconnected by ms: {}", id, pdu.cause);
                self.cancel_cc_timers(queue, id);
                self.notify_leg(queue, id, LegEvent::Disconnected(leg_cause(pdu.cause)));
                self.unlink(id);
                self.send_release(queue, id, Cause::NormalClearing, false);
            }
            (Ok(CcMsgType::Disconnect), _) => {
                // Both sides cleared at once, our Release answers it
                tracing::debug!("disconnect for leg {} already clearing", id);
            }
            (Ok(CcMsgType::Release), _) => {
                let Some((_, pdu)) = codec::parse::<Release>(bytes) else {
                    return;
                };
                if state != ScCcState::ReleaseRequest {
                    self.send_cc(queue, id, &ReleaseComplete { cause: pdu.cause });
                }
                self.release_txn(queue, id, Some(LegEvent::Disconnected(leg_cause(pdu.cause))));
            }
            (Ok(CcMsgType::ReleaseComplete), _) => {
                if let Some((_, pdu)) = codec::parse::<ReleaseComplete>(bytes) {
                    self.release_txn(queue, id, Some(LegEvent::Disconnected(leg_cause(pdu.cause))));
                }
            }
            (Ok(other), _) => {
                tracing::warn!("unexpected CC {} on leg {} in state {}", other, id, state);
                self.stats.inc(Counter::DroppedMessages);
            }
            (Err(_), _) => {
                tracing::warn!("unknown CC message type {:#04x}", msg_type);
                self.stats.inc(Counter::DroppedMessages);
            }
        }
    }

    fn leg_connected(&mut self, id: TxnId) {
        if let Some(call) = self.txns.get_mut(id).and_then(|t| t.call_mut()) {
            call.connected = true;
        }
        self.set_call_state(id, ScCcState::Active);
    }

    fn unlink(&mut self, id: TxnId) {
        let peer = self.txns.get_mut(id).and_then(|t| t.call_mut()).and_then(|c| c.peer.take());
        if let Some(peer) = peer {
            if let Some(call) = self.txns.get_mut(peer).and_then(|t| t.call_mut()) {
                call.peer = None;
            }
        }
    }

    /// Originating leg: seize a circuit, then page the called subscriber
    fn rx_setup(&mut self, queue: &mut MessageQueue, id: TxnId, ti: TiField, pdu: Setup) {
        let caller = self.txns.get(id).map(|t| t.imsi).unwrap_or(0);
        if let Some(call) = self.txns.get_mut(id).and_then(|t| t.call_mut()) {
            call.ti = ti;
            call.other_party = Some(pdu.party);
        }
        self.stats.inc(Counter::CallAttempts);

        if let Err(e) = self
            .circuits
            .try_allocate(Self::owner(id), 1, ResourceKind::Voice, AllocStage::Confirmed, AdmissionPurpose::NewRequest)
        {
            tracing::info!("no circuit for call of imsi {}: {}", caller, e);
            self.stats.inc(Counter::CircuitRejects);
            self.send_cc(queue, id, &ReleaseComplete { cause: Cause::NoCircuitAvailable });
            self.release_txn(queue, id, None);
            return;
        }

        self.send_cc(queue, id, &CallProceeding);
        self.set_call_state(id, ScCcState::CallProceeding);

        let Some(record) = self.vlr.get(&pdu.party).cloned() else {
            tracing::info!("called imsi {} not reachable", pdu.party);
            self.network_disconnect(queue, id, Cause::SubscriberAbsent);
            return;
        };
        let busy = self
            .txns
            .iter()
            .any(|(_, _, t)| t.imsi == pdu.party && t.call().is_some_and(|c| !is_clearing(c.state)));
        if busy {
            tracing::info!("called imsi {} busy", pdu.party);
            self.network_disconnect(queue, id, Cause::UserBusy);
            return;
        }

        let mut mt_call = ScCall::new(LegRole::Mt, ScCcState::Paging);
        mt_call.peer = Some(id);
        mt_call.other_party = Some(caller);
        mt_call.paging_attempts = 1;
        let mt = ScTxn {
            ms: record.ms,
            imsi: pdu.party,
            bs: record.bs,
            cell: record.cell,
            chan_ref: None,
            created: queue.now(),
            service: ScService::Call(mt_call),
        };
        let mt_id = match self.create_txn(ScKey::Paging { imsi: pdu.party }, mt) {
            Ok(mt_id) => mt_id,
            Err(_) => {
                self.network_disconnect(queue, id, Cause::Congestion);
                return;
            }
        };
        if let Some(call) = self.txns.get_mut(id).and_then(|t| t.call_mut()) {
            call.peer = Some(mt_id);
        }

        tracing::info!("call {} -> {}: paging via bs {}", caller, pdu.party, record.bs);
        self.send_paging(queue, mt_id);
    }

    fn send_paging(&mut self, queue: &mut MessageQueue, mt_id: TxnId) {
        let Some(txn) = self.txns.get(mt_id) else {
            return;
        };
        let paging = Paging {
            imsi: txn.imsi,
            ms: txn.ms,
            kind: ResourceKind::Voice,
        };
        queue.send_pdu(txn.bs, TiField::NONE, &paging);
        self.stats.inc(Counter::PagingAttempts);
        self.arm(queue, ScTimerOwner::Txn(mt_id), ScTimer::T3113);
    }

    pub(super) fn on_t3113(&mut self, queue: &mut MessageQueue, id: TxnId) {
        let Some(call) = self.txns.get(id).and_then(|t| t.call()) else {
            return;
        };
        if call.state != ScCcState::Paging {
            return;
        }
        let max = self.config.config().limits.max_paging_attempts;
        if call.paging_attempts < max {
            if let Some(call) = self.txns.get_mut(id).and_then(|t| t.call_mut()) {
                call.paging_attempts += 1;
            }
            self.send_paging(queue, id);
            return;
        }
        tracing::info!("no answer to paging for leg {}", id);
        self.stats.inc(Counter::PagingFailures);
        self.release_txn(queue, id, Some(LegEvent::Failed(leg_cause(Cause::NoUserResponding))));
    }

    /// Starts clearing towards the MS
    fn network_disconnect(&mut self, queue: &mut MessageQueue, id: TxnId, cause: Cause) {
        self.cancel_cc_timers(queue, id);
        self.send_cc(queue, id, &Disconnect { cause });
        self.set_call_state(id, ScCcState::DisconnectIndication);
        self.arm(queue, ScTimerOwner::Txn(id), ScTimer::T305);
    }

    fn send_release(&mut self, queue: &mut MessageQueue, id: TxnId, cause: Cause, repeat: bool) {
        self.cancel_cc_timers(queue, id);
        self.send_cc(queue, id, &Release { cause });
        if let Some(call) = self.txns.get_mut(id).and_then(|t| t.call_mut()) {
            call.release_attempts = if repeat { call.release_attempts + 1 } else { 1 };
        }
        self.set_call_state(id, ScCcState::ReleaseRequest);
        self.arm(queue, ScTimerOwner::Txn(id), ScTimer::T308);
    }

    /// Progress or failure of the linked leg
    pub(super) fn rx_call_leg_ind(&mut self, queue: &mut MessageQueue, id: TxnId, event: LegEvent) {
        let Some(state) = self.call_state(id) else {
            tracing::debug!("leg event {:?} for released leg {}", event, id);
            return;
        };
        tracing::debug!("leg {} in state {}: {:?}", id, state, event);

        match event {
            LegEvent::Alerting if state == ScCcState::CallProceeding => {
                self.send_cc(queue, id, &Alerting);
                self.set_call_state(id, ScCcState::CallDelivered);
            }
            LegEvent::Connected if matches!(state, ScCcState::CallProceeding | ScCcState::CallDelivered) => {
                self.send_cc(queue, id, &Connect);
                self.leg_connected(id);
            }
            LegEvent::Disconnected(cause) | LegEvent::Failed(cause) => {
                if let Some(call) = self.txns.get_mut(id).and_then(|t| t.call_mut()) {
                    call.peer = None;
                }
                if is_clearing(state) {
                    return;
                }
                if self.txns.get(id).is_some_and(|t| t.chan_ref.is_none()) {
                    // Still paging, nobody to tell
                    self.release_txn(queue, id, None);
                    return;
                }
                self.network_disconnect(queue, id, cause_from_leg(cause));
            }
            _ => tracing::debug!("ignoring leg event {:?} in state {}", event, state),
        }
    }

    /// T301, T303 or T310: the terminating subscriber did not progress the call
    pub(super) fn on_cc_guard_expiry(&mut self, queue: &mut MessageQueue, id: TxnId, timer: ScTimer) {
        let Some(state) = self.call_state(id) else {
            return;
        };
        tracing::info!("{:?} expired for leg {} in state {}", timer, id, state);
        match timer {
            ScTimer::T301 => {
                self.notify_leg(queue, id, LegEvent::Failed(leg_cause(Cause::NoAnswer)));
                self.unlink(id);
                self.network_disconnect(queue, id, Cause::NoAnswer);
            }
            _ => {
                let event = LegEvent::Failed(leg_cause(Cause::NoUserResponding));
                self.abort_txn(queue, id, Cause::RecoveryOnTimerExpiry, Some(event));
            }
        }
    }

    pub(super) fn on_t305(&mut self, queue: &mut MessageQueue, id: TxnId) {
        if self.call_state(id) == Some(ScCcState::DisconnectIndication) {
            let event = LegEvent::Disconnected(leg_cause(Cause::RecoveryOnTimerExpiry));
            self.abort_txn(queue, id, Cause::RecoveryOnTimerExpiry, Some(event));
        }
    }

    pub(super) fn on_t308(&mut self, queue: &mut MessageQueue, id: TxnId) {
        let Some(call) = self.txns.get(id).and_then(|t| t.call()) else {
            return;
        };
        if call.state != ScCcState::ReleaseRequest {
            return;
        }
        let max = self.config.config().limits.max_release_attempts;
        if call.release_attempts < max {
            self.send_release(queue, id, Cause::RecoveryOnTimerExpiry, true);
        } else {
            tracing::info!("no answer to release of leg {}", id);
            self.abort_txn(queue, id, Cause::RecoveryOnTimerExpiry, None);
        }
    }
}
