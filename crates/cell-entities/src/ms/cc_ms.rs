use cell_core::{Imsi, ResourceKind, TxnId};
use cell_pdus::cc::enums::cc_msg_type::CcMsgType;
use cell_pdus::cc::pdus::call_clearing::{Disconnect, Release, ReleaseComplete};
use cell_pdus::cc::pdus::call_progress::{Alerting, CallConfirmed, Connect, ConnectAck};
use cell_pdus::cc::pdus::setup::Setup;
use cell_pdus::mm::pdus::cm_service_request::CmServiceRequest;
use cell_pdus::mm::pdus::paging_response::PagingResponse;
use cell_pdus::rr::enums::establishment_cause::EstablishmentCause;
use cell_pdus::{Cause, TiField};

use crate::MessageQueue;
use crate::codec;
use crate::ms::app::{AppService, CallDir, CcState, MmState, MsApp, MsAppKey, MsCall, MsTimer, MsTimerOwner, RrState};
use crate::ms::mobile_station::MobileStation;
use crate::stats::Counter;

/// Timers guarding the call states, all cancelled on any clearing step
const CC_TIMERS: [MsTimer; 8] = [
    MsTimer::T3230,
    MsTimer::T301,
    MsTimer::T303,
    MsTimer::T305,
    MsTimer::T308,
    MsTimer::T310,
    MsTimer::T313,
    MsTimer::AnswerDelay,
];

impl MobileStation {
    fn call(&self, id: TxnId) -> Option<&MsCall> {
        self.apps.get(id).and_then(|a| a.call())
    }

    fn call_state(&self, id: TxnId) -> Option<CcState> {
        self.call(id).map(|c| c.state)
    }

    fn set_call_state(&mut self, id: TxnId, state: CcState) {
        if let Some(call) = self.apps.get_mut(id).and_then(|a| a.call_mut()) {
            tracing::debug!("call {}: {} -> {}", id, call.state, state);
            call.state = state;
        }
    }

    /// Transaction identifier for messages of this call. The originating side
    /// allocates the value, the flag marks the direction.
    fn call_ti(&self, id: TxnId) -> TiField {
        match self.call(id).map(|c| c.dir) {
            Some(CallDir::Mt) => TiField::responder((id & 0x07) as u8),
            _ => TiField::originator((id & 0x07) as u8),
        }
    }

    fn cancel_cc_timers(&mut self, queue: &mut MessageQueue, id: TxnId) {
        for timer in CC_TIMERS {
            self.disarm(queue, MsTimerOwner::App(id), timer);
        }
    }

    /// Call reached Null: count it and free its channel
    fn finish_call(&mut self, queue: &mut MessageQueue, id: TxnId) {
        let connected = self.call(id).is_some_and(|c| c.connected);
        self.set_call_state(id, CcState::Null);
        if connected {
            self.stats.inc(Counter::CallsCleared);
        } else {
            self.stats.inc(Counter::CallsFailed);
        }
        self.release_app(queue, id, Cause::NormalRelease);
    }

    pub(super) fn originate(&mut self, queue: &mut MessageQueue, callee: Imsi, bandwidth_kbps: u32) {
        if !self.powered || self.mm_state != MmState::Updated {
            tracing::info!("cannot call {}: not registered ({})", callee, self.mm_state);
            self.stats.inc(Counter::CallsFailed);
            return;
        }

        let seq = self.next_call;
        self.next_call = self.next_call.wrapping_add(1);
        let app = MsApp {
            rr: RrState::Idle,
            est_cause: EstablishmentCause::MoCall,
            kind: ResourceKind::Voice,
            bandwidth_kbps,
            service: AppService::Call(MsCall {
                dir: CallDir::Mo { callee },
                state: CcState::Null,
                release_attempts: 0,
                connected: false,
            }),
        };
        let Some(id) = self.create_app(MsAppKey::Call(seq), app) else {
            self.stats.inc(Counter::CallsFailed);
            return;
        };
        tracing::info!("calling {} with app {}", callee, id);
        self.stats.inc(Counter::CallAttempts);
        self.rr_establish(queue, id);
    }

    /// Clears every call of the MS
    pub(super) fn hang_up(&mut self, queue: &mut MessageQueue) {
        let calls: Vec<(TxnId, CcState)> = self
            .apps
            .iter()
            .filter_map(|(id, _, app)| app.call().map(|c| (id, c.state)))
            .collect();
        if calls.is_empty() {
            tracing::debug!("hang up without call");
        }

        for (id, state) in calls {
            match state {
                CcState::Null => {
                    // No call control message sent yet
                    self.stats.inc(Counter::CallsFailed);
                    self.release_app(queue, id, Cause::NormalRelease);
                }
                CcState::DisconnectRequest | CcState::DisconnectIndication | CcState::ReleaseRequest => {}
                _ => self.send_disconnect(queue, id, Cause::NormalClearing),
            }
        }
    }

    fn send_disconnect(&mut self, queue: &mut MessageQueue, id: TxnId, cause: Cause) {
        self.cancel_cc_timers(queue, id);
        let ti = self.call_ti(id);
        self.send_dtap(queue, id, ti, &Disconnect { cause });
        self.set_call_state(id, CcState::DisconnectRequest);
        self.arm(queue, MsTimerOwner::App(id), MsTimer::T305);
    }

    /// Sends RELEASE and waits for the answer. `repeat` marks a retransmission
    /// within the same release attempt.
    fn send_release(&mut self, queue: &mut MessageQueue, id: TxnId, cause: Cause, repeat: bool) {
        self.cancel_cc_timers(queue, id);
        let ti = self.call_ti(id);
        self.send_dtap(queue, id, ti, &Release { cause });
        if let Some(call) = self.apps.get_mut(id).and_then(|a| a.call_mut()) {
            call.release_attempts = if repeat { call.release_attempts + 1 } else { 1 };
        }
        self.set_call_state(id, CcState::ReleaseRequest);
        self.arm(queue, MsTimerOwner::App(id), MsTimer::T308);
    }

    pub(super) fn on_cc_channel_ready(&mut self, queue: &mut MessageQueue, id: TxnId) {
        match self.call(id).map(|c| c.dir) {
            Some(CallDir::Mo { .. }) => {
                let pdu = CmServiceRequest {
                    imsi: self.imsi,
                    service: ResourceKind::Voice,
                };
                self.send_dtap(queue, id, TiField::NONE, &pdu);
            }
            Some(CallDir::Mt) => {
                self.send_dtap(queue, id, TiField::NONE, &PagingResponse { imsi: self.imsi });
            }
            None => return,
        }
        self.arm(queue, MsTimerOwner::App(id), MsTimer::T3230);
    }

    pub(super) fn on_cc_channel_failed(&mut self, queue: &mut MessageQueue, id: TxnId) {
        tracing::info!("call {} failed, no channel", id);
        self.stats.inc(Counter::CallsFailed);
        self.release_app(queue, id, Cause::NormalRelease);
    }

    pub(super) fn on_cc_channel_lost(&mut self, queue: &mut MessageQueue, id: TxnId) {
        self.cancel_cc_timers(queue, id);
        self.finish_call(queue, id);
    }

    pub(super) fn on_t3230(&mut self, queue: &mut MessageQueue, id: TxnId) {
        if self.call_state(id) != Some(CcState::Null) {
            return;
        }
        tracing::info!("no answer to service request of call {}", id);
        self.stats.inc(Counter::CallsFailed);
        self.release_app(queue, id, Cause::NormalRelease);
    }

    pub(super) fn on_cm_service_accept(&mut self, queue: &mut MessageQueue, id: TxnId) {
        let Some(call) = self.call(id) else {
            tracing::warn!("service accept for app {} without call", id);
            return;
        };
        let CallDir::Mo { callee } = call.dir else {
            return;
        };
        if call.state != CcState::Null {
            return;
        }
        let bandwidth_kbps = self.apps.get(id).map(|a| a.bandwidth_kbps).unwrap_or(0);

        self.disarm(queue, MsTimerOwner::App(id), MsTimer::T3230);
        let ti = self.call_ti(id);
        let pdu = Setup {
            party: callee,
            kind: ResourceKind::Voice,
            bandwidth_kbps,
        };
        self.send_dtap(queue, id, ti, &pdu);
        self.set_call_state(id, CcState::CallInitiated);
        self.arm(queue, MsTimerOwner::App(id), MsTimer::T303);
    }

    pub(super) fn on_cm_service_reject(&mut self, queue: &mut MessageQueue, id: TxnId, cause: Cause) {
        if self.call(id).is_none() {
            return;
        }
        tracing::info!("service request of call {} rejected: {}", id, cause);
        self.stats.inc(Counter::CallsFailed);
        self.release_app(queue, id, Cause::NormalRelease);
    }

    pub(super) fn rx_cc(&mut self, queue: &mut MessageQueue, id: TxnId, msg_type: u64, bytes: &[u8]) {
        let Some(state) = self.call_state(id) else {
            tracing::warn!("call control message for app {} without call", id);
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let dir = self.call(id).map(|c| c.dir);
        let is_mo = matches!(dir, Some(CallDir::Mo { .. }));

        match CcMsgType::try_from(msg_type) {
            Ok(CcMsgType::Setup) if !is_mo && state == CcState::Null => {
                if codec::parse::<Setup>(bytes).is_some() {
                    self.rx_setup(queue, id);
                }
            }
            Ok(CcMsgType::CallProceeding) if is_mo && state == CcState::CallInitiated => {
                self.disarm(queue, MsTimerOwner::App(id), MsTimer::T303);
                self.set_call_state(id, CcState::Proceeding);
                self.arm(queue, MsTimerOwner::App(id), MsTimer::T310);
            }
            Ok(CcMsgType::Alerting) if is_mo && matches!(state, CcState::CallInitiated | CcState::Proceeding) => {
                self.disarm(queue, MsTimerOwner::App(id), MsTimer::T303);
                self.disarm(queue, MsTimerOwner::App(id), MsTimer::T310);
                self.set_call_state(id, CcState::Alerting);
                self.arm(queue, MsTimerOwner::App(id), MsTimer::T301);
            }
            Ok(CcMsgType::Connect)
                if is_mo && matches!(state, CcState::CallInitiated | CcState::Proceeding | CcState::Alerting) =>
            {
                self.cancel_cc_timers(queue, id);
                let ti = self.call_ti(id);
                self.send_dtap(queue, id, ti, &ConnectAck);
                self.call_connected(id);
            }
            Ok(CcMsgType::ConnectAck) if !is_mo && state == CcState::ConnectRequest => {
                self.disarm(queue, MsTimerOwner::App(id), MsTimer::T313);
                self.call_connected(id);
            }
            Ok(CcMsgType::Disconnect) => {
                let Some((_, pdu)) = codec::parse::<Disconnect>(bytes) else {
                    return;
                };
                match state {
                    CcState::Null | CcState::ReleaseRequest => {}
                    _ => {
                        tracing::info!("call {} disconnected by network: {}", id, pdu.cause);
                        self.set_call_state(id, CcState::DisconnectIndication);
                        self.send_release(queue, id, Cause::NormalClearing, false);
                    }
                }
            }
            Ok(CcMsgType::Release) => {
                let Some((_, pdu)) = codec::parse::<Release>(bytes) else {
                    return;
                };
                self.cancel_cc_timers(queue, id);
                if state != CcState::ReleaseRequest {
                    let ti = self.call_ti(id);
                    self.send_dtap(queue, id, ti, &ReleaseComplete { cause: pdu.cause });
                }
                self.finish_call(queue, id);
            }
            Ok(CcMsgType::ReleaseComplete) => {
                if codec::parse::<ReleaseComplete>(bytes).is_some() {
                    self.cancel_cc_timers(queue, id);
                    self.finish_call(queue, id);
                }
            }
            Ok(other) => {
                tracing::warn!("unexpected CC {} in state {} for call {}", other, state, id);
                self.stats.inc(Counter::DroppedMessages);
            }
            Err(_) => {
                tracing::warn!("unknown CC message type {:#04x}", msg_type);
                self.stats.inc(Counter::DroppedMessages);
            }
        }
    }

    fn call_connected(&mut self, id: TxnId) {
        if let Some(call) = self.apps.get_mut(id).and_then(|a| a.call_mut()) {
            call.connected = true;
        }
        self.set_call_state(id, CcState::Active);
        self.stats.inc(Counter::CallsConnected);
        tracing::info!("call {} connected", id);
    }

    /// Incoming call: confirm and alert the user
    fn rx_setup(&mut self, queue: &mut MessageQueue, id: TxnId) {
        self.disarm(queue, MsTimerOwner::App(id), MsTimer::T3230);
        let ti = self.call_ti(id);
        self.set_call_state(id, CcState::CallPresent);
        self.send_dtap(queue, id, ti, &CallConfirmed);
        self.set_call_state(id, CcState::CallConfirmed);
        self.send_dtap(queue, id, ti, &Alerting);
        self.set_call_state(id, CcState::Alerting);
        self.arm(queue, MsTimerOwner::App(id), MsTimer::AnswerDelay);
    }

    pub(super) fn on_answer_delay(&mut self, queue: &mut MessageQueue, id: TxnId) {
        if self.call_state(id) != Some(CcState::Alerting) {
            return;
        }
        tracing::info!("answering call {}", id);
        let ti = self.call_ti(id);
        self.send_dtap(queue, id, ti, &Connect);
        self.set_call_state(id, CcState::ConnectRequest);
        self.arm(queue, MsTimerOwner::App(id), MsTimer::T313);
    }

    /// T301, T303, T310 or T313: the network did not progress the call
    pub(super) fn on_cc_guard_expiry(&mut self, queue: &mut MessageQueue, id: TxnId, timer: MsTimer) {
        let Some(state) = self.call_state(id) else {
            return;
        };
        tracing::info!("{:?} expired for call {} in state {}", timer, id, state);
        self.send_disconnect(queue, id, Cause::RecoveryOnTimerExpiry);
    }

    pub(super) fn on_t305(&mut self, queue: &mut MessageQueue, id: TxnId) {
        if self.call_state(id) != Some(CcState::DisconnectRequest) {
            return;
        }
        self.send_release(queue, id, Cause::RecoveryOnTimerExpiry, false);
    }

    pub(super) fn on_t308(&mut self, queue: &mut MessageQueue, id: TxnId) {
        let Some(call) = self.call(id) else {
            return;
        };
        if call.state != CcState::ReleaseRequest {
            return;
        }
        let max = self.config.config().limits.max_release_attempts;
        if call.release_attempts < max {
            self.send_release(queue, id, Cause::RecoveryOnTimerExpiry, true);
        } else {
            tracing::info!("no answer to release of call {}, clearing locally", id);
            self.finish_call(queue, id);
        }
    }
}
