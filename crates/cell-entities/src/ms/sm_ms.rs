use cell_core::{ResourceKind, TxnId};
use cell_pdus::rr::enums::establishment_cause::EstablishmentCause;
use cell_pdus::sm::enums::sm_msg_type::SmMsgType;
use cell_pdus::sm::pdus::activate_pdp_context::{ActivatePdpContextAccept, ActivatePdpContextReject, ActivatePdpContextRequest};
use cell_pdus::sm::pdus::deactivate_pdp_context::{DeactivatePdpContextAccept, DeactivatePdpContextRequest};
use cell_pdus::{Cause, TiField};

use crate::MessageQueue;
use crate::codec;
use crate::ms::app::{AppService, MmState, MsApp, MsAppKey, MsPdp, MsTimer, MsTimerOwner, RrState, SmState};
use crate::ms::mobile_station::MobileStation;
use crate::stats::Counter;

impl MobileStation {
    fn pdp(&self, id: TxnId) -> Option<&MsPdp> {
        self.apps.get(id).and_then(|a| a.pdp())
    }

    fn set_pdp_state(&mut self, id: TxnId, state: SmState) {
        if let Some(pdp) = self.apps.get_mut(id).and_then(|a| a.pdp_mut()) {
            tracing::debug!("pdp context {}: {:?} -> {:?}", pdp.nsapi, pdp.state, state);
            pdp.state = state;
        }
    }

    pub(super) fn activate_pdp(&mut self, queue: &mut MessageQueue, nsapi: u8, bandwidth_kbps: u32) {
        if !self.powered || self.mm_state != MmState::Updated {
            tracing::info!("cannot activate pdp context {}: not registered ({})", nsapi, self.mm_state);
            self.stats.inc(Counter::PdpRejected);
            return;
        }
        let app = MsApp {
            rr: RrState::Idle,
            est_cause: EstablishmentCause::PacketData,
            kind: ResourceKind::Data,
            bandwidth_kbps,
            service: AppService::Pdp(MsPdp {
                nsapi,
                state: SmState::Inactive,
                attempts: 0,
                address: None,
            }),
        };
        let Some(id) = self.create_app(MsAppKey::Pdp(nsapi), app) else {
            self.stats.inc(Counter::PdpRejected);
            return;
        };
        tracing::info!("activating pdp context {} with app {}", nsapi, id);
        self.stats.inc(Counter::PdpActivateAttempts);
        self.rr_establish(queue, id);
    }

    pub(super) fn deactivate_pdp(&mut self, queue: &mut MessageQueue, nsapi: u8) {
        let Some(id) = self.apps.lookup(&MsAppKey::Pdp(nsapi)) else {
            tracing::debug!("pdp context {} not active", nsapi);
            return;
        };
        match self.pdp(id).map(|p| p.state) {
            Some(SmState::Active) => {
                if let Some(pdp) = self.apps.get_mut(id).and_then(|a| a.pdp_mut()) {
                    pdp.attempts = 0;
                }
                self.send_deactivate_request(queue, id);
            }
            Some(SmState::InactivePending) => {}
            _ => {
                // Activation still under way, abandon it
                tracing::info!("abandoning activation of pdp context {}", nsapi);
                self.release_app(queue, id, Cause::NormalRelease);
            }
        }
    }

    pub(super) fn on_sm_channel_ready(&mut self, queue: &mut MessageQueue, id: TxnId) {
        if let Some(pdp) = self.apps.get_mut(id).and_then(|a| a.pdp_mut()) {
            pdp.attempts = 0;
        }
        self.send_activate_request(queue, id);
    }

    pub(super) fn on_sm_channel_failed(&mut self, queue: &mut MessageQueue, id: TxnId) {
        tracing::info!("pdp activation of app {} failed, no channel", id);
        self.stats.inc(Counter::PdpRejected);
        self.release_app(queue, id, Cause::NormalRelease);
    }

    pub(super) fn on_sm_channel_lost(&mut self, queue: &mut MessageQueue, id: TxnId) {
        if self.pdp(id).is_some_and(|p| p.state == SmState::Active) {
            self.stats.inc(Counter::PdpDeactivated);
        }
        self.release_app(queue, id, Cause::NormalRelease);
    }

    fn send_activate_request(&mut self, queue: &mut MessageQueue, id: TxnId) {
        let Some(app) = self.apps.get_mut(id) else {
            return;
        };
        let bandwidth_kbps = app.bandwidth_kbps;
        let Some(pdp) = app.pdp_mut() else {
            return;
        };
        pdp.attempts += 1;
        let nsapi = pdp.nsapi;
        self.set_pdp_state(id, SmState::ActivePending);
        let ti = TiField::originator(nsapi & 0x07);
        self.send_dtap(queue, id, ti, &ActivatePdpContextRequest { nsapi, bandwidth_kbps });
        self.arm(queue, MsTimerOwner::App(id), MsTimer::T3380);
    }

    fn send_deactivate_request(&mut self, queue: &mut MessageQueue, id: TxnId) {
        let Some(pdp) = self.apps.get_mut(id).and_then(|a| a.pdp_mut()) else {
            return;
        };
        pdp.attempts += 1;
        let nsapi = pdp.nsapi;
        self.set_pdp_state(id, SmState::InactivePending);
        let pdu = DeactivatePdpContextRequest {
            nsapi,
            cause: Cause::RegularDeactivation,
        };
        self.send_dtap(queue, id, TiField::originator(nsapi & 0x07), &pdu);
        self.arm(queue, MsTimerOwner::App(id), MsTimer::T3390);
    }

    pub(super) fn on_t3380(&mut self, queue: &mut MessageQueue, id: TxnId) {
        let Some(pdp) = self.pdp(id) else {
            return;
        };
        if pdp.state != SmState::ActivePending {
            return;
        }
        let max = self.config.config().limits.max_sm_attempts;
        if pdp.attempts < max {
            tracing::debug!("T3380 expired, repeating activation of pdp context {}", pdp.nsapi);
            self.send_activate_request(queue, id);
        } else {
            tracing::info!("pdp context {} not activated after {} requests", pdp.nsapi, pdp.attempts);
            self.stats.inc(Counter::PdpRejected);
            self.release_app(queue, id, Cause::NormalRelease);
        }
    }

    pub(super) fn on_t3390(&mut self, queue: &mut MessageQueue, id: TxnId) {
        let Some(pdp) = self.pdp(id) else {
            return;
        };
        if pdp.state != SmState::InactivePending {
            return;
        }
        let max = self.config.config().limits.max_sm_attempts;
        if pdp.attempts < max {
            self.send_deactivate_request(queue, id);
        } else {
            tracing::info!("no answer to deactivation of pdp context {}, deactivating locally", pdp.nsapi);
            self.stats.inc(Counter::PdpDeactivated);
            self.release_app(queue, id, Cause::NormalRelease);
        }
    }

    pub(super) fn rx_sm(&mut self, queue: &mut MessageQueue, id: TxnId, msg_type: u64, bytes: &[u8]) {
        let Some(state) = self.pdp(id).map(|p| p.state) else {
            tracing::warn!("session management message for app {} without pdp context", id);
            self.stats.inc(Counter::DroppedMessages);
            return;
        };

        match SmMsgType::try_from(msg_type) {
            Ok(SmMsgType::ActivatePdpContextAccept) if state == SmState::ActivePending => {
                let Some((_, pdu)) = codec::parse::<ActivatePdpContextAccept>(bytes) else {
                    return;
                };
                self.disarm(queue, MsTimerOwner::App(id), MsTimer::T3380);
                if let Some(pdp) = self.apps.get_mut(id).and_then(|a| a.pdp_mut()) {
                    pdp.address = Some(pdu.pdp_address);
                }
                self.set_pdp_state(id, SmState::Active);
                self.stats.inc(Counter::PdpActivated);
                tracing::info!("pdp context {} active, address {:#010x}", pdu.nsapi, pdu.pdp_address);
            }
            Ok(SmMsgType::ActivatePdpContextReject) if state == SmState::ActivePending => {
                let Some((_, pdu)) = codec::parse::<ActivatePdpContextReject>(bytes) else {
                    return;
                };
                tracing::info!("activation of pdp context {} rejected: {}", pdu.nsapi, pdu.cause);
                self.stats.inc(Counter::PdpRejected);
                self.release_app(queue, id, Cause::NormalRelease);
            }
            Ok(SmMsgType::DeactivatePdpContextAccept) if state == SmState::InactivePending => {
                if codec::parse::<DeactivatePdpContextAccept>(bytes).is_none() {
                    return;
                }
                self.stats.inc(Counter::PdpDeactivated);
                self.release_app(queue, id, Cause::NormalRelease);
            }
            Ok(SmMsgType::DeactivatePdpContextRequest) => {
                let Some((ti, pdu)) = codec::parse::<DeactivatePdpContextRequest>(bytes) else {
                    return;
                };
                tracing::info!("pdp context {} deactivated by network: {}", pdu.nsapi, pdu.cause);
                self.send_dtap(queue, id, ti.reply(), &DeactivatePdpContextAccept { nsapi: pdu.nsapi });
                self.stats.inc(Counter::PdpDeactivated);
                self.release_app(queue, id, Cause::NormalRelease);
            }
            Ok(other) => {
                tracing::warn!("unexpected SM {} in state {:?}", other, state);
                self.stats.inc(Counter::DroppedMessages);
            }
            Err(_) => {
                tracing::warn!("unknown SM message type {:#04x}", msg_type);
                self.stats.inc(Counter::DroppedMessages);
            }
        }
    }
}
