use cell_core::{Imsi, TxnId};
use cell_pdus::gtp::pdus::create_pdp_context::{CreatePdpContextRequest, CreatePdpContextResponse};
use cell_pdus::gtp::pdus::delete_pdp_context::{DeletePdpContextRequest, DeletePdpContextResponse};
use cell_pdus::sm::enums::sm_msg_type::SmMsgType;
use cell_pdus::sm::pdus::activate_pdp_context::{ActivatePdpContextAccept, ActivatePdpContextReject, ActivatePdpContextRequest};
use cell_pdus::sm::pdus::deactivate_pdp_context::{DeactivatePdpContextAccept, DeactivatePdpContextRequest};
use cell_pdus::{Cause, TiField};

use crate::MessageQueue;
use crate::codec;
use crate::components::TableErr;
use crate::sc::sc_txn::{ScPdp, ScPdpState, ScService, ScTimer, ScTimerOwner};
use crate::sc::switching_center::{SwitchingCenter, Uplink, new_txn};
use crate::stats::Counter;

impl SwitchingCenter {
    fn next_seq(&mut self) -> u16 {
        self.next_gtp_seq = self.next_gtp_seq.wrapping_add(1);
        self.next_gtp_seq
    }

    fn pdp_state(&self, id: TxnId) -> Option<ScPdpState> {
        self.txns.get(id).and_then(|t| t.pdp()).map(|p| p.state)
    }

    /// Transaction holding the context `nsapi` of `imsi`
    fn find_pdp(&self, imsi: Imsi, nsapi: u8) -> Option<TxnId> {
        self.txns
            .iter()
            .find(|(_, _, t)| t.imsi == imsi && t.pdp().is_some_and(|p| p.nsapi == nsapi))
            .map(|(id, _, _)| id)
    }

    pub(super) fn rx_sm(&mut self, queue: &mut MessageQueue, up: &Uplink, msg_type: u64, bytes: &[u8]) {
        match SmMsgType::try_from(msg_type) {
            Ok(SmMsgType::ActivatePdpContextRequest) => {
                if let Some((ti, pdu)) = codec::parse::<ActivatePdpContextRequest>(bytes) {
                    self.rx_activate_request(queue, up, ti.reply(), pdu);
                }
            }
            Ok(SmMsgType::DeactivatePdpContextRequest) => {
                if let Some((ti, pdu)) = codec::parse::<DeactivatePdpContextRequest>(bytes) {
                    self.rx_ms_deactivate_request(queue, up, ti.reply(), pdu);
                }
            }
            Ok(SmMsgType::DeactivatePdpContextAccept) => {
                let Some((_, pdu)) = codec::parse::<DeactivatePdpContextAccept>(bytes) else {
                    return;
                };
                let id = self.txns.lookup(&up.key());
                match id.filter(|id| self.pdp_state(*id) == Some(ScPdpState::NetDeactivatePending)) {
                    Some(id) => {
                        tracing::info!("pdp context {} of ms {} deactivated by network", pdu.nsapi, up.ms);
                        self.stats.inc(Counter::PdpDeactivated);
                        self.release_txn(queue, id, None);
                    }
                    None => tracing::debug!("stray deactivate accept from ms {}", up.ms),
                }
            }
            Ok(other) => {
                tracing::warn!("unexpected SM {} from ms {}", other, up.ms);
                self.stats.inc(Counter::DroppedMessages);
            }
            Err(_) => {
                tracing::warn!("unknown SM message type {:#04x}", msg_type);
                self.stats.inc(Counter::DroppedMessages);
            }
        }
    }

    fn rx_activate_request(&mut self, queue: &mut MessageQueue, up: &Uplink, ti: TiField, pdu: ActivatePdpContextRequest) {
        let nsapi = pdu.nsapi;
        let reject = |cause| ActivatePdpContextReject { nsapi, cause };

        if let Some(id) = self.txns.lookup(&up.key()) {
            // Retransmission from the MS
            match self.txns.get(id).and_then(|t| t.pdp()) {
                Some(pdp) if pdp.state == ScPdpState::Active => {
                    let accept = ActivatePdpContextAccept {
                        nsapi,
                        pdp_address: pdp.address.unwrap_or(0),
                    };
                    self.send_dtap(queue, up, ti, &accept);
                }
                _ => tracing::debug!("activation of pdp context {} already under way", nsapi),
            }
            return;
        }

        let Some(imsi) = self.imsi_of_ms(up.ms) else {
            tracing::info!("pdp activation from unregistered ms {}", up.ms);
            self.send_dtap(queue, up, ti, &reject(Cause::ImsiUnknownInVlr));
            return;
        };
        let Some(gateway) = self.gateway else {
            tracing::info!("no gateway configured, rejecting pdp context {}", nsapi);
            self.send_dtap(queue, up, ti, &reject(Cause::ServiceNotSupported));
            return;
        };

        let seq = self.next_seq();
        let pdp = ScPdp {
            nsapi,
            state: ScPdpState::CreatePending,
            ti,
            seq,
            attempts: 1,
            bandwidth_kbps: pdu.bandwidth_kbps,
            address: None,
        };
        let id = match self.create_txn(up.key(), new_txn(up, imsi, queue.now(), ScService::Pdp(pdp))) {
            Ok(id) => id,
            Err(e) => {
                let cause = match e {
                    TableErr::Exhausted => Cause::InsufficientResources,
                    TableErr::DuplicateKey => Cause::MessageNotCompatibleWithState,
                };
                self.send_dtap(queue, up, ti, &reject(cause));
                return;
            }
        };

        self.stats.inc(Counter::PdpActivateAttempts);
        tracing::info!("creating pdp context {} of imsi {} at gateway {}", nsapi, imsi, gateway);
        let req = CreatePdpContextRequest {
            seq,
            imsi,
            nsapi,
            bandwidth_kbps: pdu.bandwidth_kbps,
        };
        queue.send_pdu(gateway, TiField::NONE, &req);
        self.arm(queue, ScTimerOwner::Txn(id), ScTimer::T3Response);
    }

    pub(super) fn on_t3_response(&mut self, queue: &mut MessageQueue, id: TxnId) {
        let Some(gateway) = self.gateway else {
            return;
        };
        let Some(txn) = self.txns.get(id) else {
            return;
        };
        let imsi = txn.imsi;
        let Some(pdp) = txn.pdp().filter(|p| p.state == ScPdpState::CreatePending) else {
            return;
        };
        let (nsapi, ti, attempts, bandwidth_kbps, seq) = (pdp.nsapi, pdp.ti, pdp.attempts, pdp.bandwidth_kbps, pdp.seq);

        if attempts < self.config.config().limits.n3_requests {
            tracing::debug!("T3-RESPONSE expired, repeating create of pdp context {}", nsapi);
            self.stats.inc(Counter::GtpRetransmissions);
            if let Some(pdp) = self.txns.get_mut(id).and_then(|t| t.pdp_mut()) {
                pdp.attempts += 1;
            }
            let req = CreatePdpContextRequest {
                seq,
                imsi,
                nsapi,
                bandwidth_kbps,
            };
            queue.send_pdu(gateway, TiField::NONE, &req);
            self.arm(queue, ScTimerOwner::Txn(id), ScTimer::T3Response);
            return;
        }

        tracing::info!("gateway did not answer create of pdp context {} of imsi {}", nsapi, imsi);
        self.stats.inc(Counter::PdpRejected);
        let reject = ActivatePdpContextReject {
            nsapi,
            cause: Cause::TemporaryFailure,
        };
        self.send_dtap_txn(queue, id, ti, &reject);
        self.release_txn(queue, id, None);
    }

    pub(super) fn rx_create_pdp_response(&mut self, queue: &mut MessageQueue, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<CreatePdpContextResponse>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let id = self.find_pdp(pdu.imsi, pdu.nsapi).filter(|id| {
            self.txns
                .get(*id)
                .and_then(|t| t.pdp())
                .is_some_and(|p| p.state == ScPdpState::CreatePending && p.seq == pdu.seq)
        });

        let Some(id) = id else {
            tracing::info!("create response {} for unknown pdp context {} of imsi {}", pdu.seq, pdu.nsapi, pdu.imsi);
            if pdu.cause == Cause::NormalRelease {
                // Context exists at the gateway but nobody wants it anymore
                self.send_gateway_delete(queue, pdu.imsi, pdu.nsapi);
            }
            return;
        };
        self.disarm(queue, ScTimerOwner::Txn(id), ScTimer::T3Response);
        let ti = self.txns.get(id).and_then(|t| t.pdp()).map(|p| p.ti).unwrap_or(TiField::NONE);

        if pdu.cause != Cause::NormalRelease {
            tracing::info!("gateway refused pdp context {} of imsi {}: {}", pdu.nsapi, pdu.imsi, pdu.cause);
            self.stats.inc(Counter::PdpRejected);
            let reject = ActivatePdpContextReject {
                nsapi: pdu.nsapi,
                cause: pdu.cause,
            };
            self.send_dtap_txn(queue, id, ti, &reject);
            self.release_txn(queue, id, None);
            return;
        }

        if let Some(pdp) = self.txns.get_mut(id).and_then(|t| t.pdp_mut()) {
            pdp.state = ScPdpState::Active;
            pdp.address = Some(pdu.pdp_address);
        }
        self.stats.inc(Counter::PdpActivated);
        tracing::info!("pdp context {} of imsi {} active, address {:#010x}", pdu.nsapi, pdu.imsi, pdu.pdp_address);
        let accept = ActivatePdpContextAccept {
            nsapi: pdu.nsapi,
            pdp_address: pdu.pdp_address,
        };
        self.send_dtap_txn(queue, id, ti, &accept);
    }

    fn send_gateway_delete(&mut self, queue: &mut MessageQueue, imsi: Imsi, nsapi: u8) {
        let Some(gateway) = self.gateway else {
            return;
        };
        let req = DeletePdpContextRequest {
            seq: self.next_seq(),
            imsi,
            nsapi,
            cause: Cause::RegularDeactivation,
        };
        queue.send_pdu(gateway, TiField::NONE, &req);
    }

    fn rx_ms_deactivate_request(
        &mut self,
        queue: &mut MessageQueue,
        up: &Uplink,
        ti: TiField,
        pdu: DeactivatePdpContextRequest,
    ) {
        self.send_dtap(queue, up, ti, &DeactivatePdpContextAccept { nsapi: pdu.nsapi });
        let Some(id) = self.txns.lookup(&up.key()) else {
            tracing::debug!("deactivate request for unknown pdp context {} of ms {}", pdu.nsapi, up.ms);
            return;
        };
        let Some(txn) = self.txns.get(id) else {
            return;
        };
        let imsi = txn.imsi;
        if self.pdp_state(id) == Some(ScPdpState::Active) {
            self.send_gateway_delete(queue, imsi, pdu.nsapi);
            self.stats.inc(Counter::PdpDeactivated);
        }
        tracing::info!("pdp context {} of imsi {} deactivated by ms: {}", pdu.nsapi, imsi, pdu.cause);
        self.release_txn(queue, id, None);
    }

    /// The gateway tears a context down
    pub(super) fn rx_gateway_delete_request(&mut self, queue: &mut MessageQueue, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<DeletePdpContextRequest>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        if let Some(gateway) = self.gateway {
            let resp = DeletePdpContextResponse {
                seq: pdu.seq,
                imsi: pdu.imsi,
                nsapi: pdu.nsapi,
                cause: Cause::NormalRelease,
            };
            queue.send_pdu(gateway, TiField::NONE, &resp);
        }

        let Some(id) = self.find_pdp(pdu.imsi, pdu.nsapi) else {
            tracing::debug!("gateway deleted unknown pdp context {} of imsi {}", pdu.nsapi, pdu.imsi);
            return;
        };
        match self.pdp_state(id) {
            Some(ScPdpState::Active) => {
                tracing::info!("gateway deleted pdp context {} of imsi {}: {}", pdu.nsapi, pdu.imsi, pdu.cause);
                if let Some(pdp) = self.txns.get_mut(id).and_then(|t| t.pdp_mut()) {
                    pdp.state = ScPdpState::NetDeactivatePending;
                    pdp.attempts = 0;
                }
                self.send_net_deactivate(queue, id, pdu.cause);
            }
            Some(ScPdpState::CreatePending) => {
                self.disarm(queue, ScTimerOwner::Txn(id), ScTimer::T3Response);
                let ti = self.txns.get(id).and_then(|t| t.pdp()).map(|p| p.ti).unwrap_or(TiField::NONE);
                let reject = ActivatePdpContextReject {
                    nsapi: pdu.nsapi,
                    cause: pdu.cause,
                };
                self.stats.inc(Counter::PdpRejected);
                self.send_dtap_txn(queue, id, ti, &reject);
                self.release_txn(queue, id, None);
            }
            _ => {}
        }
    }

    fn send_net_deactivate(&mut self, queue: &mut MessageQueue, id: TxnId, cause: Cause) {
        let Some(pdp) = self.txns.get_mut(id).and_then(|t| t.pdp_mut()) else {
            return;
        };
        pdp.attempts += 1;
        let (nsapi, ti) = (pdp.nsapi, pdp.ti);
        self.send_dtap_txn(queue, id, ti, &DeactivatePdpContextRequest { nsapi, cause });
        self.arm(queue, ScTimerOwner::Txn(id), ScTimer::T3395);
    }

    pub(super) fn on_t3395(&mut self, queue: &mut MessageQueue, id: TxnId) {
        let Some(pdp) = self.txns.get(id).and_then(|t| t.pdp()) else {
            return;
        };
        if pdp.state != ScPdpState::NetDeactivatePending {
            return;
        }
        if pdp.attempts < self.config.config().limits.max_sm_attempts {
            self.send_net_deactivate(queue, id, Cause::RegularDeactivation);
        } else {
            tracing::info!("ms did not confirm deactivation of pdp context {}", pdp.nsapi);
            self.stats.inc(Counter::PdpDeactivated);
            self.abort_txn(queue, id, Cause::RecoveryOnTimerExpiry, None);
        }
    }

    /// Radio connection of a context went away, the gateway side goes too
    pub(super) fn pdp_connection_lost(&mut self, queue: &mut MessageQueue, id: TxnId) {
        let Some(txn) = self.txns.get(id) else {
            return;
        };
        let imsi = txn.imsi;
        let Some(pdp) = txn.pdp() else {
            return;
        };
        let nsapi = pdp.nsapi;
        if pdp.state != ScPdpState::CreatePending {
            self.send_gateway_delete(queue, imsi, nsapi);
            self.stats.inc(Counter::PdpDeactivated);
        }
    }

    pub(super) fn rx_delete_pdp_response(&mut self, bytes: &[u8]) {
        match codec::parse::<DeletePdpContextResponse>(bytes) {
            Some((_, pdu)) => tracing::debug!("gateway confirmed delete of pdp context {} of imsi {}", pdu.nsapi, pdu.imsi),
            None => self.stats.inc(Counter::DroppedMessages),
        }
    }
}
