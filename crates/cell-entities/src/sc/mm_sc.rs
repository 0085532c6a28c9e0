use cell_core::Imsi;
use cell_pdus::map::pdus::cancel_location::{CancelLocation, PurgeMs};
use cell_pdus::map::pdus::update_location::{UpdateLocation, UpdateLocationAck};
use cell_pdus::mm::enums::mm_msg_type::MmMsgType;
use cell_pdus::mm::enums::update_type::UpdateType;
use cell_pdus::mm::pdus::cm_service_request::CmServiceRequest;
use cell_pdus::mm::pdus::imsi_detach_indication::ImsiDetachIndication;
use cell_pdus::mm::pdus::location_update_accept::LocationUpdateAccept;
use cell_pdus::mm::pdus::location_update_reject::LocationUpdateReject;
use cell_pdus::mm::pdus::location_update_request::LocationUpdateRequest;
use cell_pdus::mm::pdus::paging_response::PagingResponse;
use cell_pdus::{Cause, TiField};

use crate::MessageQueue;
use crate::codec;
use crate::components::TableErr;
use crate::sc::sc_txn::{ScService, ScTimer, ScTimerOwner};
use crate::sc::switching_center::{SwitchingCenter, Uplink, VlrRecord, new_txn};
use crate::stats::Counter;

impl SwitchingCenter {
    pub(super) fn rx_mm(&mut self, queue: &mut MessageQueue, up: &Uplink, msg_type: u64, bytes: &[u8]) {
        match MmMsgType::try_from(msg_type) {
            Ok(MmMsgType::LocationUpdateRequest) => {
                if let Some((_, pdu)) = codec::parse::<LocationUpdateRequest>(bytes) {
                    self.rx_location_update_request(queue, up, pdu);
                }
            }
            Ok(MmMsgType::ImsiDetachIndication) => {
                if let Some((_, pdu)) = codec::parse::<ImsiDetachIndication>(bytes) {
                    self.rx_imsi_detach(queue, pdu.imsi);
                }
            }
            Ok(MmMsgType::CmServiceRequest) => {
                if let Some((_, pdu)) = codec::parse::<CmServiceRequest>(bytes) {
                    self.rx_cm_service_request(queue, up, pdu);
                }
            }
            Ok(MmMsgType::PagingResponse) => {
                if let Some((_, pdu)) = codec::parse::<PagingResponse>(bytes) {
                    self.rx_paging_response(queue, up, pdu.imsi);
                }
            }
            Ok(other) => {
                tracing::warn!("unexpected MM {} from ms {}", other, up.ms);
                self.stats.inc(Counter::DroppedMessages);
            }
            Err(_) => {
                tracing::warn!("unknown MM message type {:#04x}", msg_type);
                self.stats.inc(Counter::DroppedMessages);
            }
        }
    }

    /// Records where the subscriber is and informs the HLR. Accepts without
    /// waiting for the HLR.
    fn rx_location_update_request(&mut self, queue: &mut MessageQueue, up: &Uplink, pdu: LocationUpdateRequest) {
        self.stats.inc(Counter::LocationUpdateAttempts);
        let txn = new_txn(up, pdu.imsi, queue.now(), ScService::Mm);
        let id = match self.create_txn(up.key(), txn) {
            Ok(id) => id,
            Err(e) => {
                let cause = match e {
                    TableErr::Exhausted => Cause::Congestion,
                    TableErr::DuplicateKey => Cause::MessageNotCompatibleWithState,
                };
                tracing::info!("location update of imsi {} rejected: {}", pdu.imsi, cause);
                self.stats.inc(Counter::LocationUpdateRejected);
                self.send_dtap(queue, up, TiField::NONE, &LocationUpdateReject { cause });
                return;
            }
        };

        let lac = self.lac_of_bs(up.bs);
        let record = VlrRecord {
            ms: up.ms,
            bs: up.bs,
            cell: up.cell,
            lac,
            last_update: queue.now(),
        };
        let known = self.vlr.insert(pdu.imsi, record).is_some();
        self.arm(queue, ScTimerOwner::Vlr(pdu.imsi), ScTimer::VlrLifetime);
        tracing::info!("imsi {} registered in lac {} ({}, old lac {})", pdu.imsi, lac, pdu.update_type, pdu.old_lac);

        if !known || pdu.update_type != UpdateType::Periodic {
            self.stats.inc(Counter::HlrUpdates);
            let ul = UpdateLocation {
                imsi: pdu.imsi,
                sc: self.node,
            };
            queue.send_pdu(self.hlr, TiField::NONE, &ul);
        }

        self.stats.inc(Counter::LocationUpdateSuccess);
        self.send_dtap(queue, up, TiField::NONE, &LocationUpdateAccept { lac });
        self.release_txn(queue, id, None);
    }

    fn purge(&mut self, queue: &mut MessageQueue, imsi: Imsi) {
        self.disarm(queue, ScTimerOwner::Vlr(imsi), ScTimer::VlrLifetime);
        queue.send_pdu(self.hlr, TiField::NONE, &PurgeMs { imsi, sc: self.node });
    }

    fn rx_imsi_detach(&mut self, queue: &mut MessageQueue, imsi: Imsi) {
        if self.vlr.remove(&imsi).is_none() {
            tracing::debug!("detach of unknown imsi {}", imsi);
            return;
        }
        tracing::info!("imsi {} detached", imsi);
        self.stats.inc(Counter::ImsiDetaches);
        self.purge(queue, imsi);
    }

    pub(super) fn on_vlr_lifetime(&mut self, queue: &mut MessageQueue, imsi: Imsi) {
        if self.vlr.remove(&imsi).is_some() {
            tracing::info!("vlr record of imsi {} expired", imsi);
            self.stats.inc(Counter::VlrRecordsExpired);
            self.purge(queue, imsi);
        }
    }

    pub(super) fn rx_update_location_ack(&mut self, bytes: &[u8]) {
        if codec::parse::<UpdateLocationAck>(bytes).is_none() {
            self.stats.inc(Counter::DroppedMessages);
        }
    }

    /// The subscriber registered at another SC
    pub(super) fn rx_cancel_location(&mut self, queue: &mut MessageQueue, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<CancelLocation>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        if self.vlr.remove(&pdu.imsi).is_some() {
            tracing::info!("imsi {} moved away, vlr record cancelled", pdu.imsi);
            self.disarm(queue, ScTimerOwner::Vlr(pdu.imsi), ScTimer::VlrLifetime);
        }
    }
}
