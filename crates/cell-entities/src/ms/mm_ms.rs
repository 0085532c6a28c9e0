use cell_core::{CellId, ResourceKind, TxnId};
use cell_pdus::mm::enums::mm_msg_type::MmMsgType;
use cell_pdus::mm::enums::update_type::UpdateType;
use cell_pdus::mm::pdus::cm_service_response::CmServiceReject;
use cell_pdus::mm::pdus::imsi_detach_indication::ImsiDetachIndication;
use cell_pdus::mm::pdus::location_update_accept::LocationUpdateAccept;
use cell_pdus::mm::pdus::location_update_reject::LocationUpdateReject;
use cell_pdus::mm::pdus::location_update_request::LocationUpdateRequest;
use cell_pdus::rr::enums::establishment_cause::EstablishmentCause;
use cell_pdus::{Cause, TiField};

use crate::MessageQueue;
use crate::codec;
use crate::ms::app::{AppService, MmProc, MmState, MsApp, MsAppKey, MsTimer, MsTimerOwner, RrState};
use crate::ms::mobile_station::MobileStation;
use crate::stats::Counter;

impl MobileStation {
    pub(super) fn power_on(&mut self, queue: &mut MessageQueue) {
        if self.powered {
            tracing::debug!("already switched on");
            return;
        }
        tracing::info!("switched on in cell {}", self.cell);
        self.powered = true;
        self.mm_state = MmState::Null;
        self.start_location_update(queue, UpdateType::ImsiAttach, true);
    }

    /// Aborts all applications, then detaches if registered
    pub(super) fn power_off(&mut self, queue: &mut MessageQueue) {
        if !self.powered {
            tracing::debug!("already switched off");
            return;
        }
        tracing::info!("switching off");
        self.powered = false;

        for id in self.apps.ids() {
            let is_call = self.apps.get(id).and_then(|a| a.call()).map(|c| c.connected);
            match is_call {
                Some(true) => self.stats.inc(Counter::CallsCleared),
                Some(false) => self.stats.inc(Counter::CallsFailed),
                None => {}
            }
            self.release_app(queue, id, Cause::NormalRelease);
        }
        self.timers.cancel_owner(queue, MsTimerOwner::Mobile);

        let registered = self.mm_state == MmState::Updated;
        self.mm_state = MmState::Detached;
        self.registered_lac = None;
        self.lu_attempts = 0;
        if !registered {
            return;
        }

        let app = MsApp {
            rr: RrState::Idle,
            est_cause: EstablishmentCause::Detach,
            kind: ResourceKind::Control,
            bandwidth_kbps: 0,
            service: AppService::Mm(MmProc::Detach),
        };
        if let Some(id) = self.create_app(MsAppKey::Mm, app) {
            self.rr_establish(queue, id);
        }
    }

    /// Cell reselection while idle
    pub(super) fn camp_on(&mut self, queue: &mut MessageQueue, cell: CellId) {
        if self.config.config().bs_for_cell(cell).is_none() {
            tracing::warn!("cannot camp on unknown cell {}", cell);
            return;
        }
        if !self.apps.is_empty() {
            tracing::warn!("ignoring reselection to cell {} in dedicated mode", cell);
            return;
        }
        tracing::info!("camping on cell {}", cell);
        self.cell = cell;
        if !self.powered || self.mm_state == MmState::Rejected {
            return;
        }
        if self.lac_of(cell) != self.registered_lac {
            self.start_location_update(queue, UpdateType::Normal, true);
        }
    }

    /// Starts a location update. `fresh` starts a new sequence of attempts;
    /// retries after T3211 continue the current one.
    pub(super) fn start_location_update(&mut self, queue: &mut MessageQueue, update_type: UpdateType, fresh: bool) {
        if self.apps.lookup(&MsAppKey::Mm).is_some() {
            tracing::debug!("MM procedure already running");
            return;
        }
        if fresh {
            self.lu_attempts = 0;
            self.disarm(queue, MsTimerOwner::Mobile, MsTimer::T3211);
        }
        self.lu_type = update_type;
        self.lu_attempts += 1;
        self.mm_state = MmState::UpdateRequested;
        self.stats.inc(Counter::LocationUpdateAttempts);

        let app = MsApp {
            rr: RrState::Idle,
            est_cause: EstablishmentCause::LocationUpdating,
            kind: ResourceKind::Control,
            bandwidth_kbps: 0,
            service: AppService::Mm(MmProc::LocationUpdate(update_type)),
        };
        let Some(id) = self.create_app(MsAppKey::Mm, app) else {
            self.location_update_attempt_failed(queue);
            return;
        };
        tracing::info!("location update ({}) attempt {}", update_type, self.lu_attempts);
        self.rr_establish(queue, id);
    }

    fn location_update_attempt_failed(&mut self, queue: &mut MessageQueue) {
        let max = self.config.config().limits.max_location_update_attempts;
        if self.lu_attempts < max {
            tracing::debug!("location update attempt {} of {} failed", self.lu_attempts, max);
            self.arm(queue, MsTimerOwner::Mobile, MsTimer::T3211);
            return;
        }
        tracing::info!("location update failed after {} attempts", self.lu_attempts);
        self.mm_state = MmState::Failed;
        self.lu_attempts = 0;
        self.stats.inc(Counter::LocationUpdateFailures);
        self.arm(queue, MsTimerOwner::Mobile, MsTimer::T3212);
    }

    /// After the last application ends, catch up with a location area change
    /// caused by handover
    pub(super) fn check_location_after_release(&mut self, queue: &mut MessageQueue) {
        if !self.powered || !self.apps.is_empty() || self.mm_state != MmState::Updated {
            return;
        }
        if self.lac_of(self.cell) != self.registered_lac {
            tracing::info!("location area changed during connection");
            self.start_location_update(queue, UpdateType::Normal, true);
        }
    }

    pub(super) fn on_mm_channel_ready(&mut self, queue: &mut MessageQueue, id: TxnId, proc: MmProc) {
        match proc {
            MmProc::LocationUpdate(update_type) => {
                let pdu = LocationUpdateRequest {
                    update_type,
                    imsi: self.imsi,
                    old_lac: self.registered_lac.unwrap_or(0),
                };
                self.send_dtap(queue, id, TiField::NONE, &pdu);
                self.arm(queue, MsTimerOwner::App(id), MsTimer::T3210);
            }
            MmProc::Detach => {
                self.send_dtap(queue, id, TiField::NONE, &ImsiDetachIndication { imsi: self.imsi });
                self.stats.inc(Counter::ImsiDetaches);
                self.release_app(queue, id, Cause::NormalRelease);
            }
        }
    }

    /// Channel establishment failed or the channel was lost before the procedure ended
    pub(super) fn on_mm_channel_failed(&mut self, queue: &mut MessageQueue, id: TxnId, proc: MmProc) {
        self.release_app(queue, id, Cause::NormalRelease);
        match proc {
            MmProc::LocationUpdate(_) => self.location_update_attempt_failed(queue),
            MmProc::Detach => tracing::info!("detach not delivered"),
        }
    }

    pub(super) fn on_t3210(&mut self, queue: &mut MessageQueue, id: TxnId) {
        tracing::info!("no answer to location update");
        self.release_app(queue, id, Cause::NormalRelease);
        self.location_update_attempt_failed(queue);
    }

    pub(super) fn on_t3211(&mut self, queue: &mut MessageQueue) {
        if self.powered {
            self.start_location_update(queue, self.lu_type, false);
        }
    }

    pub(super) fn on_t3212(&mut self, queue: &mut MessageQueue) {
        if !self.powered {
            return;
        }
        let update_type = match self.mm_state {
            MmState::Updated => UpdateType::Periodic,
            _ => self.lu_type,
        };
        self.start_location_update(queue, update_type, true);
    }

    pub(super) fn rx_mm(&mut self, queue: &mut MessageQueue, id: TxnId, msg_type: u64, bytes: &[u8]) {
        match MmMsgType::try_from(msg_type) {
            Ok(MmMsgType::LocationUpdateAccept) => self.rx_location_update_accept(queue, id, bytes),
            Ok(MmMsgType::LocationUpdateReject) => self.rx_location_update_reject(queue, id, bytes),
            Ok(MmMsgType::CmServiceAccept) => self.on_cm_service_accept(queue, id),
            Ok(MmMsgType::CmServiceReject) => {
                if let Some((_, pdu)) = codec::parse::<CmServiceReject>(bytes) {
                    self.on_cm_service_reject(queue, id, pdu.cause);
                }
            }
            Ok(other) => {
                tracing::warn!("unexpected MM {} for app {}", other, id);
                self.stats.inc(Counter::DroppedMessages);
            }
            Err(_) => {
                tracing::warn!("unknown MM message type {:#04x}", msg_type);
                self.stats.inc(Counter::DroppedMessages);
            }
        }
    }

    fn is_location_update(&self, id: TxnId) -> bool {
        matches!(
            self.apps.get(id).map(|a| &a.service),
            Some(AppService::Mm(MmProc::LocationUpdate(_)))
        )
    }

    fn rx_location_update_accept(&mut self, queue: &mut MessageQueue, id: TxnId, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<LocationUpdateAccept>(bytes) else {
            return;
        };
        if !self.is_location_update(id) {
            tracing::warn!("location update accept for app {} without update", id);
            return;
        }
        tracing::info!("registered in location area {}", pdu.lac);
        self.mm_state = MmState::Updated;
        self.registered_lac = Some(pdu.lac);
        self.lu_attempts = 0;
        self.stats.inc(Counter::LocationUpdateSuccess);
        self.arm(queue, MsTimerOwner::Mobile, MsTimer::T3212);
        self.release_app(queue, id, Cause::NormalRelease);
    }

    fn rx_location_update_reject(&mut self, queue: &mut MessageQueue, id: TxnId, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<LocationUpdateReject>(bytes) else {
            return;
        };
        if !self.is_location_update(id) {
            return;
        }
        tracing::info!("location update rejected: {}", pdu.cause);
        self.mm_state = MmState::Rejected;
        self.registered_lac = None;
        self.lu_attempts = 0;
        self.stats.inc(Counter::LocationUpdateRejected);
        self.release_app(queue, id, Cause::NormalRelease);
    }
}
