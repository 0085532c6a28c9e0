use cell_core::{ChanRef, Sap, TxnId};
use cell_pdus::rr::pdus::assignment_complete::AssignmentComplete;
use cell_pdus::rr::pdus::channel_release::ChannelRelease;
use cell_pdus::rr::pdus::channel_request::ChannelRequest;
use cell_pdus::rr::pdus::immediate_assignment::{ImmediateAssignment, ImmediateAssignmentReject};
use cell_pdus::rr::pdus::paging_request::PagingRequest;
use cell_pdus::rr::enums::establishment_cause::EstablishmentCause;
use cell_saps::SapMsgInner;
use cell_saps::rr::{RrEstCnf, RrEstFailure, RrEstRej, RrRelInd};

use crate::MessageQueue;
use crate::codec;
use crate::ms::app::{AppService, CallDir, CcState, MmState, MsApp, MsAppKey, MsCall, MsTimer, MsTimerOwner, RrState};
use crate::ms::mobile_station::MobileStation;
use crate::stats::Counter;

impl MobileStation {
    /// Starts channel establishment for application `id`
    pub(super) fn rr_establish(&mut self, queue: &mut MessageQueue, id: TxnId) {
        let Some(app) = self.apps.get_mut(id) else {
            return;
        };
        app.rr = RrState::Requesting { attempts: 0 };
        self.send_channel_request(queue, id);
    }

    fn send_channel_request(&mut self, queue: &mut MessageQueue, id: TxnId) {
        let cell = self.cell;
        let Some(app) = self.apps.get_mut(id) else {
            return;
        };
        let RrState::Requesting { attempts } = &mut app.rr else {
            return;
        };
        *attempts += 1;
        let pdu = ChannelRequest {
            chan_ref: id as ChanRef,
            cell,
            est_cause: app.est_cause,
            kind: app.kind,
            count: 1,
            bandwidth_kbps: app.bandwidth_kbps,
        };
        self.stats.inc(Counter::ChannelRequestsSent);
        self.send_rr(queue, &pdu);
        self.arm(queue, MsTimerOwner::App(id), MsTimer::T3126);
    }

    pub(super) fn on_t3126(&mut self, queue: &mut MessageQueue, id: TxnId) {
        let max = self.config.config().limits.num_channel_request_attempts;
        let attempts = match self.apps.get(id).map(|a| &a.rr) {
            Some(RrState::Requesting { attempts }) => *attempts,
            _ => return,
        };

        if attempts < max {
            tracing::debug!("T3126 expired for app {}, channel request {} of {}", id, attempts + 1, max);
            self.send_channel_request(queue, id);
            return;
        }

        tracing::info!("no channel for app {} after {} requests", id, attempts);
        if let Some(app) = self.apps.get_mut(id) {
            app.rr = RrState::Idle;
        }
        self.stats.inc(Counter::ChannelRequestFailures);
        queue.push_local(
            Sap::RrSap,
            SapMsgInner::RrEstRej(RrEstRej {
                app: id,
                failure: RrEstFailure::NoResponse,
            }),
        );
    }

    pub(super) fn rx_immediate_assignment(&mut self, queue: &mut MessageQueue, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<ImmediateAssignment>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let id = pdu.chan_ref as TxnId;
        let Some(app) = self.apps.get_mut(id) else {
            tracing::debug!("assignment for unknown app {}, ignoring", id);
            return;
        };

        match app.rr {
            RrState::Requesting { .. } => {}
            RrState::Assigned { .. } => {
                // Answer to an earlier repetition of the request, confirm again
                self.send_rr(queue, &AssignmentComplete { chan_ref: pdu.chan_ref });
                return;
            }
            RrState::Idle => {
                tracing::debug!("assignment for app {} not requesting, ignoring", id);
                return;
            }
        }

        tracing::info!("app {} assigned channels {:?} in cell {}", id, pdu.channels, pdu.cell);
        app.rr = RrState::Assigned {
            cell: pdu.cell,
            channels: pdu.channels,
        };
        self.disarm(queue, MsTimerOwner::App(id), MsTimer::T3126);
        self.stats.inc(Counter::ChannelsAssigned);
        self.send_rr(queue, &AssignmentComplete { chan_ref: pdu.chan_ref });
        queue.push_local(Sap::RrSap, SapMsgInner::RrEstCnf(RrEstCnf { app: id }));
    }

    pub(super) fn rx_immediate_assignment_reject(&mut self, queue: &mut MessageQueue, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<ImmediateAssignmentReject>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let id = pdu.chan_ref as TxnId;
        let Some(app) = self.apps.get_mut(id) else {
            return;
        };
        if !matches!(app.rr, RrState::Requesting { .. }) {
            tracing::debug!("assignment reject for app {} not requesting, ignoring", id);
            return;
        }

        tracing::info!("channel request of app {} rejected: {}", id, pdu.cause);
        app.rr = RrState::Idle;
        self.disarm(queue, MsTimerOwner::App(id), MsTimer::T3126);
        self.stats.inc(Counter::ChannelsRejected);
        queue.push_local(
            Sap::RrSap,
            SapMsgInner::RrEstRej(RrEstRej {
                app: id,
                failure: RrEstFailure::Rejected(pdu.cause.into_raw() as u8),
            }),
        );
    }

    /// Release of an application's channels ordered by the network
    pub(super) fn rx_channel_release(&mut self, queue: &mut MessageQueue, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<ChannelRelease>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let id = pdu.chan_ref as TxnId;
        let Some(app) = self.apps.get_mut(id) else {
            tracing::debug!("release for unknown app {}, ignoring", id);
            return;
        };
        if !app.is_assigned() {
            return;
        }
        app.rr = RrState::Idle;
        self.stats.inc(Counter::ChannelsReleased);
        queue.push_local(
            Sap::RrSap,
            SapMsgInner::RrRelInd(RrRelInd {
                app: id,
                cause: pdu.cause.into_raw() as u8,
            }),
        );
    }

    /// Paging for this MS starts a mobile terminated call
    pub(super) fn rx_paging_request(&mut self, queue: &mut MessageQueue, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<PagingRequest>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        if pdu.imsi != self.imsi {
            return;
        }
        if !self.powered || self.mm_state != MmState::Updated {
            tracing::info!("paged while not registered ({}), ignoring", self.mm_state);
            return;
        }

        // Repeated paging while the response is under way
        let answering = self.apps.iter().any(|(_, _, app)| {
            matches!(
                app.call(),
                Some(MsCall { dir: CallDir::Mt, state: CcState::Null, .. })
            )
        });
        if answering {
            tracing::debug!("already answering paging");
            return;
        }

        let seq = self.next_call;
        self.next_call = self.next_call.wrapping_add(1);
        let app = MsApp {
            rr: RrState::Idle,
            est_cause: EstablishmentCause::PagingResponse,
            kind: pdu.kind,
            bandwidth_kbps: 0,
            service: AppService::Call(MsCall {
                dir: CallDir::Mt,
                state: CcState::Null,
                release_attempts: 0,
                connected: false,
            }),
        };
        let Some(id) = self.create_app(MsAppKey::Call(seq), app) else {
            return;
        };
        tracing::info!("paged, answering with app {}", id);
        self.rr_establish(queue, id);
    }
}
