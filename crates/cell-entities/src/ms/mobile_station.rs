use std::collections::BTreeMap;
use std::time::Duration;

use cell_config::{CfgMs, SharedConfig};
use cell_core::{CellId, CellRole, ChanRef, Imsi, Lac, NodeId, TimerRegistry, TxnId, unimplemented_log};
use cell_pdus::mm::enums::update_type::UpdateType;
use cell_pdus::rr::enums::rr_msg_type::RrMsgType;
use cell_pdus::rr::pdus::channel_release::ChannelRelease;
use cell_pdus::rr::pdus::dedicated_data::{DownlinkData, UplinkData};
use cell_pdus::{Cause, L3Message, ProtocolDiscriminator, TiField, encode, peek};
use cell_saps::mmi::MmiCmd;
use cell_saps::{SapMsg, SapMsgInner};

use crate::codec;
use crate::components::{TableErr, TransactionTable};
use crate::ms::app::{AppService, CcState, MmState, MsApp, MsAppKey, MsTimer, MsTimerOwner, RrState, SmState};
use crate::stats::{Counter, NodeStats};
use crate::{CellEntityTrait, MessageQueue};

/// Mobile station: RR, MM, CC and SM sublayers of one handset, driven by user
/// commands (MMI) and messages from the serving base station
pub struct MobileStation {
    pub(super) config: SharedConfig,
    pub(super) node: NodeId,
    pub(super) imsi: Imsi,
    /// Cell the MS is camped on, or in dedicated mode, the cell of its channels
    pub(super) cell: CellId,
    pub(super) powered: bool,
    pub(super) mm_state: MmState,
    pub(super) registered_lac: Option<Lac>,
    /// Location update attempts in the current sequence
    pub(super) lu_attempts: u8,
    pub(super) lu_type: UpdateType,
    pub(super) apps: TransactionTable<MsAppKey, MsApp>,
    pub(super) timers: TimerRegistry<MsTimerOwner, MsTimer>,
    /// Latest signal quality per cell
    pub(super) measurements: BTreeMap<CellId, u8>,
    pub(super) next_call: u16,
    pub(super) stats: NodeStats,
}

impl MobileStation {
    pub fn new(config: SharedConfig, cfg: &CfgMs) -> Self {
        let capacity = config.config().limits.max_active_app_per_ms;
        Self {
            node: cfg.node,
            imsi: cfg.imsi,
            cell: cfg.cell,
            powered: false,
            mm_state: MmState::Null,
            registered_lac: None,
            lu_attempts: 0,
            lu_type: UpdateType::ImsiAttach,
            apps: TransactionTable::new(capacity),
            timers: TimerRegistry::new(),
            measurements: BTreeMap::new(),
            next_call: 0,
            stats: NodeStats::new(),
            config,
        }
    }

    pub fn imsi(&self) -> Imsi {
        self.imsi
    }

    pub fn cell(&self) -> CellId {
        self.cell
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    pub fn mm_state(&self) -> MmState {
        self.mm_state
    }

    pub fn registered_lac(&self) -> Option<Lac> {
        self.registered_lac
    }

    pub fn num_apps(&self) -> usize {
        self.apps.len()
    }

    /// States of all calls, in application order
    pub fn call_states(&self) -> Vec<CcState> {
        self.apps.iter().filter_map(|(_, _, app)| app.call().map(|c| c.state)).collect()
    }

    pub fn pdp_state(&self, nsapi: u8) -> Option<SmState> {
        let id = self.apps.lookup(&MsAppKey::Pdp(nsapi))?;
        self.apps.get(id).and_then(|a| a.pdp()).map(|p| p.state)
    }

    pub fn pdp_address(&self, nsapi: u8) -> Option<u32> {
        let id = self.apps.lookup(&MsAppKey::Pdp(nsapi))?;
        self.apps.get(id).and_then(|a| a.pdp()).and_then(|p| p.address)
    }

    /// Assigned channels per application
    pub fn app_channels(&self) -> Vec<(TxnId, CellId, Vec<u16>)> {
        self.apps
            .iter()
            .filter_map(|(id, _, app)| match &app.rr {
                RrState::Assigned { cell, channels } => Some((id, *cell, channels.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn num_active_timers(&self) -> usize {
        self.timers.num_active()
    }

    pub(super) fn serving_bs(&self) -> Option<NodeId> {
        self.config.config().bs_for_cell(self.cell).map(|bs| bs.node)
    }

    pub(super) fn lac_of(&self, cell: CellId) -> Option<Lac> {
        self.config.config().bs_for_cell(cell).map(|bs| bs.lac)
    }

    fn timer_duration(&self, timer: MsTimer) -> Duration {
        let cfg = self.config.config();
        let t = &cfg.timers;
        match timer {
            MsTimer::T3126 => t.t3126,
            MsTimer::T3210 => t.t3210,
            MsTimer::T3211 => t.t3211,
            MsTimer::T3212 => t.t3212,
            MsTimer::T3230 => t.t3230,
            MsTimer::T301 => t.t301,
            MsTimer::T303 => t.t303,
            MsTimer::T305 => t.t305,
            MsTimer::T308 => t.t308,
            MsTimer::T310 => t.t310,
            MsTimer::T313 => t.t313,
            MsTimer::AnswerDelay => t.answer_delay,
            MsTimer::T3380 => t.t3380,
            MsTimer::T3390 => t.t3390,
        }
    }

    pub(super) fn arm(&mut self, queue: &mut MessageQueue, owner: MsTimerOwner, timer: MsTimer) {
        let delay = self.timer_duration(timer);
        self.timers.set(queue, owner, timer, delay, ());
    }

    pub(super) fn disarm(&mut self, queue: &mut MessageQueue, owner: MsTimerOwner, timer: MsTimer) {
        self.timers.cancel(queue, owner, timer);
    }

    /// Sends an RR message to the serving BS
    pub(super) fn send_rr<M: L3Message>(&mut self, queue: &mut MessageQueue, pdu: &M) {
        match self.serving_bs() {
            Some(bs) => {
                queue.send_pdu(bs, TiField::NONE, pdu);
            }
            None => tracing::warn!("no base station serves cell {}, dropping {}", self.cell, pdu),
        }
    }

    /// Sends an MM, CC or SM message on the dedicated channel of `app`
    pub(super) fn send_dtap<M: L3Message>(&mut self, queue: &mut MessageQueue, app: TxnId, ti: TiField, pdu: &M) {
        let payload = match encode(ti, pdu) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed encoding {}: {:?}", pdu, e);
                return;
            }
        };
        tracing::debug!("-> app {} {:?}", app, pdu);
        self.send_rr(queue, &UplinkData { chan_ref: app as ChanRef, payload });
    }

    pub(super) fn create_app(&mut self, key: MsAppKey, app: MsApp) -> Option<TxnId> {
        match self.apps.create(key, app) {
            Ok(id) => Some(id),
            Err(TableErr::Exhausted) => {
                tracing::warn!("no free application slot for {:?}", key);
                self.stats.inc(Counter::TableExhausted);
                None
            }
            Err(TableErr::DuplicateKey) => {
                tracing::warn!("application {:?} already active", key);
                None
            }
        }
    }

    /// Ends an application: cancels its timers and, if it holds channels,
    /// releases them towards the BS. Releasing an unknown id does nothing.
    pub(super) fn release_app(&mut self, queue: &mut MessageQueue, id: TxnId, cause: Cause) {
        let Some((key, app)) = self.apps.release(id) else {
            return;
        };
        self.timers.cancel_owner(queue, MsTimerOwner::App(id));
        if app.is_assigned() {
            self.send_rr(queue, &ChannelRelease { chan_ref: id as ChanRef, cause });
            self.stats.inc(Counter::ChannelsReleased);
        }
        tracing::debug!("released app {} {:?}", id, key);
        self.check_location_after_release(queue);
    }

    fn rx_timer(&mut self, queue: &mut MessageQueue, handle: u64) {
        let Some(expired) = self.timers.on_expiry(handle) else {
            return;
        };
        tracing::debug!("timer {:?} expired for {:?}", expired.timer, expired.owner);
        self.stats.inc(Counter::TimerExpiries);

        match (expired.owner, expired.timer) {
            (MsTimerOwner::Mobile, MsTimer::T3211) => self.on_t3211(queue),
            (MsTimerOwner::Mobile, MsTimer::T3212) => self.on_t3212(queue),
            (MsTimerOwner::App(id), MsTimer::T3126) => self.on_t3126(queue, id),
            (MsTimerOwner::App(id), MsTimer::T3210) => self.on_t3210(queue, id),
            (MsTimerOwner::App(id), MsTimer::T3230) => self.on_t3230(queue, id),
            (MsTimerOwner::App(id), t @ (MsTimer::T301 | MsTimer::T303 | MsTimer::T310 | MsTimer::T313)) => {
                self.on_cc_guard_expiry(queue, id, t)
            }
            (MsTimerOwner::App(id), MsTimer::T305) => self.on_t305(queue, id),
            (MsTimerOwner::App(id), MsTimer::T308) => self.on_t308(queue, id),
            (MsTimerOwner::App(id), MsTimer::AnswerDelay) => self.on_answer_delay(queue, id),
            (MsTimerOwner::App(id), MsTimer::T3380) => self.on_t3380(queue, id),
            (MsTimerOwner::App(id), MsTimer::T3390) => self.on_t3390(queue, id),
            (owner, timer) => unimplemented_log!("timer {:?} for {:?}", timer, owner),
        }
    }

    fn rx_mmi(&mut self, queue: &mut MessageQueue, cmd: MmiCmd) {
        tracing::debug!("mmi: {:?}", cmd);
        match cmd {
            MmiCmd::PowerOn => self.power_on(queue),
            MmiCmd::PowerOff => self.power_off(queue),
            MmiCmd::Originate { callee, bandwidth_kbps } => self.originate(queue, callee, bandwidth_kbps),
            MmiCmd::HangUp => self.hang_up(queue),
            MmiCmd::ActivatePdp { nsapi, bandwidth_kbps } => self.activate_pdp(queue, nsapi, bandwidth_kbps),
            MmiCmd::DeactivatePdp { nsapi } => self.deactivate_pdp(queue, nsapi),
            MmiCmd::Measurement { cell, quality } => self.measurement(queue, cell, quality),
            MmiCmd::CampOn { cell } => self.camp_on(queue, cell),
        }
    }

    fn rx_transport(&mut self, queue: &mut MessageQueue, src: NodeId, bytes: Vec<u8>) {
        if !self.powered && self.apps.is_empty() {
            tracing::trace!("switched off, ignoring message from {}", src);
            return;
        }
        let (header, msg_type) = match peek(&bytes) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!("Failed parsing header from {}: {:?}", src, e);
                self.stats.inc(Counter::DroppedMessages);
                return;
            }
        };
        if header.pd != ProtocolDiscriminator::Rr {
            tracing::warn!("unexpected {} message from {}", header.pd, src);
            self.stats.inc(Counter::DroppedMessages);
            return;
        }
        match RrMsgType::try_from(msg_type) {
            Ok(RrMsgType::ImmediateAssignment) => self.rx_immediate_assignment(queue, &bytes),
            Ok(RrMsgType::ImmediateAssignmentReject) => self.rx_immediate_assignment_reject(queue, &bytes),
            Ok(RrMsgType::ChannelRelease) => self.rx_channel_release(queue, &bytes),
            Ok(RrMsgType::PagingRequest) => self.rx_paging_request(queue, &bytes),
            Ok(RrMsgType::HandoverCommand) => self.rx_handover_command(queue, src, &bytes),
            Ok(RrMsgType::DownlinkData) => self.rx_downlink_data(queue, &bytes),
            Ok(other) => {
                tracing::warn!("unexpected RR {} from {}", other, src);
                self.stats.inc(Counter::DroppedMessages);
            }
            Err(_) => {
                tracing::warn!("unknown RR message type {:#04x} from {}", msg_type, src);
                self.stats.inc(Counter::DroppedMessages);
            }
        }
    }

    fn rx_downlink_data(&mut self, queue: &mut MessageQueue, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<DownlinkData>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let id = pdu.chan_ref as TxnId;
        if !self.apps.get(id).is_some_and(|a| a.is_assigned()) {
            tracing::warn!("downlink data for app {} without channel", id);
            self.stats.inc(Counter::DroppedMessages);
            return;
        }
        let (header, msg_type) = match peek(&pdu.payload) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!("Failed parsing relayed header: {:?}", e);
                self.stats.inc(Counter::DroppedMessages);
                return;
            }
        };
        match header.pd {
            ProtocolDiscriminator::Mm => self.rx_mm(queue, id, msg_type, &pdu.payload),
            ProtocolDiscriminator::Cc => self.rx_cc(queue, id, msg_type, &pdu.payload),
            ProtocolDiscriminator::Sm => self.rx_sm(queue, id, msg_type, &pdu.payload),
            other => {
                tracing::warn!("unexpected {} message relayed to app {}", other, id);
                self.stats.inc(Counter::DroppedMessages);
            }
        }
    }

    fn rx_rr_est_cnf(&mut self, queue: &mut MessageQueue, id: TxnId) {
        let Some(app) = self.apps.get(id) else {
            tracing::debug!("RR-EST-CNF for released app {}", id);
            return;
        };
        match &app.service {
            AppService::Mm(proc) => {
                let proc = *proc;
                self.on_mm_channel_ready(queue, id, proc)
            }
            AppService::Call(_) => self.on_cc_channel_ready(queue, id),
            AppService::Pdp(_) => self.on_sm_channel_ready(queue, id),
        }
    }

    fn rx_rr_est_rej(&mut self, queue: &mut MessageQueue, id: TxnId) {
        let Some(app) = self.apps.get(id) else {
            return;
        };
        match &app.service {
            AppService::Mm(proc) => {
                let proc = *proc;
                self.on_mm_channel_failed(queue, id, proc)
            }
            AppService::Call(_) => self.on_cc_channel_failed(queue, id),
            AppService::Pdp(_) => self.on_sm_channel_failed(queue, id),
        }
    }

    fn rx_rr_rel_ind(&mut self, queue: &mut MessageQueue, id: TxnId, cause: u8) {
        let Some(app) = self.apps.get(id) else {
            return;
        };
        tracing::info!("channels of app {} released by the network, cause {}", id, cause);
        match &app.service {
            AppService::Mm(proc) => {
                let proc = *proc;
                self.on_mm_channel_failed(queue, id, proc)
            }
            AppService::Call(_) => self.on_cc_channel_lost(queue, id),
            AppService::Pdp(_) => self.on_sm_channel_lost(queue, id),
        }
    }
}

impl CellEntityTrait for MobileStation {
    fn node(&self) -> NodeId {
        self.node
    }

    fn role(&self) -> CellRole {
        CellRole::Ms
    }

    fn rx_prim(&mut self, queue: &mut MessageQueue, message: SapMsg) {
        tracing::trace!("rx_prim: {:?} {} from {}", message.get_sap(), message.kind(), message.get_source());
        let src = message.get_source();
        match message.msg {
            SapMsgInner::TransportUnitdataInd(prim) => self.rx_transport(queue, src, prim.bytes),
            SapMsgInner::TimerExpiryInd(prim) => self.rx_timer(queue, prim.handle),
            SapMsgInner::MmiCmd(cmd) => self.rx_mmi(queue, cmd),
            SapMsgInner::RrEstCnf(prim) => self.rx_rr_est_cnf(queue, prim.app),
            SapMsgInner::RrEstRej(prim) => {
                tracing::debug!("RR-EST-REJ for app {}: {:?}", prim.app, prim.failure);
                self.rx_rr_est_rej(queue, prim.app)
            }
            SapMsgInner::RrRelInd(prim) => self.rx_rr_rel_ind(queue, prim.app, prim.cause),
            other => {
                tracing::warn!("unexpected primitive {:?}", other);
                self.stats.inc(Counter::DroppedMessages);
            }
        }
    }

    fn stats(&self) -> &NodeStats {
        &self.stats
    }
}
