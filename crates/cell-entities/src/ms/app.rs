use core::fmt;

use cell_core::{CellId, Imsi, ResourceKind, TxnId};
use cell_pdus::mm::enums::update_type::UpdateType;
use cell_pdus::rr::enums::establishment_cause::EstablishmentCause;

/// Registration state of the MS as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmState {
    /// Switched off, never registered
    Null,
    /// Location update in progress, including waits between attempts
    UpdateRequested,
    Updated,
    /// Network refused the update; no retries until the next trigger
    Rejected,
    /// All attempts exhausted
    Failed,
    Detached,
}

impl fmt::Display for MmState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Key of an application in the MS table. The slot id doubles as channel reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsAppKey {
    /// The single MM procedure (location update or detach)
    Mm,
    Call(u16),
    Pdp(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RrState {
    Idle,
    /// Waiting for an immediate assignment. `attempts` channel requests sent so far
    Requesting { attempts: u8 },
    Assigned { cell: CellId, channels: Vec<u16> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmProc {
    LocationUpdate(UpdateType),
    Detach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcState {
    Null,
    CallInitiated,
    Proceeding,
    Alerting,
    Active,
    CallPresent,
    CallConfirmed,
    ConnectRequest,
    DisconnectRequest,
    DisconnectIndication,
    ReleaseRequest,
}

impl fmt::Display for CcState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallDir {
    Mo { callee: Imsi },
    Mt,
}

#[derive(Debug, Clone)]
pub struct MsCall {
    pub dir: CallDir,
    pub state: CcState,
    /// RELEASE messages sent in the current release attempt
    pub release_attempts: u8,
    /// Reached Active at least once
    pub connected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmState {
    Inactive,
    ActivePending,
    Active,
    InactivePending,
}

#[derive(Debug, Clone)]
pub struct MsPdp {
    pub nsapi: u8,
    pub state: SmState,
    /// Requests sent in the current procedure
    pub attempts: u8,
    pub address: Option<u32>,
}

#[derive(Debug, Clone)]
pub enum AppService {
    Mm(MmProc),
    Call(MsCall),
    Pdp(MsPdp),
}

/// One application of the MS: a location update, a call or a packet data context,
/// each with its own dedicated channel(s)
#[derive(Debug, Clone)]
pub struct MsApp {
    pub rr: RrState,
    pub est_cause: EstablishmentCause,
    pub kind: ResourceKind,
    pub bandwidth_kbps: u32,
    pub service: AppService,
}

impl MsApp {
    pub fn call(&self) -> Option<&MsCall> {
        match &self.service {
            AppService::Call(c) => Some(c),
            _ => None,
        }
    }

    pub fn call_mut(&mut self) -> Option<&mut MsCall> {
        match &mut self.service {
            AppService::Call(c) => Some(c),
            _ => None,
        }
    }

    pub fn pdp(&self) -> Option<&MsPdp> {
        match &self.service {
            AppService::Pdp(p) => Some(p),
            _ => None,
        }
    }

    pub fn pdp_mut(&mut self) -> Option<&mut MsPdp> {
        match &mut self.service {
            AppService::Pdp(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self.rr, RrState::Assigned { .. })
    }
}

/// Owner of an MS timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsTimerOwner {
    /// Timers of the MS as a whole (T3211, T3212)
    Mobile,
    App(TxnId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsTimer {
    T3126,
    T3210,
    T3211,
    T3212,
    T3230,
    T301,
    T303,
    T305,
    T308,
    T310,
    T313,
    AnswerDelay,
    T3380,
    T3390,
}
