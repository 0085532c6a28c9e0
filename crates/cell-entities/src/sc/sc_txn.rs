use std::fmt;

use cell_core::{CellId, ChanRef, Imsi, NodeId, SimTime, TxnId};
use cell_pdus::TiField;

/// Lookup key of an SC transaction. A mobile terminated leg is known by the
/// paged IMSI until the paging response arrives on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScKey {
    Conn { ms: NodeId, chan_ref: ChanRef },
    Paging { imsi: Imsi },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegRole {
    /// Calling side, holds the switch circuit
    Mo,
    Mt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScCcState {
    /// Service accepted, no Setup yet
    Null,
    // Mobile originated leg
    CallProceeding,
    CallDelivered,
    // Mobile terminated leg
    Paging,
    CallPresent,
    CallConfirmed,
    CallReceived,
    // Both
    Active,
    DisconnectIndication,
    ReleaseRequest,
}

impl fmt::Display for ScCcState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone)]
pub struct ScCall {
    pub leg: LegRole,
    pub state: ScCcState,
    /// Transaction identifier used towards the MS
    pub ti: TiField,
    /// Linked leg of the same call
    pub peer: Option<TxnId>,
    /// Calling party for the Mt leg, called party for the Mo leg
    pub other_party: Option<Imsi>,
    pub paging_attempts: u8,
    pub release_attempts: u8,
    pub connected: bool,
}

impl ScCall {
    pub fn new(leg: LegRole, state: ScCcState) -> Self {
        Self {
            leg,
            state,
            ti: TiField::NONE,
            peer: None,
            other_party: None,
            paging_attempts: 0,
            release_attempts: 0,
            connected: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScPdpState {
    /// CreatePdpContextRequest outstanding at the gateway
    CreatePending,
    Active,
    /// Network initiated deactivation under T3395
    NetDeactivatePending,
}

#[derive(Debug, Clone)]
pub struct ScPdp {
    pub nsapi: u8,
    pub state: ScPdpState,
    pub ti: TiField,
    /// Sequence number of the outstanding GTP request
    pub seq: u16,
    pub attempts: u8,
    pub bandwidth_kbps: u32,
    pub address: Option<u32>,
}

#[derive(Debug, Clone)]
pub enum ScService {
    /// Location update, lives for one message exchange
    Mm,
    Call(ScCall),
    Pdp(ScPdp),
}

#[derive(Debug, Clone)]
pub struct ScTxn {
    pub ms: NodeId,
    pub imsi: Imsi,
    pub bs: NodeId,
    pub cell: CellId,
    /// None while a terminating leg is being paged
    pub chan_ref: Option<ChanRef>,
    pub created: SimTime,
    pub service: ScService,
}

impl ScTxn {
    pub fn call(&self) -> Option<&ScCall> {
        match &self.service {
            ScService::Call(c) => Some(c),
            _ => None,
        }
    }

    pub fn call_mut(&mut self) -> Option<&mut ScCall> {
        match &mut self.service {
            ScService::Call(c) => Some(c),
            _ => None,
        }
    }

    pub fn pdp(&self) -> Option<&ScPdp> {
        match &self.service {
            ScService::Pdp(p) => Some(p),
            _ => None,
        }
    }

    pub fn pdp_mut(&mut self) -> Option<&mut ScPdp> {
        match &mut self.service {
            ScService::Pdp(p) => Some(p),
            _ => None,
        }
    }
}

/// Handover coordinated by the SC
#[derive(Debug, Clone)]
pub struct ScHandover {
    pub ms: NodeId,
    pub source_bs: NodeId,
    pub target_bs: NodeId,
    pub target_cell: CellId,
    /// HandoverCommand sent to the source
    pub commanded: bool,
    /// Channel references of the applications moving
    pub chan_refs: Vec<ChanRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScTimerOwner {
    Txn(TxnId),
    Vlr(Imsi),
    Handover(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScTimer {
    T301,
    T303,
    T305,
    T308,
    T310,
    T3113,
    T3Response,
    T3395,
    T3103,
    VlrLifetime,
}
