use cell_core::{NodeId, Sap, SimTime};

use crate::call_leg::CallLegInd;
use crate::mmi::MmiCmd;
use crate::rr::{RrEstCnf, RrEstRej, RrRelInd};
use crate::timer::TimerExpiryInd;
use crate::transport::TransportUnitdataInd;

/// Exhaustive list of primitives for use in the SapMsg struct
#[derive(Debug)]
pub enum SapMsgInner {
    // TRANSPORT-SAP
    TransportUnitdataInd(TransportUnitdataInd),

    // TIMER-SAP
    TimerExpiryInd(TimerExpiryInd),

    // MMI-SAP
    MmiCmd(MmiCmd),

    // RR-SAP (MS internal, RR -> MM/CC/SM)
    RrEstCnf(RrEstCnf),
    RrEstRej(RrEstRej),
    RrRelInd(RrRelInd),

    // CALL-LEG-SAP (SC internal)
    CallLegInd(CallLegInd),
}

#[derive(Debug)]
pub struct SapMsg {
    pub sap: Sap,
    /// Sending node. Equal to `dest` for timers and internal primitives
    pub src: NodeId,
    pub dest: NodeId,
    /// Simulated time at which the message is due
    pub time: SimTime,
    pub msg: SapMsgInner,
}

impl SapMsg {
    pub fn get_sap(&self) -> Sap {
        self.sap
    }

    pub fn get_source(&self) -> NodeId {
        self.src
    }

    pub fn get_dest(&self) -> NodeId {
        self.dest
    }

    /// Short name of the carried primitive, for logging
    pub fn kind(&self) -> &'static str {
        match &self.msg {
            SapMsgInner::TransportUnitdataInd(_) => "TransportUnitdataInd",
            SapMsgInner::TimerExpiryInd(_) => "TimerExpiryInd",
            SapMsgInner::MmiCmd(_) => "MmiCmd",
            SapMsgInner::RrEstCnf(_) => "RrEstCnf",
            SapMsgInner::RrEstRej(_) => "RrEstRej",
            SapMsgInner::RrRelInd(_) => "RrRelInd",
            SapMsgInner::CallLegInd(_) => "CallLegInd",
        }
    }
}
