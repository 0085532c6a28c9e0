/// BSSMAP message types
/// Bits: 8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BssmapMsgType {
    HandoverRequest = 16,
    HandoverRequired = 17,
    HandoverRequestAck = 18,
    HandoverCommand = 19,
    HandoverComplete = 20,
    HandoverFailure = 22,
    HandoverRequiredReject = 26,
    HandoverCancel = 27,
    ClearCommand = 32,
    ClearComplete = 33,
    ClearRequest = 34,
    Paging = 82,
    /// Relayed MS message, uplink
    DtapUp = 96,
    /// Relayed MS message, downlink
    DtapDown = 97,
}

impl std::convert::TryFrom<u64> for BssmapMsgType {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            16 => Ok(BssmapMsgType::HandoverRequest),
            17 => Ok(BssmapMsgType::HandoverRequired),
            18 => Ok(BssmapMsgType::HandoverRequestAck),
            19 => Ok(BssmapMsgType::HandoverCommand),
            20 => Ok(BssmapMsgType::HandoverComplete),
            22 => Ok(BssmapMsgType::HandoverFailure),
            26 => Ok(BssmapMsgType::HandoverRequiredReject),
            27 => Ok(BssmapMsgType::HandoverCancel),
            32 => Ok(BssmapMsgType::ClearCommand),
            33 => Ok(BssmapMsgType::ClearComplete),
            34 => Ok(BssmapMsgType::ClearRequest),
            82 => Ok(BssmapMsgType::Paging),
            96 => Ok(BssmapMsgType::DtapUp),
            97 => Ok(BssmapMsgType::DtapDown),
            _ => Err(()),
        }
    }
}

impl BssmapMsgType {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        match self {
            BssmapMsgType::HandoverRequest => 16,
            BssmapMsgType::HandoverRequired => 17,
            BssmapMsgType::HandoverRequestAck => 18,
            BssmapMsgType::HandoverCommand => 19,
            BssmapMsgType::HandoverComplete => 20,
            BssmapMsgType::HandoverFailure => 22,
            BssmapMsgType::HandoverRequiredReject => 26,
            BssmapMsgType::HandoverCancel => 27,
            BssmapMsgType::ClearCommand => 32,
            BssmapMsgType::ClearComplete => 33,
            BssmapMsgType::ClearRequest => 34,
            BssmapMsgType::Paging => 82,
            BssmapMsgType::DtapUp => 96,
            BssmapMsgType::DtapDown => 97,
        }
    }
}

impl From<BssmapMsgType> for u64 {
    fn from(e: BssmapMsgType) -> Self { e.into_raw() }
}

impl core::fmt::Display for BssmapMsgType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BssmapMsgType::HandoverRequest => write!(f, "HandoverRequest"),
            BssmapMsgType::HandoverRequired => write!(f, "HandoverRequired"),
            BssmapMsgType::HandoverRequestAck => write!(f, "HandoverRequestAck"),
            BssmapMsgType::HandoverCommand => write!(f, "HandoverCommand"),
            BssmapMsgType::HandoverComplete => write!(f, "HandoverComplete"),
            BssmapMsgType::HandoverFailure => write!(f, "HandoverFailure"),
            BssmapMsgType::HandoverRequiredReject => write!(f, "HandoverRequiredReject"),
            BssmapMsgType::HandoverCancel => write!(f, "HandoverCancel"),
            BssmapMsgType::ClearCommand => write!(f, "ClearCommand"),
            BssmapMsgType::ClearComplete => write!(f, "ClearComplete"),
            BssmapMsgType::ClearRequest => write!(f, "ClearRequest"),
            BssmapMsgType::Paging => write!(f, "Paging"),
            BssmapMsgType::DtapUp => write!(f, "DtapUp"),
            BssmapMsgType::DtapDown => write!(f, "DtapDown"),
        }
    }
}
