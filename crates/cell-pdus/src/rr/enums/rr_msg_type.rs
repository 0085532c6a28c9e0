/// RR message types
/// Bits: 8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RrMsgType {
    ChannelRequest = 59,
    ImmediateAssignment = 63,
    ImmediateAssignmentReject = 58,
    AssignmentComplete = 41,
    ChannelRelease = 13,
    PagingRequest = 33,
    MeasurementReport = 21,
    HandoverCommand = 43,
    HandoverComplete = 44,
    HandoverFailure = 40,
    UplinkData = 48,
    DownlinkData = 49,
}

impl std::convert::TryFrom<u64> for RrMsgType {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            59 => Ok(RrMsgType::ChannelRequest),
            63 => Ok(RrMsgType::ImmediateAssignment),
            58 => Ok(RrMsgType::ImmediateAssignmentReject),
            41 => Ok(RrMsgType::AssignmentComplete),
            13 => Ok(RrMsgType::ChannelRelease),
            33 => Ok(RrMsgType::PagingRequest),
            21 => Ok(RrMsgType::MeasurementReport),
            43 => Ok(RrMsgType::HandoverCommand),
            44 => Ok(RrMsgType::HandoverComplete),
            40 => Ok(RrMsgType::HandoverFailure),
            48 => Ok(RrMsgType::UplinkData),
            49 => Ok(RrMsgType::DownlinkData),
            _ => Err(()),
        }
    }
}

impl RrMsgType {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        match self {
            RrMsgType::ChannelRequest => 59,
            RrMsgType::ImmediateAssignment => 63,
            RrMsgType::ImmediateAssignmentReject => 58,
            RrMsgType::AssignmentComplete => 41,
            RrMsgType::ChannelRelease => 13,
            RrMsgType::PagingRequest => 33,
            RrMsgType::MeasurementReport => 21,
            RrMsgType::HandoverCommand => 43,
            RrMsgType::HandoverComplete => 44,
            RrMsgType::HandoverFailure => 40,
            RrMsgType::UplinkData => 48,
            RrMsgType::DownlinkData => 49,
        }
    }
}

impl From<RrMsgType> for u64 {
    fn from(e: RrMsgType) -> Self { e.into_raw() }
}

impl core::fmt::Display for RrMsgType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RrMsgType::ChannelRequest => write!(f, "ChannelRequest"),
            RrMsgType::ImmediateAssignment => write!(f, "ImmediateAssignment"),
            RrMsgType::ImmediateAssignmentReject => write!(f, "ImmediateAssignmentReject"),
            RrMsgType::AssignmentComplete => write!(f, "AssignmentComplete"),
            RrMsgType::ChannelRelease => write!(f, "ChannelRelease"),
            RrMsgType::PagingRequest => write!(f, "PagingRequest"),
            RrMsgType::MeasurementReport => write!(f, "MeasurementReport"),
            RrMsgType::HandoverCommand => write!(f, "HandoverCommand"),
            RrMsgType::HandoverComplete => write!(f, "HandoverComplete"),
            RrMsgType::HandoverFailure => write!(f, "HandoverFailure"),
            RrMsgType::UplinkData => write!(f, "UplinkData"),
            RrMsgType::DownlinkData => write!(f, "DownlinkData"),
        }
    }
}
