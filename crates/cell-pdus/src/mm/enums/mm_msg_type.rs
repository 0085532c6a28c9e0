/// MM message types
/// Bits: 8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MmMsgType {
    ImsiDetachIndication = 1,
    LocationUpdateAccept = 2,
    LocationUpdateReject = 4,
    LocationUpdateRequest = 8,
    CmServiceAccept = 33,
    CmServiceReject = 34,
    CmServiceRequest = 36,
    PagingResponse = 39,
}

impl std::convert::TryFrom<u64> for MmMsgType {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            1 => Ok(MmMsgType::ImsiDetachIndication),
            2 => Ok(MmMsgType::LocationUpdateAccept),
            4 => Ok(MmMsgType::LocationUpdateReject),
            8 => Ok(MmMsgType::LocationUpdateRequest),
            33 => Ok(MmMsgType::CmServiceAccept),
            34 => Ok(MmMsgType::CmServiceReject),
            36 => Ok(MmMsgType::CmServiceRequest),
            39 => Ok(MmMsgType::PagingResponse),
            _ => Err(()),
        }
    }
}

impl MmMsgType {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        match self {
            MmMsgType::ImsiDetachIndication => 1,
            MmMsgType::LocationUpdateAccept => 2,
            MmMsgType::LocationUpdateReject => 4,
            MmMsgType::LocationUpdateRequest => 8,
            MmMsgType::CmServiceAccept => 33,
            MmMsgType::CmServiceReject => 34,
            MmMsgType::CmServiceRequest => 36,
            MmMsgType::PagingResponse => 39,
        }
    }
}

impl From<MmMsgType> for u64 {
    fn from(e: MmMsgType) -> Self { e.into_raw() }
}

impl core::fmt::Display for MmMsgType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MmMsgType::ImsiDetachIndication => write!(f, "ImsiDetachIndication"),
            MmMsgType::LocationUpdateAccept => write!(f, "LocationUpdateAccept"),
            MmMsgType::LocationUpdateReject => write!(f, "LocationUpdateReject"),
            MmMsgType::LocationUpdateRequest => write!(f, "LocationUpdateRequest"),
            MmMsgType::CmServiceAccept => write!(f, "CmServiceAccept"),
            MmMsgType::CmServiceReject => write!(f, "CmServiceReject"),
            MmMsgType::CmServiceRequest => write!(f, "CmServiceRequest"),
            MmMsgType::PagingResponse => write!(f, "PagingResponse"),
        }
    }
}
