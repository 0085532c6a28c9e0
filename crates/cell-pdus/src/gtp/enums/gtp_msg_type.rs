/// GTP message types
/// Bits: 8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GtpMsgType {
    CreatePdpContextRequest = 16,
    CreatePdpContextResponse = 17,
    DeletePdpContextRequest = 20,
    DeletePdpContextResponse = 21,
}

impl std::convert::TryFrom<u64> for GtpMsgType {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            16 => Ok(GtpMsgType::CreatePdpContextRequest),
            17 => Ok(GtpMsgType::CreatePdpContextResponse),
            20 => Ok(GtpMsgType::DeletePdpContextRequest),
            21 => Ok(GtpMsgType::DeletePdpContextResponse),
            _ => Err(()),
        }
    }
}

impl GtpMsgType {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        match self {
            GtpMsgType::CreatePdpContextRequest => 16,
            GtpMsgType::CreatePdpContextResponse => 17,
            GtpMsgType::DeletePdpContextRequest => 20,
            GtpMsgType::DeletePdpContextResponse => 21,
        }
    }
}

impl From<GtpMsgType> for u64 {
    fn from(e: GtpMsgType) -> Self { e.into_raw() }
}

impl core::fmt::Display for GtpMsgType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            GtpMsgType::CreatePdpContextRequest => write!(f, "CreatePdpContextRequest"),
            GtpMsgType::CreatePdpContextResponse => write!(f, "CreatePdpContextResponse"),
            GtpMsgType::DeletePdpContextRequest => write!(f, "DeletePdpContextRequest"),
            GtpMsgType::DeletePdpContextResponse => write!(f, "DeletePdpContextResponse"),
        }
    }
}
