/// SM message types
/// Bits: 8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SmMsgType {
    ActivatePdpContextRequest = 65,
    ActivatePdpContextAccept = 66,
    ActivatePdpContextReject = 67,
    DeactivatePdpContextRequest = 70,
    DeactivatePdpContextAccept = 71,
}

impl std::convert::TryFrom<u64> for SmMsgType {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            65 => Ok(SmMsgType::ActivatePdpContextRequest),
            66 => Ok(SmMsgType::ActivatePdpContextAccept),
            67 => Ok(SmMsgType::ActivatePdpContextReject),
            70 => Ok(SmMsgType::DeactivatePdpContextRequest),
            71 => Ok(SmMsgType::DeactivatePdpContextAccept),
            _ => Err(()),
        }
    }
}

impl SmMsgType {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        match self {
            SmMsgType::ActivatePdpContextRequest => 65,
            SmMsgType::ActivatePdpContextAccept => 66,
            SmMsgType::ActivatePdpContextReject => 67,
            SmMsgType::DeactivatePdpContextRequest => 70,
            SmMsgType::DeactivatePdpContextAccept => 71,
        }
    }
}

impl From<SmMsgType> for u64 {
    fn from(e: SmMsgType) -> Self { e.into_raw() }
}

impl core::fmt::Display for SmMsgType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SmMsgType::ActivatePdpContextRequest => write!(f, "ActivatePdpContextRequest"),
            SmMsgType::ActivatePdpContextAccept => write!(f, "ActivatePdpContextAccept"),
            SmMsgType::ActivatePdpContextReject => write!(f, "ActivatePdpContextReject"),
            SmMsgType::DeactivatePdpContextRequest => write!(f, "DeactivatePdpContextRequest"),
            SmMsgType::DeactivatePdpContextAccept => write!(f, "DeactivatePdpContextAccept"),
        }
    }
}
