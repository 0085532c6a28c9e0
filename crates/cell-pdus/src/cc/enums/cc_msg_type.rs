/// CC message types
/// Bits: 8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CcMsgType {
    Alerting = 1,
    CallProceeding = 2,
    Setup = 5,
    Connect = 7,
    CallConfirmed = 8,
    ConnectAck = 15,
    Disconnect = 37,
    ReleaseComplete = 42,
    Release = 45,
}

impl std::convert::TryFrom<u64> for CcMsgType {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            1 => Ok(CcMsgType::Alerting),
            2 => Ok(CcMsgType::CallProceeding),
            5 => Ok(CcMsgType::Setup),
            7 => Ok(CcMsgType::Connect),
            8 => Ok(CcMsgType::CallConfirmed),
            15 => Ok(CcMsgType::ConnectAck),
            37 => Ok(CcMsgType::Disconnect),
            42 => Ok(CcMsgType::ReleaseComplete),
            45 => Ok(CcMsgType::Release),
            _ => Err(()),
        }
    }
}

impl CcMsgType {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        match self {
            CcMsgType::Alerting => 1,
            CcMsgType::CallProceeding => 2,
            CcMsgType::Setup => 5,
            CcMsgType::Connect => 7,
            CcMsgType::CallConfirmed => 8,
            CcMsgType::ConnectAck => 15,
            CcMsgType::Disconnect => 37,
            CcMsgType::ReleaseComplete => 42,
            CcMsgType::Release => 45,
        }
    }
}

impl From<CcMsgType> for u64 {
    fn from(e: CcMsgType) -> Self { e.into_raw() }
}

impl core::fmt::Display for CcMsgType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CcMsgType::Alerting => write!(f, "Alerting"),
            CcMsgType::CallProceeding => write!(f, "CallProceeding"),
            CcMsgType::Setup => write!(f, "Setup"),
            CcMsgType::Connect => write!(f, "Connect"),
            CcMsgType::CallConfirmed => write!(f, "CallConfirmed"),
            CcMsgType::ConnectAck => write!(f, "ConnectAck"),
            CcMsgType::Disconnect => write!(f, "Disconnect"),
            CcMsgType::ReleaseComplete => write!(f, "ReleaseComplete"),
            CcMsgType::Release => write!(f, "Release"),
        }
    }
}
