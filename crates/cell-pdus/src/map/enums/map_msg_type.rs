/// MAP message types
/// Bits: 8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MapMsgType {
    UpdateLocation = 2,
    UpdateLocationAck = 3,
    CancelLocation = 4,
    PurgeMs = 5,
}

impl std::convert::TryFrom<u64> for MapMsgType {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            2 => Ok(MapMsgType::UpdateLocation),
            3 => Ok(MapMsgType::UpdateLocationAck),
            4 => Ok(MapMsgType::CancelLocation),
            5 => Ok(MapMsgType::PurgeMs),
            _ => Err(()),
        }
    }
}

impl MapMsgType {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        match self {
            MapMsgType::UpdateLocation => 2,
            MapMsgType::UpdateLocationAck => 3,
            MapMsgType::CancelLocation => 4,
            MapMsgType::PurgeMs => 5,
        }
    }
}

impl From<MapMsgType> for u64 {
    fn from(e: MapMsgType) -> Self { e.into_raw() }
}

impl core::fmt::Display for MapMsgType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MapMsgType::UpdateLocation => write!(f, "UpdateLocation"),
            MapMsgType::UpdateLocationAck => write!(f, "UpdateLocationAck"),
            MapMsgType::CancelLocation => write!(f, "CancelLocation"),
            MapMsgType::PurgeMs => write!(f, "PurgeMs"),
        }
    }
}
