/// Location updating type
/// Bits: 8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum UpdateType {
    /// Change of location area
    Normal = 0,
    /// Expiry of the periodic update timer
    Periodic = 1,
    /// Switch on
    ImsiAttach = 2,
}

impl std::convert::TryFrom<u64> for UpdateType {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            0 => Ok(UpdateType::Normal),
            1 => Ok(UpdateType::Periodic),
            2 => Ok(UpdateType::ImsiAttach),
            _ => Err(()),
        }
    }
}

impl UpdateType {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        match self {
            UpdateType::Normal => 0,
            UpdateType::Periodic => 1,
            UpdateType::ImsiAttach => 2,
        }
    }
}

impl From<UpdateType> for u64 {
    fn from(e: UpdateType) -> Self { e.into_raw() }
}

impl core::fmt::Display for UpdateType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UpdateType::Normal => write!(f, "Normal"),
            UpdateType::Periodic => write!(f, "Periodic"),
            UpdateType::ImsiAttach => write!(f, "ImsiAttach"),
        }
    }
}
