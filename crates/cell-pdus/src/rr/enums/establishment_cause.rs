/// Reason given by the MS in a channel request
/// Bits: 8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EstablishmentCause {
    LocationUpdating = 0,
    MoCall = 1,
    PagingResponse = 2,
    PacketData = 3,
    Detach = 4,
}

impl std::convert::TryFrom<u64> for EstablishmentCause {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            0 => Ok(EstablishmentCause::LocationUpdating),
            1 => Ok(EstablishmentCause::MoCall),
            2 => Ok(EstablishmentCause::PagingResponse),
            3 => Ok(EstablishmentCause::PacketData),
            4 => Ok(EstablishmentCause::Detach),
            _ => Err(()),
        }
    }
}

impl EstablishmentCause {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        match self {
            EstablishmentCause::LocationUpdating => 0,
            EstablishmentCause::MoCall => 1,
            EstablishmentCause::PagingResponse => 2,
            EstablishmentCause::PacketData => 3,
            EstablishmentCause::Detach => 4,
        }
    }
}

impl From<EstablishmentCause> for u64 {
    fn from(e: EstablishmentCause) -> Self { e.into_raw() }
}

impl core::fmt::Display for EstablishmentCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EstablishmentCause::LocationUpdating => write!(f, "LocationUpdating"),
            EstablishmentCause::MoCall => write!(f, "MoCall"),
            EstablishmentCause::PagingResponse => write!(f, "PagingResponse"),
            EstablishmentCause::PacketData => write!(f, "PacketData"),
            EstablishmentCause::Detach => write!(f, "Detach"),
        }
    }
}
