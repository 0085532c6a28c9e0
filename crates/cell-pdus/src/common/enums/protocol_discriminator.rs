/// Protocol discriminator, high nibble of the first octet of every message
/// Bits: 4
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProtocolDiscriminator {
    /// BS <-> SC signalling, including relayed MS messages
    Bssmap = 1,
    /// Call control
    Cc = 3,
    /// Mobility management
    Mm = 5,
    /// Radio resource management
    Rr = 6,
    /// Session management (packet data contexts)
    Sm = 10,
    /// SC <-> HLR
    Map = 12,
    /// SC <-> Gateway
    Gtp = 13,
}

impl std::convert::TryFrom<u64> for ProtocolDiscriminator {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            1 => Ok(ProtocolDiscriminator::Bssmap),
            3 => Ok(ProtocolDiscriminator::Cc),
            5 => Ok(ProtocolDiscriminator::Mm),
            6 => Ok(ProtocolDiscriminator::Rr),
            10 => Ok(ProtocolDiscriminator::Sm),
            12 => Ok(ProtocolDiscriminator::Map),
            13 => Ok(ProtocolDiscriminator::Gtp),
            _ => Err(()),
        }
    }
}

impl ProtocolDiscriminator {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        match self {
            ProtocolDiscriminator::Bssmap => 1,
            ProtocolDiscriminator::Cc => 3,
            ProtocolDiscriminator::Mm => 5,
            ProtocolDiscriminator::Rr => 6,
            ProtocolDiscriminator::Sm => 10,
            ProtocolDiscriminator::Map => 12,
            ProtocolDiscriminator::Gtp => 13,
        }
    }
}

impl From<ProtocolDiscriminator> for u64 {
    fn from(e: ProtocolDiscriminator) -> Self { e.into_raw() }
}

impl core::fmt::Display for ProtocolDiscriminator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ProtocolDiscriminator::Bssmap => write!(f, "Bssmap"),
            ProtocolDiscriminator::Cc => write!(f, "Cc"),
            ProtocolDiscriminator::Mm => write!(f, "Mm"),
            ProtocolDiscriminator::Rr => write!(f, "Rr"),
            ProtocolDiscriminator::Sm => write!(f, "Sm"),
            ProtocolDiscriminator::Map => write!(f, "Map"),
            ProtocolDiscriminator::Gtp => write!(f, "Gtp"),
        }
    }
}
