/// Cause values shared by reject, release and failure messages of all protocols
/// Bits: 8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Cause {
    NormalRelease = 0,
    UnassignedNumber = 1,
    ImsiUnknownInHlr = 2,
    NoRouteToDestination = 3,
    ImsiUnknownInVlr = 4,
    LocationAreaNotAllowed = 12,
    NormalClearing = 16,
    UserBusy = 17,
    NoUserResponding = 18,
    NoAnswer = 19,
    SubscriberAbsent = 20,
    CallRejected = 21,
    Congestion = 22,
    InsufficientResources = 26,
    NoCircuitAvailable = 34,
    RegularDeactivation = 36,
    TemporaryFailure = 41,
    ResourceUnavailable = 47,
    ServiceNotSupported = 63,
    InvalidTransactionId = 81,
    MessageNotCompatibleWithState = 101,
    RecoveryOnTimerExpiry = 102,
    ProtocolError = 111,
    RadioInterfaceFailure = 113,
    HandoverSuccessful = 114,
    HandoverCancelled = 115,
    HandoverImpossible = 116,
    Interworking = 127,
}

impl std::convert::TryFrom<u64> for Cause {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            0 => Ok(Cause::NormalRelease),
            1 => Ok(Cause::UnassignedNumber),
            2 => Ok(Cause::ImsiUnknownInHlr),
            3 => Ok(Cause::NoRouteToDestination),
            4 => Ok(Cause::ImsiUnknownInVlr),
            12 => Ok(Cause::LocationAreaNotAllowed),
            16 => Ok(Cause::NormalClearing),
            17 => Ok(Cause::UserBusy),
            18 => Ok(Cause::NoUserResponding),
            19 => Ok(Cause::NoAnswer),
            20 => Ok(Cause::SubscriberAbsent),
            21 => Ok(Cause::CallRejected),
            22 => Ok(Cause::Congestion),
            26 => Ok(Cause::InsufficientResources),
            34 => Ok(Cause::NoCircuitAvailable),
            36 => Ok(Cause::RegularDeactivation),
            41 => Ok(Cause::TemporaryFailure),
            47 => Ok(Cause::ResourceUnavailable),
            63 => Ok(Cause::ServiceNotSupported),
            81 => Ok(Cause::InvalidTransactionId),
            101 => Ok(Cause::MessageNotCompatibleWithState),
            102 => Ok(Cause::RecoveryOnTimerExpiry),
            111 => Ok(Cause::ProtocolError),
            113 => Ok(Cause::RadioInterfaceFailure),
            114 => Ok(Cause::HandoverSuccessful),
            115 => Ok(Cause::HandoverCancelled),
            116 => Ok(Cause::HandoverImpossible),
            127 => Ok(Cause::Interworking),
            _ => Err(()),
        }
    }
}

impl Cause {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        match self {
            Cause::NormalRelease => 0,
            Cause::UnassignedNumber => 1,
            Cause::ImsiUnknownInHlr => 2,
            Cause::NoRouteToDestination => 3,
            Cause::ImsiUnknownInVlr => 4,
            Cause::LocationAreaNotAllowed => 12,
            Cause::NormalClearing => 16,
            Cause::UserBusy => 17,
            Cause::NoUserResponding => 18,
            Cause::NoAnswer => 19,
            Cause::SubscriberAbsent => 20,
            Cause::CallRejected => 21,
            Cause::Congestion => 22,
            Cause::InsufficientResources => 26,
            Cause::NoCircuitAvailable => 34,
            Cause::RegularDeactivation => 36,
            Cause::TemporaryFailure => 41,
            Cause::ResourceUnavailable => 47,
            Cause::ServiceNotSupported => 63,
            Cause::InvalidTransactionId => 81,
            Cause::MessageNotCompatibleWithState => 101,
            Cause::RecoveryOnTimerExpiry => 102,
            Cause::ProtocolError => 111,
            Cause::RadioInterfaceFailure => 113,
            Cause::HandoverSuccessful => 114,
            Cause::HandoverCancelled => 115,
            Cause::HandoverImpossible => 116,
            Cause::Interworking => 127,
        }
    }
}

impl From<Cause> for u64 {
    fn from(e: Cause) -> Self { e.into_raw() }
}

impl core::fmt::Display for Cause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Cause::NormalRelease => write!(f, "NormalRelease"),
            Cause::UnassignedNumber => write!(f, "UnassignedNumber"),
            Cause::ImsiUnknownInHlr => write!(f, "ImsiUnknownInHlr"),
            Cause::NoRouteToDestination => write!(f, "NoRouteToDestination"),
            Cause::ImsiUnknownInVlr => write!(f, "ImsiUnknownInVlr"),
            Cause::LocationAreaNotAllowed => write!(f, "LocationAreaNotAllowed"),
            Cause::NormalClearing => write!(f, "NormalClearing"),
            Cause::UserBusy => write!(f, "UserBusy"),
            Cause::NoUserResponding => write!(f, "NoUserResponding"),
            Cause::NoAnswer => write!(f, "NoAnswer"),
            Cause::SubscriberAbsent => write!(f, "SubscriberAbsent"),
            Cause::CallRejected => write!(f, "CallRejected"),
            Cause::Congestion => write!(f, "Congestion"),
            Cause::InsufficientResources => write!(f, "InsufficientResources"),
            Cause::NoCircuitAvailable => write!(f, "NoCircuitAvailable"),
            Cause::RegularDeactivation => write!(f, "RegularDeactivation"),
            Cause::TemporaryFailure => write!(f, "TemporaryFailure"),
            Cause::ResourceUnavailable => write!(f, "ResourceUnavailable"),
            Cause::ServiceNotSupported => write!(f, "ServiceNotSupported"),
            Cause::InvalidTransactionId => write!(f, "InvalidTransactionId"),
            Cause::MessageNotCompatibleWithState => write!(f, "MessageNotCompatibleWithState"),
            Cause::RecoveryOnTimerExpiry => write!(f, "RecoveryOnTimerExpiry"),
            Cause::ProtocolError => write!(f, "ProtocolError"),
            Cause::RadioInterfaceFailure => write!(f, "RadioInterfaceFailure"),
            Cause::HandoverSuccessful => write!(f, "HandoverSuccessful"),
            Cause::HandoverCancelled => write!(f, "HandoverCancelled"),
            Cause::HandoverImpossible => write!(f, "HandoverImpossible"),
            Cause::Interworking => write!(f, "Interworking"),
        }
    }
}
