// SAPs through which events reach an entity
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Sap {
    /// Bytes received from the transport
    TransportSap,

    /// Expiry of a timer scheduled through the Timer Registry
    TimerSap,

    /// User / application commands (originate, hang up, move, measure)
    MmiSap,

    /// RR -> MM/CC/SM primitives inside an MS
    RrSap,

    /// Call leg linking inside an SC
    CallLegSap,
}

/// Sublayers of the protocol core
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Sublayer {
    /// Radio resource: channel request, assignment, release
    Rr,
    /// Mobility management: location update, detach, paging response
    Mm,
    /// Call control
    Cc,
    /// Session management: packet data contexts
    Sm,
    /// Handover between channels and cells
    Ho,
}
