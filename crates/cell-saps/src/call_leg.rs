use cell_core::TxnId;

/// Progress of one call leg, reported to the linked leg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegEvent {
    /// Called party is being alerted
    Alerting,
    /// Called party answered
    Connected,
    /// Peer leg is clearing, raw cause value
    Disconnected(u8),
    /// Peer leg could not be set up, raw cause value
    Failed(u8),
}

/// Event for call leg `leg`, raised by its linked leg
#[derive(Debug, Clone, Copy)]
pub struct CallLegInd {
    pub leg: TxnId,
    pub event: LegEvent,
}
