use std::collections::BTreeMap;

use cell_core::{CellRole, NodeId, PoolCounts, SimTime};
use serde::Serialize;

/// Event counters kept per node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Counter {
    // Radio resource
    ChannelRequestsSent,
    ChannelsAssigned,
    ChannelsRejected,
    ChannelRequestFailures,
    ChannelsAdmitted,
    AdmissionRejects,
    AssignmentTimeouts,
    ChannelsReleased,

    // Mobility management
    LocationUpdateAttempts,
    LocationUpdateSuccess,
    LocationUpdateRejected,
    LocationUpdateFailures,
    ImsiDetaches,
    VlrRecordsExpired,
    HlrUpdates,
    PagingAttempts,
    PagingFailures,

    // Call control
    CallAttempts,
    CallsConnected,
    CallsFailed,
    CallsCleared,
    CircuitRejects,

    // Session management
    PdpActivateAttempts,
    PdpActivated,
    PdpRejected,
    PdpDeactivated,
    GtpRetransmissions,
    GatewayContextsCreated,
    GatewayContextsDeleted,

    // Handover
    HandoverRequired,
    HandoverSuccess,
    HandoverFailures,

    // Generic
    TableExhausted,
    TimerExpiries,
    DroppedMessages,
}

/// Counters of one node. Only counters that were incremented at least once are present.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct NodeStats {
    counters: BTreeMap<Counter, u64>,
}

impl NodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&mut self, counter: Counter) {
        *self.counters.entry(counter).or_insert(0) += 1;
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.counters.get(&counter).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Counter, &u64)> {
        self.counters.iter()
    }
}

/// Counters kept by the message router itself
#[derive(Debug, Clone, Default, Serialize)]
pub struct RouterStats {
    pub delivered: u64,
    pub undeliverable: u64,
    pub cancelled_timers: u64,
    pub messages_sent: u64,
    pub bytes_sent: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    pub role: CellRole,
    pub counters: NodeStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolCounts>,
}

/// Snapshot of all statistics at one point in simulated time
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub time: SimTime,
    pub router: RouterStats,
    pub nodes: BTreeMap<NodeId, NodeReport>,
}

impl StatsReport {
    /// Sum of one counter over all nodes
    pub fn total(&self, counter: Counter) -> u64 {
        self.nodes.values().map(|n| n.counters.get(counter)).sum()
    }
}
