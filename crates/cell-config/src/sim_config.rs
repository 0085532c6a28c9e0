use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use cell_core::admission::{
    AdmissionPolicy, RefrainProbabilityPolicy, SimpleMaxUserPolicy, ThresholdPolicy,
};
use cell_core::{CellId, CellRole, Imsi, Lac, NodeId, SimTime, imsi_is_valid};
use serde::Deserialize;

/// Protocol timer durations
#[derive(Debug, Clone)]
pub struct CfgTimers {
    /// MS waits for immediate assignment after a channel request
    pub t3126: Duration,
    /// BS waits for the MS to take a tentatively assigned channel into use
    pub t3101: Duration,
    /// MS waits for a location update response
    pub t3210: Duration,
    /// MS delay before the next location update attempt
    pub t3211: Duration,
    /// Periodic location update
    pub t3212: Duration,
    /// MS waits for a CM service response
    pub t3230: Duration,
    /// SC waits for a paging response
    pub t3113: Duration,
    pub t301: Duration,
    pub t303: Duration,
    pub t305: Duration,
    pub t308: Duration,
    pub t310: Duration,
    pub t313: Duration,
    /// MS waits for PDP context activation response
    pub t3380: Duration,
    /// MS waits for PDP context deactivation response
    pub t3390: Duration,
    /// SC waits for PDP context deactivation response
    pub t3395: Duration,
    /// SC waits for a Gateway response
    pub t3_response: Duration,
    /// Source BS waits for handover command after handover required
    pub t7: Duration,
    /// Source BS waits for clearing after handover command
    pub t8: Duration,
    /// SC waits for handover complete
    pub t3103: Duration,
    /// VLR record lifetime without a location update
    pub vlr_lifetime: Duration,
    /// MS answers an alerting call after this delay
    pub answer_delay: Duration,
    /// Gateway deletes contexts older than this, if set
    pub pdp_lifetime: Option<Duration>,
}

impl Default for CfgTimers {
    fn default() -> Self {
        Self {
            t3126: Duration::from_secs(5),
            t3101: Duration::from_secs(3),
            t3210: Duration::from_secs(10),
            t3211: Duration::from_secs(15),
            t3212: Duration::from_secs(1800),
            t3230: Duration::from_secs(15),
            t3113: Duration::from_secs(10),
            t301: Duration::from_secs(30),
            t303: Duration::from_secs(30),
            t305: Duration::from_secs(30),
            t308: Duration::from_secs(30),
            t310: Duration::from_secs(30),
            t313: Duration::from_secs(30),
            t3380: Duration::from_secs(30),
            t3390: Duration::from_secs(8),
            t3395: Duration::from_secs(8),
            t3_response: Duration::from_secs(3),
            t7: Duration::from_secs(10),
            t8: Duration::from_secs(10),
            t3103: Duration::from_secs(10),
            vlr_lifetime: Duration::from_secs(7200),
            answer_delay: Duration::from_secs(2),
            pdp_lifetime: None,
        }
    }
}

/// Retry counts and table capacities
#[derive(Debug, Clone)]
pub struct CfgLimits {
    /// Total channel request transmissions before giving up
    pub num_channel_request_attempts: u8,
    pub max_location_update_attempts: u8,
    /// Total RELEASE transmissions before a call is abandoned
    pub max_release_attempts: u8,
    /// Total SM request transmissions before giving up
    pub max_sm_attempts: u8,
    pub max_paging_attempts: u8,
    /// Total Gateway request transmissions before giving up
    pub n3_requests: u8,
    pub max_active_app_per_ms: u16,
    pub max_active_app_per_bs: u16,
    pub max_active_app_per_sc: u16,
    pub max_contexts_per_gateway: u16,
}

impl Default for CfgLimits {
    fn default() -> Self {
        Self {
            num_channel_request_attempts: 4,
            max_location_update_attempts: 4,
            max_release_attempts: 2,
            max_sm_attempts: 5,
            max_paging_attempts: 3,
            n3_requests: 3,
            max_active_app_per_ms: 50,
            max_active_app_per_bs: 1000,
            max_active_app_per_sc: 1000,
            max_contexts_per_gateway: 1000,
        }
    }
}

/// Transmission delay model of the transport
#[derive(Debug, Clone)]
pub struct CfgTransport {
    /// Delay on links with an MS at one end
    pub radio_delay: Duration,
    /// Delay between network nodes
    pub wired_delay: Duration,
}

impl Default for CfgTransport {
    fn default() -> Self {
        Self {
            radio_delay: Duration::from_millis(5),
            wired_delay: Duration::from_millis(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AdmissionPolicyKind {
    Threshold,
    SimpleMaxUser,
    RefrainProbability,
}

/// Admission policy for BS radio channel pools
#[derive(Debug, Clone)]
pub struct CfgAdmission {
    pub policy: AdmissionPolicyKind,
    /// Threshold: channels held back for handovers
    pub guard_channels: u16,
    /// SimpleMaxUser: busy channel ceiling. Defaults to the pool capacity
    pub max_users: Option<u16>,
    /// RefrainProbability: busy channels above which new requests may be refused
    pub refrain_threshold: u16,
    pub refrain_probability: f64,
}

impl Default for CfgAdmission {
    fn default() -> Self {
        Self {
            policy: AdmissionPolicyKind::Threshold,
            guard_channels: 1,
            max_users: None,
            refrain_threshold: 8,
            refrain_probability: 0.5,
        }
    }
}

impl CfgAdmission {
    /// Builds the configured policy for a pool of `capacity` slots
    pub fn build_policy(&self, capacity: u16, seed: u64) -> Box<dyn AdmissionPolicy> {
        match self.policy {
            AdmissionPolicyKind::Threshold => Box::new(ThresholdPolicy { guard_channels: self.guard_channels }),
            AdmissionPolicyKind::SimpleMaxUser => Box::new(SimpleMaxUserPolicy {
                max_users: self.max_users.unwrap_or(capacity),
            }),
            AdmissionPolicyKind::RefrainProbability => Box::new(RefrainProbabilityPolicy::new(
                self.refrain_threshold,
                self.refrain_probability,
                seed,
            )),
        }
    }
}

/// Handover decision parameters, in signal quality units (0..=63)
#[derive(Debug, Clone)]
pub struct CfgHandover {
    pub enabled: bool,
    /// Serving quality below which a handover is considered
    pub threshold: u8,
    /// Neighbour must be better than serving by at least this
    pub margin: u8,
    /// MS refuses a handover command to a cell measured below this
    pub min_access_quality: u8,
}

impl Default for CfgHandover {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 20,
            margin: 6,
            min_access_quality: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CfgHlr {
    pub node: NodeId,
}

#[derive(Debug, Clone)]
pub struct CfgGateway {
    pub node: NodeId,
    pub address_pool: u16,
    /// First address handed out, as a 32-bit IPv4 address
    pub base_address: u32,
}

#[derive(Debug, Clone)]
pub struct CfgSc {
    pub node: NodeId,
    pub hlr: NodeId,
    pub gateway: Option<NodeId>,
    pub circuits: u16,
}

#[derive(Debug, Clone)]
pub struct CfgBs {
    pub node: NodeId,
    pub sc: NodeId,
    pub lac: Lac,
    /// Cells (sectors) served by this BS, sharing one channel pool
    pub cells: Vec<CellId>,
    pub channels: u16,
    pub channel_bandwidth_kbps: u32,
}

#[derive(Debug, Clone)]
pub struct CfgMs {
    pub node: NodeId,
    pub imsi: Imsi,
    /// Cell the MS is camped on at start
    pub cell: CellId,
    /// Whether the MS is switched on at time zero
    pub power_on: bool,
}

/// Scripted user action
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptAction {
    PowerOn,
    PowerOff,
    Call { callee: Imsi, bandwidth_kbps: u32 },
    HangUp,
    ActivatePdp { nsapi: u8, bandwidth_kbps: u32 },
    DeactivatePdp { nsapi: u8 },
    Measurement { cell: CellId, quality: u8 },
    CampOn { cell: CellId },
}

#[derive(Debug, Clone)]
pub struct CfgScriptEntry {
    pub at: SimTime,
    pub node: NodeId,
    pub action: ScriptAction,
}

#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    pub debug_log: Option<String>,
    /// Seed for all pseudo-random decisions
    pub seed: u64,

    pub timers: CfgTimers,
    pub limits: CfgLimits,
    pub transport: CfgTransport,
    pub admission: CfgAdmission,
    pub handover: CfgHandover,

    pub hlrs: Vec<CfgHlr>,
    pub gateways: Vec<CfgGateway>,
    pub scs: Vec<CfgSc>,
    pub bss: Vec<CfgBs>,
    pub mss: Vec<CfgMs>,

    pub script: Vec<CfgScriptEntry>,
}

impl SimConfig {
    pub fn role_of(&self, node: NodeId) -> Option<CellRole> {
        if self.mss.iter().any(|c| c.node == node) {
            Some(CellRole::Ms)
        } else if self.bss.iter().any(|c| c.node == node) {
            Some(CellRole::Bs)
        } else if self.scs.iter().any(|c| c.node == node) {
            Some(CellRole::Sc)
        } else if self.gateways.iter().any(|c| c.node == node) {
            Some(CellRole::Gateway)
        } else if self.hlrs.iter().any(|c| c.node == node) {
            Some(CellRole::Hlr)
        } else {
            None
        }
    }

    pub fn bs(&self, node: NodeId) -> Option<&CfgBs> {
        self.bss.iter().find(|c| c.node == node)
    }

    /// BS serving `cell`
    pub fn bs_for_cell(&self, cell: CellId) -> Option<&CfgBs> {
        self.bss.iter().find(|c| c.cells.contains(&cell))
    }

    pub fn sc(&self, node: NodeId) -> Option<&CfgSc> {
        self.scs.iter().find(|c| c.node == node)
    }

    pub fn ms(&self, node: NodeId) -> Option<&CfgMs> {
        self.mss.iter().find(|c| c.node == node)
    }

    pub fn gateway(&self, node: NodeId) -> Option<&CfgGateway> {
        self.gateways.iter().find(|c| c.node == node)
    }

    /// Validate cross references and limits. Configuration faults are fatal at init.
    pub fn validate(&self) -> Result<(), String> {
        let mut nodes = HashSet::new();
        let all_nodes = self
            .hlrs
            .iter()
            .map(|c| c.node)
            .chain(self.gateways.iter().map(|c| c.node))
            .chain(self.scs.iter().map(|c| c.node))
            .chain(self.bss.iter().map(|c| c.node))
            .chain(self.mss.iter().map(|c| c.node));
        for node in all_nodes {
            if !nodes.insert(node) {
                return Err(format!("duplicate node id {}", node));
            }
        }

        for sc in self.scs.iter() {
            if !self.hlrs.iter().any(|h| h.node == sc.hlr) {
                return Err(format!("sc {} refers to unknown hlr {}", sc.node, sc.hlr));
            }
            if let Some(gw) = sc.gateway {
                if self.gateway(gw).is_none() {
                    return Err(format!("sc {} refers to unknown gateway {}", sc.node, gw));
                }
            }
            if sc.circuits == 0 {
                return Err(format!("sc {} has no circuits", sc.node));
            }
        }

        let mut cells = HashSet::new();
        for bs in self.bss.iter() {
            if self.sc(bs.sc).is_none() {
                return Err(format!("bs {} refers to unknown sc {}", bs.node, bs.sc));
            }
            if bs.cells.is_empty() {
                return Err(format!("bs {} serves no cells", bs.node));
            }
            if bs.channels == 0 {
                return Err(format!("bs {} has no channels", bs.node));
            }
            for cell in bs.cells.iter() {
                if !cells.insert(*cell) {
                    return Err(format!("cell {} served by more than one bs", cell));
                }
            }
        }

        let mut imsis = HashSet::new();
        for ms in self.mss.iter() {
            if self.bs_for_cell(ms.cell).is_none() {
                return Err(format!("ms {} camps on unknown cell {}", ms.node, ms.cell));
            }
            if !imsi_is_valid(ms.imsi) {
                return Err(format!("ms {} has invalid imsi {}", ms.node, ms.imsi));
            }
            if !imsis.insert(ms.imsi) {
                return Err(format!("duplicate imsi {}", ms.imsi));
            }
        }

        for gw in self.gateways.iter() {
            if gw.address_pool == 0 {
                return Err(format!("gateway {} has an empty address pool", gw.node));
            }
        }

        let l = &self.limits;
        if l.max_active_app_per_ms == 0 || l.max_active_app_per_ms > 255 {
            return Err("max_active_app_per_ms must be within 1..=255".to_string());
        }
        if l.max_active_app_per_bs == 0 || l.max_active_app_per_sc == 0 || l.max_contexts_per_gateway == 0 {
            return Err("transaction table capacities must be non-zero".to_string());
        }
        if l.num_channel_request_attempts == 0
            || l.max_location_update_attempts == 0
            || l.max_release_attempts == 0
            || l.max_sm_attempts == 0
            || l.max_paging_attempts == 0
            || l.n3_requests == 0
        {
            return Err("attempt limits must be at least 1".to_string());
        }

        if !(0.0..=1.0).contains(&self.admission.refrain_probability) {
            return Err("admission.refrain_probability must be within 0..=1".to_string());
        }
        if self.handover.threshold > 63 || self.handover.min_access_quality > 63 {
            return Err("handover quality values must be within 0..=63".to_string());
        }

        for entry in self.script.iter() {
            let Some(role) = self.role_of(entry.node) else {
                return Err(format!("script entry at {} refers to unknown node {}", entry.at, entry.node));
            };
            if role != CellRole::Ms {
                return Err(format!("script entry at {} targets {} node {}, expected an MS", entry.at, role, entry.node));
            }
            match entry.action {
                ScriptAction::Measurement { cell, .. } | ScriptAction::CampOn { cell } => {
                    if self.bs_for_cell(cell).is_none() {
                        return Err(format!("script entry at {} refers to unknown cell {}", entry.at, cell));
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Global shared configuration: immutable after construction, cloned into every entity
#[derive(Clone)]
pub struct SharedConfig {
    cfg: Arc<SimConfig>,
}

impl SharedConfig {
    /// Wraps a configuration, panicking if it is invalid
    pub fn from_config(cfg: SimConfig) -> Self {
        match Self::try_from_config(cfg) {
            Ok(c) => c,
            Err(e) => panic!("Invalid simulation configuration: {}", e),
        }
    }

    pub fn try_from_config(cfg: SimConfig) -> Result<Self, String> {
        cfg.validate()?;
        Ok(Self { cfg: Arc::new(cfg) })
    }

    /// Access immutable config.
    pub fn config(&self) -> Arc<SimConfig> {
        Arc::clone(&self.cfg)
    }
}
