use std::time::Duration;

use cell_config::{CfgBs, CfgGateway, CfgHlr, CfgMs, CfgSc, SharedConfig, SimConfig};
use cell_core::{Imsi, NodeId, Sap, SimTime};
use cell_entities::bs::BaseStation;
use cell_entities::gateway::Gateway;
use cell_entities::hlr::Hlr;
use cell_entities::ms::MobileStation;
use cell_entities::sc::SwitchingCenter;
use cell_entities::stats::StatsReport;
use cell_entities::{CellEntityTrait, MessageRouter};
use cell_pdus::{L3Message, TiField, encode};
use cell_saps::mmi::MmiCmd;
use cell_saps::transport::TransportUnitdataInd;
use cell_saps::{SapMsg, SapMsgInner};

use super::sink::Sink;

pub const HLR: NodeId = 1;
pub const GW: NodeId = 2;
pub const SC: NodeId = 3;
/// Serves cells 1 and 2 in location area 100
pub const BS_A: NodeId = 10;
/// Serves cell 3 in location area 200
pub const BS_B: NodeId = 11;
pub const MS_A: NodeId = 100;
pub const MS_B: NodeId = 101;

pub const IMSI_A: Imsi = 262_01_0000001001;
pub const IMSI_B: Imsi = 262_01_0000001002;
/// Not provisioned anywhere
pub const IMSI_UNKNOWN: Imsi = 262_01_0000009999;

pub const LAC_A: u16 = 100;
pub const LAC_B: u16 = 200;

pub const GW_BASE_ADDRESS: u32 = 0x0a00_0001;

/// Creates a default config for testing: one HLR, Gateway and SC, two base
/// stations and two switched-off MSs in cell 1. It can still be modified as
/// needed before passing it to the ComponentTest constructor
pub fn default_test_config() -> SimConfig {
    SimConfig {
        seed: 7,
        hlrs: vec![CfgHlr { node: HLR }],
        gateways: vec![CfgGateway {
            node: GW,
            address_pool: 4,
            base_address: GW_BASE_ADDRESS,
        }],
        scs: vec![CfgSc {
            node: SC,
            hlr: HLR,
            gateway: Some(GW),
            circuits: 10,
        }],
        bss: vec![
            CfgBs {
                node: BS_A,
                sc: SC,
                lac: LAC_A,
                cells: vec![1, 2],
                channels: 10,
                channel_bandwidth_kbps: 16,
            },
            CfgBs {
                node: BS_B,
                sc: SC,
                lac: LAC_B,
                cells: vec![3],
                channels: 10,
                channel_bandwidth_kbps: 16,
            },
        ],
        mss: vec![
            CfgMs {
                node: MS_A,
                imsi: IMSI_A,
                cell: 1,
                power_on: false,
            },
            CfgMs {
                node: MS_B,
                imsi: IMSI_B,
                cell: 1,
                power_on: false,
            },
        ],
        ..Default::default()
    }
}

/// Infrastructure for testing network nodes
/// Quick setup of all configured nodes for end-to-end testing
/// Supports replacing nodes by sinks for collecting messages for later inspection
pub struct ComponentTest {
    pub config: SharedConfig,
    pub router: MessageRouter,
    pub sinks: Vec<NodeId>,
}

impl ComponentTest {
    pub fn new(config: SimConfig) -> Self {
        let shared_config = SharedConfig::from_config(config);
        let router = MessageRouter::new(shared_config.clone());
        Self {
            config: shared_config,
            router,
            sinks: vec![],
        }
    }

    /// Shortcut: default topology with every node registered
    pub fn with_defaults() -> Self {
        let mut test = Self::new(default_test_config());
        test.populate_entities(vec![]);
        test
    }

    pub fn get_shared_config(&self) -> SharedConfig {
        self.config.clone()
    }

    /// Registers an entity for every configured node, except for those listed in
    /// `sinks`, which get a Sink of the same role instead
    pub fn populate_entities(&mut self, sinks: Vec<NodeId>) {
        let cfg = self.config.config();
        for hlr in cfg.hlrs.iter().filter(|c| !sinks.contains(&c.node)) {
            self.register_entity(Hlr::new(hlr));
        }
        for gw in cfg.gateways.iter().filter(|c| !sinks.contains(&c.node)) {
            self.register_entity(Gateway::new(self.config.clone(), gw));
        }
        for sc in cfg.scs.iter().filter(|c| !sinks.contains(&c.node)) {
            self.register_entity(SwitchingCenter::new(self.config.clone(), sc));
        }
        for bs in cfg.bss.iter().filter(|c| !sinks.contains(&c.node)) {
            self.register_entity(BaseStation::new(self.config.clone(), bs));
        }
        for ms in cfg.mss.iter().filter(|c| !sinks.contains(&c.node)) {
            self.register_entity(MobileStation::new(self.config.clone(), ms));
        }

        self.create_sinks(sinks);
    }

    fn create_sinks(&mut self, sinks: Vec<NodeId>) {
        let cfg = self.config.config();
        for node in sinks {
            assert!(!self.sinks.contains(&node), "Sink already exists: {}", node);
            assert!(self.router.get_entity(node).is_none(), "Sink already registered as entity: {}", node);
            let role = cfg.role_of(node).unwrap_or_else(|| panic!("Sink for unconfigured node {}", node));
            self.sinks.push(node);
            self.register_entity(Sink::new(node, role));
        }
    }

    /// Swaps a running entity for a Sink. Whatever the other nodes learned about
    /// it stays, so the test can play its part from there.
    pub fn replace_with_sink(&mut self, node: NodeId) {
        let role = self
            .config
            .config()
            .role_of(node)
            .unwrap_or_else(|| panic!("Sink for unconfigured node {}", node));
        assert!(!self.sinks.contains(&node), "Sink already exists: {}", node);
        self.sinks.push(node);
        self.register_entity(Sink::new(node, role));
    }

    pub fn register_entity<T: 'static + CellEntityTrait>(&mut self, entity: T) {
        self.router.register_entity(Box::new(entity));
    }

    /// Typed access to a registered entity
    pub fn entity<T: 'static>(&mut self, node: NodeId) -> &mut T {
        self.router
            .get_entity(node)
            .and_then(|e| e.as_any_mut().downcast_mut::<T>())
            .unwrap_or_else(|| panic!("node {} missing or of other type", node))
    }

    pub fn ms(&mut self, node: NodeId) -> &mut MobileStation {
        self.entity::<MobileStation>(node)
    }

    pub fn bs(&mut self, node: NodeId) -> &mut BaseStation {
        self.entity::<BaseStation>(node)
    }

    pub fn sc(&mut self) -> &mut SwitchingCenter {
        self.entity::<SwitchingCenter>(SC)
    }

    pub fn gateway(&mut self) -> &mut Gateway {
        self.entity::<Gateway>(GW)
    }

    pub fn hlr(&mut self) -> &mut Hlr {
        self.entity::<Hlr>(HLR)
    }

    /// Issues a user command at the current simulated time
    pub fn mmi(&mut self, node: NodeId, cmd: MmiCmd) {
        let now = self.router.now();
        self.router.submit_mmi(node, now, cmd);
    }

    pub fn mmi_at(&mut self, node: NodeId, at: SimTime, cmd: MmiCmd) {
        self.router.submit_mmi(node, at, cmd);
    }

    pub fn submit_message(&mut self, message: SapMsg) {
        self.router.submit_message(message);
    }

    /// Delivers `pdu` to `dest` now, as if `src` had sent it
    pub fn inject<M: L3Message>(&mut self, src: NodeId, dest: NodeId, pdu: &M) {
        let bytes = encode(TiField::NONE, pdu).expect("encodable");
        self.submit_message(SapMsg {
            sap: Sap::TransportSap,
            src,
            dest,
            time: self.now(),
            msg: SapMsgInner::TransportUnitdataInd(TransportUnitdataInd { bytes }),
        });
    }

    /// Runs the network for `duration` of simulated time. Periodic timers keep
    /// the event heap from ever draining, so runs are always bounded.
    pub fn run_for(&mut self, duration: Duration) {
        self.router.run_for(duration);
    }

    pub fn run_secs(&mut self, secs: u64) {
        self.run_for(Duration::from_secs(secs));
    }

    pub fn now(&self) -> SimTime {
        self.router.now()
    }

    pub fn report(&self) -> StatsReport {
        self.router.stats_report()
    }

    /// Switches on the given MSs and waits for their registration
    pub fn power_on_all(&mut self, nodes: &[NodeId]) {
        for node in nodes {
            self.mmi(*node, MmiCmd::PowerOn);
        }
        self.run_secs(1);
    }

    pub fn dump_sinks(&mut self) -> Vec<SapMsg> {
        let mut msgs = vec![];
        for sink in self.sinks.clone() {
            if let Some(component) = self.router.get_entity(sink) {
                if let Some(sink) = component.as_any_mut().downcast_mut::<Sink>() {
                    let mut sink_msgs = sink.take_msgqueue();
                    msgs.append(&mut sink_msgs);
                }
            }
        }
        msgs
    }
}
