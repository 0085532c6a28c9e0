//! Builds a running network from the configuration

use cell_config::{ScriptAction, SharedConfig};
use cell_core::SimTime;
use cell_saps::mmi::MmiCmd;

use crate::MessageRouter;
use crate::bs::BaseStation;
use crate::gateway::Gateway;
use crate::hlr::Hlr;
use crate::ms::MobileStation;
use crate::sc::SwitchingCenter;

/// User command an MS receives for a scripted action
pub fn mmi_for_action(action: &ScriptAction) -> MmiCmd {
    match *action {
        ScriptAction::PowerOn => MmiCmd::PowerOn,
        ScriptAction::PowerOff => MmiCmd::PowerOff,
        ScriptAction::Call { callee, bandwidth_kbps } => MmiCmd::Originate { callee, bandwidth_kbps },
        ScriptAction::HangUp => MmiCmd::HangUp,
        ScriptAction::ActivatePdp { nsapi, bandwidth_kbps } => MmiCmd::ActivatePdp { nsapi, bandwidth_kbps },
        ScriptAction::DeactivatePdp { nsapi } => MmiCmd::DeactivatePdp { nsapi },
        ScriptAction::Measurement { cell, quality } => MmiCmd::Measurement { cell, quality },
        ScriptAction::CampOn { cell } => MmiCmd::CampOn { cell },
    }
}

/// Registers one entity per configured node
pub fn register_entities(router: &mut MessageRouter, config: &SharedConfig) {
    let cfg = config.config();
    for hlr in cfg.hlrs.iter() {
        router.register_entity(Box::new(Hlr::new(hlr)));
    }
    for gw in cfg.gateways.iter() {
        router.register_entity(Box::new(Gateway::new(config.clone(), gw)));
    }
    for sc in cfg.scs.iter() {
        router.register_entity(Box::new(SwitchingCenter::new(config.clone(), sc)));
    }
    for bs in cfg.bss.iter() {
        router.register_entity(Box::new(BaseStation::new(config.clone(), bs)));
    }
    for ms in cfg.mss.iter() {
        router.register_entity(Box::new(MobileStation::new(config.clone(), ms)));
    }
}

/// Queues the power-on of MSs switched on at start and every scripted action
pub fn submit_scenario(router: &mut MessageRouter, config: &SharedConfig) {
    let cfg = config.config();
    for ms in cfg.mss.iter().filter(|ms| ms.power_on) {
        router.submit_mmi(ms.node, SimTime::ZERO, MmiCmd::PowerOn);
    }
    for entry in cfg.script.iter() {
        router.submit_mmi(entry.node, entry.at, mmi_for_action(&entry.action));
    }
    tracing::info!(
        "scenario: {} ms, {} bs, {} sc, {} script entries",
        cfg.mss.len(),
        cfg.bss.len(),
        cfg.scs.len(),
        cfg.script.len()
    );
}

/// Router with all nodes registered and the scenario queued
pub fn build_router(config: SharedConfig) -> MessageRouter {
    let mut router = MessageRouter::new(config.clone());
    register_entities(&mut router, &config);
    submit_scenario(&mut router, &config);
    router
}
