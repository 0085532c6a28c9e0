mod common;

use std::time::Duration;

use cell_core::debug;
use cell_entities::ms::SmState;
use cell_entities::{CellEntityTrait, Counter};
use cell_pdus::gtp::pdus::create_pdp_context::CreatePdpContextRequest;
use cell_saps::mmi::MmiCmd;
use common::{BS_A, ComponentTest, GW, GW_BASE_ADDRESS, IMSI_A, MS_A, MS_B, decode_all, default_test_config};

const NSAPI: u8 = 5;

fn activate(bandwidth_kbps: u32) -> MmiCmd {
    MmiCmd::ActivatePdp {
        nsapi: NSAPI,
        bandwidth_kbps,
    }
}

#[test]
fn test_pdp_activation_and_deactivation() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();
    test.power_on_all(&[MS_A]);

    test.mmi(MS_A, activate(32));
    test.run_secs(1);

    let ms = test.ms(MS_A);
    assert_eq!(ms.pdp_state(NSAPI), Some(SmState::Active));
    assert_eq!(ms.pdp_address(NSAPI), Some(GW_BASE_ADDRESS));
    assert_eq!(ms.stats().get(Counter::PdpActivated), 1);
    let channels = ms.app_channels();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].2.len(), 2, "32 kbps takes two 16 kbps channels");

    assert_eq!(test.bs(BS_A).pool().counts().in_use, 2);
    assert_eq!(test.gateway().num_contexts(), 1);
    let ctx = test.gateway().context(IMSI_A, NSAPI).cloned().expect("gateway context");
    assert_eq!(ctx.address_index, 0);
    assert_eq!(ctx.bandwidth_kbps, 32);
    assert_eq!(test.gateway().address_of(&ctx), GW_BASE_ADDRESS);
    assert_eq!(test.sc().stats().get(Counter::PdpActivated), 1);

    test.mmi(MS_A, MmiCmd::DeactivatePdp { nsapi: NSAPI });
    test.run_secs(1);

    let ms = test.ms(MS_A);
    assert_eq!(ms.pdp_state(NSAPI), None);
    assert_eq!(ms.num_apps(), 0);
    assert_eq!(ms.stats().get(Counter::PdpDeactivated), 1);
    assert_eq!(test.gateway().num_contexts(), 0);
    assert_eq!(test.gateway().stats().get(Counter::GatewayContextsDeleted), 1);
    assert_eq!(test.sc().num_txns(), 0);
    assert_eq!(test.bs(BS_A).pool().num_idle(), 10);
}

#[test]
fn test_gateway_address_pool_exhausted() {
    debug::setup_logging_verbose();
    let mut config = default_test_config();
    config.gateways[0].address_pool = 1;
    let mut test = ComponentTest::new(config);
    test.populate_entities(vec![]);
    test.power_on_all(&[MS_A, MS_B]);

    test.mmi(MS_A, activate(16));
    test.run_secs(1);
    assert_eq!(test.ms(MS_A).pdp_state(NSAPI), Some(SmState::Active));

    test.mmi(MS_B, activate(16));
    test.run_secs(1);

    let ms = test.ms(MS_B);
    assert_eq!(ms.pdp_state(NSAPI), None);
    assert_eq!(ms.num_apps(), 0);
    assert_eq!(ms.stats().get(Counter::PdpRejected), 1);
    assert_eq!(test.gateway().num_contexts(), 1);
    assert_eq!(test.sc().stats().get(Counter::PdpRejected), 1);

    // Once the address is back, the next activation gets it
    test.mmi(MS_A, MmiCmd::DeactivatePdp { nsapi: NSAPI });
    test.run_secs(1);
    test.mmi(MS_B, activate(16));
    test.run_secs(1);
    assert_eq!(test.ms(MS_B).pdp_state(NSAPI), Some(SmState::Active));
    assert_eq!(test.ms(MS_B).pdp_address(NSAPI), Some(GW_BASE_ADDRESS));
}

#[test]
fn test_pdp_context_lifetime_expiry() {
    debug::setup_logging_verbose();
    let mut config = default_test_config();
    config.timers.pdp_lifetime = Some(Duration::from_secs(10));
    let mut test = ComponentTest::new(config);
    test.populate_entities(vec![]);
    test.power_on_all(&[MS_A]);

    test.mmi(MS_A, activate(16));
    test.run_secs(5);
    assert_eq!(test.ms(MS_A).pdp_state(NSAPI), Some(SmState::Active));

    test.run_secs(10);
    let ms = test.ms(MS_A);
    assert_eq!(ms.pdp_state(NSAPI), None);
    assert_eq!(ms.num_apps(), 0);
    assert_eq!(ms.stats().get(Counter::PdpDeactivated), 1);

    assert_eq!(test.gateway().num_contexts(), 0);
    assert_eq!(test.sc().num_txns(), 0);
    assert_eq!(test.sc().stats().get(Counter::PdpDeactivated), 1);
    assert_eq!(test.bs(BS_A).pool().num_idle(), 10);
}

#[test]
fn test_gateway_not_answering() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    test.populate_entities(vec![GW]);
    test.power_on_all(&[MS_A]);

    test.mmi(MS_A, activate(16));
    test.run_secs(5);
    assert_eq!(test.ms(MS_A).pdp_state(NSAPI), Some(SmState::ActivePending));

    test.run_secs(5);
    let ms = test.ms(MS_A);
    assert_eq!(ms.pdp_state(NSAPI), None);
    assert_eq!(ms.num_apps(), 0);
    assert_eq!(ms.stats().get(Counter::PdpRejected), 1);

    let n3 = test.config.config().limits.n3_requests as u64;
    assert_eq!(test.sc().stats().get(Counter::GtpRetransmissions), n3 - 1);
    assert_eq!(test.sc().stats().get(Counter::PdpRejected), 1);
    assert_eq!(test.sc().num_txns(), 0);

    let requests = decode_all::<CreatePdpContextRequest>(&test.dump_sinks());
    assert_eq!(requests.len() as u64, n3);
    assert!(requests.iter().all(|r| r.imsi == IMSI_A && r.nsapi == NSAPI && r.seq == requests[0].seq));
    assert_eq!(test.bs(BS_A).pool().num_idle(), 10);
}
