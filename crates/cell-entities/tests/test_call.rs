mod common;

use std::time::Duration;

use cell_config::{CfgMs, SimConfig};
use cell_core::{Imsi, NodeId, debug};
use cell_entities::ms::CcState;
use cell_entities::sc::ScCcState;
use cell_entities::{CellEntityTrait, Counter};
use cell_saps::mmi::MmiCmd;
use common::{BS_A, BS_B, ComponentTest, IMSI_A, IMSI_B, IMSI_UNKNOWN, MS_A, MS_B, default_test_config};

const MS_C: NodeId = 102;
const IMSI_C: Imsi = 262_01_0000001003;

fn config_with_third_ms() -> SimConfig {
    let mut config = default_test_config();
    config.mss.push(CfgMs {
        node: MS_C,
        imsi: IMSI_C,
        cell: 1,
        power_on: false,
    });
    config
}

fn call(callee: Imsi) -> MmiCmd {
    MmiCmd::Originate {
        callee,
        bandwidth_kbps: 16,
    }
}

/// Sets up an active call from MS_A to MS_B
fn connect_a_to_b(test: &mut ComponentTest) {
    test.power_on_all(&[MS_A, MS_B]);
    test.mmi(MS_A, call(IMSI_B));
    test.run_secs(3);
    assert_eq!(test.ms(MS_A).call_states(), vec![CcState::Active]);
    assert_eq!(test.ms(MS_B).call_states(), vec![CcState::Active]);
}

#[test]
fn test_call_setup_and_clearing() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();
    test.power_on_all(&[MS_A, MS_B]);

    test.mmi(MS_A, call(IMSI_B));
    test.run_for(Duration::from_millis(500));

    // Callee rings until the answer delay passes
    assert_eq!(test.ms(MS_A).call_states(), vec![CcState::Alerting]);
    assert_eq!(test.ms(MS_B).call_states(), vec![CcState::Alerting]);
    assert_eq!(test.sc().call_states(IMSI_A), vec![ScCcState::CallDelivered]);
    assert_eq!(test.sc().call_states(IMSI_B), vec![ScCcState::CallReceived]);

    test.run_secs(2);
    assert_eq!(test.ms(MS_A).call_states(), vec![CcState::Active]);
    assert_eq!(test.ms(MS_B).call_states(), vec![CcState::Active]);
    assert_eq!(test.sc().call_states(IMSI_A), vec![ScCcState::Active]);
    assert_eq!(test.sc().call_states(IMSI_B), vec![ScCcState::Active]);
    assert_eq!(test.sc().circuits().counts().in_use, 1);
    assert_eq!(test.bs(BS_A).pool().counts().in_use, 2);
    assert_eq!(test.ms(MS_A).stats().get(Counter::CallsConnected), 1);
    assert_eq!(test.ms(MS_B).stats().get(Counter::CallsConnected), 1);
    assert_eq!(test.sc().stats().get(Counter::CallsConnected), 1);

    test.mmi(MS_A, MmiCmd::HangUp);
    test.run_secs(1);

    for ms in [MS_A, MS_B] {
        let ms = test.ms(ms);
        assert!(ms.call_states().is_empty());
        assert_eq!(ms.num_apps(), 0);
        assert_eq!(ms.stats().get(Counter::CallsCleared), 1);
        assert_eq!(ms.stats().get(Counter::CallsFailed), 0);
    }
    assert_eq!(test.sc().num_txns(), 0);
    assert_eq!(test.sc().stats().get(Counter::CallsCleared), 1);
    assert_eq!(test.sc().circuits().counts().in_use, 0);
    assert_eq!(test.bs(BS_A).pool().num_idle(), 10);
    assert_eq!(test.bs(BS_A).num_txns(), 0);
}

#[test]
fn test_callee_clears_call() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();
    connect_a_to_b(&mut test);

    test.mmi(MS_B, MmiCmd::HangUp);
    test.run_secs(1);

    assert!(test.ms(MS_A).call_states().is_empty());
    assert!(test.ms(MS_B).call_states().is_empty());
    assert_eq!(test.ms(MS_A).stats().get(Counter::CallsCleared), 1);
    assert_eq!(test.ms(MS_B).stats().get(Counter::CallsCleared), 1);
    assert_eq!(test.sc().num_txns(), 0);
    assert_eq!(test.sc().circuits().num_idle(), 10);
}

#[test]
fn test_call_to_unregistered_subscriber() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();
    test.power_on_all(&[MS_A]);

    test.mmi(MS_A, call(IMSI_UNKNOWN));
    test.run_secs(1);

    let ms = test.ms(MS_A);
    assert!(ms.call_states().is_empty());
    assert_eq!(ms.num_apps(), 0);
    assert_eq!(ms.stats().get(Counter::CallAttempts), 1);
    assert_eq!(ms.stats().get(Counter::CallsFailed), 1);
    assert_eq!(ms.stats().get(Counter::CallsConnected), 0);

    assert_eq!(test.sc().num_txns(), 0);
    assert_eq!(test.sc().stats().get(Counter::CallsFailed), 1);
    assert_eq!(test.sc().circuits().num_idle(), 10);
    assert_eq!(test.bs(BS_A).pool().num_idle(), 10);
}

#[test]
fn test_call_without_registration_fails_locally() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();

    test.mmi(MS_A, call(IMSI_B));
    test.run_secs(1);

    let ms = test.ms(MS_A);
    assert_eq!(ms.stats().get(Counter::CallsFailed), 1);
    assert_eq!(ms.stats().get(Counter::ChannelRequestsSent), 0);
    assert_eq!(test.sc().stats().get(Counter::CallAttempts), 0);
}

#[test]
fn test_call_to_busy_subscriber() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(config_with_third_ms());
    test.populate_entities(vec![]);
    test.power_on_all(&[MS_C]);
    connect_a_to_b(&mut test);

    test.mmi(MS_C, call(IMSI_A));
    test.run_secs(1);

    let ms = test.ms(MS_C);
    assert!(ms.call_states().is_empty());
    assert_eq!(ms.stats().get(Counter::CallsFailed), 1);

    // The existing call is untouched
    assert_eq!(test.ms(MS_A).call_states(), vec![CcState::Active]);
    assert_eq!(test.ms(MS_B).call_states(), vec![CcState::Active]);
    assert_eq!(test.sc().circuits().counts().in_use, 1);
}

#[test]
fn test_no_circuit_available() {
    debug::setup_logging_verbose();
    let mut config = config_with_third_ms();
    config.scs[0].circuits = 1;
    let mut test = ComponentTest::new(config);
    test.populate_entities(vec![]);
    test.power_on_all(&[MS_C]);
    connect_a_to_b(&mut test);
    assert_eq!(test.sc().circuits().num_idle(), 0);

    test.mmi(MS_C, call(IMSI_B));
    test.run_secs(1);

    assert_eq!(test.sc().stats().get(Counter::CircuitRejects), 1);
    let ms = test.ms(MS_C);
    assert!(ms.call_states().is_empty());
    assert_eq!(ms.num_apps(), 0);
    assert_eq!(ms.stats().get(Counter::CallsFailed), 1);

    // Clearing the first call frees the circuit for the next one
    test.mmi(MS_A, MmiCmd::HangUp);
    test.run_secs(1);
    assert_eq!(test.sc().circuits().num_idle(), 1);

    test.mmi(MS_C, call(IMSI_B));
    test.run_secs(3);
    assert_eq!(test.ms(MS_C).call_states(), vec![CcState::Active]);
    assert_eq!(test.ms(MS_B).call_states(), vec![CcState::Active]);
}

#[test]
fn test_paging_without_answer() {
    debug::setup_logging_verbose();
    let mut config = default_test_config();
    config.timers.t3113 = Duration::from_secs(5);
    let mut test = ComponentTest::new(config);
    test.populate_entities(vec![BS_B]);
    test.power_on_all(&[MS_A, MS_B]);

    // MS_B moves to a cell whose BS never answers, so it stops being registered
    // while the SC still sends its paging to BS_A
    test.mmi(MS_B, MmiCmd::CampOn { cell: 3 });
    test.run_secs(1);
    assert!(test.sc().vlr_record(IMSI_B).is_some_and(|r| r.bs == BS_A));

    test.mmi(MS_A, call(IMSI_B));
    test.run_secs(1);
    assert_eq!(test.sc().call_states(IMSI_B), vec![ScCcState::Paging]);
    assert_eq!(test.ms(MS_A).call_states(), vec![CcState::Proceeding]);

    test.run_secs(19);
    let max_paging = test.config.config().limits.max_paging_attempts as u64;
    assert_eq!(test.sc().stats().get(Counter::PagingAttempts), max_paging);
    assert_eq!(test.sc().stats().get(Counter::PagingFailures), 1);
    assert!(test.sc().call_states(IMSI_B).is_empty());
    assert!(test.sc().call_states(IMSI_A).is_empty());
    assert_eq!(test.sc().circuits().num_idle(), 10);

    let ms = test.ms(MS_A);
    assert!(ms.call_states().is_empty());
    assert_eq!(ms.stats().get(Counter::CallsFailed), 1);
    assert_eq!(test.bs(BS_A).pool().num_idle(), 10);
}
