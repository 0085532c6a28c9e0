mod common;

use std::time::Duration;

use cell_config::AdmissionPolicyKind;
use cell_core::{ChanRef, PoolCounts, ResourceKind, ResourceStatus, debug};
use cell_entities::ms::{CcState, MmState};
use cell_entities::{CellEntityTrait, Counter};
use cell_pdus::Cause;
use cell_pdus::bssmap::pdus::clear::ClearCommand;
use cell_pdus::rr::pdus::channel_release::ChannelRelease;
use cell_saps::mmi::MmiCmd;
use common::{BS_A, ComponentTest, IMSI_B, MS_A, MS_B, SC, default_test_config};

fn counts(test: &mut ComponentTest) -> PoolCounts {
    test.bs(BS_A).pool().counts()
}

#[test]
fn test_channel_lifecycle_during_location_update() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();
    assert_eq!(test.bs(BS_A).pool().capacity(), 10);

    test.mmi(MS_A, MmiCmd::PowerOn);

    // Channel request arrived, assignment sent
    test.run_for(Duration::from_millis(6));
    let c = counts(&mut test);
    assert_eq!((c.idle, c.tentative, c.in_use, c.reserved), (9, 1, 0, 0));
    assert_eq!(test.bs(BS_A).num_txns(), 1);

    // Assignment complete arrived
    test.run_for(Duration::from_millis(10));
    let c = counts(&mut test);
    assert_eq!((c.idle, c.tentative, c.in_use, c.reserved), (9, 0, 1, 0));
    let channels = test.ms(MS_A).app_channels();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].1, 1);
    assert_eq!(channels[0].2, vec![0], "lowest idle channel comes first");

    test.run_for(Duration::from_millis(200));
    let c = counts(&mut test);
    assert_eq!((c.idle, c.tentative, c.in_use, c.reserved), (10, 0, 0, 0));
    assert_eq!(test.bs(BS_A).num_txns(), 0);
    assert_eq!(test.bs(BS_A).num_active_timers(), 0);
    assert_eq!(test.bs(BS_A).stats().get(Counter::ChannelsAdmitted), 1);
    assert_eq!(test.bs(BS_A).stats().get(Counter::ChannelsReleased), 1);
    assert_eq!(test.ms(MS_A).stats().get(Counter::ChannelsAssigned), 1);
}

#[test]
fn test_guard_channel_blocks_new_requests() {
    debug::setup_logging_verbose();
    let mut config = default_test_config();
    config.bss[0].channels = 1;
    let mut test = ComponentTest::new(config);
    test.populate_entities(vec![]);

    test.mmi(MS_A, MmiCmd::PowerOn);
    test.run_secs(1);

    let ms = test.ms(MS_A);
    assert_eq!(ms.stats().get(Counter::ChannelsRejected), 1);
    assert_eq!(ms.stats().get(Counter::ChannelsAssigned), 0);
    assert_eq!(ms.mm_state(), MmState::UpdateRequested, "waiting for T3211");
    assert_eq!(ms.num_apps(), 0);

    let bs = test.bs(BS_A);
    assert_eq!(bs.stats().get(Counter::AdmissionRejects), 1);
    assert_eq!(bs.num_txns(), 0);
    assert_eq!(bs.pool().num_idle(), 1);
}

#[test]
fn test_rejected_request_retried_after_release() {
    debug::setup_logging_verbose();
    let mut config = default_test_config();
    // One channel for new requests, one held back
    config.bss[0].channels = 2;
    let mut test = ComponentTest::new(config);
    test.populate_entities(vec![]);

    test.mmi(MS_A, MmiCmd::PowerOn);
    test.mmi(MS_B, MmiCmd::PowerOn);
    test.run_secs(1);

    assert_eq!(test.ms(MS_A).mm_state(), MmState::Updated);
    assert_eq!(test.ms(MS_B).mm_state(), MmState::UpdateRequested);
    assert_eq!(test.ms(MS_B).stats().get(Counter::ChannelsRejected), 1);

    let t3211 = test.config.config().timers.t3211;
    test.run_for(t3211 + Duration::from_secs(1));
    assert_eq!(test.ms(MS_B).mm_state(), MmState::Updated);
    assert_eq!(test.ms(MS_B).stats().get(Counter::LocationUpdateAttempts), 2);
    assert_eq!(test.bs(BS_A).stats().get(Counter::AdmissionRejects), 1);
    assert_eq!(test.bs(BS_A).pool().num_idle(), 2);
}

#[test]
fn test_max_user_policy() {
    debug::setup_logging_verbose();
    let mut config = default_test_config();
    config.admission.policy = AdmissionPolicyKind::SimpleMaxUser;
    config.admission.max_users = Some(1);
    let mut test = ComponentTest::new(config);
    test.populate_entities(vec![]);

    test.mmi(MS_A, MmiCmd::PowerOn);
    test.mmi(MS_B, MmiCmd::PowerOn);
    test.run_secs(1);

    assert_eq!(test.ms(MS_A).mm_state(), MmState::Updated);
    assert_eq!(test.ms(MS_B).stats().get(Counter::ChannelsRejected), 1);
    assert_eq!(test.bs(BS_A).stats().get(Counter::AdmissionRejects), 1);
    assert_eq!(test.bs(BS_A).pool().num_idle(), 10);
}

fn call_b(bandwidth_kbps: u32) -> MmiCmd {
    MmiCmd::Originate {
        callee: IMSI_B,
        bandwidth_kbps,
    }
}

#[test]
fn test_voice_channel_lifecycle_during_call() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();
    test.power_on_all(&[MS_A, MS_B]);
    assert_eq!(counts(&mut test).idle, 10);

    test.mmi(MS_A, call_b(16));

    // Channel request arrived, assignment sent
    test.run_for(Duration::from_millis(6));
    let c = counts(&mut test);
    assert_eq!((c.idle, c.tentative, c.in_use, c.reserved), (9, 1, 0, 0));
    assert_eq!(test.bs(BS_A).pool().status(0), Some(ResourceStatus::Tentative(ResourceKind::Voice)));

    // Assignment complete arrived
    test.run_for(Duration::from_millis(10));
    let c = counts(&mut test);
    assert_eq!((c.idle, c.tentative, c.in_use, c.reserved), (9, 0, 1, 0));
    assert_eq!(test.bs(BS_A).pool().status(0), Some(ResourceStatus::InUse(ResourceKind::Voice)));

    // Callee got its own voice channel
    test.run_secs(3);
    assert_eq!(test.ms(MS_A).call_states(), vec![CcState::Active]);
    let c = counts(&mut test);
    assert_eq!((c.idle, c.tentative, c.in_use, c.reserved), (8, 0, 2, 0));
    let callee_channels = test.ms(MS_B).app_channels();
    assert_eq!(callee_channels.len(), 1);
    let callee_channel = callee_channels[0].2[0];
    assert_ne!(callee_channel, 0);
    assert_eq!(
        test.bs(BS_A).pool().status(callee_channel),
        Some(ResourceStatus::InUse(ResourceKind::Voice))
    );
    assert_eq!(test.bs(BS_A).pool().bandwidth_in_use_kbps(), 32);

    test.mmi(MS_A, MmiCmd::HangUp);
    test.run_secs(1);
    let c = counts(&mut test);
    assert_eq!((c.idle, c.tentative, c.in_use, c.reserved), (10, 0, 0, 0));
    let bs = test.bs(BS_A);
    assert_eq!(bs.num_txns(), 0);
    assert_eq!(bs.num_active_timers(), 0);
    // Two location updates and two call legs
    assert_eq!(bs.stats().get(Counter::ChannelsAdmitted), 4);
    assert_eq!(bs.stats().get(Counter::ChannelsReleased), 4);
}

#[test]
fn test_oversized_bandwidth_request_rejected() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();
    test.power_on_all(&[MS_A]);

    // Needs 65536 channels of 16 kbps
    test.mmi(MS_A, call_b(16 * 65_536));
    test.run_secs(1);

    let ms = test.ms(MS_A);
    assert!(ms.call_states().is_empty());
    assert_eq!(ms.num_apps(), 0);
    assert_eq!(ms.stats().get(Counter::ChannelsRejected), 1);
    assert_eq!(ms.stats().get(Counter::CallsFailed), 1);

    let bs = test.bs(BS_A);
    assert_eq!(bs.stats().get(Counter::AdmissionRejects), 1);
    assert_eq!(bs.stats().get(Counter::ChannelsAdmitted), 1, "only the location update");
    assert_eq!(bs.pool().num_idle(), 10);
    assert_eq!(bs.num_txns(), 0);
    assert_eq!(test.sc().stats().get(Counter::CallAttempts), 0);

    test.mmi(MS_A, call_b(65_537 * 16));
    test.run_secs(1);
    assert_eq!(test.ms(MS_A).stats().get(Counter::CallsFailed), 2);
    assert_eq!(test.bs(BS_A).stats().get(Counter::AdmissionRejects), 2);
    assert_eq!(test.bs(BS_A).pool().num_idle(), 10);
}

#[test]
fn test_duplicate_release_leaves_pool_alone() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();
    test.power_on_all(&[MS_A, MS_B]);
    test.mmi(MS_A, call_b(16));
    test.run_secs(3);
    assert_eq!(test.ms(MS_A).call_states(), vec![CcState::Active]);
    let chan_ref = test.ms(MS_A).app_channels()[0].0 as ChanRef;

    // MS_A drops its channel, the network clears the rest of the call
    let release = ChannelRelease {
        chan_ref,
        cause: Cause::NormalRelease,
    };
    test.inject(MS_A, BS_A, &release);
    test.run_secs(1);
    assert!(test.ms(MS_B).call_states().is_empty());

    let before = counts(&mut test);
    assert_eq!(before.idle, 10);
    let bs = test.bs(BS_A);
    let timers_before = bs.num_active_timers();
    let txns_before = bs.num_txns();
    let released_before = bs.stats().get(Counter::ChannelsReleased);

    // Same release again, then a late clear for the connection
    test.inject(MS_A, BS_A, &release);
    let clear = ClearCommand {
        ms: MS_A,
        chan_ref,
        cause: Cause::NormalRelease,
    };
    test.inject(SC, BS_A, &clear);
    test.run_for(Duration::from_millis(100));

    assert_eq!(counts(&mut test), before);
    let bs = test.bs(BS_A);
    assert_eq!(bs.num_active_timers(), timers_before);
    assert_eq!(bs.num_txns(), txns_before);
    assert_eq!(bs.stats().get(Counter::ChannelsReleased), released_before);
    assert_eq!(test.sc().num_txns(), 0);
    assert_eq!(test.sc().circuits().num_idle(), 10);
}
