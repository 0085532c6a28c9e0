mod common;

use std::time::Duration;

use cell_core::{ChanRef, debug};
use cell_entities::bs::BsTxnState;
use cell_entities::ms::{CcState, MmState};
use cell_entities::{CellEntityTrait, Counter};
use cell_pdus::Cause;
use cell_pdus::bssmap::pdus::handover_complete::HandoverCancel;
use cell_pdus::bssmap::pdus::handover_request::HandoverRequest;
use cell_pdus::rr::pdus::channel_release::ChannelRelease;
use cell_saps::mmi::MmiCmd;
use common::{
    BS_A, BS_B, ComponentTest, IMSI_A, IMSI_B, LAC_A, LAC_B, MS_A, MS_B, decode_all, default_test_config,
};

/// Brings up an active call from MS_A to MS_B, both in cell 1. Returns the
/// channel reference of MS_A's connection.
fn setup_call(test: &mut ComponentTest) -> ChanRef {
    test.power_on_all(&[MS_A, MS_B]);
    test.mmi(
        MS_A,
        MmiCmd::Originate {
            callee: IMSI_B,
            bandwidth_kbps: 16,
        },
    );
    test.run_secs(3);
    assert_eq!(test.ms(MS_A).call_states(), vec![CcState::Active]);
    let channels = test.ms(MS_A).app_channels();
    assert_eq!(channels.len(), 1);
    channels[0].0 as ChanRef
}

/// Reports a weak serving cell, then a strong `target`
fn measure(test: &mut ComponentTest, serving_quality: u8, target: u16, target_quality: u8) {
    test.mmi(
        MS_A,
        MmiCmd::Measurement {
            cell: 1,
            quality: serving_quality,
        },
    );
    test.mmi(
        MS_A,
        MmiCmd::Measurement {
            cell: target,
            quality: target_quality,
        },
    );
}

#[test]
fn test_intra_bs_handover() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();
    let chan_ref = setup_call(&mut test);
    let (old_channels, _) = test.bs(BS_A).txn_channels(MS_A, chan_ref).expect("connection");

    measure(&mut test, 5, 2, 40);
    test.run_secs(1);

    let ms = test.ms(MS_A);
    assert_eq!(ms.cell(), 2);
    assert_eq!(ms.call_states(), vec![CcState::Active]);
    assert_eq!(ms.stats().get(Counter::HandoverSuccess), 1);
    let app_channels = ms.app_channels();
    assert_eq!(app_channels[0].1, 2);

    let bs = test.bs(BS_A);
    let (channels, reserved) = bs.txn_channels(MS_A, chan_ref).expect("connection");
    assert_ne!(channels, old_channels);
    assert_eq!(channels, app_channels[0].2);
    assert!(reserved.is_empty());
    assert!(!bs.handover_in_progress(MS_A));
    let counts = bs.pool().counts();
    assert_eq!((counts.in_use, counts.reserved, counts.tentative), (2, 0, 0));
    assert_eq!(bs.stats().get(Counter::HandoverRequired), 1);
    assert_eq!(bs.stats().get(Counter::HandoverSuccess), 1);

    let record = test.sc().vlr_record(IMSI_A).cloned().expect("vlr record");
    assert_eq!((record.bs, record.cell), (BS_A, 2));
    assert_eq!(test.sc().num_handovers(), 0);
    assert_eq!(test.sc().stats().get(Counter::HandoverSuccess), 1);

    // Call still clears normally on the new channels
    test.mmi(MS_A, MmiCmd::HangUp);
    test.run_secs(1);
    assert!(test.ms(MS_A).call_states().is_empty());
    assert_eq!(test.ms(MS_A).registered_lac(), Some(LAC_A));
    assert_eq!(test.ms(MS_A).stats().get(Counter::LocationUpdateAttempts), 1);
    assert_eq!(test.bs(BS_A).pool().num_idle(), 10);
}

#[test]
fn test_inter_bs_handover() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();
    let chan_ref = setup_call(&mut test);

    measure(&mut test, 5, 3, 40);
    test.run_secs(1);

    let ms = test.ms(MS_A);
    assert_eq!(ms.cell(), 3);
    assert_eq!(ms.call_states(), vec![CcState::Active]);

    assert_eq!(test.bs(BS_B).txn_state(MS_A, chan_ref), Some(BsTxnState::Active));
    assert_eq!(test.bs(BS_B).pool().counts().in_use, 1);

    // Source let go without telling the MS, MS_B's leg is untouched
    assert_eq!(test.bs(BS_A).txn_state(MS_A, chan_ref), None);
    assert!(!test.bs(BS_A).handover_in_progress(MS_A));
    assert_eq!(test.bs(BS_A).pool().counts().in_use, 1);
    assert_eq!(test.ms(MS_A).stats().get(Counter::ChannelsReleased), 1, "only the location update channel");

    let record = test.sc().vlr_record(IMSI_A).cloned().expect("vlr record");
    assert_eq!((record.bs, record.cell), (BS_B, 3));
    assert_eq!(record.lac, LAC_A, "location area only changes with a location update");
    assert_eq!(test.sc().stats().get(Counter::HandoverSuccess), 1);
    assert_eq!(test.sc().num_handovers(), 0);

    // After the call the MS registers in the new location area
    test.mmi(MS_A, MmiCmd::HangUp);
    test.run_secs(1);
    let ms = test.ms(MS_A);
    assert!(ms.call_states().is_empty());
    assert_eq!(ms.num_apps(), 0);
    assert_eq!(ms.mm_state(), MmState::Updated);
    assert_eq!(ms.registered_lac(), Some(LAC_B));
    assert_eq!(test.sc().vlr_record(IMSI_A).map(|r| r.lac), Some(LAC_B));
    assert_eq!(test.bs(BS_A).pool().num_idle(), 10);
    assert_eq!(test.bs(BS_B).pool().num_idle(), 10);
    assert!(test.ms(MS_B).call_states().is_empty());
}

#[test]
fn test_ms_refuses_handover() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();
    let chan_ref = setup_call(&mut test);
    let min_quality = test.config.config().handover.min_access_quality;

    // Good enough for the BS to decide, too weak for the MS to access
    measure(&mut test, 2, 3, min_quality - 1);
    test.run_secs(1);

    let ms = test.ms(MS_A);
    assert_eq!(ms.cell(), 1);
    assert_eq!(ms.call_states(), vec![CcState::Active]);
    assert_eq!(ms.stats().get(Counter::HandoverFailures), 1);

    assert_eq!(test.bs(BS_A).stats().get(Counter::HandoverFailures), 1);
    assert!(!test.bs(BS_A).handover_in_progress(MS_A));
    assert_eq!(test.bs(BS_A).txn_state(MS_A, chan_ref), Some(BsTxnState::Active));
    assert_eq!(test.sc().stats().get(Counter::HandoverFailures), 1);
    assert_eq!(test.sc().num_handovers(), 0);

    // Reservation at the target is given back
    assert_eq!(test.bs(BS_B).num_txns(), 0);
    assert_eq!(test.bs(BS_B).pool().num_idle(), 10);
    assert_eq!(test.sc().vlr_record(IMSI_A).map(|r| r.bs), Some(BS_A));
}

#[test]
fn test_no_answer_from_target() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    test.populate_entities(vec![BS_B]);
    let chan_ref = setup_call(&mut test);

    measure(&mut test, 5, 3, 40);
    test.run_secs(1);
    assert!(test.bs(BS_A).handover_in_progress(MS_A));
    assert_eq!(test.sc().num_handovers(), 1);

    let timers = test.config.config().timers.clone();
    test.run_for(timers.t7.max(timers.t3103));

    assert!(!test.bs(BS_A).handover_in_progress(MS_A));
    assert_eq!(test.bs(BS_A).stats().get(Counter::HandoverFailures), 1);
    assert_eq!(test.sc().num_handovers(), 0);
    assert_eq!(test.sc().stats().get(Counter::HandoverFailures), 1);

    let to_target = test.dump_sinks();
    let requests = decode_all::<HandoverRequest>(&to_target);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].ms, MS_A);
    assert_eq!(requests[0].target_cell, 3);
    let cancels = decode_all::<HandoverCancel>(&to_target);
    assert_eq!(cancels.len(), 1);
    assert_eq!(cancels[0].ho_ref, requests[0].ho_ref);

    // The call carries on where it was
    let ms = test.ms(MS_A);
    assert_eq!(ms.cell(), 1);
    assert_eq!(ms.call_states(), vec![CcState::Active]);
    assert_eq!(test.bs(BS_A).txn_state(MS_A, chan_ref), Some(BsTxnState::Active));
}

/// Reaches the point where the source has relayed the HandoverCommand and
/// the MS has not yet arrived on the target
fn run_until_commanded(test: &mut ComponentTest) {
    test.run_for(Duration::from_millis(15));
}

#[test]
fn test_intra_bs_handover_holds_old_and_new_channels() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();
    let chan_ref = setup_call(&mut test);
    let (old_channels, _) = test.bs(BS_A).txn_channels(MS_A, chan_ref).expect("connection");

    measure(&mut test, 5, 2, 40);
    run_until_commanded(&mut test);

    let bs = test.bs(BS_A);
    assert!(bs.handover_in_progress(MS_A));
    let (channels, reserved) = bs.txn_channels(MS_A, chan_ref).expect("connection");
    assert_eq!(channels, old_channels, "old channels kept until the MS arrives");
    assert_eq!(reserved.len(), 1);
    assert!(!old_channels.contains(&reserved[0]));
    let counts = bs.pool().counts();
    assert_eq!((counts.in_use, counts.reserved, counts.tentative), (2, 1, 0));
    assert_eq!(test.ms(MS_A).cell(), 1);
    assert_eq!(test.sc().num_handovers(), 1);

    test.run_secs(1);
    let bs = test.bs(BS_A);
    let (channels, reserved) = bs.txn_channels(MS_A, chan_ref).expect("connection");
    assert!(reserved.is_empty());
    assert_ne!(channels, old_channels);
    let counts = bs.pool().counts();
    assert_eq!((counts.in_use, counts.reserved, counts.tentative), (2, 0, 0));
}

#[test]
fn test_inter_bs_handover_holds_source_and_target() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();
    let chan_ref = setup_call(&mut test);

    measure(&mut test, 5, 3, 40);
    run_until_commanded(&mut test);

    // Source still carries the call
    let source = test.bs(BS_A);
    assert_eq!(source.txn_state(MS_A, chan_ref), Some(BsTxnState::Active));
    assert!(source.handover_in_progress(MS_A));
    assert_eq!(source.pool().counts().in_use, 2);

    // Target holds the reservation
    let target = test.bs(BS_B);
    assert_eq!(target.txn_state(MS_A, chan_ref), Some(BsTxnState::Incoming));
    let counts = target.pool().counts();
    assert_eq!((counts.in_use, counts.reserved, counts.tentative), (0, 1, 0));

    test.run_secs(1);
    assert_eq!(test.bs(BS_A).txn_state(MS_A, chan_ref), None);
    assert_eq!(test.bs(BS_A).pool().counts().in_use, 1);
    assert_eq!(test.bs(BS_B).txn_state(MS_A, chan_ref), Some(BsTxnState::Active));
    let counts = test.bs(BS_B).pool().counts();
    assert_eq!((counts.in_use, counts.reserved), (1, 0));
}

#[test]
fn test_connection_lost_during_inter_bs_handover() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();
    let chan_ref = setup_call(&mut test);

    measure(&mut test, 5, 3, 40);
    test.run_for(Duration::from_millis(10));
    assert_eq!(test.bs(BS_B).pool().counts().reserved, 1);

    // Radio link to the source drops before the MS is commanded away
    let release = ChannelRelease {
        chan_ref,
        cause: Cause::RadioInterfaceFailure,
    };
    test.inject(MS_A, BS_A, &release);
    test.run_for(Duration::from_millis(100));

    // Reservation at the target is freed well before T3103
    let target = test.bs(BS_B);
    assert_eq!(target.num_txns(), 0);
    assert_eq!(target.pool().num_idle(), 10);
    assert!(!target.handover_in_progress(MS_A));
    assert!(!test.bs(BS_A).handover_in_progress(MS_A));
    assert_eq!(test.bs(BS_A).txn_state(MS_A, chan_ref), None);
    assert_eq!(test.sc().num_handovers(), 0);
    assert_eq!(test.sc().stats().get(Counter::HandoverFailures), 1);

    // The other leg is cleared as well
    test.run_secs(1);
    assert!(test.ms(MS_B).call_states().is_empty());
    assert_eq!(test.sc().num_txns(), 0);
    assert_eq!(test.sc().circuits().num_idle(), 10);
    assert_eq!(test.bs(BS_A).pool().num_idle(), 10);
    assert_eq!(test.bs(BS_A).num_active_timers(), 0);
}

#[test]
fn test_connection_lost_during_intra_bs_handover() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();
    let chan_ref = setup_call(&mut test);

    measure(&mut test, 5, 2, 40);
    test.run_for(Duration::from_millis(10));
    assert_eq!(test.bs(BS_A).pool().counts().reserved, 1);

    let release = ChannelRelease {
        chan_ref,
        cause: Cause::RadioInterfaceFailure,
    };
    test.inject(MS_A, BS_A, &release);
    test.run_for(Duration::from_millis(100));

    let bs = test.bs(BS_A);
    assert!(!bs.handover_in_progress(MS_A));
    assert_eq!(bs.txn_channels(MS_A, chan_ref), None);
    assert_eq!(bs.pool().counts().reserved, 0);
    assert_eq!(test.sc().num_handovers(), 0);

    test.run_secs(1);
    assert_eq!(test.bs(BS_A).pool().num_idle(), 10);
    assert_eq!(test.bs(BS_A).num_txns(), 0);
    assert_eq!(test.bs(BS_A).num_active_timers(), 0);
}
