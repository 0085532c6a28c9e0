mod common;

use std::time::Duration;

use cell_core::debug;
use cell_entities::{CellEntityTrait, Counter};
use cell_entities::ms::MmState;
use cell_pdus::bssmap::pdus::dtap::DtapUp;
use cell_pdus::rr::pdus::channel_request::ChannelRequest;
use cell_saps::mmi::MmiCmd;
use common::{
    BS_A, BS_B, ComponentTest, IMSI_A, IMSI_B, LAC_A, LAC_B, MS_A, MS_B, SC, decode_all, default_test_config,
};

#[test]
fn test_location_update_success() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();

    test.mmi(MS_A, MmiCmd::PowerOn);
    test.run_for(Duration::from_millis(200));

    let ms = test.ms(MS_A);
    assert!(ms.is_powered());
    assert_eq!(ms.mm_state(), MmState::Updated);
    assert_eq!(ms.registered_lac(), Some(LAC_A));
    assert_eq!(ms.num_apps(), 0, "location update channel must be released");
    assert_eq!(ms.stats().get(Counter::LocationUpdateSuccess), 1);

    let record = test.sc().vlr_record(IMSI_A).cloned().expect("vlr record");
    assert_eq!(record.ms, MS_A);
    assert_eq!(record.bs, BS_A);
    assert_eq!(record.cell, 1);
    assert_eq!(record.lac, LAC_A);
    assert_eq!(test.sc().num_txns(), 0);

    assert_eq!(test.hlr().record(IMSI_A).map(|r| r.sc), Some(SC));

    let bs = test.bs(BS_A);
    assert_eq!(bs.pool().num_idle(), 10);
    assert_eq!(bs.num_txns(), 0);
    assert_eq!(bs.num_active_timers(), 0);
}

#[test]
fn test_two_ms_register_independently() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();

    test.power_on_all(&[MS_A, MS_B]);

    assert_eq!(test.ms(MS_A).mm_state(), MmState::Updated);
    assert_eq!(test.ms(MS_B).mm_state(), MmState::Updated);
    assert_eq!(test.sc().num_vlr_records(), 2);
    assert_eq!(test.hlr().num_records(), 2);
    assert_eq!(test.sc().vlr_record(IMSI_B).map(|r| r.ms), Some(MS_B));
}

#[test]
fn test_periodic_update_skips_hlr() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();

    test.power_on_all(&[MS_A]);
    let t3212 = test.config.config().timers.t3212;
    test.run_for(t3212 + Duration::from_secs(1));

    assert_eq!(test.ms(MS_A).mm_state(), MmState::Updated);
    assert_eq!(test.ms(MS_A).stats().get(Counter::LocationUpdateSuccess), 2);
    assert_eq!(test.sc().stats().get(Counter::LocationUpdateSuccess), 2);
    // Only the attach reached the HLR
    assert_eq!(test.sc().stats().get(Counter::HlrUpdates), 1);
    assert_eq!(test.hlr().stats().get(Counter::HlrUpdates), 1);
}

#[test]
fn test_location_update_fails_after_max_attempts() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    test.populate_entities(vec![SC]);

    let timers = test.config.config().timers.clone();
    let max = test.config.config().limits.max_location_update_attempts as u32;

    test.mmi(MS_A, MmiCmd::PowerOn);

    // Between attempts the procedure is still running
    test.run_for(timers.t3210 + Duration::from_secs(1));
    assert_eq!(test.ms(MS_A).mm_state(), MmState::UpdateRequested);

    let total = timers.t3210 * max + timers.t3211 * (max - 1);
    test.run_for(total);

    let ms = test.ms(MS_A);
    assert_eq!(ms.mm_state(), MmState::Failed);
    assert_eq!(ms.registered_lac(), None);
    assert_eq!(ms.num_apps(), 0);
    assert_eq!(ms.stats().get(Counter::LocationUpdateAttempts), max as u64);
    assert_eq!(ms.stats().get(Counter::LocationUpdateFailures), 1);

    // Each attempt reached the SC over a fresh channel, and every channel was returned
    let relayed = decode_all::<DtapUp>(&test.dump_sinks());
    assert_eq!(relayed.len(), max as usize);
    assert!(relayed.iter().all(|up| up.ms == MS_A && up.cell == 1));
    assert_eq!(test.bs(BS_A).pool().num_idle(), 10);
    assert_eq!(test.bs(BS_A).num_txns(), 0);
}

#[test]
fn test_channel_request_attempts_bounded() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    test.populate_entities(vec![BS_A]);

    let cfg = test.config.config();
    let requests = cfg.limits.num_channel_request_attempts as u64;
    let max_lu = cfg.limits.max_location_update_attempts as u64;

    test.mmi(MS_A, MmiCmd::PowerOn);
    test.run_for(cfg.timers.t3126 * requests as u32 + Duration::from_millis(100));

    let ms = test.ms(MS_A);
    assert_eq!(ms.stats().get(Counter::ChannelRequestsSent), requests);
    assert_eq!(ms.stats().get(Counter::ChannelRequestFailures), 1);
    assert_eq!(ms.mm_state(), MmState::UpdateRequested, "waiting for T3211");

    test.run_secs(300);
    let ms = test.ms(MS_A);
    assert_eq!(ms.mm_state(), MmState::Failed);
    assert_eq!(ms.stats().get(Counter::ChannelRequestsSent), requests * max_lu);

    let sent = decode_all::<ChannelRequest>(&test.dump_sinks());
    assert_eq!(sent.len() as u64, requests * max_lu);
    assert!(sent.iter().all(|req| req.cell == 1));
}

#[test]
fn test_detach_on_power_off() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();
    test.power_on_all(&[MS_A]);
    assert!(test.sc().vlr_record(IMSI_A).is_some());

    test.mmi(MS_A, MmiCmd::PowerOff);
    test.run_secs(1);

    let ms = test.ms(MS_A);
    assert!(!ms.is_powered());
    assert_eq!(ms.mm_state(), MmState::Detached);
    assert_eq!(ms.num_apps(), 0);
    assert_eq!(ms.num_active_timers(), 0);
    assert_eq!(ms.stats().get(Counter::ImsiDetaches), 1);

    assert!(test.sc().vlr_record(IMSI_A).is_none());
    assert_eq!(test.sc().stats().get(Counter::ImsiDetaches), 1);
    assert!(test.hlr().record(IMSI_A).is_none());
    assert_eq!(test.bs(BS_A).pool().num_idle(), 10);
}

#[test]
fn test_power_off_unregistered_sends_nothing() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(default_test_config());
    test.populate_entities(vec![BS_A]);

    test.mmi(MS_A, MmiCmd::PowerOn);
    test.run_secs(2);
    let _ = test.dump_sinks();

    test.mmi(MS_A, MmiCmd::PowerOff);
    test.run_secs(60);

    let ms = test.ms(MS_A);
    assert_eq!(ms.mm_state(), MmState::Detached);
    assert_eq!(ms.num_apps(), 0);
    assert_eq!(ms.stats().get(Counter::ImsiDetaches), 0);
    assert!(decode_all::<ChannelRequest>(&test.dump_sinks()).is_empty());
}

#[test]
fn test_reselection_to_new_location_area() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::with_defaults();
    test.power_on_all(&[MS_A]);

    // Same location area, no update needed
    test.mmi(MS_A, MmiCmd::CampOn { cell: 2 });
    test.run_secs(1);
    assert_eq!(test.ms(MS_A).stats().get(Counter::LocationUpdateAttempts), 1);

    test.mmi(MS_A, MmiCmd::CampOn { cell: 3 });
    test.run_secs(1);

    let ms = test.ms(MS_A);
    assert_eq!(ms.cell(), 3);
    assert_eq!(ms.mm_state(), MmState::Updated);
    assert_eq!(ms.registered_lac(), Some(LAC_B));
    assert_eq!(ms.stats().get(Counter::LocationUpdateAttempts), 2);

    let record = test.sc().vlr_record(IMSI_A).cloned().expect("vlr record");
    assert_eq!(record.bs, BS_B);
    assert_eq!(record.lac, LAC_B);
    assert_eq!(test.hlr().stats().get(Counter::HlrUpdates), 2);
    assert_eq!(test.bs(BS_B).pool().num_idle(), 10);
}

#[test]
fn test_vlr_record_expires() {
    debug::setup_logging_verbose();
    let mut config = default_test_config();
    config.timers.vlr_lifetime = Duration::from_secs(60);
    let mut test = ComponentTest::new(config);
    test.populate_entities(vec![]);

    test.power_on_all(&[MS_A]);
    assert!(test.hlr().record(IMSI_A).is_some());

    test.run_secs(61);
    assert!(test.sc().vlr_record(IMSI_A).is_none());
    assert_eq!(test.sc().stats().get(Counter::VlrRecordsExpired), 1);
    assert!(test.hlr().record(IMSI_A).is_none());

    // The MS is not told and still considers itself registered
    assert_eq!(test.ms(MS_A).mm_state(), MmState::Updated);
}
