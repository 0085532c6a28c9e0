mod common;

use std::time::Duration;

use cell_config::SimConfig;
use cell_core::{ChanRef, ResourceKind, debug};
use cell_entities::ms::CcState;
use cell_entities::sc::ScCcState;
use cell_entities::{CellEntityTrait, Counter};
use cell_pdus::bssmap::pdus::clear::ClearRequest;
use cell_pdus::bssmap::pdus::dtap::{DtapDown, DtapUp};
use cell_pdus::cc::pdus::call_clearing::{Disconnect, Release};
use cell_pdus::cc::pdus::call_progress::{Alerting, CallProceeding};
use cell_pdus::cc::pdus::setup::Setup;
use cell_pdus::mm::pdus::cm_service_request::CmServiceRequest;
use cell_pdus::mm::pdus::cm_service_response::CmServiceAccept;
use cell_pdus::mm::pdus::paging_response::PagingResponse;
use cell_pdus::rr::enums::establishment_cause::EstablishmentCause;
use cell_pdus::rr::pdus::assignment_complete::AssignmentComplete;
use cell_pdus::rr::pdus::channel_release::ChannelRelease;
use cell_pdus::rr::pdus::channel_request::ChannelRequest;
use cell_pdus::rr::pdus::dedicated_data::{DownlinkData, UplinkData};
use cell_pdus::rr::pdus::paging_request::PagingRequest;
use cell_pdus::{Cause, L3Message, TiField, decode, encode};
use cell_saps::SapMsg;
use cell_saps::mmi::MmiCmd;
use common::{BS_A, ComponentTest, IMSI_A, IMSI_B, MS_A, MS_B, SC, decode_all, default_test_config};

const T303: Duration = Duration::from_secs(2);
const T310: Duration = Duration::from_secs(3);
const T301: Duration = Duration::from_secs(4);
const T305: Duration = Duration::from_secs(3);
const T308: Duration = Duration::from_secs(4);

fn config_with_short_cc_timers() -> SimConfig {
    let mut config = default_test_config();
    config.timers.t303 = T303;
    config.timers.t310 = T310;
    config.timers.t301 = T301;
    config.timers.t305 = T305;
    config.timers.t308 = T308;
    config
}

/// CC messages MS_A sent towards the SC
fn cc_uplink<M: L3Message>(msgs: &[SapMsg]) -> Vec<M> {
    decode_all::<DtapUp>(msgs)
        .into_iter()
        .filter(|up| up.ms == MS_A)
        .filter_map(|up| decode::<M>(&up.payload).ok().map(|(_, pdu)| pdu))
        .collect()
}

/// Messages the network relayed to MS_B
fn cc_downlink<M: L3Message>(msgs: &[SapMsg]) -> Vec<M> {
    decode_all::<DownlinkData>(msgs)
        .into_iter()
        .filter_map(|down| decode::<M>(&down.payload).ok().map(|(_, pdu)| pdu))
        .collect()
}

/// Plays the SC: sends `pdu` to MS_A on its connection
fn sc_to_ms<M: L3Message>(test: &mut ComponentTest, chan_ref: ChanRef, ti: TiField, pdu: &M) {
    let down = DtapDown {
        ms: MS_A,
        chan_ref,
        payload: encode(ti, pdu).expect("encodable"),
    };
    test.inject(SC, BS_A, &down);
}

/// Registers MS_A, then silences the SC. The test accepts the service request
/// of MS_A's call by hand; after that the network never answers again.
fn call_into_silent_sc(test: &mut ComponentTest) -> ChanRef {
    test.power_on_all(&[MS_A]);
    test.replace_with_sink(SC);

    test.mmi(
        MS_A,
        MmiCmd::Originate {
            callee: IMSI_B,
            bandwidth_kbps: 16,
        },
    );
    test.run_for(Duration::from_millis(100));

    let ups = decode_all::<DtapUp>(&test.dump_sinks());
    let requests: Vec<&DtapUp> = ups
        .iter()
        .filter(|up| decode::<CmServiceRequest>(&up.payload).is_ok_and(|(_, r)| r.imsi == IMSI_A))
        .collect();
    assert_eq!(requests.len(), 1);
    let chan_ref = requests[0].chan_ref;

    sc_to_ms(test, chan_ref, TiField::NONE, &CmServiceAccept);
    test.run_for(Duration::from_millis(100));
    assert_eq!(test.ms(MS_A).call_states(), vec![CcState::CallInitiated]);
    chan_ref
}

/// MS_A clears a call the network stopped answering: DISCONNECT, then RELEASE
/// once T305 expires, repeated on T308 until it gives up
fn expect_local_clearing(test: &mut ComponentTest) {
    assert_eq!(test.ms(MS_A).call_states(), vec![CcState::DisconnectRequest]);
    let disconnects = cc_uplink::<Disconnect>(&test.dump_sinks());
    assert_eq!(disconnects.len(), 1);
    assert_eq!(disconnects[0].cause, Cause::RecoveryOnTimerExpiry);

    test.run_for(T305);
    assert_eq!(test.ms(MS_A).call_states(), vec![CcState::ReleaseRequest]);
    let mut releases = cc_uplink::<Release>(&test.dump_sinks());
    assert_eq!(releases.len(), 1);

    let max_attempts = test.config.config().limits.max_release_attempts as usize;
    test.run_for(T308 * max_attempts as u32);
    let msgs = test.dump_sinks();
    releases.extend(cc_uplink::<Release>(&msgs));
    assert_eq!(releases.len(), max_attempts);
    assert!(releases.iter().all(|r| r.cause == Cause::RecoveryOnTimerExpiry));

    // Channel given back, the BS tells the SC
    let clears = decode_all::<ClearRequest>(&msgs);
    assert_eq!(clears.len(), 1);
    assert_eq!(clears[0].ms, MS_A);

    let ms = test.ms(MS_A);
    assert!(ms.call_states().is_empty());
    assert_eq!(ms.num_apps(), 0);
    assert_eq!(ms.stats().get(Counter::CallsFailed), 1);
    assert_eq!(ms.stats().get(Counter::CallsConnected), 0);

    let bs = test.bs(BS_A);
    assert_eq!(bs.pool().num_idle(), 10);
    assert_eq!(bs.num_txns(), 0);
    assert_eq!(bs.num_active_timers(), 0);
}

#[test]
fn test_t303_no_answer_to_setup() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(config_with_short_cc_timers());
    test.populate_entities(vec![]);
    call_into_silent_sc(&mut test);

    test.run_for(T303);
    expect_local_clearing(&mut test);
}

#[test]
fn test_t310_no_progress_after_proceeding() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(config_with_short_cc_timers());
    test.populate_entities(vec![]);
    let chan_ref = call_into_silent_sc(&mut test);

    sc_to_ms(&mut test, chan_ref, TiField::responder(chan_ref), &CallProceeding);
    test.run_for(Duration::from_millis(100));
    assert_eq!(test.ms(MS_A).call_states(), vec![CcState::Proceeding]);

    // T303 no longer runs
    test.run_for(T310 - Duration::from_millis(500));
    assert_eq!(test.ms(MS_A).call_states(), vec![CcState::Proceeding]);

    test.run_for(Duration::from_secs(1));
    expect_local_clearing(&mut test);
}

#[test]
fn test_t301_no_answer_while_alerting() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(config_with_short_cc_timers());
    test.populate_entities(vec![]);
    let chan_ref = call_into_silent_sc(&mut test);

    sc_to_ms(&mut test, chan_ref, TiField::responder(chan_ref), &Alerting);
    test.run_for(Duration::from_millis(100));
    assert_eq!(test.ms(MS_A).call_states(), vec![CcState::Alerting]);

    test.run_for(T301 - Duration::from_millis(500));
    assert_eq!(test.ms(MS_A).call_states(), vec![CcState::Alerting]);

    test.run_for(Duration::from_secs(1));
    expect_local_clearing(&mut test);
}

#[test]
fn test_t303_called_party_never_confirms() {
    debug::setup_logging_verbose();
    let mut test = ComponentTest::new(config_with_short_cc_timers());
    test.populate_entities(vec![]);
    test.power_on_all(&[MS_A, MS_B]);
    test.replace_with_sink(MS_B);

    test.mmi(
        MS_A,
        MmiCmd::Originate {
            callee: IMSI_B,
            bandwidth_kbps: 16,
        },
    );
    test.run_for(Duration::from_millis(500));
    assert_eq!(test.sc().call_states(IMSI_B), vec![ScCcState::Paging]);
    let pagings = decode_all::<PagingRequest>(&test.dump_sinks());
    assert_eq!(pagings.len(), 1);
    assert_eq!(pagings[0].imsi, IMSI_B);

    // MS_B answers the paging, then goes quiet
    let chan_ref: ChanRef = 0;
    let request = ChannelRequest {
        chan_ref,
        cell: 1,
        est_cause: EstablishmentCause::PagingResponse,
        kind: ResourceKind::Voice,
        count: 1,
        bandwidth_kbps: 0,
    };
    test.inject(MS_B, BS_A, &request);
    test.run_for(Duration::from_millis(20));
    test.inject(MS_B, BS_A, &AssignmentComplete { chan_ref });
    test.run_for(Duration::from_millis(20));
    let response = UplinkData {
        chan_ref,
        payload: encode(TiField::NONE, &PagingResponse { imsi: IMSI_B }).expect("encodable"),
    };
    test.inject(MS_B, BS_A, &response);
    test.run_for(Duration::from_millis(100));

    assert_eq!(test.sc().call_states(IMSI_B), vec![ScCcState::CallPresent]);
    assert_eq!(test.sc().circuits().counts().in_use, 1);
    let setups = cc_downlink::<Setup>(&test.dump_sinks());
    assert_eq!(setups.len(), 1);
    assert_eq!(setups[0].party, IMSI_A);

    test.run_for(T303);
    let releases = decode_all::<ChannelRelease>(&test.dump_sinks());
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].chan_ref, chan_ref);
    assert_eq!(releases[0].cause, Cause::RecoveryOnTimerExpiry);

    // The caller is cleared through the normal network disconnect
    test.run_secs(1);
    let ms = test.ms(MS_A);
    assert!(ms.call_states().is_empty());
    assert_eq!(ms.num_apps(), 0);
    assert_eq!(ms.stats().get(Counter::CallsFailed), 1);

    let sc = test.sc();
    assert_eq!(sc.num_txns(), 0);
    assert_eq!(sc.circuits().num_idle(), 10);
    assert_eq!(sc.stats().get(Counter::CallsFailed), 1);
    let bs = test.bs(BS_A);
    assert_eq!(bs.pool().num_idle(), 10);
    assert_eq!(bs.num_txns(), 0);
    assert_eq!(bs.num_active_timers(), 0);
}
