use cell_pdus::bssmap::pdus::clear::{ClearCommand, ClearComplete};
use cell_pdus::bssmap::pdus::dtap::DtapDown;
use cell_pdus::bssmap::pdus::paging::Paging;
use cell_pdus::rr::pdus::channel_release::ChannelRelease;
use cell_pdus::rr::pdus::dedicated_data::DownlinkData;
use cell_pdus::rr::pdus::paging_request::PagingRequest;
use cell_pdus::{Cause, TiField};

use crate::MessageQueue;
use crate::bs::base_station::{BaseStation, BsKey, BsTxnState};
use crate::codec;
use crate::stats::Counter;

impl BaseStation {
    pub(super) fn rx_dtap_down(&mut self, queue: &mut MessageQueue, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<DtapDown>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let key = BsKey { ms: pdu.ms, chan_ref: pdu.chan_ref };
        let active = self
            .txns
            .lookup(&key)
            .and_then(|id| self.txns.get(id))
            .is_some_and(|t| t.state == BsTxnState::Active);
        if !active {
            tracing::warn!("downlink data for unconfirmed channel {:?}, dropping", key);
            self.stats.inc(Counter::DroppedMessages);
            return;
        }
        let down = DownlinkData {
            chan_ref: pdu.chan_ref,
            payload: pdu.payload,
        };
        queue.send_pdu(pdu.ms, TiField::NONE, &down);
    }

    pub(super) fn rx_paging(&mut self, queue: &mut MessageQueue, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<Paging>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        tracing::debug!("paging imsi {} at ms {}", pdu.imsi, pdu.ms);
        queue.send_pdu(pdu.ms, TiField::NONE, &PagingRequest { imsi: pdu.imsi, kind: pdu.kind });
    }

    /// SC ends a connection. After a successful handover the MS has already left
    /// and is not told.
    pub(super) fn rx_clear_command(&mut self, queue: &mut MessageQueue, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<ClearCommand>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let key = BsKey { ms: pdu.ms, chan_ref: pdu.chan_ref };
        if let Some(id) = self.txns.lookup(&key) {
            if pdu.cause != Cause::HandoverSuccessful {
                let release = ChannelRelease {
                    chan_ref: pdu.chan_ref,
                    cause: pdu.cause,
                };
                queue.send_pdu(pdu.ms, TiField::NONE, &release);
            }
            self.release_txn(queue, id);
            self.forget_handover_if_idle(queue, pdu.ms);
        } else {
            tracing::debug!("clear command for unknown {:?}", key);
        }
        self.send_sc(queue, &ClearComplete { ms: pdu.ms, chan_ref: pdu.chan_ref });
    }
}
