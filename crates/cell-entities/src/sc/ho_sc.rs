use cell_core::{ChanRef, NodeId};
use cell_pdus::bssmap::pdus::clear::ClearCommand;
use cell_pdus::bssmap::pdus::handover_command::BssHandoverCommand;
use cell_pdus::bssmap::pdus::handover_complete::{BssHandoverComplete, HandoverCancel};
use cell_pdus::bssmap::pdus::handover_request::{BssHandoverFailure, HandoverRequest, HandoverRequestAck};
use cell_pdus::bssmap::pdus::handover_required::{HandoverRequired, HandoverRequiredReject};
use cell_pdus::{Cause, TiField};

use crate::MessageQueue;
use crate::codec;
use crate::sc::sc_txn::{ScHandover, ScKey, ScTimer, ScTimerOwner};
use crate::sc::switching_center::SwitchingCenter;
use crate::stats::Counter;

impl SwitchingCenter {
    fn reject_required(&mut self, queue: &mut MessageQueue, bs: NodeId, ms: NodeId, cause: Cause) {
        tracing::info!("rejecting handover of ms {}: {}", ms, cause);
        queue.send_pdu(bs, TiField::NONE, &HandoverRequiredReject { ms, cause });
    }

    /// Free handover reference, None if all are taken
    fn alloc_ho_ref(&mut self) -> Option<u8> {
        for _ in 0..=u8::MAX {
            let candidate = self.next_ho_ref;
            self.next_ho_ref = self.next_ho_ref.wrapping_add(1);
            if !self.handovers.contains_key(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    /// Source BS asks to move an MS: find the target and let it reserve channels
    pub(super) fn rx_handover_required(&mut self, queue: &mut MessageQueue, src: NodeId, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<HandoverRequired>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let Some(target_bs) = self.config.config().bs_for_cell(pdu.target_cell).map(|b| b.node) else {
            self.reject_required(queue, src, pdu.ms, Cause::HandoverImpossible);
            return;
        };
        if self.handovers.values().any(|h| h.ms == pdu.ms) {
            self.reject_required(queue, src, pdu.ms, Cause::HandoverImpossible);
            return;
        }
        let known = pdu
            .apps
            .iter()
            .all(|app| self.txns.lookup(&ScKey::Conn { ms: pdu.ms, chan_ref: app.chan_ref }).is_some());
        if pdu.apps.is_empty() || !known {
            self.reject_required(queue, src, pdu.ms, Cause::HandoverImpossible);
            return;
        }
        let Some(ho_ref) = self.alloc_ho_ref() else {
            self.reject_required(queue, src, pdu.ms, Cause::Congestion);
            return;
        };

        tracing::info!(
            "handover {} of ms {}: bs {} cell {} -> bs {} cell {}",
            ho_ref,
            pdu.ms,
            src,
            pdu.serving_cell,
            target_bs,
            pdu.target_cell
        );
        let chan_refs: Vec<ChanRef> = pdu.apps.iter().map(|a| a.chan_ref).collect();
        self.handovers.insert(
            ho_ref,
            ScHandover {
                ms: pdu.ms,
                source_bs: src,
                target_bs,
                target_cell: pdu.target_cell,
                commanded: false,
                chan_refs,
            },
        );
        let req = HandoverRequest {
            ho_ref,
            ms: pdu.ms,
            target_cell: pdu.target_cell,
            apps: pdu.apps,
        };
        queue.send_pdu(target_bs, TiField::NONE, &req);
        self.arm(queue, ScTimerOwner::Handover(ho_ref), ScTimer::T3103);
    }

    /// Target reserved the channels, command the MS through the source
    pub(super) fn rx_handover_request_ack(&mut self, queue: &mut MessageQueue, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<HandoverRequestAck>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let Some(ho) = self.handovers.get_mut(&pdu.ho_ref) else {
            tracing::warn!("request ack for unknown handover {}", pdu.ho_ref);
            return;
        };
        if ho.commanded {
            return;
        }
        ho.commanded = true;
        let cmd = BssHandoverCommand {
            ho_ref: pdu.ho_ref,
            ms: ho.ms,
            target_cell: ho.target_cell,
            target_bs: ho.target_bs,
            assignments: pdu.assignments,
        };
        let source = ho.source_bs;
        queue.send_pdu(source, TiField::NONE, &cmd);
    }

    /// Target refused, or the MS could not get there
    pub(super) fn rx_bss_handover_failure(&mut self, queue: &mut MessageQueue, src: NodeId, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<BssHandoverFailure>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let Some(ho) = self.handovers.remove(&pdu.ho_ref) else {
            tracing::debug!("failure of unknown handover {}", pdu.ho_ref);
            return;
        };
        self.timers.cancel_owner(queue, ScTimerOwner::Handover(pdu.ho_ref));
        self.stats.inc(Counter::HandoverFailures);
        tracing::info!("handover {} of ms {} failed at bs {}: {}", pdu.ho_ref, ho.ms, src, pdu.cause);

        if ho.commanded {
            queue.send_pdu(ho.target_bs, TiField::NONE, &HandoverCancel { ho_ref: pdu.ho_ref, ms: ho.ms });
        } else {
            self.reject_required(queue, ho.source_bs, ho.ms, pdu.cause);
        }
    }

    /// MS arrived at the target: the connections now run over it
    pub(super) fn rx_bss_handover_complete(&mut self, queue: &mut MessageQueue, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<BssHandoverComplete>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let Some(ho) = self.handovers.remove(&pdu.ho_ref) else {
            tracing::warn!("completion of unknown handover {}", pdu.ho_ref);
            return;
        };
        self.timers.cancel_owner(queue, ScTimerOwner::Handover(pdu.ho_ref));

        for chan_ref in ho.chan_refs.iter() {
            let key = ScKey::Conn { ms: ho.ms, chan_ref: *chan_ref };
            let Some(txn) = self.txns.lookup(&key).and_then(|id| self.txns.get_mut(id)) else {
                continue;
            };
            txn.bs = ho.target_bs;
            txn.cell = ho.target_cell;
        }
        if let Some(record) = self.vlr.values_mut().find(|r| r.ms == ho.ms) {
            record.bs = ho.target_bs;
            record.cell = ho.target_cell;
        }

        if ho.source_bs != ho.target_bs {
            for chan_ref in ho.chan_refs.iter() {
                let cmd = ClearCommand {
                    ms: ho.ms,
                    chan_ref: *chan_ref,
                    cause: Cause::HandoverSuccessful,
                };
                queue.send_pdu(ho.source_bs, TiField::NONE, &cmd);
            }
        }
        tracing::info!("handover {} of ms {} to cell {} complete", pdu.ho_ref, ho.ms, ho.target_cell);
        self.stats.inc(Counter::HandoverSuccess);
    }

    /// A connection of a handover in progress was released. Once none is left the
    /// handover is abandoned and the target frees its reservation.
    pub(super) fn drop_handover_of(&mut self, queue: &mut MessageQueue, ms: NodeId, chan_ref: ChanRef) {
        let Some((&ho_ref, ho)) = self
            .handovers
            .iter_mut()
            .find(|(_, h)| h.ms == ms && h.chan_refs.contains(&chan_ref))
        else {
            return;
        };
        ho.chan_refs.retain(|c| *c != chan_ref);
        if !ho.chan_refs.is_empty() {
            return;
        }
        let Some(ho) = self.handovers.remove(&ho_ref) else {
            return;
        };
        self.timers.cancel_owner(queue, ScTimerOwner::Handover(ho_ref));
        self.stats.inc(Counter::HandoverFailures);
        tracing::info!("handover {} of ms {} abandoned, its connections were released", ho_ref, ms);
        queue.send_pdu(ho.target_bs, TiField::NONE, &HandoverCancel { ho_ref, ms });
        if !ho.commanded {
            self.reject_required(queue, ho.source_bs, ms, Cause::HandoverCancelled);
        }
    }

    pub(super) fn on_t3103(&mut self, queue: &mut MessageQueue, ho_ref: u8) {
        let Some(ho) = self.handovers.remove(&ho_ref) else {
            return;
        };
        tracing::info!("T3103 expired for handover {} of ms {}", ho_ref, ho.ms);
        self.stats.inc(Counter::HandoverFailures);
        queue.send_pdu(ho.target_bs, TiField::NONE, &HandoverCancel { ho_ref, ms: ho.ms });
        self.reject_required(queue, ho.source_bs, ho.ms, Cause::RecoveryOnTimerExpiry);
    }
}
