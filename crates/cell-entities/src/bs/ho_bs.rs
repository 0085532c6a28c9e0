use cell_core::{AdmissionPurpose, AllocStage, NodeId, TxnId};
use cell_pdus::bssmap::pdus::handover_command::BssHandoverCommand;
use cell_pdus::bssmap::pdus::handover_complete::{BssHandoverComplete, HandoverCancel};
use cell_pdus::bssmap::pdus::handover_request::{BssHandoverFailure, HandoverRequest, HandoverRequestAck};
use cell_pdus::bssmap::pdus::handover_required::{HandoverRequired, HandoverRequiredReject};
use cell_pdus::common::fields::channel_assignment::ChannelAssignment;
use cell_pdus::common::fields::ho_app::HoAppRequirement;
use cell_pdus::rr::pdus::handover_command::HandoverCommand;
use cell_pdus::rr::pdus::handover_complete::{HandoverComplete, HandoverFailure};
use cell_pdus::rr::pdus::measurement_report::MeasurementReport;
use cell_pdus::{Cause, TiField};

use crate::MessageQueue;
use crate::bs::base_station::{BaseStation, BsKey, BsTimer, BsTimerOwner, BsTxn, BsTxnState, HoSource, HoSourceState, HoTarget};
use crate::codec;
use crate::stats::Counter;

impl BaseStation {
    /// Handover decision: serving cell too weak and a clearly better neighbour
    pub(super) fn rx_measurement_report(&mut self, queue: &mut MessageQueue, src: NodeId, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<MeasurementReport>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let cfg = self.config.config();
        let ho = &cfg.handover;
        if !ho.enabled || self.ho_out.contains_key(&src) {
            return;
        }
        if pdu.serving_quality >= ho.threshold
            || pdu.neighbour_cell == pdu.serving_cell
            || pdu.neighbour_quality < pdu.serving_quality.saturating_add(ho.margin)
        {
            return;
        }
        if cfg.bs_for_cell(pdu.neighbour_cell).is_none() {
            tracing::debug!("neighbour cell {} unknown", pdu.neighbour_cell);
            return;
        }

        let apps: Vec<HoAppRequirement> = self
            .txns
            .iter()
            .filter(|(_, key, txn)| key.ms == src && txn.state == BsTxnState::Active && txn.ho_channels.is_empty())
            .map(|(_, key, txn)| HoAppRequirement {
                chan_ref: key.chan_ref,
                kind: txn.kind,
                count: txn.channels.len() as u8,
            })
            .collect();
        if apps.is_empty() {
            return;
        }

        tracing::info!(
            "handover required for ms {}: cell {} ({}) -> cell {} ({})",
            src,
            pdu.serving_cell,
            pdu.serving_quality,
            pdu.neighbour_cell,
            pdu.neighbour_quality
        );
        self.stats.inc(Counter::HandoverRequired);
        let required = HandoverRequired {
            ms: src,
            serving_cell: pdu.serving_cell,
            target_cell: pdu.neighbour_cell,
            apps,
        };
        self.send_sc(queue, &required);
        self.ho_out.insert(
            src,
            HoSource {
                state: HoSourceState::Pending,
                ho_ref: None,
                target_cell: pdu.neighbour_cell,
            },
        );
        self.arm(queue, BsTimerOwner::Handover(src), BsTimer::T7);
    }

    pub(super) fn on_t7(&mut self, queue: &mut MessageQueue, ms: NodeId) {
        if self.ho_out.get(&ms).is_some_and(|h| h.state == HoSourceState::Pending) {
            tracing::info!("no handover command for ms {}, giving up", ms);
            self.ho_out.remove(&ms);
            self.timers.cancel_owner(queue, BsTimerOwner::Handover(ms));
            self.stats.inc(Counter::HandoverFailures);
        }
    }

    /// The MS neither completed nor failed the handover
    pub(super) fn on_t8(&mut self, queue: &mut MessageQueue, ms: NodeId) {
        let Some(ctx) = self.ho_out.remove(&ms) else {
            return;
        };
        tracing::info!("T8 expired for handover of ms {}", ms);
        self.stats.inc(Counter::HandoverFailures);
        if let Some(ho_ref) = ctx.ho_ref {
            let failure = BssHandoverFailure {
                ho_ref,
                ms,
                cause: Cause::RadioInterfaceFailure,
            };
            self.send_sc(queue, &failure);
        }
    }

    pub(super) fn rx_handover_required_reject(&mut self, queue: &mut MessageQueue, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<HandoverRequiredReject>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        if self.ho_out.remove(&pdu.ms).is_some() {
            tracing::info!("handover of ms {} rejected: {}", pdu.ms, pdu.cause);
            self.timers.cancel_owner(queue, BsTimerOwner::Handover(pdu.ms));
            self.stats.inc(Counter::HandoverFailures);
        }
    }

    /// Target is ready: relay the new channels to the MS
    pub(super) fn rx_bss_handover_command(&mut self, queue: &mut MessageQueue, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<BssHandoverCommand>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let Some(ctx) = self.ho_out.get_mut(&pdu.ms) else {
            tracing::warn!("handover command for ms {} without handover", pdu.ms);
            return;
        };
        if ctx.state != HoSourceState::Pending {
            return;
        }
        ctx.state = HoSourceState::Proceeding;
        ctx.ho_ref = Some(pdu.ho_ref);
        self.timers.cancel(queue, BsTimerOwner::Handover(pdu.ms), BsTimer::T7);
        self.arm(queue, BsTimerOwner::Handover(pdu.ms), BsTimer::T8);

        let cmd = HandoverCommand {
            ho_ref: pdu.ho_ref,
            target_cell: pdu.target_cell,
            target_bs: pdu.target_bs,
            assignments: pdu.assignments,
        };
        queue.send_pdu(pdu.ms, TiField::NONE, &cmd);
    }

    /// The MS could not reach the target and stays on its old channels
    pub(super) fn rx_rr_handover_failure(&mut self, queue: &mut MessageQueue, src: NodeId, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<HandoverFailure>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        match self.ho_out.get(&src) {
            Some(ctx) if ctx.ho_ref == Some(pdu.ho_ref) => {}
            _ => {
                tracing::debug!("handover failure from ms {} without handover", src);
                return;
            }
        }
        tracing::info!("handover of ms {} failed: {}", src, pdu.cause);
        self.ho_out.remove(&src);
        self.timers.cancel_owner(queue, BsTimerOwner::Handover(src));
        self.stats.inc(Counter::HandoverFailures);
        let failure = BssHandoverFailure {
            ho_ref: pdu.ho_ref,
            ms: src,
            cause: pdu.cause,
        };
        self.send_sc(queue, &failure);
    }

    /// Reserves channels for an incoming handover, all applications or none
    pub(super) fn rx_handover_request(&mut self, queue: &mut MessageQueue, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<HandoverRequest>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        if !self.cells.contains(&pdu.target_cell) || pdu.apps.is_empty() || self.ho_in.contains_key(&pdu.ho_ref) {
            self.refuse_handover(queue, pdu.ho_ref, pdu.ms, Cause::HandoverImpossible);
            return;
        }

        let intra = pdu
            .apps
            .iter()
            .all(|app| self.txns.lookup(&BsKey { ms: pdu.ms, chan_ref: app.chan_ref }).is_some());

        let mut reserved: Vec<(TxnId, Vec<u16>)> = Vec::new();
        let mut failed = false;
        for app in pdu.apps.iter() {
            let key = BsKey { ms: pdu.ms, chan_ref: app.chan_ref };
            let id = if intra {
                self.txns.lookup(&key)
            } else {
                let txn = BsTxn {
                    cell: pdu.target_cell,
                    kind: app.kind,
                    state: BsTxnState::Incoming,
                    channels: Vec::new(),
                    ho_channels: Vec::new(),
                };
                self.txns.create(key, txn).ok()
            };
            let Some(id) = id else {
                self.stats.inc(Counter::TableExhausted);
                failed = true;
                break;
            };
            let count = u16::from(app.count).max(1);
            match self
                .pool
                .try_allocate(Self::owner(id), count, app.kind, AllocStage::Reserved, AdmissionPurpose::Handover)
            {
                Ok(channels) => reserved.push((id, channels)),
                Err(e) => {
                    tracing::info!("cannot admit handover of ms {}: {}", pdu.ms, e);
                    self.stats.inc(Counter::AdmissionRejects);
                    if !intra {
                        self.txns.release(id);
                    }
                    failed = true;
                    break;
                }
            }
        }

        if failed {
            for (id, channels) in reserved {
                self.pool.release(Self::owner(id), &channels);
                if !intra {
                    self.txns.release(id);
                }
            }
            self.refuse_handover(queue, pdu.ho_ref, pdu.ms, Cause::Congestion);
            return;
        }

        let mut assignments = Vec::with_capacity(reserved.len());
        let mut txns = Vec::with_capacity(reserved.len());
        for (id, channels) in reserved {
            let Some(txn) = self.txns.get_mut(id) else {
                continue;
            };
            if intra {
                txn.ho_channels = channels.clone();
            } else {
                txn.channels = channels.clone();
            }
            if let Some(key) = self.txns.key_of(id) {
                assignments.push(ChannelAssignment { chan_ref: key.chan_ref, channels });
            }
            txns.push(id);
        }

        tracing::info!(
            "reserved {} connection(s) in cell {} for {} handover of ms {}",
            txns.len(),
            pdu.target_cell,
            if intra { "intra-BS" } else { "inter-BS" },
            pdu.ms
        );
        self.ho_in.insert(
            pdu.ho_ref,
            HoTarget {
                ms: pdu.ms,
                cell: pdu.target_cell,
                intra,
                txns,
            },
        );
        self.send_sc(queue, &HandoverRequestAck { ho_ref: pdu.ho_ref, assignments });
    }

    fn refuse_handover(&mut self, queue: &mut MessageQueue, ho_ref: u8, ms: NodeId, cause: Cause) {
        tracing::info!("refusing handover {} of ms {}: {}", ho_ref, ms, cause);
        self.send_sc(queue, &BssHandoverFailure { ho_ref, ms, cause });
    }

    /// The MS arrived on the reserved channels: commit them and let go of the old ones
    pub(super) fn rx_rr_handover_complete(&mut self, queue: &mut MessageQueue, src: NodeId, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<HandoverComplete>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let Some(target) = self.ho_in.remove(&pdu.ho_ref) else {
            tracing::warn!("handover complete for unknown reference {}", pdu.ho_ref);
            return;
        };
        if target.ms != src {
            tracing::warn!("handover complete {} from ms {}, expected {}", pdu.ho_ref, src, target.ms);
            self.ho_in.insert(pdu.ho_ref, target);
            return;
        }

        for id in target.txns.iter() {
            let owner = Self::owner(*id);
            let Some(txn) = self.txns.get_mut(*id) else {
                continue;
            };
            if target.intra {
                let old = std::mem::replace(&mut txn.channels, std::mem::take(&mut txn.ho_channels));
                if let Err(e) = self.pool.confirm(owner, &txn.channels) {
                    tracing::warn!("cannot confirm handover channels of txn {}: {:?}", id, e);
                }
                self.pool.release(owner, &old);
            } else {
                if let Err(e) = self.pool.confirm(owner, &txn.channels) {
                    tracing::warn!("cannot confirm handover channels of txn {}: {:?}", id, e);
                }
                txn.state = BsTxnState::Active;
            }
            txn.cell = target.cell;
        }

        if target.intra {
            self.ho_out.remove(&src);
            self.timers.cancel_owner(queue, BsTimerOwner::Handover(src));
        }
        tracing::info!("ms {} handed over to cell {}", src, target.cell);
        self.stats.inc(Counter::HandoverSuccess);
        self.send_sc(queue, &BssHandoverComplete { ho_ref: pdu.ho_ref, ms: src });
    }

    /// Handover abandoned: free what was reserved here
    pub(super) fn rx_handover_cancel(&mut self, queue: &mut MessageQueue, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<HandoverCancel>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };
        let Some(target) = self.ho_in.remove(&pdu.ho_ref) else {
            tracing::debug!("cancel of unknown handover {}", pdu.ho_ref);
            return;
        };
        tracing::info!("handover {} of ms {} cancelled", pdu.ho_ref, target.ms);
        for id in target.txns {
            if target.intra {
                if let Some(txn) = self.txns.get_mut(id) {
                    let reserved = std::mem::take(&mut txn.ho_channels);
                    self.pool.release(Self::owner(id), &reserved);
                }
            } else {
                self.release_txn(queue, id);
            }
        }
    }
}
