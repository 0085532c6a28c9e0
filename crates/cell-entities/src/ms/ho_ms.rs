use cell_core::{CellId, NodeId, TxnId};
use cell_pdus::rr::pdus::handover_command::HandoverCommand;
use cell_pdus::rr::pdus::handover_complete::{HandoverComplete, HandoverFailure};
use cell_pdus::rr::pdus::measurement_report::MeasurementReport;
use cell_pdus::{Cause, TiField};

use crate::MessageQueue;
use crate::codec;
use crate::ms::app::RrState;
use crate::ms::mobile_station::MobileStation;
use crate::stats::Counter;

/// Quality assumed for the serving cell before it was measured
const UNMEASURED_SERVING_QUALITY: u8 = 63;

impl MobileStation {
    /// Stores a measurement. While in dedicated mode, reports the serving cell
    /// and the best neighbour to the BS.
    pub(super) fn measurement(&mut self, queue: &mut MessageQueue, cell: CellId, quality: u8) {
        self.measurements.insert(cell, quality);
        if !self.apps.iter().any(|(_, _, app)| app.is_assigned()) {
            return;
        }

        let serving_quality = self.measurements.get(&self.cell).copied().unwrap_or(UNMEASURED_SERVING_QUALITY);
        let best = self
            .measurements
            .iter()
            .filter(|(c, _)| **c != self.cell)
            .max_by_key(|(_, q)| **q)
            .map(|(c, q)| (*c, *q));
        let Some((neighbour_cell, neighbour_quality)) = best else {
            return;
        };

        let pdu = MeasurementReport {
            serving_cell: self.cell,
            serving_quality,
            neighbour_cell,
            neighbour_quality,
        };
        self.send_rr(queue, &pdu);
    }

    /// Moves the listed applications to their new channels, then confirms to the
    /// target BS. The old channels are still held until the network frees them.
    pub(super) fn rx_handover_command(&mut self, queue: &mut MessageQueue, src: NodeId, bytes: &[u8]) {
        let Some((_, pdu)) = codec::parse::<HandoverCommand>(bytes) else {
            self.stats.inc(Counter::DroppedMessages);
            return;
        };

        let min_quality = self.config.config().handover.min_access_quality;
        let target_quality = self.measurements.get(&pdu.target_cell).copied().unwrap_or(0);
        if target_quality < min_quality {
            tracing::info!(
                "cannot access cell {} (quality {} < {}), handover failed",
                pdu.target_cell,
                target_quality,
                min_quality
            );
            self.stats.inc(Counter::HandoverFailures);
            let failure = HandoverFailure {
                ho_ref: pdu.ho_ref,
                cause: Cause::HandoverImpossible,
            };
            queue.send_pdu(src, TiField::NONE, &failure);
            return;
        }

        for assignment in pdu.assignments {
            let id = assignment.chan_ref as TxnId;
            match self.apps.get_mut(id) {
                Some(app) if app.is_assigned() => {
                    tracing::debug!("app {} moves to channels {:?}", id, assignment.channels);
                    app.rr = RrState::Assigned {
                        cell: pdu.target_cell,
                        channels: assignment.channels,
                    };
                }
                _ => tracing::warn!("handover for app {} without channel", id),
            }
        }

        tracing::info!("handed over from cell {} to cell {}", self.cell, pdu.target_cell);
        self.cell = pdu.target_cell;
        self.stats.inc(Counter::HandoverSuccess);
        queue.send_pdu(pdu.target_bs, TiField::NONE, &HandoverComplete { ho_ref: pdu.ho_ref });
    }
}
