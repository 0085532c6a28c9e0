use core::fmt;

use cell_core::{BitBuffer, CellId, MsgParseErr, NodeId};
use cell_core::expect_msg_type;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::fields::channel_assignment::{self, ChannelAssignment};
use crate::header::L3Message;
use crate::bssmap::enums::bssmap_msg_type::BssmapMsgType;

/// Representation of the BSSMAP HANDOVER COMMAND message.
/// Carries the target reservation to the serving BS, which relays it to the MS.
/// Response to: HANDOVER REQUIRED
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BssHandoverCommand {
    /// 8 bits
    pub ho_ref: u8,
    /// 32 bits
    pub ms: NodeId,
    /// 16 bits
    pub target_cell: CellId,
    /// 32 bits
    pub target_bs: NodeId,
    /// 8-bit count, then one assignment per application
    pub assignments: Vec<ChannelAssignment>,
}

impl L3Message for BssHandoverCommand {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Bssmap;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, BssmapMsgType::HandoverCommand)?;

        let ho_ref = buffer.read_field(8, "ho_ref")? as u8;
        let ms = buffer.read_field(32, "ms")? as NodeId;
        let target_cell = buffer.read_field(16, "target_cell")? as CellId;
        let target_bs = buffer.read_field(32, "target_bs")? as NodeId;
        let assignments = channel_assignment::read_assignments(buffer)?;

        Ok(BssHandoverCommand {
            ho_ref,
            ms,
            target_cell,
            target_bs,
            assignments,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(BssmapMsgType::HandoverCommand.into_raw(), 8);
        buffer.write_bits(self.ho_ref as u64, 8);
        buffer.write_bits(self.ms as u64, 32);
        buffer.write_bits(self.target_cell as u64, 16);
        buffer.write_bits(self.target_bs as u64, 32);
        channel_assignment::write_assignments(buffer, &self.assignments)?;
        Ok(())
    }
}

impl fmt::Display for BssHandoverCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BssHandoverCommand {{ ho_ref: {} ms: {} target_cell: {} target_bs: {} assignments: {:?} }}",
            self.ho_ref,
            self.ms,
            self.target_cell,
            self.target_bs,
            self.assignments,
        )
    }
}
