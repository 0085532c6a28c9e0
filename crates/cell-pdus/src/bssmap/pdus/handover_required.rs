use core::fmt;

use cell_core::{BitBuffer, CellId, MsgParseErr, NodeId};
use cell_core::expect_msg_type;
use cell_core::let_enum_field;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::enums::cause::Cause;
use crate::common::fields::ho_app::{self, HoAppRequirement};
use crate::header::L3Message;
use crate::bssmap::enums::bssmap_msg_type::BssmapMsgType;

/// Representation of the HANDOVER REQUIRED message.
/// Sent by the serving BS when a neighbour cell is better than the serving one.
/// Response expected: HANDOVER COMMAND/HANDOVER REQUIRED REJECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoverRequired {
    /// 32 bits
    pub ms: NodeId,
    /// 16 bits
    pub serving_cell: CellId,
    /// 16 bits
    pub target_cell: CellId,
    /// 8-bit count, then one requirement per application
    pub apps: Vec<HoAppRequirement>,
}

impl L3Message for HandoverRequired {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Bssmap;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, BssmapMsgType::HandoverRequired)?;

        let ms = buffer.read_field(32, "ms")? as NodeId;
        let serving_cell = buffer.read_field(16, "serving_cell")? as CellId;
        let target_cell = buffer.read_field(16, "target_cell")? as CellId;
        let apps = ho_app::read_requirements(buffer)?;

        Ok(HandoverRequired {
            ms,
            serving_cell,
            target_cell,
            apps,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(BssmapMsgType::HandoverRequired.into_raw(), 8);
        buffer.write_bits(self.ms as u64, 32);
        buffer.write_bits(self.serving_cell as u64, 16);
        buffer.write_bits(self.target_cell as u64, 16);
        ho_app::write_requirements(buffer, &self.apps)?;
        Ok(())
    }
}

impl fmt::Display for HandoverRequired {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HandoverRequired {{ ms: {} serving_cell: {} target_cell: {} apps: {:?} }}",
            self.ms,
            self.serving_cell,
            self.target_cell,
            self.apps,
        )
    }
}

/// Representation of the HANDOVER REQUIRED REJECT message.
/// Response to: HANDOVER REQUIRED
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoverRequiredReject {
    /// 32 bits
    pub ms: NodeId,
    /// 8 bits
    pub cause: Cause,
}

impl L3Message for HandoverRequiredReject {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Bssmap;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, BssmapMsgType::HandoverRequiredReject)?;

        let ms = buffer.read_field(32, "ms")? as NodeId;
        let_enum_field!(buffer, cause, Cause, 8);

        Ok(HandoverRequiredReject {
            ms,
            cause,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(BssmapMsgType::HandoverRequiredReject.into_raw(), 8);
        buffer.write_bits(self.ms as u64, 32);
        buffer.write_bits(self.cause.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for HandoverRequiredReject {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HandoverRequiredReject {{ ms: {} cause: {} }}",
            self.ms,
            self.cause,
        )
    }
}
