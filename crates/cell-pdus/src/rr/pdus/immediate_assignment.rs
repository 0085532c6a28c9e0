use core::fmt;

use cell_core::{BitBuffer, CellId, ChanRef, MsgParseErr};
use cell_core::expect_msg_type;
use cell_core::let_enum_field;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::enums::cause::Cause;
use crate::common::fields::counted;
use crate::header::L3Message;
use crate::rr::enums::rr_msg_type::RrMsgType;

/// Representation of the IMMEDIATE ASSIGNMENT message.
/// The BS grants the requested channels. They stay tentative until ASSIGNMENT COMPLETE.
/// Response expected: ASSIGNMENT COMPLETE
/// Response to: CHANNEL REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmediateAssignment {
    /// 8 bits
    pub chan_ref: ChanRef,
    /// 16 bits
    pub cell: CellId,
    /// 8-bit count, then 16 bits per channel index
    pub channels: Vec<u16>,
}

impl L3Message for ImmediateAssignment {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Rr;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, RrMsgType::ImmediateAssignment)?;

        let chan_ref = buffer.read_field(8, "chan_ref")? as ChanRef;
        let cell = buffer.read_field(16, "cell")? as CellId;
        let channels = counted::read_channel_list(buffer, "channels")?;

        Ok(ImmediateAssignment {
            chan_ref,
            cell,
            channels,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(RrMsgType::ImmediateAssignment.into_raw(), 8);
        buffer.write_bits(self.chan_ref as u64, 8);
        buffer.write_bits(self.cell as u64, 16);
        counted::write_channel_list(buffer, &self.channels, "channels")?;
        Ok(())
    }
}

impl fmt::Display for ImmediateAssignment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ImmediateAssignment {{ chan_ref: {} cell: {} channels: {:?} }}",
            self.chan_ref,
            self.cell,
            self.channels,
        )
    }
}

/// Representation of the IMMEDIATE ASSIGNMENT REJECT message.
/// Response to: CHANNEL REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmediateAssignmentReject {
    /// 8 bits
    pub chan_ref: ChanRef,
    /// 8 bits
    pub cause: Cause,
}

impl L3Message for ImmediateAssignmentReject {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Rr;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, RrMsgType::ImmediateAssignmentReject)?;

        let chan_ref = buffer.read_field(8, "chan_ref")? as ChanRef;
        let_enum_field!(buffer, cause, Cause, 8);

        Ok(ImmediateAssignmentReject {
            chan_ref,
            cause,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(RrMsgType::ImmediateAssignmentReject.into_raw(), 8);
        buffer.write_bits(self.chan_ref as u64, 8);
        buffer.write_bits(self.cause.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for ImmediateAssignmentReject {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ImmediateAssignmentReject {{ chan_ref: {} cause: {} }}",
            self.chan_ref,
            self.cause,
        )
    }
}
