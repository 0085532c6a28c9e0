use core::fmt;

use cell_core::{BitBuffer, ChanRef, MsgParseErr};
use cell_core::expect_msg_type;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::header::L3Message;
use crate::rr::enums::rr_msg_type::RrMsgType;

/// Representation of the ASSIGNMENT COMPLETE message.
/// The MS confirms it has seized the assigned channels.
/// Response to: IMMEDIATE ASSIGNMENT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentComplete {
    /// 8 bits
    pub chan_ref: ChanRef,
}

impl L3Message for AssignmentComplete {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Rr;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, RrMsgType::AssignmentComplete)?;

        let chan_ref = buffer.read_field(8, "chan_ref")? as ChanRef;

        Ok(AssignmentComplete {
            chan_ref,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(RrMsgType::AssignmentComplete.into_raw(), 8);
        buffer.write_bits(self.chan_ref as u64, 8);
        Ok(())
    }
}

impl fmt::Display for AssignmentComplete {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "AssignmentComplete {{ chan_ref: {} }}",
            self.chan_ref,
        )
    }
}
