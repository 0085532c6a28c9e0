use core::fmt;

use cell_core::{BitBuffer, MsgParseErr};
use cell_core::expect_msg_type;
use cell_core::let_enum_field;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::enums::cause::Cause;
use crate::header::L3Message;
use crate::rr::enums::rr_msg_type::RrMsgType;

/// Representation of the RR HANDOVER COMPLETE message, sent by the MS on the target channels.
/// Response to: HANDOVER COMMAND
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoverComplete {
    /// 8 bits
    pub ho_ref: u8,
}

impl L3Message for HandoverComplete {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Rr;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, RrMsgType::HandoverComplete)?;

        let ho_ref = buffer.read_field(8, "ho_ref")? as u8;

        Ok(HandoverComplete {
            ho_ref,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(RrMsgType::HandoverComplete.into_raw(), 8);
        buffer.write_bits(self.ho_ref as u64, 8);
        Ok(())
    }
}

impl fmt::Display for HandoverComplete {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HandoverComplete {{ ho_ref: {} }}",
            self.ho_ref,
        )
    }
}

/// Representation of the RR HANDOVER FAILURE message, sent by the MS on the old channels.
/// Response to: HANDOVER COMMAND
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoverFailure {
    /// 8 bits
    pub ho_ref: u8,
    /// 8 bits
    pub cause: Cause,
}

impl L3Message for HandoverFailure {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Rr;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, RrMsgType::HandoverFailure)?;

        let ho_ref = buffer.read_field(8, "ho_ref")? as u8;
        let_enum_field!(buffer, cause, Cause, 8);

        Ok(HandoverFailure {
            ho_ref,
            cause,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(RrMsgType::HandoverFailure.into_raw(), 8);
        buffer.write_bits(self.ho_ref as u64, 8);
        buffer.write_bits(self.cause.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for HandoverFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HandoverFailure {{ ho_ref: {} cause: {} }}",
            self.ho_ref,
            self.cause,
        )
    }
}
