use core::fmt;

use cell_core::{BitBuffer, ChanRef, MsgParseErr, NodeId};
use cell_core::expect_msg_type;
use cell_core::let_enum_field;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::enums::cause::Cause;
use crate::header::L3Message;
use crate::bssmap::enums::bssmap_msg_type::BssmapMsgType;

/// Representation of the CLEAR COMMAND message.
/// The SC orders the BS to release the channels of one application.
/// Response expected: CLEAR COMPLETE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearCommand {
    /// 32 bits
    pub ms: NodeId,
    /// 8 bits
    pub chan_ref: ChanRef,
    /// 8 bits
    pub cause: Cause,
}

impl L3Message for ClearCommand {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Bssmap;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, BssmapMsgType::ClearCommand)?;

        let ms = buffer.read_field(32, "ms")? as NodeId;
        let chan_ref = buffer.read_field(8, "chan_ref")? as ChanRef;
        let_enum_field!(buffer, cause, Cause, 8);

        Ok(ClearCommand {
            ms,
            chan_ref,
            cause,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(BssmapMsgType::ClearCommand.into_raw(), 8);
        buffer.write_bits(self.ms as u64, 32);
        buffer.write_bits(self.chan_ref as u64, 8);
        buffer.write_bits(self.cause.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for ClearCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ClearCommand {{ ms: {} chan_ref: {} cause: {} }}",
            self.ms,
            self.chan_ref,
            self.cause,
        )
    }
}

/// Representation of the CLEAR COMPLETE message.
/// Response to: CLEAR COMMAND
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearComplete {
    /// 32 bits
    pub ms: NodeId,
    /// 8 bits
    pub chan_ref: ChanRef,
}

impl L3Message for ClearComplete {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Bssmap;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, BssmapMsgType::ClearComplete)?;

        let ms = buffer.read_field(32, "ms")? as NodeId;
        let chan_ref = buffer.read_field(8, "chan_ref")? as ChanRef;

        Ok(ClearComplete {
            ms,
            chan_ref,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(BssmapMsgType::ClearComplete.into_raw(), 8);
        buffer.write_bits(self.ms as u64, 32);
        buffer.write_bits(self.chan_ref as u64, 8);
        Ok(())
    }
}

impl fmt::Display for ClearComplete {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ClearComplete {{ ms: {} chan_ref: {} }}",
            self.ms,
            self.chan_ref,
        )
    }
}

/// Representation of the CLEAR REQUEST message.
/// The BS reports channels released on the radio side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearRequest {
    /// 32 bits
    pub ms: NodeId,
    /// 8 bits
    pub chan_ref: ChanRef,
    /// 8 bits
    pub cause: Cause,
}

impl L3Message for ClearRequest {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Bssmap;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, BssmapMsgType::ClearRequest)?;

        let ms = buffer.read_field(32, "ms")? as NodeId;
        let chan_ref = buffer.read_field(8, "chan_ref")? as ChanRef;
        let_enum_field!(buffer, cause, Cause, 8);

        Ok(ClearRequest {
            ms,
            chan_ref,
            cause,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(BssmapMsgType::ClearRequest.into_raw(), 8);
        buffer.write_bits(self.ms as u64, 32);
        buffer.write_bits(self.chan_ref as u64, 8);
        buffer.write_bits(self.cause.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for ClearRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ClearRequest {{ ms: {} chan_ref: {} cause: {} }}",
            self.ms,
            self.chan_ref,
            self.cause,
        )
    }
}
