use core::fmt;

use cell_core::{BitBuffer, ChanRef, MsgParseErr};
use cell_core::expect_msg_type;
use cell_core::let_enum_field;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::enums::cause::Cause;
use crate::header::L3Message;
use crate::rr::enums::rr_msg_type::RrMsgType;

/// Representation of the CHANNEL RELEASE message.
/// Sent in either direction. The receiver frees the channels of the application, a release for unknown channels is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRelease {
    /// 8 bits
    pub chan_ref: ChanRef,
    /// 8 bits
    pub cause: Cause,
}

impl L3Message for ChannelRelease {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Rr;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, RrMsgType::ChannelRelease)?;

        let chan_ref = buffer.read_field(8, "chan_ref")? as ChanRef;
        let_enum_field!(buffer, cause, Cause, 8);

        Ok(ChannelRelease {
            chan_ref,
            cause,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(RrMsgType::ChannelRelease.into_raw(), 8);
        buffer.write_bits(self.chan_ref as u64, 8);
        buffer.write_bits(self.cause.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for ChannelRelease {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ChannelRelease {{ chan_ref: {} cause: {} }}",
            self.chan_ref,
            self.cause,
        )
    }
}
