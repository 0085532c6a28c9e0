use core::fmt;

use cell_core::{BitBuffer, MsgParseErr};
use cell_core::expect_msg_type;
use cell_core::let_enum_field;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::enums::cause::Cause;
use crate::header::L3Message;
use crate::sm::enums::sm_msg_type::SmMsgType;

/// Representation of the DEACTIVATE PDP CONTEXT REQUEST message, sent in either direction.
/// Response expected: DEACTIVATE PDP CONTEXT ACCEPT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeactivatePdpContextRequest {
    /// 8 bits
    pub nsapi: u8,
    /// 8 bits
    pub cause: Cause,
}

impl L3Message for DeactivatePdpContextRequest {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Sm;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, SmMsgType::DeactivatePdpContextRequest)?;

        let nsapi = buffer.read_field(8, "nsapi")? as u8;
        let_enum_field!(buffer, cause, Cause, 8);

        Ok(DeactivatePdpContextRequest {
            nsapi,
            cause,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(SmMsgType::DeactivatePdpContextRequest.into_raw(), 8);
        buffer.write_bits(self.nsapi as u64, 8);
        buffer.write_bits(self.cause.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for DeactivatePdpContextRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DeactivatePdpContextRequest {{ nsapi: {} cause: {} }}",
            self.nsapi,
            self.cause,
        )
    }
}

/// Representation of the DEACTIVATE PDP CONTEXT ACCEPT message.
/// Response to: DEACTIVATE PDP CONTEXT REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeactivatePdpContextAccept {
    /// 8 bits
    pub nsapi: u8,
}

impl L3Message for DeactivatePdpContextAccept {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Sm;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, SmMsgType::DeactivatePdpContextAccept)?;

        let nsapi = buffer.read_field(8, "nsapi")? as u8;

        Ok(DeactivatePdpContextAccept {
            nsapi,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(SmMsgType::DeactivatePdpContextAccept.into_raw(), 8);
        buffer.write_bits(self.nsapi as u64, 8);
        Ok(())
    }
}

impl fmt::Display for DeactivatePdpContextAccept {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DeactivatePdpContextAccept {{ nsapi: {} }}",
            self.nsapi,
        )
    }
}
