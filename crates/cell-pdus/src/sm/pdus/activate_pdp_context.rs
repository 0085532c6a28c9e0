use core::fmt;

use cell_core::{BitBuffer, MsgParseErr};
use cell_core::expect_msg_type;
use cell_core::let_enum_field;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::enums::cause::Cause;
use crate::header::L3Message;
use crate::sm::enums::sm_msg_type::SmMsgType;

/// Representation of the ACTIVATE PDP CONTEXT REQUEST message.
/// Response expected: ACTIVATE PDP CONTEXT ACCEPT/ACTIVATE PDP CONTEXT REJECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivatePdpContextRequest {
    /// 8 bits
    pub nsapi: u8,
    /// 32 bits
    pub bandwidth_kbps: u32,
}

impl L3Message for ActivatePdpContextRequest {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Sm;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, SmMsgType::ActivatePdpContextRequest)?;

        let nsapi = buffer.read_field(8, "nsapi")? as u8;
        let bandwidth_kbps = buffer.read_field(32, "bandwidth_kbps")? as u32;

        Ok(ActivatePdpContextRequest {
            nsapi,
            bandwidth_kbps,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(SmMsgType::ActivatePdpContextRequest.into_raw(), 8);
        buffer.write_bits(self.nsapi as u64, 8);
        buffer.write_bits(self.bandwidth_kbps as u64, 32);
        Ok(())
    }
}

impl fmt::Display for ActivatePdpContextRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ActivatePdpContextRequest {{ nsapi: {} bandwidth_kbps: {} }}",
            self.nsapi,
            self.bandwidth_kbps,
        )
    }
}

/// Representation of the ACTIVATE PDP CONTEXT ACCEPT message.
/// Response to: ACTIVATE PDP CONTEXT REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivatePdpContextAccept {
    /// 8 bits
    pub nsapi: u8,
    /// 32 bits
    pub pdp_address: u32,
}

impl L3Message for ActivatePdpContextAccept {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Sm;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, SmMsgType::ActivatePdpContextAccept)?;

        let nsapi = buffer.read_field(8, "nsapi")? as u8;
        let pdp_address = buffer.read_field(32, "pdp_address")? as u32;

        Ok(ActivatePdpContextAccept {
            nsapi,
            pdp_address,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(SmMsgType::ActivatePdpContextAccept.into_raw(), 8);
        buffer.write_bits(self.nsapi as u64, 8);
        buffer.write_bits(self.pdp_address as u64, 32);
        Ok(())
    }
}

impl fmt::Display for ActivatePdpContextAccept {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ActivatePdpContextAccept {{ nsapi: {} pdp_address: {} }}",
            self.nsapi,
            self.pdp_address,
        )
    }
}

/// Representation of the ACTIVATE PDP CONTEXT REJECT message.
/// Response to: ACTIVATE PDP CONTEXT REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivatePdpContextReject {
    /// 8 bits
    pub nsapi: u8,
    /// 8 bits
    pub cause: Cause,
}

impl L3Message for ActivatePdpContextReject {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Sm;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, SmMsgType::ActivatePdpContextReject)?;

        let nsapi = buffer.read_field(8, "nsapi")? as u8;
        let_enum_field!(buffer, cause, Cause, 8);

        Ok(ActivatePdpContextReject {
            nsapi,
            cause,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(SmMsgType::ActivatePdpContextReject.into_raw(), 8);
        buffer.write_bits(self.nsapi as u64, 8);
        buffer.write_bits(self.cause.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for ActivatePdpContextReject {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ActivatePdpContextReject {{ nsapi: {} cause: {} }}",
            self.nsapi,
            self.cause,
        )
    }
}
