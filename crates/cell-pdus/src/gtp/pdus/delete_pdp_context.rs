use core::fmt;

use cell_core::{BitBuffer, Imsi, MsgParseErr};
use cell_core::expect_msg_type;
use cell_core::let_enum_field;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::enums::cause::Cause;
use crate::common::fields::imsi;
use crate::header::L3Message;
use crate::gtp::enums::gtp_msg_type::GtpMsgType;

/// Representation of the GTP DELETE PDP CONTEXT REQUEST message, sent in either direction.
/// Response expected: DELETE PDP CONTEXT RESPONSE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePdpContextRequest {
    /// 16 bits
    pub seq: u16,
    /// 56 bits, 6 spare + IMSI
    pub imsi: Imsi,
    /// 8 bits
    pub nsapi: u8,
    /// 8 bits
    pub cause: Cause,
}

impl L3Message for DeletePdpContextRequest {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Gtp;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, GtpMsgType::DeletePdpContextRequest)?;

        let seq = buffer.read_field(16, "seq")? as u16;
        let imsi = imsi::read_imsi(buffer, "imsi")?;
        let nsapi = buffer.read_field(8, "nsapi")? as u8;
        let_enum_field!(buffer, cause, Cause, 8);

        Ok(DeletePdpContextRequest {
            seq,
            imsi,
            nsapi,
            cause,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(GtpMsgType::DeletePdpContextRequest.into_raw(), 8);
        buffer.write_bits(self.seq as u64, 16);
        imsi::write_imsi(buffer, self.imsi, "imsi")?;
        buffer.write_bits(self.nsapi as u64, 8);
        buffer.write_bits(self.cause.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for DeletePdpContextRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DeletePdpContextRequest {{ seq: {} imsi: {} nsapi: {} cause: {} }}",
            self.seq,
            self.imsi,
            self.nsapi,
            self.cause,
        )
    }
}

/// Representation of the GTP DELETE PDP CONTEXT RESPONSE message.
/// Response to: DELETE PDP CONTEXT REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePdpContextResponse {
    /// 16 bits
    pub seq: u16,
    /// 56 bits, 6 spare + IMSI
    pub imsi: Imsi,
    /// 8 bits
    pub nsapi: u8,
    /// 8 bits
    pub cause: Cause,
}

impl L3Message for DeletePdpContextResponse {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Gtp;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, GtpMsgType::DeletePdpContextResponse)?;

        let seq = buffer.read_field(16, "seq")? as u16;
        let imsi = imsi::read_imsi(buffer, "imsi")?;
        let nsapi = buffer.read_field(8, "nsapi")? as u8;
        let_enum_field!(buffer, cause, Cause, 8);

        Ok(DeletePdpContextResponse {
            seq,
            imsi,
            nsapi,
            cause,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(GtpMsgType::DeletePdpContextResponse.into_raw(), 8);
        buffer.write_bits(self.seq as u64, 16);
        imsi::write_imsi(buffer, self.imsi, "imsi")?;
        buffer.write_bits(self.nsapi as u64, 8);
        buffer.write_bits(self.cause.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for DeletePdpContextResponse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DeletePdpContextResponse {{ seq: {} imsi: {} nsapi: {} cause: {} }}",
            self.seq,
            self.imsi,
            self.nsapi,
            self.cause,
        )
    }
}
