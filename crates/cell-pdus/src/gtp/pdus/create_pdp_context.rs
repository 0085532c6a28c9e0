use core::fmt;

use cell_core::{BitBuffer, Imsi, MsgParseErr};
use cell_core::expect_msg_type;
use cell_core::let_enum_field;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::enums::cause::Cause;
use crate::common::fields::imsi;
use crate::header::L3Message;
use crate::gtp::enums::gtp_msg_type::GtpMsgType;

/// Representation of the GTP CREATE PDP CONTEXT REQUEST message.
/// Response expected: CREATE PDP CONTEXT RESPONSE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePdpContextRequest {
    /// 16 bits
    pub seq: u16,
    /// 56 bits, 6 spare + IMSI
    pub imsi: Imsi,
    /// 8 bits
    pub nsapi: u8,
    /// 32 bits
    pub bandwidth_kbps: u32,
}

impl L3Message for CreatePdpContextRequest {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Gtp;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, GtpMsgType::CreatePdpContextRequest)?;

        let seq = buffer.read_field(16, "seq")? as u16;
        let imsi = imsi::read_imsi(buffer, "imsi")?;
        let nsapi = buffer.read_field(8, "nsapi")? as u8;
        let bandwidth_kbps = buffer.read_field(32, "bandwidth_kbps")? as u32;

        Ok(CreatePdpContextRequest {
            seq,
            imsi,
            nsapi,
            bandwidth_kbps,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(GtpMsgType::CreatePdpContextRequest.into_raw(), 8);
        buffer.write_bits(self.seq as u64, 16);
        imsi::write_imsi(buffer, self.imsi, "imsi")?;
        buffer.write_bits(self.nsapi as u64, 8);
        buffer.write_bits(self.bandwidth_kbps as u64, 32);
        Ok(())
    }
}

impl fmt::Display for CreatePdpContextRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CreatePdpContextRequest {{ seq: {} imsi: {} nsapi: {} bandwidth_kbps: {} }}",
            self.seq,
            self.imsi,
            self.nsapi,
            self.bandwidth_kbps,
        )
    }
}

/// Representation of the GTP CREATE PDP CONTEXT RESPONSE message.
/// The address is only meaningful when the cause is NormalRelease.
/// Response to: CREATE PDP CONTEXT REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePdpContextResponse {
    /// 16 bits
    pub seq: u16,
    /// 56 bits, 6 spare + IMSI
    pub imsi: Imsi,
    /// 8 bits
    pub nsapi: u8,
    /// 8 bits
    pub cause: Cause,
    /// 32 bits
    pub pdp_address: u32,
}

impl L3Message for CreatePdpContextResponse {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Gtp;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, GtpMsgType::CreatePdpContextResponse)?;

        let seq = buffer.read_field(16, "seq")? as u16;
        let imsi = imsi::read_imsi(buffer, "imsi")?;
        let nsapi = buffer.read_field(8, "nsapi")? as u8;
        let_enum_field!(buffer, cause, Cause, 8);
        let pdp_address = buffer.read_field(32, "pdp_address")? as u32;

        Ok(CreatePdpContextResponse {
            seq,
            imsi,
            nsapi,
            cause,
            pdp_address,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(GtpMsgType::CreatePdpContextResponse.into_raw(), 8);
        buffer.write_bits(self.seq as u64, 16);
        imsi::write_imsi(buffer, self.imsi, "imsi")?;
        buffer.write_bits(self.nsapi as u64, 8);
        buffer.write_bits(self.cause.into_raw(), 8);
        buffer.write_bits(self.pdp_address as u64, 32);
        Ok(())
    }
}

impl fmt::Display for CreatePdpContextResponse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CreatePdpContextResponse {{ seq: {} imsi: {} nsapi: {} cause: {} pdp_address: {} }}",
            self.seq,
            self.imsi,
            self.nsapi,
            self.cause,
            self.pdp_address,
        )
    }
}

#[cfg(test)]
mod tests {
    use cell_core::debug;

    use super::*;
    use crate::header::{TiField, decode, encode, peek};

    #[test]
    fn test_create_response() {
        debug::setup_logging_verbose();
        let msg = CreatePdpContextResponse {
            seq: 0x1234,
            imsi: 5,
            nsapi: 5,
            cause: Cause::NormalRelease,
            pdp_address: 0x0a000001,
        };
        let bytes = encode(TiField::NONE, &msg).unwrap();
        let (hdr, msg_type) = peek(&bytes).unwrap();
        assert_eq!(hdr.pd, ProtocolDiscriminator::Gtp);
        assert_eq!(GtpMsgType::try_from(msg_type), Ok(GtpMsgType::CreatePdpContextResponse));
        assert_eq!(&bytes[2..4], &[0x12, 0x34]);
        assert_eq!(decode::<CreatePdpContextResponse>(&bytes).unwrap().1, msg);
    }
}
