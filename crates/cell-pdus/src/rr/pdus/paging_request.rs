use core::fmt;

use cell_core::{BitBuffer, Imsi, MsgParseErr, ResourceKind};
use cell_core::expect_msg_type;
use cell_core::let_enum_field;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::fields::imsi;
use crate::header::L3Message;
use crate::rr::enums::rr_msg_type::RrMsgType;

/// Representation of the PAGING REQUEST message, broadcast in all cells of a BS.
/// Response expected: CHANNEL REQUEST with establishment cause PagingResponse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingRequest {
    /// 56 bits, 6 spare + IMSI
    pub imsi: Imsi,
    /// 8 bits. Service the network wants to deliver
    pub kind: ResourceKind,
}

impl L3Message for PagingRequest {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Rr;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, RrMsgType::PagingRequest)?;

        let imsi = imsi::read_imsi(buffer, "imsi")?;
        let_enum_field!(buffer, kind, ResourceKind, 8);

        Ok(PagingRequest {
            imsi,
            kind,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(RrMsgType::PagingRequest.into_raw(), 8);
        imsi::write_imsi(buffer, self.imsi, "imsi")?;
        buffer.write_bits(self.kind.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for PagingRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PagingRequest {{ imsi: {} kind: {} }}",
            self.imsi,
            self.kind,
        )
    }
}
