use core::fmt;

use cell_core::{BitBuffer, Imsi, MsgParseErr};
use cell_core::expect_msg_type;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::fields::imsi;
use crate::header::L3Message;
use crate::mm::enums::mm_msg_type::MmMsgType;

/// Representation of the PAGING RESPONSE message, first message on a channel seized for a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingResponse {
    /// 56 bits, 6 spare + IMSI
    pub imsi: Imsi,
}

impl L3Message for PagingResponse {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Mm;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, MmMsgType::PagingResponse)?;

        let imsi = imsi::read_imsi(buffer, "imsi")?;

        Ok(PagingResponse {
            imsi,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(MmMsgType::PagingResponse.into_raw(), 8);
        imsi::write_imsi(buffer, self.imsi, "imsi")?;
        Ok(())
    }
}

impl fmt::Display for PagingResponse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PagingResponse {{ imsi: {} }}",
            self.imsi,
        )
    }
}
