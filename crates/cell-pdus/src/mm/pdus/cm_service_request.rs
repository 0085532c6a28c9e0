use core::fmt;

use cell_core::{BitBuffer, Imsi, MsgParseErr, ResourceKind};
use cell_core::expect_msg_type;
use cell_core::let_enum_field;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::fields::imsi;
use crate::header::L3Message;
use crate::mm::enums::mm_msg_type::MmMsgType;

/// Representation of the CM SERVICE REQUEST message.
/// Response expected: CM SERVICE ACCEPT/CM SERVICE REJECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmServiceRequest {
    /// 56 bits, 6 spare + IMSI
    pub imsi: Imsi,
    /// 8 bits
    pub service: ResourceKind,
}

impl L3Message for CmServiceRequest {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Mm;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, MmMsgType::CmServiceRequest)?;

        let imsi = imsi::read_imsi(buffer, "imsi")?;
        let_enum_field!(buffer, service, ResourceKind, 8);

        Ok(CmServiceRequest {
            imsi,
            service,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(MmMsgType::CmServiceRequest.into_raw(), 8);
        imsi::write_imsi(buffer, self.imsi, "imsi")?;
        buffer.write_bits(self.service.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for CmServiceRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CmServiceRequest {{ imsi: {} service: {} }}",
            self.imsi,
            self.service,
        )
    }
}
