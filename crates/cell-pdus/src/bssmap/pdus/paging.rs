use core::fmt;

use cell_core::{BitBuffer, Imsi, MsgParseErr, NodeId, ResourceKind};
use cell_core::expect_msg_type;
use cell_core::let_enum_field;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::fields::imsi;
use crate::header::L3Message;
use crate::bssmap::enums::bssmap_msg_type::BssmapMsgType;

/// Representation of the BSSMAP PAGING message. The BS broadcasts a PAGING REQUEST in its cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paging {
    /// 56 bits, 6 spare + IMSI
    pub imsi: Imsi,
    /// 32 bits. Radio address of the subscriber, resolved by the SC
    pub ms: NodeId,
    /// 8 bits
    pub kind: ResourceKind,
}

impl L3Message for Paging {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Bssmap;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, BssmapMsgType::Paging)?;

        let imsi = imsi::read_imsi(buffer, "imsi")?;
        let ms = buffer.read_field(32, "ms")? as NodeId;
        let_enum_field!(buffer, kind, ResourceKind, 8);

        Ok(Paging {
            imsi,
            ms,
            kind,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(BssmapMsgType::Paging.into_raw(), 8);
        imsi::write_imsi(buffer, self.imsi, "imsi")?;
        buffer.write_bits(self.ms as u64, 32);
        buffer.write_bits(self.kind.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for Paging {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Paging {{ imsi: {} ms: {} kind: {} }}",
            self.imsi,
            self.ms,
            self.kind,
        )
    }
}
