use core::fmt;

use cell_core::{BitBuffer, MsgParseErr, NodeId};
use cell_core::expect_msg_type;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::header::L3Message;
use crate::bssmap::enums::bssmap_msg_type::BssmapMsgType;

/// Representation of the BSSMAP HANDOVER COMPLETE message, sent by the target BS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BssHandoverComplete {
    /// 8 bits
    pub ho_ref: u8,
    /// 32 bits
    pub ms: NodeId,
}

impl L3Message for BssHandoverComplete {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Bssmap;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, BssmapMsgType::HandoverComplete)?;

        let ho_ref = buffer.read_field(8, "ho_ref")? as u8;
        let ms = buffer.read_field(32, "ms")? as NodeId;

        Ok(BssHandoverComplete {
            ho_ref,
            ms,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(BssmapMsgType::HandoverComplete.into_raw(), 8);
        buffer.write_bits(self.ho_ref as u64, 8);
        buffer.write_bits(self.ms as u64, 32);
        Ok(())
    }
}

impl fmt::Display for BssHandoverComplete {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BssHandoverComplete {{ ho_ref: {} ms: {} }}",
            self.ho_ref,
            self.ms,
        )
    }
}

/// Representation of the HANDOVER CANCEL message.
/// The target BS frees the reservation made for the handover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoverCancel {
    /// 8 bits
    pub ho_ref: u8,
    /// 32 bits
    pub ms: NodeId,
}

impl L3Message for HandoverCancel {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Bssmap;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, BssmapMsgType::HandoverCancel)?;

        let ho_ref = buffer.read_field(8, "ho_ref")? as u8;
        let ms = buffer.read_field(32, "ms")? as NodeId;

        Ok(HandoverCancel {
            ho_ref,
            ms,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(BssmapMsgType::HandoverCancel.into_raw(), 8);
        buffer.write_bits(self.ho_ref as u64, 8);
        buffer.write_bits(self.ms as u64, 32);
        Ok(())
    }
}

impl fmt::Display for HandoverCancel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HandoverCancel {{ ho_ref: {} ms: {} }}",
            self.ho_ref,
            self.ms,
        )
    }
}
