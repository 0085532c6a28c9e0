use core::fmt;

use cell_core::{BitBuffer, CellId, ChanRef, MsgParseErr, NodeId};
use cell_core::expect_msg_type;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::fields::counted;
use crate::header::L3Message;
use crate::bssmap::enums::bssmap_msg_type::BssmapMsgType;

/// Relays an MS message received on a confirmed dedicated channel to the SC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtapUp {
    /// 32 bits
    pub ms: NodeId,
    /// 8 bits
    pub chan_ref: ChanRef,
    /// 16 bits
    pub cell: CellId,
    /// 8-bit length, then the octets of an embedded message
    pub payload: Vec<u8>,
}

impl L3Message for DtapUp {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Bssmap;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, BssmapMsgType::DtapUp)?;

        let ms = buffer.read_field(32, "ms")? as NodeId;
        let chan_ref = buffer.read_field(8, "chan_ref")? as ChanRef;
        let cell = buffer.read_field(16, "cell")? as CellId;
        let payload = counted::read_payload(buffer, "payload")?;

        Ok(DtapUp {
            ms,
            chan_ref,
            cell,
            payload,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(BssmapMsgType::DtapUp.into_raw(), 8);
        buffer.write_bits(self.ms as u64, 32);
        buffer.write_bits(self.chan_ref as u64, 8);
        buffer.write_bits(self.cell as u64, 16);
        counted::write_payload(buffer, &self.payload, "payload")?;
        Ok(())
    }
}

impl fmt::Display for DtapUp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DtapUp {{ ms: {} chan_ref: {} cell: {} payload: {:02x?} }}",
            self.ms,
            self.chan_ref,
            self.cell,
            self.payload,
        )
    }
}

/// Relays an SC message to the MS on the channels of one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtapDown {
    /// 32 bits
    pub ms: NodeId,
    /// 8 bits
    pub chan_ref: ChanRef,
    /// 8-bit length, then the octets of an embedded message
    pub payload: Vec<u8>,
}

impl L3Message for DtapDown {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Bssmap;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, BssmapMsgType::DtapDown)?;

        let ms = buffer.read_field(32, "ms")? as NodeId;
        let chan_ref = buffer.read_field(8, "chan_ref")? as ChanRef;
        let payload = counted::read_payload(buffer, "payload")?;

        Ok(DtapDown {
            ms,
            chan_ref,
            payload,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(BssmapMsgType::DtapDown.into_raw(), 8);
        buffer.write_bits(self.ms as u64, 32);
        buffer.write_bits(self.chan_ref as u64, 8);
        counted::write_payload(buffer, &self.payload, "payload")?;
        Ok(())
    }
}

impl fmt::Display for DtapDown {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DtapDown {{ ms: {} chan_ref: {} payload: {:02x?} }}",
            self.ms,
            self.chan_ref,
            self.payload,
        )
    }
}
