use core::fmt;

use cell_core::{BitBuffer, Imsi, MsgParseErr, NodeId};
use cell_core::expect_msg_type;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::fields::imsi;
use crate::header::L3Message;
use crate::map::enums::map_msg_type::MapMsgType;

/// Representation of the MAP CANCEL LOCATION message.
/// Sent by the HLR to the previous SC of a subscriber that moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelLocation {
    /// 56 bits, 6 spare + IMSI
    pub imsi: Imsi,
}

impl L3Message for CancelLocation {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Map;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, MapMsgType::CancelLocation)?;

        let imsi = imsi::read_imsi(buffer, "imsi")?;

        Ok(CancelLocation {
            imsi,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(MapMsgType::CancelLocation.into_raw(), 8);
        imsi::write_imsi(buffer, self.imsi, "imsi")?;
        Ok(())
    }
}

impl fmt::Display for CancelLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CancelLocation {{ imsi: {} }}",
            self.imsi,
        )
    }
}

/// Representation of the MAP PURGE MS message, sent when a subscriber detaches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeMs {
    /// 56 bits, 6 spare + IMSI
    pub imsi: Imsi,
    /// 32 bits
    pub sc: NodeId,
}

impl L3Message for PurgeMs {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Map;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, MapMsgType::PurgeMs)?;

        let imsi = imsi::read_imsi(buffer, "imsi")?;
        let sc = buffer.read_field(32, "sc")? as NodeId;

        Ok(PurgeMs {
            imsi,
            sc,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(MapMsgType::PurgeMs.into_raw(), 8);
        imsi::write_imsi(buffer, self.imsi, "imsi")?;
        buffer.write_bits(self.sc as u64, 32);
        Ok(())
    }
}

impl fmt::Display for PurgeMs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PurgeMs {{ imsi: {} sc: {} }}",
            self.imsi,
            self.sc,
        )
    }
}
