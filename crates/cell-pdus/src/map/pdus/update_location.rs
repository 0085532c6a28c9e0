use core::fmt;

use cell_core::{BitBuffer, Imsi, MsgParseErr, NodeId};
use cell_core::expect_msg_type;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::fields::imsi;
use crate::header::L3Message;
use crate::map::enums::map_msg_type::MapMsgType;

/// Representation of the MAP UPDATE LOCATION message.
/// Response expected: UPDATE LOCATION ACK
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateLocation {
    /// 56 bits, 6 spare + IMSI
    pub imsi: Imsi,
    /// 32 bits. SC now serving the subscriber
    pub sc: NodeId,
}

impl L3Message for UpdateLocation {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Map;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, MapMsgType::UpdateLocation)?;

        let imsi = imsi::read_imsi(buffer, "imsi")?;
        let sc = buffer.read_field(32, "sc")? as NodeId;

        Ok(UpdateLocation {
            imsi,
            sc,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(MapMsgType::UpdateLocation.into_raw(), 8);
        imsi::write_imsi(buffer, self.imsi, "imsi")?;
        buffer.write_bits(self.sc as u64, 32);
        Ok(())
    }
}

impl fmt::Display for UpdateLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "UpdateLocation {{ imsi: {} sc: {} }}",
            self.imsi,
            self.sc,
        )
    }
}

/// Representation of the MAP UPDATE LOCATION ACK message.
/// Response to: UPDATE LOCATION
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateLocationAck {
    /// 56 bits, 6 spare + IMSI
    pub imsi: Imsi,
}

impl L3Message for UpdateLocationAck {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Map;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, MapMsgType::UpdateLocationAck)?;

        let imsi = imsi::read_imsi(buffer, "imsi")?;

        Ok(UpdateLocationAck {
            imsi,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(MapMsgType::UpdateLocationAck.into_raw(), 8);
        imsi::write_imsi(buffer, self.imsi, "imsi")?;
        Ok(())
    }
}

impl fmt::Display for UpdateLocationAck {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "UpdateLocationAck {{ imsi: {} }}",
            self.imsi,
        )
    }
}
