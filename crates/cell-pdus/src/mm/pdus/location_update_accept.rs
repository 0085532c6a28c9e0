use core::fmt;

use cell_core::{BitBuffer, Lac, MsgParseErr};
use cell_core::expect_msg_type;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::header::L3Message;
use crate::mm::enums::mm_msg_type::MmMsgType;

/// Representation of the LOCATION UPDATING ACCEPT message.
/// Response to: LOCATION UPDATING REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationUpdateAccept {
    /// 16 bits
    pub lac: Lac,
}

impl L3Message for LocationUpdateAccept {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Mm;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, MmMsgType::LocationUpdateAccept)?;

        let lac = buffer.read_field(16, "lac")? as Lac;

        Ok(LocationUpdateAccept {
            lac,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(MmMsgType::LocationUpdateAccept.into_raw(), 8);
        buffer.write_bits(self.lac as u64, 16);
        Ok(())
    }
}

impl fmt::Display for LocationUpdateAccept {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LocationUpdateAccept {{ lac: {} }}",
            self.lac,
        )
    }
}
