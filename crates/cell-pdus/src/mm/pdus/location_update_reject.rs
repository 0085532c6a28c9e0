use core::fmt;

use cell_core::{BitBuffer, MsgParseErr};
use cell_core::expect_msg_type;
use cell_core::let_enum_field;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::enums::cause::Cause;
use crate::header::L3Message;
use crate::mm::enums::mm_msg_type::MmMsgType;

/// Representation of the LOCATION UPDATING REJECT message.
/// Response to: LOCATION UPDATING REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationUpdateReject {
    /// 8 bits
    pub cause: Cause,
}

impl L3Message for LocationUpdateReject {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Mm;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, MmMsgType::LocationUpdateReject)?;

        let_enum_field!(buffer, cause, Cause, 8);

        Ok(LocationUpdateReject {
            cause,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(MmMsgType::LocationUpdateReject.into_raw(), 8);
        buffer.write_bits(self.cause.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for LocationUpdateReject {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LocationUpdateReject {{ cause: {} }}",
            self.cause,
        )
    }
}
