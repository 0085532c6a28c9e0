use core::fmt;

use cell_core::{BitBuffer, MsgParseErr};
use cell_core::expect_msg_type;
use cell_core::let_enum_field;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::enums::cause::Cause;
use crate::header::L3Message;
use crate::cc::enums::cc_msg_type::CcMsgType;

/// Representation of the DISCONNECT message.
/// Response expected: RELEASE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnect {
    /// 8 bits
    pub cause: Cause,
}

impl L3Message for Disconnect {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Cc;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, CcMsgType::Disconnect)?;

        let_enum_field!(buffer, cause, Cause, 8);

        Ok(Disconnect {
            cause,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(CcMsgType::Disconnect.into_raw(), 8);
        buffer.write_bits(self.cause.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for Disconnect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Disconnect {{ cause: {} }}",
            self.cause,
        )
    }
}

/// Representation of the RELEASE message.
/// Response expected: RELEASE COMPLETE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// 8 bits
    pub cause: Cause,
}

impl L3Message for Release {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Cc;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, CcMsgType::Release)?;

        let_enum_field!(buffer, cause, Cause, 8);

        Ok(Release {
            cause,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(CcMsgType::Release.into_raw(), 8);
        buffer.write_bits(self.cause.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Release {{ cause: {} }}",
            self.cause,
        )
    }
}

/// Representation of the RELEASE COMPLETE message.
/// Response to: RELEASE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseComplete {
    /// 8 bits
    pub cause: Cause,
}

impl L3Message for ReleaseComplete {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Cc;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, CcMsgType::ReleaseComplete)?;

        let_enum_field!(buffer, cause, Cause, 8);

        Ok(ReleaseComplete {
            cause,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(CcMsgType::ReleaseComplete.into_raw(), 8);
        buffer.write_bits(self.cause.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for ReleaseComplete {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ReleaseComplete {{ cause: {} }}",
            self.cause,
        )
    }
}
