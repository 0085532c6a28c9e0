use core::fmt;

use cell_core::{BitBuffer, MsgParseErr};
use cell_core::expect_msg_type;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::header::L3Message;
use crate::cc::enums::cc_msg_type::CcMsgType;

/// Representation of the CALL PROCEEDING message.
/// Response to: SETUP (MO)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallProceeding;

impl L3Message for CallProceeding {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Cc;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, CcMsgType::CallProceeding)?;

        Ok(CallProceeding)
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(CcMsgType::CallProceeding.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for CallProceeding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CallProceeding")
    }
}

/// Representation of the CALL CONFIRMED message.
/// Response to: SETUP (MT)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallConfirmed;

impl L3Message for CallConfirmed {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Cc;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, CcMsgType::CallConfirmed)?;

        Ok(CallConfirmed)
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(CcMsgType::CallConfirmed.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for CallConfirmed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CallConfirmed")
    }
}

/// Representation of the ALERTING message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alerting;

impl L3Message for Alerting {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Cc;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, CcMsgType::Alerting)?;

        Ok(Alerting)
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(CcMsgType::Alerting.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for Alerting {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Alerting")
    }
}

/// Representation of the CONNECT message.
/// Response expected: CONNECT ACKNOWLEDGE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connect;

impl L3Message for Connect {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Cc;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, CcMsgType::Connect)?;

        Ok(Connect)
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(CcMsgType::Connect.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for Connect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Connect")
    }
}

/// Representation of the CONNECT ACKNOWLEDGE message.
/// Response to: CONNECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectAck;

impl L3Message for ConnectAck {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Cc;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, CcMsgType::ConnectAck)?;

        Ok(ConnectAck)
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(CcMsgType::ConnectAck.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for ConnectAck {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ConnectAck")
    }
}
