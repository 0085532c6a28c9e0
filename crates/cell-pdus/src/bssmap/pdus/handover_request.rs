use core::fmt;

use cell_core::{BitBuffer, CellId, MsgParseErr, NodeId};
use cell_core::expect_msg_type;
use cell_core::let_enum_field;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::enums::cause::Cause;
use crate::common::fields::channel_assignment::{self, ChannelAssignment};
use crate::common::fields::ho_app::{self, HoAppRequirement};
use crate::header::L3Message;
use crate::bssmap::enums::bssmap_msg_type::BssmapMsgType;

/// Representation of the HANDOVER REQUEST message.
/// Asks the target BS to reserve channels for every application of the MS.
/// Response expected: HANDOVER REQUEST ACKNOWLEDGE/HANDOVER FAILURE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoverRequest {
    /// 8 bits
    pub ho_ref: u8,
    /// 32 bits
    pub ms: NodeId,
    /// 16 bits
    pub target_cell: CellId,
    /// 8-bit count, then one requirement per application
    pub apps: Vec<HoAppRequirement>,
}

impl L3Message for HandoverRequest {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Bssmap;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, BssmapMsgType::HandoverRequest)?;

        let ho_ref = buffer.read_field(8, "ho_ref")? as u8;
        let ms = buffer.read_field(32, "ms")? as NodeId;
        let target_cell = buffer.read_field(16, "target_cell")? as CellId;
        let apps = ho_app::read_requirements(buffer)?;

        Ok(HandoverRequest {
            ho_ref,
            ms,
            target_cell,
            apps,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(BssmapMsgType::HandoverRequest.into_raw(), 8);
        buffer.write_bits(self.ho_ref as u64, 8);
        buffer.write_bits(self.ms as u64, 32);
        buffer.write_bits(self.target_cell as u64, 16);
        ho_app::write_requirements(buffer, &self.apps)?;
        Ok(())
    }
}

impl fmt::Display for HandoverRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HandoverRequest {{ ho_ref: {} ms: {} target_cell: {} apps: {:?} }}",
            self.ho_ref,
            self.ms,
            self.target_cell,
            self.apps,
        )
    }
}

/// Representation of the HANDOVER REQUEST ACKNOWLEDGE message.
/// Response to: HANDOVER REQUEST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoverRequestAck {
    /// 8 bits
    pub ho_ref: u8,
    /// 8-bit count, then one assignment per application
    pub assignments: Vec<ChannelAssignment>,
}

impl L3Message for HandoverRequestAck {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Bssmap;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, BssmapMsgType::HandoverRequestAck)?;

        let ho_ref = buffer.read_field(8, "ho_ref")? as u8;
        let assignments = channel_assignment::read_assignments(buffer)?;

        Ok(HandoverRequestAck {
            ho_ref,
            assignments,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(BssmapMsgType::HandoverRequestAck.into_raw(), 8);
        buffer.write_bits(self.ho_ref as u64, 8);
        channel_assignment::write_assignments(buffer, &self.assignments)?;
        Ok(())
    }
}

impl fmt::Display for HandoverRequestAck {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HandoverRequestAck {{ ho_ref: {} assignments: {:?} }}",
            self.ho_ref,
            self.assignments,
        )
    }
}

/// Representation of the BSSMAP HANDOVER FAILURE message.
/// Sent by the target when it cannot reserve, or by the source when the MS reports failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BssHandoverFailure {
    /// 8 bits
    pub ho_ref: u8,
    /// 32 bits
    pub ms: NodeId,
    /// 8 bits
    pub cause: Cause,
}

impl L3Message for BssHandoverFailure {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Bssmap;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, BssmapMsgType::HandoverFailure)?;

        let ho_ref = buffer.read_field(8, "ho_ref")? as u8;
        let ms = buffer.read_field(32, "ms")? as NodeId;
        let_enum_field!(buffer, cause, Cause, 8);

        Ok(BssHandoverFailure {
            ho_ref,
            ms,
            cause,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(BssmapMsgType::HandoverFailure.into_raw(), 8);
        buffer.write_bits(self.ho_ref as u64, 8);
        buffer.write_bits(self.ms as u64, 32);
        buffer.write_bits(self.cause.into_raw(), 8);
        Ok(())
    }
}

impl fmt::Display for BssHandoverFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BssHandoverFailure {{ ho_ref: {} ms: {} cause: {} }}",
            self.ho_ref,
            self.ms,
            self.cause,
        )
    }
}

#[cfg(test)]
mod tests {
    use cell_core::{ResourceKind, debug};

    use super::*;
    use crate::header::{TiField, decode, encode};

    #[test]
    fn test_handover_request_ack() {
        debug::setup_logging_verbose();
        let msg = HandoverRequestAck {
            ho_ref: 9,
            assignments: vec![
                ChannelAssignment { chan_ref: 0, channels: vec![4, 5] },
                ChannelAssignment { chan_ref: 1, channels: vec![7] },
            ],
        };
        let bytes = encode(TiField::NONE, &msg).unwrap();
        assert_eq!(bytes.len(), 14);
        let (_, parsed) = decode::<HandoverRequestAck>(&bytes).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_handover_request() {
        debug::setup_logging_verbose();
        let msg = HandoverRequest {
            ho_ref: 1,
            ms: 100,
            target_cell: 2,
            apps: vec![HoAppRequirement { chan_ref: 0, kind: ResourceKind::Voice, count: 1 }],
        };
        let bytes = encode(TiField::NONE, &msg).unwrap();
        let (_, parsed) = decode::<HandoverRequest>(&bytes).unwrap();
        tracing::info!("Parsed: {}", parsed);
        assert_eq!(parsed, msg);

        // Group count larger than the content
        let mut short = bytes.clone();
        short[9] = 2;
        assert!(matches!(decode::<HandoverRequest>(&short), Err(MsgParseErr::BufferEnded { .. })));
    }
}
