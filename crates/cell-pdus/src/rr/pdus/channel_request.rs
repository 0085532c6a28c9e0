use core::fmt;

use cell_core::{BitBuffer, CellId, ChanRef, MsgParseErr, ResourceKind};
use cell_core::expect_msg_type;
use cell_core::let_enum_field;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::rr::enums::establishment_cause::EstablishmentCause;
use crate::header::L3Message;
use crate::rr::enums::rr_msg_type::RrMsgType;

/// Representation of the CHANNEL REQUEST message.
/// The MS asks the BS for dedicated channels for one application.
/// Response expected: IMMEDIATE ASSIGNMENT/IMMEDIATE ASSIGNMENT REJECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRequest {
    /// 8 bits. Chosen by the MS, unique among its active applications
    pub chan_ref: ChanRef,
    /// 16 bits. Cell the MS is camped on
    pub cell: CellId,
    /// 8 bits
    pub est_cause: EstablishmentCause,
    /// 8 bits
    pub kind: ResourceKind,
    /// 8 bits. Number of channels requested
    pub count: u8,
    /// 32 bits. Requested aggregate bandwidth
    pub bandwidth_kbps: u32,
}

impl L3Message for ChannelRequest {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Rr;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, RrMsgType::ChannelRequest)?;

        let chan_ref = buffer.read_field(8, "chan_ref")? as ChanRef;
        let cell = buffer.read_field(16, "cell")? as CellId;
        let_enum_field!(buffer, est_cause, EstablishmentCause, 8);
        let_enum_field!(buffer, kind, ResourceKind, 8);
        let count = buffer.read_field(8, "count")? as u8;
        let bandwidth_kbps = buffer.read_field(32, "bandwidth_kbps")? as u32;

        Ok(ChannelRequest {
            chan_ref,
            cell,
            est_cause,
            kind,
            count,
            bandwidth_kbps,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(RrMsgType::ChannelRequest.into_raw(), 8);
        buffer.write_bits(self.chan_ref as u64, 8);
        buffer.write_bits(self.cell as u64, 16);
        buffer.write_bits(self.est_cause.into_raw(), 8);
        buffer.write_bits(self.kind.into_raw(), 8);
        buffer.write_bits(self.count as u64, 8);
        buffer.write_bits(self.bandwidth_kbps as u64, 32);
        Ok(())
    }
}

impl fmt::Display for ChannelRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ChannelRequest {{ chan_ref: {} cell: {} est_cause: {} kind: {} count: {} bandwidth_kbps: {} }}",
            self.chan_ref,
            self.cell,
            self.est_cause,
            self.kind,
            self.count,
            self.bandwidth_kbps,
        )
    }
}

#[cfg(test)]
mod tests {
    use cell_core::debug;

    use super::*;

    #[test]
    fn test_channel_request() {
        debug::setup_logging_verbose();
        let test_vec = "00111011 00000011 0000000001100100 00000001 00000001 00000010 00000000000000000000000000100000";
        let mut buf_in = BitBuffer::from_bitstr(test_vec);
        let msg = ChannelRequest::from_bitbuf(&mut buf_in).expect("Failed parsing");

        tracing::info!("Parsed: {}", msg);
        assert!(buf_in.get_len_remaining() == 0, "Buffer not fully consumed");
        assert_eq!(msg.chan_ref, 3);
        assert_eq!(msg.cell, 100);
        assert_eq!(msg.est_cause, EstablishmentCause::MoCall);
        assert_eq!(msg.kind, ResourceKind::Voice);
        assert_eq!(msg.count, 2);
        assert_eq!(msg.bandwidth_kbps, 32);

        let mut buf_out = BitBuffer::new_autoexpand(64);
        msg.to_bitbuf(&mut buf_out).unwrap();
        assert_eq!(buf_out.to_bitstr(), test_vec.replace(' ', ""));
    }

    #[test]
    fn test_channel_request_bad_cause() {
        debug::setup_logging_verbose();
        let test_vec = "00111011 00000011 0000000001100100 00001001 00000001 00000010 00000000000000000000000000100000";
        let mut buf_in = BitBuffer::from_bitstr(test_vec);
        assert_eq!(
            ChannelRequest::from_bitbuf(&mut buf_in),
            Err(MsgParseErr::InvalidValue { field: "est_cause", value: 9 })
        );
    }
}
