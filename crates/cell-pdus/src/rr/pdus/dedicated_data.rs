use core::fmt;

use cell_core::{BitBuffer, ChanRef, MsgParseErr};
use cell_core::expect_msg_type;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::fields::counted;
use crate::header::L3Message;
use crate::rr::enums::rr_msg_type::RrMsgType;

/// Carries an MM, CC or SM message from the MS on the channels of one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UplinkData {
    /// 8 bits
    pub chan_ref: ChanRef,
    /// 8-bit length, then the octets of an embedded message
    pub payload: Vec<u8>,
}

impl L3Message for UplinkData {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Rr;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, RrMsgType::UplinkData)?;

        let chan_ref = buffer.read_field(8, "chan_ref")? as ChanRef;
        let payload = counted::read_payload(buffer, "payload")?;

        Ok(UplinkData {
            chan_ref,
            payload,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(RrMsgType::UplinkData.into_raw(), 8);
        buffer.write_bits(self.chan_ref as u64, 8);
        counted::write_payload(buffer, &self.payload, "payload")?;
        Ok(())
    }
}

impl fmt::Display for UplinkData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "UplinkData {{ chan_ref: {} payload: {:02x?} }}",
            self.chan_ref,
            self.payload,
        )
    }
}

/// Carries an MM, CC or SM message to the MS on the channels of one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownlinkData {
    /// 8 bits
    pub chan_ref: ChanRef,
    /// 8-bit length, then the octets of an embedded message
    pub payload: Vec<u8>,
}

impl L3Message for DownlinkData {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Rr;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, RrMsgType::DownlinkData)?;

        let chan_ref = buffer.read_field(8, "chan_ref")? as ChanRef;
        let payload = counted::read_payload(buffer, "payload")?;

        Ok(DownlinkData {
            chan_ref,
            payload,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(RrMsgType::DownlinkData.into_raw(), 8);
        buffer.write_bits(self.chan_ref as u64, 8);
        counted::write_payload(buffer, &self.payload, "payload")?;
        Ok(())
    }
}

impl fmt::Display for DownlinkData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DownlinkData {{ chan_ref: {} payload: {:02x?} }}",
            self.chan_ref,
            self.payload,
        )
    }
}

#[cfg(test)]
mod tests {
    use cell_core::{ResourceKind, debug};

    use super::*;
    use crate::cc::pdus::setup::Setup;
    use crate::header::{TiField, decode, encode};

    #[test]
    fn test_uplink_data_carries_setup() {
        debug::setup_logging_verbose();
        let setup = Setup { party: 1001, kind: ResourceKind::Voice, bandwidth_kbps: 16 };
        let inner = encode(TiField::originator(2), &setup).unwrap();
        let outer = encode(TiField::NONE, &UplinkData { chan_ref: 2, payload: inner.clone() }).unwrap();
        assert_eq!(outer.len(), 1 + 1 + 1 + 1 + inner.len());

        let (_, data) = decode::<UplinkData>(&outer).unwrap();
        tracing::info!("Parsed: {}", data);
        assert_eq!(data.chan_ref, 2);
        let (ti, parsed) = decode::<Setup>(&data.payload).unwrap();
        assert_eq!(ti, TiField::originator(2));
        assert_eq!(parsed, setup);
    }
}
