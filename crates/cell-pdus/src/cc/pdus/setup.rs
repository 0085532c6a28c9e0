use core::fmt;

use cell_core::{BitBuffer, Imsi, MsgParseErr, ResourceKind};
use cell_core::expect_msg_type;
use cell_core::let_enum_field;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::common::fields::imsi;
use crate::header::L3Message;
use crate::cc::enums::cc_msg_type::CcMsgType;

/// Representation of the SETUP message.
/// From the MS the party is the called subscriber, towards the MS it is the calling one.
/// Response expected: CALL PROCEEDING (MO)/CALL CONFIRMED (MT)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setup {
    /// 56 bits, 6 spare + IMSI
    pub party: Imsi,
    /// 8 bits
    pub kind: ResourceKind,
    /// 32 bits
    pub bandwidth_kbps: u32,
}

impl L3Message for Setup {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Cc;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, CcMsgType::Setup)?;

        let party = imsi::read_imsi(buffer, "party")?;
        let_enum_field!(buffer, kind, ResourceKind, 8);
        let bandwidth_kbps = buffer.read_field(32, "bandwidth_kbps")? as u32;

        Ok(Setup {
            party,
            kind,
            bandwidth_kbps,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(CcMsgType::Setup.into_raw(), 8);
        imsi::write_imsi(buffer, self.party, "party")?;
        buffer.write_bits(self.kind.into_raw(), 8);
        buffer.write_bits(self.bandwidth_kbps as u64, 32);
        Ok(())
    }
}

impl fmt::Display for Setup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Setup {{ party: {} kind: {} bandwidth_kbps: {} }}",
            self.party,
            self.kind,
            self.bandwidth_kbps,
        )
    }
}
