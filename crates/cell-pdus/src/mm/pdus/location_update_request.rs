use core::fmt;

use cell_core::{BitBuffer, Imsi, Lac, MsgParseErr};
use cell_core::expect_msg_type;
use cell_core::let_enum_field;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::mm::enums::update_type::UpdateType;
use crate::common::fields::imsi;
use crate::header::L3Message;
use crate::mm::enums::mm_msg_type::MmMsgType;

/// Representation of the LOCATION UPDATING REQUEST message.
/// Response expected: LOCATION UPDATING ACCEPT/LOCATION UPDATING REJECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationUpdateRequest {
    /// 8 bits
    pub update_type: UpdateType,
    /// 56 bits, 6 spare + IMSI
    pub imsi: Imsi,
    /// 16 bits. Last registered location area, 0 if none
    pub old_lac: Lac,
}

impl L3Message for LocationUpdateRequest {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Mm;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, MmMsgType::LocationUpdateRequest)?;

        let_enum_field!(buffer, update_type, UpdateType, 8);
        let imsi = imsi::read_imsi(buffer, "imsi")?;
        let old_lac = buffer.read_field(16, "old_lac")? as Lac;

        Ok(LocationUpdateRequest {
            update_type,
            imsi,
            old_lac,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(MmMsgType::LocationUpdateRequest.into_raw(), 8);
        buffer.write_bits(self.update_type.into_raw(), 8);
        imsi::write_imsi(buffer, self.imsi, "imsi")?;
        buffer.write_bits(self.old_lac as u64, 16);
        Ok(())
    }
}

impl fmt::Display for LocationUpdateRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LocationUpdateRequest {{ update_type: {} imsi: {} old_lac: {} }}",
            self.update_type,
            self.imsi,
            self.old_lac,
        )
    }
}

#[cfg(test)]
mod tests {
    use cell_core::debug;

    use super::*;
    use crate::header::{TiField, decode, encode};

    #[test]
    fn test_location_update_request() {
        debug::setup_logging_verbose();
        let msg = LocationUpdateRequest { update_type: UpdateType::Periodic, imsi: 262011234567890, old_lac: 17 };
        let bytes = encode(TiField::NONE, &msg).unwrap();
        // header, type, update type, 7 octets IMSI, lac
        assert_eq!(bytes.len(), 12);
        let (_, parsed) = decode::<LocationUpdateRequest>(&bytes).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_imsi_out_of_range() {
        debug::setup_logging_verbose();
        let msg = LocationUpdateRequest { update_type: UpdateType::Normal, imsi: 1 << 50, old_lac: 0 };
        assert_eq!(
            encode(TiField::NONE, &msg),
            Err(MsgParseErr::InvalidValue { field: "imsi", value: 1 << 50 })
        );
    }
}
