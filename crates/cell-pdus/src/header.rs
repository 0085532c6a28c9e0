use core::fmt;

use cell_core::{BitBuffer, MsgParseErr};

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;

/// Transaction identifier carried in the low nibble of the first octet.
/// The flag is 0 for messages sent by the side that allocated the value, 1 otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TiField {
    pub flag: bool,
    /// 3 bits
    pub value: u8,
}

impl TiField {
    pub const NONE: TiField = TiField { flag: false, value: 0 };

    /// TI for a message sent by the allocating side
    pub fn originator(value: u8) -> Self {
        TiField { flag: false, value: value & 0x07 }
    }

    /// TI for a message sent by the peer of the allocating side
    pub fn responder(value: u8) -> Self {
        TiField { flag: true, value: value & 0x07 }
    }

    /// Same transaction, opposite direction
    pub fn reply(self) -> Self {
        TiField { flag: !self.flag, value: self.value }
    }
}

impl fmt::Display for TiField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", if self.flag { "r" } else { "o" }, self.value)
    }
}

/// First octet of every message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L3Header {
    /// 4 bits
    pub pd: ProtocolDiscriminator,
    /// 4 bits, flag followed by a 3-bit value
    pub ti: TiField,
}

impl L3Header {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let raw_pd = buffer.read_field(4, "pd")?;
        let pd = ProtocolDiscriminator::try_from(raw_pd)
            .map_err(|_| MsgParseErr::InvalidProtocolDiscriminator { found: raw_pd })?;
        let flag = buffer.read_field(1, "ti_flag")? == 1;
        let value = buffer.read_field(3, "ti_value")? as u8;
        Ok(L3Header { pd, ti: TiField { flag, value } })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) {
        buffer.write_bits(self.pd.into_raw(), 4);
        buffer.write_bits(self.ti.flag as u64, 1);
        buffer.write_bits((self.ti.value & 0x07) as u64, 3);
    }
}

impl fmt::Display for L3Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ti={}", self.pd, self.ti)
    }
}

/// A message body following the header. `from_bitbuf` starts at the message type
/// octet and fails with InvalidMsgType if it belongs to another message.
pub trait L3Message: Sized + fmt::Debug + fmt::Display {
    const PD: ProtocolDiscriminator;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr>;

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr>;
}

/// Serializes header and message into a fresh octet vector
pub fn encode<M: L3Message>(ti: TiField, msg: &M) -> Result<Vec<u8>, MsgParseErr> {
    let mut buffer = BitBuffer::new_autoexpand(64);
    L3Header { pd: M::PD, ti }.to_bitbuf(&mut buffer);
    msg.to_bitbuf(&mut buffer)?;
    Ok(buffer.into_bytes())
}

/// Parses a complete message of type M. The whole input must be consumed.
pub fn decode<M: L3Message>(bytes: &[u8]) -> Result<(TiField, M), MsgParseErr> {
    let mut buffer = BitBuffer::from_bytes(bytes);
    let header = L3Header::from_bitbuf(&mut buffer)?;
    if header.pd != M::PD {
        return Err(MsgParseErr::InvalidProtocolDiscriminator { found: header.pd.into_raw() });
    }
    let msg = M::from_bitbuf(&mut buffer)?;
    let remaining = buffer.get_len_remaining();
    if remaining != 0 {
        return Err(MsgParseErr::TrailingData { remaining });
    }
    Ok((header.ti, msg))
}

/// Reads the header and the raw message type without parsing the body
pub fn peek(bytes: &[u8]) -> Result<(L3Header, u64), MsgParseErr> {
    let mut buffer = BitBuffer::from_bytes(bytes);
    let header = L3Header::from_bitbuf(&mut buffer)?;
    let msg_type = buffer.read_field(8, "msg_type")?;
    Ok((header, msg_type))
}

#[cfg(test)]
mod tests {
    use cell_core::debug;

    use super::*;
    use crate::mm::pdus::location_update_accept::LocationUpdateAccept;
    use crate::mm::pdus::location_update_reject::LocationUpdateReject;

    #[test]
    fn test_header_layout() {
        debug::setup_logging_verbose();
        let msg = LocationUpdateAccept { lac: 0x0102 };
        let bytes = encode(TiField::responder(5), &msg).unwrap();
        // pd=5, flag=1, value=5, type 0x02, lac
        assert_eq!(bytes, vec![0x5d, 0x02, 0x01, 0x02]);

        let (hdr, msg_type) = peek(&bytes).unwrap();
        assert_eq!(hdr.pd, ProtocolDiscriminator::Mm);
        assert_eq!(hdr.ti, TiField { flag: true, value: 5 });
        assert_eq!(msg_type, 0x02);

        let (ti, parsed) = decode::<LocationUpdateAccept>(&bytes).unwrap();
        assert_eq!(ti.reply(), TiField::originator(5));
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_decode_errors() {
        debug::setup_logging_verbose();
        // Unknown PD
        assert_eq!(
            decode::<LocationUpdateAccept>(&[0xf0, 0x02, 0x00, 0x01]),
            Err(MsgParseErr::InvalidProtocolDiscriminator { found: 0xf })
        );
        // Right PD, other message
        let bytes = encode(TiField::NONE, &LocationUpdateAccept { lac: 7 }).unwrap();
        assert!(matches!(
            decode::<LocationUpdateReject>(&bytes),
            Err(MsgParseErr::InvalidMsgType { .. })
        ));
        // Truncated body
        assert!(matches!(
            decode::<LocationUpdateAccept>(&bytes[..3]),
            Err(MsgParseErr::BufferEnded { .. })
        ));
        // Trailing octet
        let mut long = bytes.clone();
        long.push(0);
        assert_eq!(
            decode::<LocationUpdateAccept>(&long),
            Err(MsgParseErr::TrailingData { remaining: 8 })
        );
        // Empty input
        assert!(peek(&[]).is_err());
    }
}
