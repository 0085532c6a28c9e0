//! Variable-length groups. Channel lists carry a one-octet count followed by
//! 16-bit indices, payloads a one-octet length followed by the octets.

use cell_core::{BitBuffer, MsgParseErr};

pub const MAX_COUNT: usize = 255;

pub fn read_channel_list(buffer: &mut BitBuffer, field: &'static str) -> Result<Vec<u16>, MsgParseErr> {
    let count = buffer.read_field(8, field)? as usize;
    if buffer.get_len_remaining() < count * 16 {
        return Err(MsgParseErr::InconsistentLength {
            expected: count * 16,
            found: buffer.get_len_remaining(),
        });
    }
    let mut channels = Vec::with_capacity(count);
    for _ in 0..count {
        channels.push(buffer.read_field(16, field)? as u16);
    }
    Ok(channels)
}

pub fn write_channel_list(buffer: &mut BitBuffer, channels: &[u16], field: &'static str) -> Result<(), MsgParseErr> {
    if channels.len() > MAX_COUNT {
        return Err(MsgParseErr::FieldTooLong { field, len: channels.len() });
    }
    buffer.write_bits(channels.len() as u64, 8);
    for ch in channels {
        buffer.write_bits(*ch as u64, 16);
    }
    Ok(())
}

pub fn read_payload(buffer: &mut BitBuffer, field: &'static str) -> Result<Vec<u8>, MsgParseErr> {
    let len = buffer.read_field(8, field)? as usize;
    if buffer.get_len_remaining() < len * 8 {
        return Err(MsgParseErr::InconsistentLength {
            expected: len * 8,
            found: buffer.get_len_remaining(),
        });
    }
    buffer.read_octets(len, field)
}

pub fn write_payload(buffer: &mut BitBuffer, payload: &[u8], field: &'static str) -> Result<(), MsgParseErr> {
    if payload.len() > MAX_COUNT {
        return Err(MsgParseErr::FieldTooLong { field, len: payload.len() });
    }
    buffer.write_bits(payload.len() as u64, 8);
    buffer.write_octets(payload);
    Ok(())
}

/// Reads the one-octet count of a group of structured elements
pub fn read_group_count(buffer: &mut BitBuffer, field: &'static str) -> Result<usize, MsgParseErr> {
    Ok(buffer.read_field(8, field)? as usize)
}

pub fn write_group_count(buffer: &mut BitBuffer, count: usize, field: &'static str) -> Result<(), MsgParseErr> {
    if count > MAX_COUNT {
        return Err(MsgParseErr::FieldTooLong { field, len: count });
    }
    buffer.write_bits(count as u64, 8);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_list() {
        let mut buf = BitBuffer::new_autoexpand(32);
        write_channel_list(&mut buf, &[3, 0x0102], "channels").unwrap();
        assert_eq!(buf.to_bitstr(), "00000010 0000000000000011 0000000100000010".replace(' ', ""));
        buf.seek(0);
        assert_eq!(read_channel_list(&mut buf, "channels").unwrap(), vec![3, 0x0102]);
    }

    #[test]
    fn test_payload_length_mismatch() {
        // Claims 4 octets, carries 2
        let mut buf = BitBuffer::from_bytes(&[4, 0xaa, 0xbb]);
        assert_eq!(
            read_payload(&mut buf, "payload"),
            Err(MsgParseErr::InconsistentLength { expected: 32, found: 16 })
        );
    }

    #[test]
    fn test_payload_too_long() {
        let mut buf = BitBuffer::new_autoexpand(8);
        let big = vec![0u8; 256];
        assert_eq!(
            write_payload(&mut buf, &big, "payload"),
            Err(MsgParseErr::FieldTooLong { field: "payload", len: 256 })
        );
    }
}
