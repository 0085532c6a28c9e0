use std::fmt;

use crate::msg_parse_error::MsgParseErr;

/// Bit-addressed buffer used by the message codecs. Fields are written and
/// read most significant bit first. A buffer is either fixed-length (parsing)
/// or auto-expanding (building).
pub struct BitBuffer {
    buffer: Vec<u8>,
    /// Next bit offset for read/write
    pos: usize,
    /// Number of valid bits
    len: usize,
    autoexpand: bool,
}

impl BitBuffer {
    /// Create a zeroed buffer holding exactly `len_bits` bits.
    pub fn new(len_bits: usize) -> Self {
        BitBuffer {
            buffer: vec![0; len_bits.div_ceil(8)],
            pos: 0,
            len: len_bits,
            autoexpand: false,
        }
    }

    /// Create an empty buffer that grows as it is written to
    pub fn new_autoexpand(initial_capacity_bits: usize) -> Self {
        BitBuffer {
            buffer: Vec::with_capacity(initial_capacity_bits.div_ceil(8)),
            pos: 0,
            len: 0,
            autoexpand: true,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        BitBuffer {
            buffer: data.to_vec(),
            pos: 0,
            len: data.len() * 8,
            autoexpand: false,
        }
    }

    /// Builds a buffer from a string of '0' and '1' characters. Other characters are skipped,
    /// so test vectors may be grouped with spaces.
    pub fn from_bitstr(bitstr: &str) -> Self {
        let mut buf = BitBuffer::new_autoexpand(bitstr.len());
        for c in bitstr.chars() {
            match c {
                '0' => buf.write_bit(0),
                '1' => buf.write_bit(1),
                _ => {}
            }
        }
        buf.autoexpand = false;
        buf.seek(0);
        buf
    }

    pub fn to_bitstr(&self) -> String {
        (0..self.len).map(|i| if self.bit_at(i) == 1 { '1' } else { '0' }).collect()
    }

    fn bit_at(&self, idx: usize) -> u8 {
        (self.buffer[idx / 8] >> (7 - (idx % 8))) & 1
    }

    pub fn peek_bits(&self, num_bits: usize) -> Option<u64> {
        if num_bits > 64 || self.pos + num_bits > self.len {
            return None;
        }
        let mut value = 0u64;
        for i in 0..num_bits {
            value = (value << 1) | self.bit_at(self.pos + i) as u64;
        }
        Some(value)
    }

    pub fn read_bits(&mut self, num_bits: usize) -> Option<u64> {
        let value = self.peek_bits(num_bits)?;
        self.pos += num_bits;
        Some(value)
    }

    /// Reads a field, turning a short buffer into MsgParseErr::BufferEnded
    pub fn read_field(&mut self, num_bits: usize, field: &'static str) -> Result<u64, MsgParseErr> {
        self.read_bits(num_bits).ok_or(MsgParseErr::BufferEnded { field: Some(field) })
    }

    /// Reads `num_bytes` whole octets
    pub fn read_octets(&mut self, num_bytes: usize, field: &'static str) -> Result<Vec<u8>, MsgParseErr> {
        if self.get_len_remaining() < num_bytes * 8 {
            return Err(MsgParseErr::BufferEnded { field: Some(field) });
        }
        let mut out = Vec::with_capacity(num_bytes);
        for _ in 0..num_bytes {
            out.push(self.read_field(8, field)? as u8);
        }
        Ok(out)
    }

    pub fn write_bit(&mut self, value: u8) {
        if self.pos >= self.len {
            assert!(self.autoexpand, "write beyond end of fixed-length BitBuffer");
            self.len = self.pos + 1;
        }
        let byte_idx = self.pos / 8;
        if byte_idx >= self.buffer.len() {
            self.buffer.resize(byte_idx + 1, 0);
        }
        let mask = 1u8 << (7 - (self.pos % 8));
        if value & 1 == 1 {
            self.buffer[byte_idx] |= mask;
        } else {
            self.buffer[byte_idx] &= !mask;
        }
        self.pos += 1;
    }

    /// Writes the lowest `num_bits` bits of value, msb first
    pub fn write_bits(&mut self, value: u64, num_bits: usize) {
        assert!(num_bits <= 64);
        for i in (0..num_bits).rev() {
            self.write_bit(((value >> i) & 1) as u8);
        }
    }

    pub fn write_octets(&mut self, data: &[u8]) {
        for b in data {
            self.write_bits(*b as u64, 8);
        }
    }

    /// Returns the written bytes. Trailing bits of a partial octet are zero.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.buffer.truncate(self.len.div_ceil(8));
        self.buffer
    }

    pub fn get_len(&self) -> usize {
        self.len
    }

    pub fn get_len_remaining(&self) -> usize {
        self.len - self.pos
    }

    pub fn get_pos(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, offset: usize) {
        assert!(offset <= self.len, "seek beyond end of BitBuffer");
        self.pos = offset;
    }

    pub fn dump_hex(&self) -> String {
        let bytes = &self.buffer[..self.len.div_ceil(8)];
        bytes.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(" ")
    }

    /// Binary dump with a marker at the current position
    pub fn dump_bin(&self) -> String {
        let mut s = String::with_capacity(self.len + self.len / 8 + 2);
        for i in 0..self.len {
            if i == self.pos {
                s.push('|');
            } else if i > 0 && i % 8 == 0 {
                s.push(' ');
            }
            s.push(if self.bit_at(i) == 1 { '1' } else { '0' });
        }
        if self.pos == self.len {
            s.push('|');
        }
        s
    }
}

impl fmt::Debug for BitBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitBuffer {{ len: {} pos: {} data: {} }}", self.len, self.pos, self.dump_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_unaligned() {
        let mut buf = BitBuffer::new_autoexpand(16);
        buf.write_bits(0b0110, 4);
        buf.write_bits(0b1001, 4);
        buf.write_bits(0xab, 8);
        buf.write_bits(0b101, 3);
        assert_eq!(buf.get_len(), 19);
        assert_eq!(buf.to_bitstr(), "0110100110101011101");

        buf.seek(0);
        assert_eq!(buf.read_bits(4), Some(0b0110));
        assert_eq!(buf.peek_bits(4), Some(0b1001));
        assert_eq!(buf.read_field(12, "x"), Ok(0b1001_1010_1011));
        assert_eq!(buf.read_field(4, "y"), Err(MsgParseErr::BufferEnded { field: Some("y") }));
        assert_eq!(buf.get_len_remaining(), 3);

        let bytes = buf.into_bytes();
        assert_eq!(bytes, vec![0x69, 0xab, 0xa0]);
    }

    #[test]
    fn test_from_bitstr_skips_separators() {
        let mut buf = BitBuffer::from_bitstr("0000 0001 1111 1111");
        assert_eq!(buf.read_octets(2, "data"), Ok(vec![0x01, 0xff]));
        assert_eq!(buf.get_len_remaining(), 0);
    }
}
