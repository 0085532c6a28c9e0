use cell_core::{BitBuffer, Imsi, MsgParseErr, IMSI_BITS, imsi_is_valid};

/// IMSI field: 6 spare bits followed by the 50-bit identity, 7 octets in total
pub const IMSI_FIELD_BITS: usize = 56;

pub fn read_imsi(buffer: &mut BitBuffer, field: &'static str) -> Result<Imsi, MsgParseErr> {
    let spare = buffer.read_field(IMSI_FIELD_BITS - IMSI_BITS, field)?;
    if spare != 0 {
        return Err(MsgParseErr::InvalidValue { field, value: spare });
    }
    buffer.read_field(IMSI_BITS, field)
}

pub fn write_imsi(buffer: &mut BitBuffer, imsi: Imsi, field: &'static str) -> Result<(), MsgParseErr> {
    if !imsi_is_valid(imsi) {
        return Err(MsgParseErr::InvalidValue { field, value: imsi });
    }
    buffer.write_bits(0, IMSI_FIELD_BITS - IMSI_BITS);
    buffer.write_bits(imsi, IMSI_BITS);
    Ok(())
}
