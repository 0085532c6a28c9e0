use core::fmt;

use cell_core::{BitBuffer, CellId, MsgParseErr};
use cell_core::expect_msg_type;

use crate::common::enums::protocol_discriminator::ProtocolDiscriminator;
use crate::header::L3Message;
use crate::rr::enums::rr_msg_type::RrMsgType;

/// Representation of the MEASUREMENT REPORT message.
/// Received signal quality of the serving cell and the best neighbour, in abstract units where higher is better.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementReport {
    /// 16 bits
    pub serving_cell: CellId,
    /// 8 bits
    pub serving_quality: u8,
    /// 16 bits
    pub neighbour_cell: CellId,
    /// 8 bits
    pub neighbour_quality: u8,
}

impl L3Message for MeasurementReport {
    const PD: ProtocolDiscriminator = ProtocolDiscriminator::Rr;

    fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let msg_type = buffer.read_field(8, "msg_type")?;
        expect_msg_type!(msg_type, RrMsgType::MeasurementReport)?;

        let serving_cell = buffer.read_field(16, "serving_cell")? as CellId;
        let serving_quality = buffer.read_field(8, "serving_quality")? as u8;
        let neighbour_cell = buffer.read_field(16, "neighbour_cell")? as CellId;
        let neighbour_quality = buffer.read_field(8, "neighbour_quality")? as u8;

        Ok(MeasurementReport {
            serving_cell,
            serving_quality,
            neighbour_cell,
            neighbour_quality,
        })
    }

    fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(RrMsgType::MeasurementReport.into_raw(), 8);
        buffer.write_bits(self.serving_cell as u64, 16);
        buffer.write_bits(self.serving_quality as u64, 8);
        buffer.write_bits(self.neighbour_cell as u64, 16);
        buffer.write_bits(self.neighbour_quality as u64, 8);
        Ok(())
    }
}

impl fmt::Display for MeasurementReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MeasurementReport {{ serving_cell: {} serving_quality: {} neighbour_cell: {} neighbour_quality: {} }}",
            self.serving_cell,
            self.serving_quality,
            self.neighbour_cell,
            self.neighbour_quality,
        )
    }
}
