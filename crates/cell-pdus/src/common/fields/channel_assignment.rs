use core::fmt;

use cell_core::{BitBuffer, ChanRef, MsgParseErr};

use super::counted;

/// Channels assigned to one application of an MS, identified by its channel reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelAssignment {
    /// 8 bits
    pub chan_ref: ChanRef,
    /// Counted list of 16-bit channel indices
    pub channels: Vec<u16>,
}

impl ChannelAssignment {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let chan_ref = buffer.read_field(8, "chan_ref")? as ChanRef;
        let channels = counted::read_channel_list(buffer, "channels")?;
        Ok(ChannelAssignment { chan_ref, channels })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) -> Result<(), MsgParseErr> {
        buffer.write_bits(self.chan_ref as u64, 8);
        counted::write_channel_list(buffer, &self.channels, "channels")
    }
}

pub fn read_assignments(buffer: &mut BitBuffer) -> Result<Vec<ChannelAssignment>, MsgParseErr> {
    let count = counted::read_group_count(buffer, "num_assignments")?;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(ChannelAssignment::from_bitbuf(buffer)?);
    }
    Ok(out)
}

pub fn write_assignments(buffer: &mut BitBuffer, assignments: &[ChannelAssignment]) -> Result<(), MsgParseErr> {
    counted::write_group_count(buffer, assignments.len(), "num_assignments")?;
    for a in assignments {
        a.to_bitbuf(buffer)?;
    }
    Ok(())
}

impl fmt::Display for ChannelAssignment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ref {} -> {:?}", self.chan_ref, self.channels)
    }
}
