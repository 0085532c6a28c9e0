use core::fmt;

use cell_core::{BitBuffer, ChanRef, MsgParseErr, ResourceKind};

use super::counted;

/// Resources one application of an MS holds and needs again in the target cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoAppRequirement {
    /// 8 bits
    pub chan_ref: ChanRef,
    /// 8 bits
    pub kind: ResourceKind,
    /// 8 bits, number of channels
    pub count: u8,
}

impl HoAppRequirement {
    pub fn from_bitbuf(buffer: &mut BitBuffer) -> Result<Self, MsgParseErr> {
        let chan_ref = buffer.read_field(8, "chan_ref")? as ChanRef;
        let raw_kind = buffer.read_field(8, "kind")?;
        let kind = ResourceKind::try_from(raw_kind)
            .map_err(|_| MsgParseErr::InvalidValue { field: "kind", value: raw_kind })?;
        let count = buffer.read_field(8, "count")? as u8;
        Ok(HoAppRequirement { chan_ref, kind, count })
    }

    pub fn to_bitbuf(&self, buffer: &mut BitBuffer) {
        buffer.write_bits(self.chan_ref as u64, 8);
        buffer.write_bits(self.kind.into_raw(), 8);
        buffer.write_bits(self.count as u64, 8);
    }
}

pub fn read_requirements(buffer: &mut BitBuffer) -> Result<Vec<HoAppRequirement>, MsgParseErr> {
    let count = counted::read_group_count(buffer, "num_apps")?;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(HoAppRequirement::from_bitbuf(buffer)?);
    }
    Ok(out)
}

pub fn write_requirements(buffer: &mut BitBuffer, apps: &[HoAppRequirement]) -> Result<(), MsgParseErr> {
    counted::write_group_count(buffer, apps.len(), "num_apps")?;
    for a in apps {
        a.to_bitbuf(buffer);
    }
    Ok(())
}

impl fmt::Display for HoAppRequirement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ref {} {}x{}", self.chan_ref, self.count, self.kind)
    }
}
