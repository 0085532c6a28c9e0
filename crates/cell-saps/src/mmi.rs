use cell_core::{CellId, Imsi};

/// Commands from the user or application model of an MS
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MmiCmd {
    /// Switch on and register
    PowerOn,
    /// Detach and switch off
    PowerOff,
    /// Originate a voice call
    Originate { callee: Imsi, bandwidth_kbps: u32 },
    /// End all calls
    HangUp,
    ActivatePdp { nsapi: u8, bandwidth_kbps: u32 },
    DeactivatePdp { nsapi: u8 },
    /// New signal quality measurement for a cell
    Measurement { cell: CellId, quality: u8 },
    /// Reselect to another cell while idle
    CampOn { cell: CellId },
}
