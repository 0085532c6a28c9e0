use serde::Serialize;

/// Roles a node can take in the network
#[derive(PartialEq, Eq, Hash, Clone, Debug, Copy, Serialize)]
pub enum CellRole {
    /// Mobile station
    Ms,
    /// Base station, manages radio channels for one or more cells
    Bs,
    /// Switching center, hosts the visitor location register
    Sc,
    /// Core network node terminating packet data contexts
    Gateway,
    /// Home location register
    Hlr,

    /// Test or tap entity, only records what it receives
    Sink,
}

impl CellRole {
    /// Links touching an MS are radio links, everything else is wired
    pub fn is_radio(self) -> bool {
        self == CellRole::Ms
    }
}

impl core::fmt::Display for CellRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CellRole::Ms => write!(f, "MS"),
            CellRole::Bs => write!(f, "BS"),
            CellRole::Sc => write!(f, "SC"),
            CellRole::Gateway => write!(f, "GW"),
            CellRole::Hlr => write!(f, "HLR"),
            CellRole::Sink => write!(f, "Sink"),
        }
    }
}
