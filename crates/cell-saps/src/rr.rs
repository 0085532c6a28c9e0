use cell_core::TxnId;

/// RR-EST-CNF: dedicated channel(s) for the application are assigned
#[derive(Debug, Clone, Copy)]
pub struct RrEstCnf {
    pub app: TxnId,
}

/// Why a channel could not be established
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RrEstFailure {
    /// Network answered with an immediate assignment reject, raw cause value
    Rejected(u8),
    /// No answer after the maximum number of channel requests
    NoResponse,
}

/// RR-EST-REJ: channel establishment failed
#[derive(Debug, Clone, Copy)]
pub struct RrEstRej {
    pub app: TxnId,
    pub failure: RrEstFailure,
}

/// RR-REL-IND: the network released the application's channel(s)
#[derive(Debug, Clone, Copy)]
pub struct RrRelInd {
    pub app: TxnId,
    /// Raw cause value from the release
    pub cause: u8,
}
