mod cc_sc;
mod ho_sc;
mod mm_sc;
mod sm_sc;
pub mod sc_txn;
pub mod switching_center;

pub use sc_txn::{LegRole, ScCcState, ScKey, ScPdpState};
pub use switching_center::{SwitchingCenter, VlrRecord};
