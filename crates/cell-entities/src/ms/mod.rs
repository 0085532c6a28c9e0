pub mod app;
pub mod mobile_station;

mod cc_ms;
mod ho_ms;
mod mm_ms;
mod rr_ms;
mod sm_ms;

pub use app::{CcState, MmState, SmState};
pub use mobile_station::MobileStation;
