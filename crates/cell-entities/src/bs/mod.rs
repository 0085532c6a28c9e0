pub mod base_station;
mod bssmap_bs;
mod ho_bs;
mod rr_bs;

pub use base_station::{BaseStation, BsKey, BsTxnState};
