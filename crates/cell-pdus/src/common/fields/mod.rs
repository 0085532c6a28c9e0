pub mod channel_assignment;
pub mod counted;
pub mod ho_app;
pub mod imsi;
