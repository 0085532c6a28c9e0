pub mod call_clearing;
pub mod call_progress;
pub mod setup;
