pub mod clear;
pub mod dtap;
pub mod handover_command;
pub mod handover_complete;
pub mod handover_request;
pub mod handover_required;
pub mod paging;
