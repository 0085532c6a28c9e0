pub mod assignment_complete;
pub mod channel_release;
pub mod channel_request;
pub mod dedicated_data;
pub mod handover_command;
pub mod handover_complete;
pub mod immediate_assignment;
pub mod measurement_report;
pub mod paging_request;
