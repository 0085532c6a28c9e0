pub mod establishment_cause;
pub mod rr_msg_type;
