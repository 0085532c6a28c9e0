pub mod mm_msg_type;
pub mod update_type;
