pub mod sm_msg_type;
