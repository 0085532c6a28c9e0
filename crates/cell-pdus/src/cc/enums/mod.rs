pub mod cc_msg_type;
