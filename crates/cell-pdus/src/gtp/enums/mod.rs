pub mod gtp_msg_type;
