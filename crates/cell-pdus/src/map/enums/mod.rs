pub mod map_msg_type;
