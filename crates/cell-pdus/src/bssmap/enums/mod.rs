pub mod bssmap_msg_type;
