pub mod cancel_location;
pub mod update_location;
