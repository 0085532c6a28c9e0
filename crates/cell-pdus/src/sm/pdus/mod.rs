pub mod activate_pdp_context;
pub mod deactivate_pdp_context;
