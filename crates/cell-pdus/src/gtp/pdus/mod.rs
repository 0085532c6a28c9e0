pub mod create_pdp_context;
pub mod delete_pdp_context;
