pub mod cm_service_request;
pub mod cm_service_response;
pub mod imsi_detach_indication;
pub mod location_update_accept;
pub mod location_update_reject;
pub mod location_update_request;
pub mod paging_response;
