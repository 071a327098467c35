pub mod validate_request;
pub mod validate_route;
