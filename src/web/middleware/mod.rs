//! Tower layers applied to every route.

pub mod client_ip;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
