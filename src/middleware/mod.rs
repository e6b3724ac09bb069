//! HTTP middleware shared by all routes.

pub mod security_headers;
