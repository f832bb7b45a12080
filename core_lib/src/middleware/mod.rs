//! Middleware components for the HTTP server

pub mod logging;
pub mod timeout;

pub use logging::with_request_logging;
pub use timeout::with_request_timeout;
