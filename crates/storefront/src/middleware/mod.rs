//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers

pub mod request_id;
pub mod security_headers;
pub mod visitor;

pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use visitor::VisitorApi;
