//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//!
//! # Payment
//! GET  /payment/return         - Gateway return URL (303 to a confirmation view)
//!
//! # Checkout confirmation
//! GET  /checkout/success       - Order placed / payment confirmation
//! GET  /checkout/failure       - Payment failed or abandoned
//!
//! Anything else                 - 404
//! ```

pub mod checkout;
pub mod payment;

use axum::{Router, http::Uri, middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payment/return", get(payment::gateway_return))
        .route("/checkout/success", get(checkout::success))
        .route("/checkout/failure", get(checkout::failure))
}

/// Build the full application router with its middleware stack.
///
/// Sentry layers are added by the binary, outside this stack.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
