//! Pantry backend REST API client.
//!
//! # Architecture
//!
//! - [`StorefrontApi`] is the seam the cart and checkout logic talk to; it is
//!   mockable (`MockStorefrontApi`) so that logic can be tested without HTTP
//! - [`ApiClient`] implements it over `reqwest`, scoped to one visitor's
//!   [`SessionContext`](crate::session::SessionContext)
//! - Responses are decoded into wire DTOs and validated into domain types at
//!   this boundary; nothing past it sees raw JSON
//! - No request is ever retried automatically
//!
//! # Endpoints
//!
//! ```text
//! GET    /cart               - Current cart lines
//! PUT    /cart/{lineId}      - Update a line's quantity
//! DELETE /cart/{lineId}      - Remove a line
//! GET    /loyalty/points     - Loyalty balance
//! POST   /orders             - Create an order from the staged draft
//! GET    /orders/{orderId}   - Read back an order's status
//! POST   /payments           - Start a gateway payment session
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use pantry_storefront::api::{ApiClient, StorefrontApi};
//!
//! let client = ApiClient::new(&config.api)?.for_session(session);
//! let lines = client.get_cart().await?;
//! ```

mod client;
pub mod types;
mod wire;

pub use client::ApiClient;
pub use types::*;

use async_trait::async_trait;
use mockall::automock;
use pantry_core::{LineId, LoyaltyBalance, OrderId};
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No session token, or the backend rejected it (401/403).
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found (404).
    #[error("Not found: {path}{}", format_message(.message.as_deref()))]
    NotFound {
        /// Request path, relative to the backend root.
        path: String,
        /// Message from the backend's error body, when it sent one.
        message: Option<String>,
    },

    /// Backend returned a non-success status.
    #[error("API error: {status}{}", format_message(.message.as_deref()))]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the backend's error body, when it sent one.
        message: Option<String>,
    },

    /// Response body did not match the expected contract.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// The backend-provided message, suitable for showing to the user.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } | Self::NotFound { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Whether this is a transport-level or server-side failure rather than a
    /// refusal of the request.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        match self {
            Self::Http(_) | Self::Parse(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Unauthorized | Self::NotFound { .. } => false,
        }
    }
}

fn format_message(message: Option<&str>) -> String {
    message.map_or_else(String::new, |m| format!(" - {m}"))
}

/// Operations the storefront needs from the backend.
///
/// Every call is an independent request/response round trip.
#[automock]
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    /// Fetch the current cart lines with server-computed stock.
    async fn get_cart(&self) -> Result<Vec<CartLine>, ApiError>;

    /// Set a line's quantity; returns the backend's copy of the line.
    async fn update_cart_line(&self, line_id: LineId, quantity: u32)
    -> Result<CartLine, ApiError>;

    /// Delete a line from the cart.
    async fn delete_cart_line(&self, line_id: LineId) -> Result<(), ApiError>;

    /// Fetch the loyalty balance.
    async fn get_loyalty_points(&self) -> Result<LoyaltyBalance, ApiError>;

    /// Create an order.
    async fn create_order(&self, order: &CreateOrderRequest) -> Result<PersistedOrder, ApiError>;

    /// Read back an order.
    async fn get_order(&self, order_id: OrderId) -> Result<PersistedOrder, ApiError>;

    /// Start a payment session for an existing order.
    async fn create_payment(
        &self,
        request: &CreatePaymentRequest,
    ) -> Result<PaymentSession, ApiError>;
}
