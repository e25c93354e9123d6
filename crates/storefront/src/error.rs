//! Unified error handling with Sentry integration.
//!
//! Two layers live here:
//!
//! - [`CheckoutError`] is what cart and checkout operations return. Each
//!   variant maps onto one kind of user-facing notice (see
//!   [`Notice`](crate::notify::Notice)).
//! - [`AppError`] is what HTTP handlers return.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pantry_core::{AddressError, LineId, OrderId};
use thiserror::Error;

use crate::api::ApiError;

/// Client-side validation failures. These block an action before any request
/// is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    ShippingAddress(#[from] AddressError),

    #[error("your cart is empty")]
    EmptyCart,

    #[error("quantity must be between 1 and {stock} (got {requested})")]
    QuantityOutOfRange { requested: u32, stock: u32 },

    #[error("item {0} is not in your cart")]
    UnknownLine(LineId),

    #[error("no checkout in progress")]
    NoDraft,

    #[error("please choose a payment method")]
    PaymentMethodRequired,

    #[error("there is no unpaid order to retry")]
    NothingToRetry,

    #[error("order {0} is still awaiting payment")]
    UnpaidOrder(OrderId),
}

/// Errors from cart and checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Rejected locally; nothing was sent.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// No session token, or the backend rejected it.
    #[error("please sign in to continue")]
    Auth,

    /// Transport failure or unexpected backend response.
    #[error("network error: {0}")]
    Network(#[source] ApiError),

    /// The backend refused to create the order.
    #[error("order could not be created{}", suffix(.message.as_deref()))]
    OrderCreation { message: Option<String> },

    /// The order exists but no payment session could be started for it.
    #[error("payment for order {order_id} could not be started{}", suffix(.message.as_deref()))]
    PaymentInit {
        order_id: OrderId,
        message: Option<String>,
    },
}

fn suffix(message: Option<&str>) -> String {
    message.map_or_else(String::new, |m| format!(": {m}"))
}

impl From<ApiError> for CheckoutError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => Self::Auth,
            other => Self::Network(other),
        }
    }
}

impl CheckoutError {
    /// Map a failed `POST /orders`.
    ///
    /// A refusal carrying a backend message becomes `OrderCreation` so the
    /// message reaches the user verbatim.
    #[must_use]
    pub fn order_creation(err: ApiError) -> Self {
        if err.is_network() {
            return Self::Network(err);
        }
        match err {
            ApiError::Unauthorized => Self::Auth,
            ApiError::Api { message, .. } | ApiError::NotFound { message, .. } => {
                Self::OrderCreation { message }
            }
            _ => Self::OrderCreation { message: None },
        }
    }

    /// Map a failed `POST /payments` for an already-created order.
    #[must_use]
    pub fn payment_init(order_id: OrderId, err: &ApiError) -> Self {
        match err {
            ApiError::Unauthorized => Self::Auth,
            other => Self::PaymentInit {
                order_id,
                message: other.backend_message().map(String::from),
            },
        }
    }

    /// Whether this is a validation failure.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Log the error and capture network-class failures to Sentry.
    #[must_use]
    pub fn reported(self) -> Self {
        match &self {
            Self::Network(source) => {
                let event_id = sentry::capture_error(source);
                tracing::error!(
                    error = %source,
                    sentry_event_id = %event_id,
                    "Backend request failed"
                );
            }
            Self::OrderCreation { .. } | Self::PaymentInit { .. } => {
                tracing::warn!(error = %self, "Checkout step failed");
            }
            Self::Validation(_) | Self::Auth => {
                tracing::debug!(error = %self, "Checkout action rejected");
            }
        }
        self
    }
}

/// Error type for HTTP handlers.
///
/// The confirmation views never fail: backend problems degrade to the
/// "being confirmed" state. What is left is routing.
#[derive(Debug, Error)]
pub enum AppError {
    /// Nothing is served at this path.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };
        (status, self.to_string()).into_response()
    }
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Order created", Some(&[("order_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
