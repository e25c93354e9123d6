//! Payment gateway return handling.
//!
//! After paying (or giving up) at the external gateway, the visitor is sent
//! back to this storefront with query parameters describing the outcome. Two
//! shapes arrive:
//!
//! ```text
//! ?status=success&orderId=42
//! ?status=failed&orderId=42&message=Card%20declined
//! ?transactionStatus=00&transactionRef=42        (gateway-native)
//! ```
//!
//! Classification is a pure function of the query string. The outcome is
//! never persisted and the backend is not consulted here.

use pantry_core::PaymentMethod;
use serde::Deserialize;
use url::form_urlencoded;

/// Confirmation view for a successful payment.
pub const SUCCESS_PATH: &str = "/checkout/success";

/// Confirmation view for a failed or abandoned payment.
pub const FAILURE_PATH: &str = "/checkout/failure";

/// Gateway transaction status meaning "approved".
const APPROVED_TRANSACTION_STATUS: &str = "00";

/// Failure messages longer than this are cut before being put in a URL.
const MAX_MESSAGE_CHARS: usize = 200;

/// Query parameters on the gateway return URL.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayReturn {
    pub status: Option<String>,
    pub order_id: Option<String>,
    pub message: Option<String>,
    pub transaction_status: Option<String>,
    pub transaction_ref: Option<String>,
}

/// Result of classifying a gateway return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Success {
        order_ref: Option<String>,
    },
    Failure {
        order_ref: Option<String>,
        reason: Option<String>,
    },
}

impl GatewayReturn {
    /// Decide whether the payment succeeded.
    ///
    /// A `transactionStatus` takes precedence: `00` is success, anything else
    /// failure. Without it, `status=success` (any case) is success. Everything
    /// else, including no parameters at all, is failure.
    #[must_use]
    pub fn classify(&self) -> PaymentOutcome {
        let succeeded = match present(self.transaction_status.as_deref()) {
            Some(code) => code == APPROVED_TRANSACTION_STATUS,
            None => present(self.status.as_deref())
                .is_some_and(|status| status.eq_ignore_ascii_case("success")),
        };

        let order_ref = present(self.order_id.as_deref())
            .or_else(|| present(self.transaction_ref.as_deref()))
            .map(String::from);

        if succeeded {
            PaymentOutcome::Success { order_ref }
        } else {
            PaymentOutcome::Failure {
                order_ref,
                reason: present(self.message.as_deref()).map(truncate_message),
            }
        }
    }
}

impl PaymentOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub fn order_ref(&self) -> Option<&str> {
        match self {
            Self::Success { order_ref } | Self::Failure { order_ref, .. } => order_ref.as_deref(),
        }
    }

    /// Where to send the visitor for this outcome.
    #[must_use]
    pub fn redirect_location(&self) -> String {
        match self {
            Self::Success { order_ref } => success_location(order_ref.as_deref()),
            Self::Failure { order_ref, reason } => {
                failure_location(order_ref.as_deref(), reason.as_deref())
            }
        }
    }
}

/// `/checkout/success?orderId=…`
#[must_use]
pub fn success_location(order_ref: Option<&str>) -> String {
    with_query(SUCCESS_PATH, &[("orderId", order_ref)])
}

/// `/checkout/success?orderId=…&method=COD`, for an order paid on delivery.
#[must_use]
pub fn cash_on_delivery_location(order_ref: &str) -> String {
    let method = PaymentMethod::CashOnDelivery.to_string();
    with_query(
        SUCCESS_PATH,
        &[("orderId", Some(order_ref)), ("method", Some(method.as_str()))],
    )
}

/// `/checkout/failure?orderId=…&message=…`
#[must_use]
pub fn failure_location(order_ref: Option<&str>, message: Option<&str>) -> String {
    with_query(FAILURE_PATH, &[("orderId", order_ref), ("message", message)])
}

fn with_query(path: &str, params: &[(&str, Option<&str>)]) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        if let Some(value) = value {
            query.append_pair(key, value);
        }
    }
    let query = query.finish();

    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn truncate_message(message: &str) -> String {
    message.chars().take(MAX_MESSAGE_CHARS).collect()
}
