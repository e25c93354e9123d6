//! Status enums for orders and payment methods.

use serde::{Deserialize, Serialize};

/// How the customer chose to pay for an order.
///
/// Chosen once per checkout attempt. Serialized with the backend's wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Pay the courier on delivery. Completes locally, no gateway.
    #[serde(rename = "COD")]
    CashOnDelivery,
    /// Pay through the external payment gateway via a full-page redirect.
    #[serde(rename = "ONLINE")]
    GatewayRedirect,
}

impl PaymentMethod {
    /// Whether this method needs a payment session and gateway redirect.
    #[must_use]
    pub const fn requires_gateway(&self) -> bool {
        matches!(self, Self::GatewayRedirect)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CashOnDelivery => write!(f, "COD"),
            Self::GatewayRedirect => write!(f, "ONLINE"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COD" => Ok(Self::CashOnDelivery),
            "ONLINE" => Ok(Self::GatewayRedirect),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Order status as reported by the backend.
///
/// The backend owns this value; the storefront only reads it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Paid,
    Shipping,
    Delivered,
    Cancelled,
    Failed,
    /// A status this client does not know about yet.
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Whether the backend considers the order settled by the gateway.
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self, Self::Paid | Self::Shipping | Self::Delivered)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap(),
            "\"COD\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::GatewayRedirect).unwrap(),
            "\"ONLINE\""
        );
    }

    #[test]
    fn test_payment_method_from_str() {
        assert_eq!(
            "cod".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::CashOnDelivery
        );
        assert_eq!(
            "Online".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::GatewayRedirect
        );
        assert!("card".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_unknown_order_status() {
        let status: OrderStatus = serde_json::from_str("\"REFUND_REQUESTED\"").unwrap();
        assert_eq!(status, OrderStatus::Unknown);
    }

    #[test]
    fn test_is_paid() {
        assert!(OrderStatus::Paid.is_paid());
        assert!(OrderStatus::Delivered.is_paid());
        assert!(!OrderStatus::Pending.is_paid());
        assert!(!OrderStatus::Failed.is_paid());
    }
}
