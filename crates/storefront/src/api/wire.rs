//! Raw response bodies and their conversion into domain types.

use pantry_core::{CurrencyCode, LineId, LoyaltyBalance, Money, OrderId, OrderStatus, ProductId};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use super::ApiError;
use super::types::{CartLine, PaymentSession, PersistedOrder};

/// `GET /cart` returns either a bare array or an object wrapping the lines.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum CartBody {
    Wrapped { items: Vec<CartLineBody> },
    Bare(Vec<CartLineBody>),
}

impl CartBody {
    pub(super) fn into_lines(self) -> Result<Vec<CartLine>, ApiError> {
        let (Self::Wrapped { items } | Self::Bare(items)) = self;
        items.into_iter().map(CartLine::try_from).collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CartLineBody {
    #[serde(alias = "id")]
    line_id: LineId,
    product_id: ProductId,
    quantity: i64,
    unit_price: Decimal,
    #[serde(default)]
    currency_code: Option<CurrencyCode>,
    product_name: String,
    #[serde(default, alias = "productImageRef", alias = "imageUrl")]
    product_image: Option<String>,
    #[serde(default, alias = "stock")]
    stock_available: i64,
}

impl TryFrom<CartLineBody> for CartLine {
    type Error = ApiError;

    fn try_from(body: CartLineBody) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(body.quantity)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or_else(|| {
                ApiError::Parse(format!(
                    "cart line {} has invalid quantity {}",
                    body.line_id, body.quantity
                ))
            })?;

        if body.unit_price.is_sign_negative() {
            return Err(ApiError::Parse(format!(
                "cart line {} has negative unit price",
                body.line_id
            )));
        }

        // Negative stock shows up while the backend reconciles inventory
        let stock_available = u32::try_from(body.stock_available.max(0)).unwrap_or(u32::MAX);
        let line = Self {
            line_id: body.line_id,
            product_id: body.product_id,
            quantity,
            unit_price: Money::new(body.unit_price, body.currency_code.unwrap_or_default()),
            product_name: body.product_name,
            product_image: body.product_image.filter(|s| !s.trim().is_empty()),
            stock_available,
        };

        if line.exceeds_stock() {
            warn!(
                line_id = %line.line_id,
                quantity,
                stock_available,
                "Cart line quantity exceeds available stock"
            );
        }
        Ok(line)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LoyaltyBody {
    total_points: i64,
}

impl From<LoyaltyBody> for LoyaltyBalance {
    fn from(body: LoyaltyBody) -> Self {
        Self::new(u32::try_from(body.total_points.max(0)).unwrap_or(u32::MAX))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OrderBody {
    #[serde(alias = "orderId")]
    id: OrderId,
    #[serde(default)]
    status: OrderStatus,
}

impl From<OrderBody> for PersistedOrder {
    fn from(body: OrderBody) -> Self {
        Self {
            id: body.id,
            status: body.status,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PaymentBody {
    #[serde(default, alias = "paymentUrl", alias = "url")]
    pay_url: Option<String>,
}

impl From<PaymentBody> for PaymentSession {
    fn from(body: PaymentBody) -> Self {
        let pay_url = body
            .pay_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|raw| match Url::parse(raw) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
                Ok(url) => {
                    warn!(scheme = url.scheme(), "Ignoring payment URL with unsupported scheme");
                    None
                }
                Err(e) => {
                    warn!(error = %e, "Ignoring unparseable payment URL");
                    None
                }
            });

        Self { pay_url }
    }
}

/// Error body shape: `{"message": "..."}` or `{"error": "..."}`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    /// Extract a displayable message from a raw error body.
    pub(super) fn message_from(text: &str) -> Option<String> {
        let body: Self = serde_json::from_str(text).unwrap_or_default();
        body.message
            .or(body.error)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse_cart(json: &str) -> Result<Vec<CartLine>, ApiError> {
        serde_json::from_str::<CartBody>(json).unwrap().into_lines()
    }

    #[test]
    fn test_cart_bare_array() {
        let lines = parse_cart(
            r#"[{"lineId": 1, "productId": 10, "quantity": 2, "unitPrice": 50000,
                 "productName": "Jasmine rice 5kg", "productImage": "rice.jpg",
                 "stockAvailable": 8}]"#,
        )
        .unwrap();

        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.line_id, LineId::new(1));
        assert_eq!(line.quantity, 2);
        assert_eq!(line.unit_price, Money::from_minor(50_000));
        assert_eq!(line.stock_available, 8);
        assert_eq!(line.product_image.as_deref(), Some("rice.jpg"));
    }

    #[test]
    fn test_cart_wrapped_with_aliases() {
        let lines = parse_cart(
            r#"{"items": [{"id": 3, "productId": 11, "quantity": 1, "unitPrice": "12500.50",
                           "productName": "Fish sauce", "productImageRef": "",
                           "stock": 4}]}"#,
        )
        .unwrap();

        let line = &lines[0];
        assert_eq!(line.line_id, LineId::new(3));
        assert_eq!(line.unit_price.amount, Decimal::new(1_250_050, 2));
        assert_eq!(line.product_image, None);
        assert_eq!(line.stock_available, 4);
    }

    #[test]
    fn test_cart_rejects_zero_quantity() {
        let result = parse_cart(
            r#"[{"lineId": 1, "productId": 10, "quantity": 0, "unitPrice": 1,
                 "productName": "x", "stockAvailable": 8}]"#,
        );
        assert!(matches!(result, Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_cart_rejects_negative_price() {
        let result = parse_cart(
            r#"[{"lineId": 1, "productId": 10, "quantity": 1, "unitPrice": -5,
                 "productName": "x", "stockAvailable": 8}]"#,
        );
        assert!(matches!(result, Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_negative_stock_becomes_zero() {
        let lines = parse_cart(
            r#"[{"lineId": 1, "productId": 10, "quantity": 1, "unitPrice": 1,
                 "productName": "x", "stockAvailable": -3}]"#,
        )
        .unwrap();
        assert_eq!(lines[0].stock_available, 0);
        assert!(lines[0].exceeds_stock());
    }

    #[test]
    fn test_loyalty_negative_clamps() {
        let body: LoyaltyBody = serde_json::from_str(r#"{"totalPoints": -10}"#).unwrap();
        assert_eq!(LoyaltyBalance::from(body).total_points, 0);
    }

    #[test]
    fn test_order_status_defaults_to_pending() {
        let body: OrderBody = serde_json::from_str(r#"{"orderId": 77}"#).unwrap();
        let order = PersistedOrder::from(body);
        assert_eq!(order.id, OrderId::new(77));
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_payment_url_validation() {
        let ok: PaymentBody =
            serde_json::from_str(r#"{"payUrl": "https://gateway.test/pay?ref=77"}"#).unwrap();
        assert!(PaymentSession::from(ok).pay_url.is_some());

        let blank: PaymentBody = serde_json::from_str(r#"{"payUrl": "  "}"#).unwrap();
        assert!(PaymentSession::from(blank).pay_url.is_none());

        let missing: PaymentBody = serde_json::from_str("{}").unwrap();
        assert!(PaymentSession::from(missing).pay_url.is_none());

        let script: PaymentBody =
            serde_json::from_str(r#"{"payUrl": "javascript:alert(1)"}"#).unwrap();
        assert!(PaymentSession::from(script).pay_url.is_none());
    }

    #[test]
    fn test_error_body_message() {
        assert_eq!(
            ErrorBody::message_from(r#"{"message": "Out of stock"}"#).as_deref(),
            Some("Out of stock")
        );
        assert_eq!(
            ErrorBody::message_from(r#"{"error": "Bad address"}"#).as_deref(),
            Some("Bad address")
        );
        assert_eq!(ErrorBody::message_from("<html>502</html>"), None);
        assert_eq!(ErrorBody::message_from(r#"{"message": "  "}"#), None);
    }
}
