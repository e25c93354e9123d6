//! Domain types exchanged with the backend.
//!
//! These are the validated shapes the rest of the crate works with; raw
//! response bodies are decoded in `wire` and converted into these.

use pantry_core::{LineId, Money, OrderId, OrderStatus, PaymentMethod, ProductId, ShippingAddress};
use serde::Serialize;
use url::Url;

// =============================================================================
// Cart Types
// =============================================================================

/// One product entry in the active cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Cart line ID.
    pub line_id: LineId,
    /// Product this line is for.
    pub product_id: ProductId,
    /// Quantity, always at least 1.
    pub quantity: u32,
    /// Current unit price of the product.
    pub unit_price: Money,
    /// Product display name.
    pub product_name: String,
    /// Product image URL or asset reference.
    pub product_image: Option<String>,
    /// Units in stock as computed by the backend.
    pub stock_available: u32,
}

impl CartLine {
    /// `quantity × unit_price`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }

    /// Whether `quantity` is an acceptable quantity for this line.
    #[must_use]
    pub const fn accepts_quantity(&self, quantity: u32) -> bool {
        quantity >= 1 && quantity <= self.stock_available
    }

    /// Stock dropped below the quantity already in the cart.
    #[must_use]
    pub const fn exceeds_stock(&self) -> bool {
        self.quantity > self.stock_available
    }
}

// =============================================================================
// Order Types
// =============================================================================

/// A product/quantity pair submitted with an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItem>,
    pub points_used: u32,
    pub cart_item_ids: Vec<LineId>,
    pub shipping_address: ShippingAddress,
}

/// An order as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedOrder {
    /// Order ID.
    pub id: OrderId,
    /// Current status.
    pub status: OrderStatus,
}

// =============================================================================
// Payment Types
// =============================================================================

/// Body of `POST /payments`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub order_id: OrderId,
    pub payment_method: PaymentMethod,
}

/// Result of starting a payment session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
    /// Gateway page to send the visitor to. `None` when the backend returned
    /// no usable URL.
    pub pay_url: Option<Url>,
}
