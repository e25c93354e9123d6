//! Checkout confirmation views.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::Query;
use pantry_core::{OrderId, OrderStatus, PaymentMethod};
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::api::{ApiError, PersistedOrder, StorefrontApi};
use crate::middleware::VisitorApi;

/// Query parameters on the confirmation views.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationQuery {
    pub order_id: Option<String>,
    pub message: Option<String>,
    pub method: Option<String>,
}

impl ConfirmationQuery {
    fn order_ref(&self) -> Option<String> {
        self.order_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    }

    /// Unrecognized methods are ignored rather than rejected.
    fn payment_method(&self) -> Option<PaymentMethod> {
        self.method.as_deref().and_then(|m| m.trim().parse().ok())
    }
}

/// What the success view can say about payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentState {
    /// Backend reports the order as paid.
    Paid,
    /// Cash on delivery: the order is placed and paid to the courier.
    PayOnDelivery,
    /// Not (yet) reported as paid, or could not be checked.
    Confirming,
}

/// Success confirmation page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct SuccessTemplate {
    pub order_ref: Option<String>,
    pub payment: PaymentState,
}

impl SuccessTemplate {
    fn is_paid(&self) -> bool {
        self.payment == PaymentState::Paid
    }

    fn is_pay_on_delivery(&self) -> bool {
        self.payment == PaymentState::PayOnDelivery
    }
}

/// Failure confirmation page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/failure.html")]
pub struct FailureTemplate {
    pub order_ref: Option<String>,
    pub message: Option<String>,
}

/// Display the success view.
///
/// The gateway's word is not trusted on its own: for a signed-in visitor the
/// order is read back from the backend and only shown as paid if the backend
/// says so. Cash on delivery orders are never paid at this point and are
/// shown as placed instead.
#[instrument(skip(api, query))]
pub async fn success(VisitorApi(api): VisitorApi, Query(query): Query<ConfirmationQuery>) -> SuccessTemplate {
    let order_ref = query.order_ref();
    let cash_on_delivery = query.payment_method() == Some(PaymentMethod::CashOnDelivery);

    let order_id = order_ref.as_deref().and_then(|r| r.parse::<OrderId>().ok());
    let payment = match order_id {
        Some(order_id) if api.session().is_authenticated() => {
            payment_state(api.get_order(order_id).await, order_id)
        }
        _ => PaymentState::Confirming,
    };

    let payment = match payment {
        PaymentState::Confirming if cash_on_delivery => PaymentState::PayOnDelivery,
        other => other,
    };

    SuccessTemplate { order_ref, payment }
}

fn payment_state(
    result: Result<PersistedOrder, ApiError>,
    order_id: OrderId,
) -> PaymentState {
    match result {
        Ok(order) if order.status.is_paid() => PaymentState::Paid,
        Ok(order) => {
            if matches!(order.status, OrderStatus::Failed | OrderStatus::Cancelled) {
                warn!(%order_id, status = ?order.status, "Gateway reported success for unpaid order");
            }
            PaymentState::Confirming
        }
        Err(e) => {
            warn!(%order_id, error = %e, "Could not verify order status");
            PaymentState::Confirming
        }
    }
}

/// Display the failure view.
#[instrument(skip(query))]
pub async fn failure(Query(query): Query<ConfirmationQuery>) -> FailureTemplate {
    FailureTemplate {
        order_ref: query.order_ref(),
        message: query
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from),
    }
}
