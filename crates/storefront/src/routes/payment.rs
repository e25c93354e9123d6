//! Payment gateway return handler.

use axum::{extract::Query, response::Redirect};
use tracing::{info, instrument};

use crate::error::add_breadcrumb;
use crate::gateway::GatewayReturn;

/// Classify the gateway's return navigation and send the visitor to the
/// matching confirmation view.
///
/// Always answers with `303 See Other`; one classification, one redirect.
#[instrument(skip(params))]
pub async fn gateway_return(Query(params): Query<GatewayReturn>) -> Redirect {
    let outcome = params.classify();
    let location = outcome.redirect_location();

    info!(
        success = outcome.is_success(),
        order_ref = outcome.order_ref().unwrap_or("-"),
        "Payment gateway return"
    );
    let message = if outcome.is_success() {
        "Gateway reported success"
    } else {
        "Gateway reported failure"
    };
    match outcome.order_ref() {
        Some(order_ref) => add_breadcrumb("payment", message, Some(&[("order_ref", order_ref)])),
        None => add_breadcrumb("payment", message, None),
    }

    Redirect::to(&location)
}
