//! Cart operations against the fake backend through the real API client.

#![allow(clippy::unwrap_used)]

use pantry_core::{LineId, Money};
use pantry_integration_tests::{BackendState, FakeBackend, TEST_TOKEN, cart_line};
use pantry_storefront::api::StorefrontApi;
use pantry_storefront::notify::{Notice, NoticeKind};
use pantry_storefront::{CartState, CheckoutError, ValidationError};

async fn backend_with_two_lines() -> FakeBackend {
    FakeBackend::start(BackendState::with_cart(vec![
        cart_line(1, 2, 50_000, 10),
        cart_line(2, 1, 30_000, 5),
    ]))
    .await
}

#[tokio::test]
async fn test_load_computes_total() {
    let backend = backend_with_two_lines().await;
    let api = backend.client(Some(TEST_TOKEN));

    let mut cart = CartState::new();
    cart.load(&api).await.unwrap();

    assert_eq!(cart.lines().len(), 2);
    assert_eq!(cart.item_count(), 3);
    assert_eq!(cart.total(), Money::from_minor(130_000));

    let line = cart.line(LineId::new(1)).unwrap();
    assert_eq!(line.product_name, "Product 1");
    assert_eq!(line.stock_available, 10);
}

#[tokio::test]
async fn test_set_quantity_updates_backend_and_total() {
    let backend = backend_with_two_lines().await;
    let api = backend.client(Some(TEST_TOKEN));
    let mut cart = CartState::new();
    cart.load(&api).await.unwrap();

    cart.set_quantity(&api, LineId::new(1), 4).await.unwrap();

    assert_eq!(cart.line(LineId::new(1)).unwrap().quantity, 4);
    assert_eq!(cart.total(), Money::from_minor(230_000));
    assert_eq!(backend.state().cart[0]["quantity"], 4);
}

#[tokio::test]
async fn test_quantity_above_stock_is_rejected_locally() {
    let backend = backend_with_two_lines().await;
    let api = backend.client(Some(TEST_TOKEN));
    let mut cart = CartState::new();
    cart.load(&api).await.unwrap();
    let requests_before = backend.request_count();

    let err = cart.set_quantity(&api, LineId::new(2), 6).await.unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Validation(ValidationError::QuantityOutOfRange {
            requested: 6,
            stock: 5
        })
    ));
    assert_eq!(backend.request_count(), requests_before);
    assert_eq!(cart.line(LineId::new(2)).unwrap().quantity, 1);
}

#[tokio::test]
async fn test_backend_stock_refusal_keeps_local_quantity() {
    let backend = backend_with_two_lines().await;
    let api = backend.client(Some(TEST_TOKEN));
    let mut cart = CartState::new();
    cart.load(&api).await.unwrap();

    // Stock sold out elsewhere after the cart was loaded
    backend.state().cart[0]["stockAvailable"] = 2.into();

    let err = cart.set_quantity(&api, LineId::new(1), 3).await.unwrap_err();

    assert!(matches!(err, CheckoutError::Network(_)));
    let notice = Notice::from(&err);
    assert_eq!(notice.kind, NoticeKind::Dismissible);
    assert_eq!(notice.message, "Not enough stock");
    assert_eq!(cart.line(LineId::new(1)).unwrap().quantity, 2);
}

#[tokio::test]
async fn test_remove_line() {
    let backend = backend_with_two_lines().await;
    let api = backend.client(Some(TEST_TOKEN));
    let mut cart = CartState::new();
    cart.load(&api).await.unwrap();

    cart.remove_line(&api, LineId::new(1)).await.unwrap();

    assert!(cart.line(LineId::new(1)).is_none());
    assert_eq!(cart.total(), Money::from_minor(30_000));
    assert_eq!(backend.state().cart.len(), 1);
}

#[tokio::test]
async fn test_remove_line_already_deleted_on_backend() {
    let backend = backend_with_two_lines().await;
    let api = backend.client(Some(TEST_TOKEN));
    let mut cart = CartState::new();
    cart.load(&api).await.unwrap();

    // Removed in another tab
    backend.state().cart.retain(|l| l["lineId"] != 2);

    cart.remove_line(&api, LineId::new(2)).await.unwrap();
    assert!(cart.line(LineId::new(2)).is_none());

    // Second removal is a local no-op
    let requests_before = backend.request_count();
    cart.remove_line(&api, LineId::new(2)).await.unwrap();
    assert_eq!(backend.request_count(), requests_before);
}

#[tokio::test]
async fn test_anonymous_visitor_never_reaches_backend() {
    let backend = backend_with_two_lines().await;
    let api = backend.client(None);
    let mut cart = CartState::new();

    let err = cart.load(&api).await.unwrap_err();

    assert!(matches!(err, CheckoutError::Auth));
    assert_eq!(Notice::from(&err).kind, NoticeKind::SignIn);
    assert_eq!(backend.request_count(), 0);
}

#[tokio::test]
async fn test_rejected_token_is_auth_error() {
    let backend = backend_with_two_lines().await;
    let api = backend.client(Some("expired-token"));
    let mut cart = CartState::new();

    let err = cart.load(&api).await.unwrap_err();

    assert!(matches!(err, CheckoutError::Auth));
    assert_eq!(backend.request_count(), 1);
}

#[tokio::test]
async fn test_request_id_is_forwarded() {
    let backend = backend_with_two_lines().await;
    let api = backend.client(Some(TEST_TOKEN)).with_request_id("req-abc");

    api.get_cart().await.unwrap();
    api.get_loyalty_points().await.unwrap();

    let state = backend.state();
    assert_eq!(state.requests.len(), 2);
    assert!(
        state
            .requests
            .iter()
            .all(|r| r.request_id.as_deref() == Some("req-abc"))
    );
}
