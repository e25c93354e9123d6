//! End-to-end checkout against the fake backend.

#![allow(clippy::unwrap_used)]

use pantry_core::{LoyaltyBalance, Money, OrderId, PaymentMethod};
use pantry_integration_tests::{BackendState, FakeBackend, TEST_TOKEN, cart_line};
use pantry_storefront::api::ApiClient;
use pantry_storefront::notify::{Notice, NoticeKind};
use pantry_storefront::{
    CartState, CheckoutError, CheckoutOrchestrator, CheckoutStage, Navigation, ValidationError,
};
use serde_json::json;

async fn loaded(backend: &FakeBackend) -> CheckoutOrchestrator<ApiClient> {
    let mut checkout =
        CheckoutOrchestrator::new(backend.client(Some(TEST_TOKEN)), CartState::new());
    checkout.load().await.unwrap();
    checkout
}

fn one_line_backend() -> BackendState {
    BackendState::with_cart(vec![cart_line(1, 2, 50_000, 10)])
}

#[tokio::test]
async fn test_cash_on_delivery_checkout() {
    let backend = FakeBackend::start(one_line_backend()).await;
    let mut checkout = loaded(&backend).await;

    assert_eq!(checkout.cart().total(), Money::from_minor(100_000));
    assert_eq!(checkout.loyalty(), LoyaltyBalance::new(100));
    assert_eq!(checkout.max_redeemable_points(), 100);

    let draft = checkout
        .start_checkout("  12 Hang Bac, Hanoi  ", 30)
        .unwrap();
    assert_eq!(draft.discount_from_points, Money::from_minor(30_000));
    assert_eq!(draft.final_amount, Money::from_minor(70_000));

    let navigation = checkout
        .confirm_payment(Some(PaymentMethod::CashOnDelivery))
        .await
        .unwrap();

    assert_eq!(
        navigation,
        Navigation::Route("/checkout/success?orderId=1000&method=COD".to_string())
    );
    assert!(matches!(checkout.stage(), CheckoutStage::Completed(order) if order.id == OrderId::new(1000)));
    assert!(checkout.cart().is_empty());

    let state = backend.state();
    assert_eq!(
        state.order_bodies,
        vec![json!({
            "items": [{"productId": 10, "quantity": 2}],
            "pointsUsed": 30,
            "cartItemIds": [1],
            "shippingAddress": "12 Hang Bac, Hanoi",
        })]
    );
    assert!(state.payment_bodies.is_empty());
    assert!(state.cart.is_empty());
}

#[tokio::test]
async fn test_gateway_checkout_redirects_to_pay_url() {
    let backend = FakeBackend::start(one_line_backend()).await;
    let mut checkout = loaded(&backend).await;

    checkout.start_checkout("12 Hang Bac, Hanoi", 0).unwrap();
    let navigation = checkout
        .confirm_payment(Some(PaymentMethod::GatewayRedirect))
        .await
        .unwrap();

    let Navigation::External(url) = navigation else {
        panic!("expected external navigation, got {navigation:?}");
    };
    assert_eq!(url.as_str(), "https://gateway.test/pay?ref=1000");
    assert!(matches!(
        checkout.stage(),
        CheckoutStage::RedirectingToGateway { .. }
    ));
    assert_eq!(
        backend.state().payment_bodies,
        vec![json!({"orderId": 1000, "paymentMethod": "ONLINE"})]
    );
}

#[tokio::test]
async fn test_points_above_balance_are_clamped() {
    let backend = FakeBackend::start(BackendState::with_cart(vec![cart_line(
        1, 3, 100_000, 10,
    )]))
    .await;
    let mut checkout = loaded(&backend).await;

    let draft = checkout.start_checkout("12 Hang Bac, Hanoi", 150).unwrap();

    assert_eq!(draft.points_used, 100);
    assert_eq!(draft.discount_from_points, Money::from_minor(100_000));
    assert_eq!(draft.final_amount, Money::from_minor(200_000));
}

#[tokio::test]
async fn test_blank_address_sends_nothing() {
    let backend = FakeBackend::start(one_line_backend()).await;
    let mut checkout = loaded(&backend).await;
    let requests_before = backend.request_count();

    let err = checkout.start_checkout("   ", 10).unwrap_err();

    assert!(err.is_validation());
    assert_eq!(Notice::from(&err).kind, NoticeKind::Inline);
    assert!(checkout.draft().is_none());

    let err = checkout
        .confirm_payment(Some(PaymentMethod::CashOnDelivery))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Validation(ValidationError::NoDraft)
    ));
    assert_eq!(backend.request_count(), requests_before);
}

#[tokio::test]
async fn test_order_refusal_keeps_draft_and_cart() {
    let mut state = one_line_backend();
    state.order_error = Some((422, "Product 1 is no longer available".to_string()));
    let backend = FakeBackend::start(state).await;
    let mut checkout = loaded(&backend).await;

    checkout.start_checkout("12 Hang Bac, Hanoi", 0).unwrap();
    let err = checkout
        .confirm_payment(Some(PaymentMethod::CashOnDelivery))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::OrderCreation { .. }));
    let notice = Notice::from(&err);
    assert_eq!(notice.kind, NoticeKind::Dismissible);
    assert_eq!(notice.message, "Product 1 is no longer available");

    assert!(checkout.draft().is_some());
    assert_eq!(checkout.cart().lines().len(), 1);
}

#[tokio::test]
async fn test_order_not_found_message_reaches_user() {
    let mut state = one_line_backend();
    state.order_error = Some((404, "Product 10 no longer exists".to_string()));
    let backend = FakeBackend::start(state).await;
    let mut checkout = loaded(&backend).await;

    checkout.start_checkout("12 Hang Bac, Hanoi", 0).unwrap();
    let err = checkout
        .confirm_payment(Some(PaymentMethod::CashOnDelivery))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::OrderCreation { .. }));
    assert_eq!(Notice::from(&err).message, "Product 10 no longer exists");
    assert!(checkout.draft().is_some());
}

#[tokio::test]
async fn test_missing_pay_url_then_retry() {
    let mut state = one_line_backend();
    state.pay_url = None;
    let backend = FakeBackend::start(state).await;
    let mut checkout = loaded(&backend).await;

    checkout.start_checkout("12 Hang Bac, Hanoi", 0).unwrap();
    let err = checkout
        .confirm_payment(Some(PaymentMethod::GatewayRedirect))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::PaymentInit { order_id, .. } if order_id == OrderId::new(1000)
    ));
    assert!(Notice::from(&err).message.contains("#1000"));
    assert!(matches!(checkout.stage(), CheckoutStage::AwaitingPayment(_)));
    assert!(checkout.cart().is_empty());

    backend.state().pay_url = Some("https://gateway.test/pay?ref=1000&retry=1".to_string());
    let navigation = checkout.retry_payment().await.unwrap();

    assert_eq!(
        navigation,
        Navigation::External("https://gateway.test/pay?ref=1000&retry=1".parse().unwrap())
    );
    let state = backend.state();
    assert_eq!(state.order_bodies.len(), 1);
    assert_eq!(state.payment_bodies.len(), 2);
}

#[tokio::test]
async fn test_anonymous_checkout_prompts_sign_in() {
    let backend = FakeBackend::start(one_line_backend()).await;
    let mut checkout = CheckoutOrchestrator::new(backend.client(None), CartState::new());

    let err = checkout.load().await.unwrap_err();

    assert!(matches!(err, CheckoutError::Auth));
    assert_eq!(Notice::from(&err).kind, NoticeKind::SignIn);
    assert_eq!(backend.request_count(), 0);
}

#[tokio::test]
async fn test_cart_edit_discards_draft() {
    let backend = FakeBackend::start(one_line_backend()).await;
    let mut checkout = loaded(&backend).await;

    checkout.start_checkout("12 Hang Bac, Hanoi", 0).unwrap();
    checkout
        .set_quantity(pantry_core::LineId::new(1), 3)
        .await
        .unwrap();

    assert!(checkout.draft().is_none());
    assert_eq!(checkout.stage(), &CheckoutStage::Cart);
    assert_eq!(checkout.cart().total(), Money::from_minor(150_000));
}
