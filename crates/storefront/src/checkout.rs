//! Checkout orchestration.
//!
//! Drives one visitor through checkout:
//!
//! ```text
//! Cart ──start_checkout──▶ SelectingPayment(draft)
//!   ▲                          │
//!   └──────cancel_checkout─────┤
//!                              │ confirm_payment
//!              ┌───────────────┼──────────────────────┐
//!              ▼ COD           ▼ gateway ok           ▼ gateway failed
//!          Completed   RedirectingToGateway     AwaitingPayment
//!                                                     │ retry_payment
//!                                                     ▼
//!                                          RedirectingToGateway
//! ```
//!
//! Staging a draft never touches the backend. Submission is strictly
//! sequential: the order is created before any payment session is requested.

use pantry_core::{
    LineId, LoyaltyBalance, Money, PaymentMethod, PointsInput, ShippingAddress,
    discount_for_points, final_amount, points_to_cover,
};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::api::{CreateOrderRequest, CreatePaymentRequest, OrderItem, PersistedOrder, StorefrontApi};
use crate::cart::CartState;
use crate::error::{CheckoutError, ValidationError, add_breadcrumb};
use crate::gateway::cash_on_delivery_location;

/// Order staged between "proceed to checkout" and submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub items: Vec<OrderItem>,
    pub cart_item_ids: Vec<LineId>,
    pub shipping_address: ShippingAddress,
    pub points_used: u32,
    pub total_before_discount: Money,
    pub discount_from_points: Money,
    pub final_amount: Money,
}

impl OrderDraft {
    fn new(cart: &CartState, shipping_address: ShippingAddress, points_used: u32) -> Self {
        let total = cart.total();
        let discount = discount_for_points(points_used);

        Self {
            items: cart
                .lines()
                .iter()
                .map(|line| OrderItem {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .collect(),
            cart_item_ids: cart.lines().iter().map(|line| line.line_id).collect(),
            shipping_address,
            points_used,
            total_before_discount: total,
            discount_from_points: Money::new(discount.amount, total.currency_code),
            final_amount: final_amount(total, points_used),
        }
    }

    /// The `POST /orders` body for this draft.
    #[must_use]
    pub fn to_request(&self) -> CreateOrderRequest {
        CreateOrderRequest {
            items: self.items.clone(),
            points_used: self.points_used,
            cart_item_ids: self.cart_item_ids.clone(),
            shipping_address: self.shipping_address.clone(),
        }
    }
}

/// Where the checkout currently stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CheckoutStage {
    #[default]
    Cart,
    SelectingPayment(OrderDraft),
    /// Cash on delivery order placed.
    Completed(PersistedOrder),
    /// Gateway session started; the visitor is leaving the site.
    RedirectingToGateway { order: PersistedOrder, pay_url: Url },
    /// Order created but no payment session could be started for it.
    AwaitingPayment(PersistedOrder),
}

/// What the view layer should do after a successful step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// In-app navigation to a path on this site.
    Route(String),
    /// Full navigation away to an external page.
    External(Url),
}

/// Cart and checkout flow for one visitor.
pub struct CheckoutOrchestrator<A> {
    api: A,
    cart: CartState,
    loyalty: LoyaltyBalance,
    stage: CheckoutStage,
}

impl<A: StorefrontApi> CheckoutOrchestrator<A> {
    /// Start a flow over `cart`, talking to the backend through `api`.
    #[must_use]
    pub fn new(api: A, cart: CartState) -> Self {
        Self {
            api,
            cart,
            loyalty: LoyaltyBalance::default(),
            stage: CheckoutStage::Cart,
        }
    }

    #[must_use]
    pub const fn cart(&self) -> &CartState {
        &self.cart
    }

    #[must_use]
    pub const fn loyalty(&self) -> LoyaltyBalance {
        self.loyalty
    }

    #[must_use]
    pub const fn stage(&self) -> &CheckoutStage {
        &self.stage
    }

    /// The staged draft, if payment selection is in progress.
    #[must_use]
    pub const fn draft(&self) -> Option<&OrderDraft> {
        match &self.stage {
            CheckoutStage::SelectingPayment(draft) => Some(draft),
            _ => None,
        }
    }

    /// Most points worth redeeming: the balance, capped at what covers the
    /// whole cart.
    #[must_use]
    pub fn max_redeemable_points(&self) -> u32 {
        self.loyalty.clamp(points_to_cover(self.cart.total()))
    }

    /// Accept raw points input against the current balance.
    #[must_use]
    pub fn accept_points(&self, raw: i64) -> PointsInput {
        PointsInput::accept(raw, self.loyalty)
    }

    /// Load the cart and the loyalty balance concurrently.
    ///
    /// Each half updates only its own state; one failing does not undo the
    /// other.
    ///
    /// # Errors
    ///
    /// Returns the cart error if the cart failed to load, otherwise the
    /// loyalty error.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<(), CheckoutError> {
        let Self {
            api, cart, loyalty, ..
        } = self;
        let api = &*api;

        let (cart_result, loyalty_result) =
            tokio::join!(cart.load(api), fetch_loyalty(api, loyalty));
        cart_result.and(loyalty_result)
    }

    /// Reload the cart.
    ///
    /// # Errors
    ///
    /// See [`CartState::load`].
    pub async fn load_cart(&mut self) -> Result<(), CheckoutError> {
        self.cart.load(&self.api).await
    }

    /// Reload the loyalty balance.
    ///
    /// # Errors
    ///
    /// Returns `Auth` without a session or `Network` when the fetch fails;
    /// the previous balance is kept.
    pub async fn load_loyalty(&mut self) -> Result<(), CheckoutError> {
        fetch_loyalty(&self.api, &mut self.loyalty).await
    }

    /// Change a cart line's quantity. Discards a staged draft on success.
    ///
    /// # Errors
    ///
    /// See [`CartState::set_quantity`].
    pub async fn set_quantity(&mut self, line_id: LineId, quantity: u32) -> Result<(), CheckoutError> {
        self.cart.set_quantity(&self.api, line_id, quantity).await?;
        self.discard_stale_draft();
        Ok(())
    }

    /// Remove a cart line. Discards a staged draft on success.
    ///
    /// # Errors
    ///
    /// See [`CartState::remove_line`].
    pub async fn remove_line(&mut self, line_id: LineId) -> Result<(), CheckoutError> {
        self.cart.remove_line(&self.api, line_id).await?;
        self.discard_stale_draft();
        Ok(())
    }

    /// Validate the address and points and stage an order draft.
    ///
    /// `points_used` is clamped to the loaded balance. No request is made.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank address or an empty cart, or
    /// while an order created by this flow is still unpaid; no draft is
    /// staged in that case.
    #[instrument(skip(self, shipping_address))]
    pub fn start_checkout(
        &mut self,
        shipping_address: &str,
        points_used: u32,
    ) -> Result<OrderDraft, CheckoutError> {
        if let CheckoutStage::AwaitingPayment(order)
        | CheckoutStage::RedirectingToGateway { order, .. } = &self.stage
        {
            return Err(CheckoutError::from(ValidationError::UnpaidOrder(order.id)).reported());
        }
        let address = ShippingAddress::parse(shipping_address)
            .map_err(|e| CheckoutError::from(ValidationError::from(e)).reported())?;
        if self.cart.is_empty() {
            return Err(CheckoutError::from(ValidationError::EmptyCart).reported());
        }

        let points_used = self.loyalty.clamp(points_used);
        let draft = OrderDraft::new(&self.cart, address, points_used);
        debug!(
            total = %draft.total_before_discount,
            discount = %draft.discount_from_points,
            final_amount = %draft.final_amount,
            points_used,
            "Order draft staged"
        );
        add_breadcrumb("checkout", "Order draft staged", None);

        self.stage = CheckoutStage::SelectingPayment(draft.clone());
        Ok(draft)
    }

    /// Submit the staged draft and start payment.
    ///
    /// On order creation the cart is cleared locally. Cash on delivery ends
    /// here with a route to the success view; gateway payment requests a
    /// payment session and returns an external navigation to it.
    ///
    /// # Errors
    ///
    /// - `Validation` without a draft or a payment method; nothing is sent
    /// - `OrderCreation` when the backend refuses the order; the draft stays
    ///   staged so the visitor can retry
    /// - `PaymentInit` when the order exists but no payment session could be
    ///   started; the stage becomes `AwaitingPayment`
    #[instrument(skip(self))]
    pub async fn confirm_payment(
        &mut self,
        payment_method: Option<PaymentMethod>,
    ) -> Result<Navigation, CheckoutError> {
        let CheckoutStage::SelectingPayment(draft) = &self.stage else {
            return Err(CheckoutError::from(ValidationError::NoDraft).reported());
        };
        let Some(payment_method) = payment_method else {
            return Err(CheckoutError::from(ValidationError::PaymentMethodRequired).reported());
        };
        let request = draft.to_request();

        let method = payment_method.to_string();
        add_breadcrumb(
            "checkout",
            "Submitting order",
            Some(&[("payment_method", method.as_str())]),
        );
        let order = self
            .api
            .create_order(&request)
            .await
            .map_err(|e| CheckoutError::order_creation(e).reported())?;

        info!(order_id = %order.id, %payment_method, "Order created");
        self.cart.clear();

        if payment_method.requires_gateway() {
            self.start_payment(order).await
        } else {
            let location = cash_on_delivery_location(&order.id.to_string());
            self.stage = CheckoutStage::Completed(order);
            Ok(Navigation::Route(location))
        }
    }

    /// Request a new payment session for an order whose payment could not be
    /// started.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when there is no unpaid order, or `PaymentInit`
    /// when the session still cannot be started.
    #[instrument(skip(self))]
    pub async fn retry_payment(&mut self) -> Result<Navigation, CheckoutError> {
        let order = match &self.stage {
            CheckoutStage::AwaitingPayment(order)
            | CheckoutStage::RedirectingToGateway { order, .. } => order.clone(),
            _ => return Err(CheckoutError::from(ValidationError::NothingToRetry).reported()),
        };

        let order_id = order.id.to_string();
        add_breadcrumb(
            "checkout",
            "Retrying payment",
            Some(&[("order_id", order_id.as_str())]),
        );
        self.start_payment(order).await
    }

    /// Drop the staged draft, or stop tracking an unpaid order, and go back
    /// to the cart. Nothing is sent: an unpaid order stays on the backend.
    pub fn cancel_checkout(&mut self) {
        match &self.stage {
            CheckoutStage::SelectingPayment(_) => {
                debug!("Checkout cancelled");
                self.stage = CheckoutStage::Cart;
            }
            CheckoutStage::AwaitingPayment(order)
            | CheckoutStage::RedirectingToGateway { order, .. } => {
                info!(order_id = %order.id, "Unpaid order left for later payment");
                self.stage = CheckoutStage::Cart;
            }
            CheckoutStage::Cart | CheckoutStage::Completed(_) => {}
        }
    }

    async fn start_payment(&mut self, order: PersistedOrder) -> Result<Navigation, CheckoutError> {
        let request = CreatePaymentRequest {
            order_id: order.id,
            payment_method: PaymentMethod::GatewayRedirect,
        };

        match self.api.create_payment(&request).await {
            Ok(session) => {
                if let Some(pay_url) = session.pay_url {
                    info!(order_id = %order.id, "Redirecting to payment gateway");
                    self.stage = CheckoutStage::RedirectingToGateway {
                        order,
                        pay_url: pay_url.clone(),
                    };
                    return Ok(Navigation::External(pay_url));
                }
                warn!(order_id = %order.id, "Payment session returned no redirect URL");
                let err = CheckoutError::PaymentInit {
                    order_id: order.id,
                    message: None,
                };
                self.stage = CheckoutStage::AwaitingPayment(order);
                Err(err.reported())
            }
            Err(e) => {
                let err = CheckoutError::payment_init(order.id, &e);
                self.stage = CheckoutStage::AwaitingPayment(order);
                Err(err.reported())
            }
        }
    }

    fn discard_stale_draft(&mut self) {
        if matches!(self.stage, CheckoutStage::SelectingPayment(_)) {
            debug!("Cart changed; discarding staged draft");
            self.stage = CheckoutStage::Cart;
        }
    }
}

async fn fetch_loyalty<A: StorefrontApi + ?Sized>(
    api: &A,
    slot: &mut LoyaltyBalance,
) -> Result<(), CheckoutError> {
    let balance = api
        .get_loyalty_points()
        .await
        .map_err(|e| CheckoutError::from(e).reported())?;
    debug!(total_points = balance.total_points, "Loyalty balance loaded");
    *slot = balance;
    Ok(())
}
