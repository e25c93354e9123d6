//! Cart state.
//!
//! Holds the visitor's cart lines as last confirmed by the backend. Every
//! mutation goes to the server first; local state only changes once the
//! server has accepted it, so a failed request leaves the cart exactly as it
//! was. Totals are folded from the current lines on every read.

use pantry_core::{LineId, Money};
use tracing::{debug, instrument};

use crate::api::{ApiError, CartLine, StorefrontApi};
use crate::error::{CheckoutError, ValidationError};

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    lines: Vec<CartLine>,
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// A cart holding `lines`, as if just loaded.
    #[must_use]
    pub const fn from_lines(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    /// Replace the local lines with the backend's current cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Auth` without a request when there is no
    /// session, and `CheckoutError::Network` when the fetch fails. The
    /// previous lines are kept on failure.
    #[instrument(skip_all)]
    pub async fn load<A: StorefrontApi + ?Sized>(&mut self, api: &A) -> Result<(), CheckoutError> {
        let lines = api
            .get_cart()
            .await
            .map_err(|e| CheckoutError::from(e).reported())?;
        debug!(line_count = lines.len(), "Cart loaded");
        self.lines = lines;
        Ok(())
    }

    /// Change a line's quantity.
    ///
    /// The quantity must lie in `[1, stock_available]` for the line; anything
    /// else is rejected before a request is made.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown line or an out-of-range
    /// quantity, or the mapped API error when the update fails.
    #[instrument(skip(self, api))]
    pub async fn set_quantity<A: StorefrontApi + ?Sized>(
        &mut self,
        api: &A,
        line_id: LineId,
        quantity: u32,
    ) -> Result<(), CheckoutError> {
        let line = self
            .line(line_id)
            .ok_or(ValidationError::UnknownLine(line_id))?;
        if !line.accepts_quantity(quantity) {
            return Err(CheckoutError::from(ValidationError::QuantityOutOfRange {
                requested: quantity,
                stock: line.stock_available,
            }));
        }

        let updated = api
            .update_cart_line(line_id, quantity)
            .await
            .map_err(|e| CheckoutError::from(e).reported())?;

        if let Some(slot) = self.lines.iter_mut().find(|l| l.line_id == line_id) {
            *slot = updated;
        }
        debug!(quantity, total = %self.total(), "Cart line updated");
        Ok(())
    }

    /// Remove a line once the backend confirms the deletion.
    ///
    /// Removing a line that is not in the cart does nothing. A 404 from the
    /// backend counts as confirmation.
    ///
    /// # Errors
    ///
    /// Returns the mapped API error when the deletion fails; the line stays.
    #[instrument(skip(self, api))]
    pub async fn remove_line<A: StorefrontApi + ?Sized>(
        &mut self,
        api: &A,
        line_id: LineId,
    ) -> Result<(), CheckoutError> {
        if self.line(line_id).is_none() {
            return Ok(());
        }

        match api.delete_cart_line(line_id).await {
            Ok(()) => {}
            Err(ApiError::NotFound { .. }) => debug!("Line already gone on the backend"),
            Err(e) => return Err(CheckoutError::from(e).reported()),
        }

        self.lines.retain(|line| line.line_id != line_id);
        debug!(total = %self.total(), "Cart line removed");
        Ok(())
    }

    /// Drop every line locally.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Current lines.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up a line by ID.
    #[must_use]
    pub fn line(&self, line_id: LineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.line_id == line_id)
    }

    /// `Σ quantity × unit_price` over the current lines.
    #[must_use]
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use pantry_core::ProductId;

    use super::*;
    use crate::api::MockStorefrontApi;

    pub(crate) fn line(id: i64, quantity: u32, unit_price: i64, stock: u32) -> CartLine {
        CartLine {
            line_id: LineId::new(id),
            product_id: ProductId::new(id * 10),
            quantity,
            unit_price: Money::from_minor(unit_price),
            product_name: format!("Product {id}"),
            product_image: None,
            stock_available: stock,
        }
    }

    #[tokio::test]
    async fn test_load_replaces_lines() {
        let mut api = MockStorefrontApi::new();
        api.expect_get_cart()
            .once()
            .return_once(|| Ok(vec![line(1, 2, 50_000, 10), line(2, 1, 20_000, 3)]));

        let mut cart = CartState::new();
        cart.load(&api).await.unwrap();

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.total(), Money::from_minor(120_000));
        assert_eq!(cart.item_count(), 3);
    }

    #[tokio::test]
    async fn test_load_auth_error_keeps_state() {
        let mut api = MockStorefrontApi::new();
        api.expect_get_cart()
            .once()
            .return_once(|| Err(ApiError::Unauthorized));

        let mut cart = CartState::from_lines(vec![line(1, 1, 1000, 5)]);
        let err = cart.load(&api).await.unwrap_err();

        assert!(matches!(err, CheckoutError::Auth));
        assert_eq!(cart.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_set_quantity_updates_from_server() {
        let mut api = MockStorefrontApi::new();
        api.expect_update_cart_line()
            .once()
            .withf(|id, qty| *id == LineId::new(1) && *qty == 3)
            .return_once(|_, _| Ok(line(1, 3, 50_000, 10)));

        let mut cart = CartState::from_lines(vec![line(1, 2, 50_000, 10)]);
        cart.set_quantity(&api, LineId::new(1), 3).await.unwrap();

        assert_eq!(cart.line(LineId::new(1)).unwrap().quantity, 3);
        assert_eq!(cart.total(), Money::from_minor(150_000));
    }

    #[tokio::test]
    async fn test_set_quantity_out_of_range_sends_nothing() {
        let mut api = MockStorefrontApi::new();
        api.expect_update_cart_line().never();

        let mut cart = CartState::from_lines(vec![line(1, 2, 50_000, 4)]);

        let err = cart.set_quantity(&api, LineId::new(1), 0).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Validation(ValidationError::QuantityOutOfRange { requested: 0, stock: 4 })
        ));

        let err = cart.set_quantity(&api, LineId::new(1), 5).await.unwrap_err();
        assert!(err.is_validation());

        let err = cart.set_quantity(&api, LineId::new(9), 1).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Validation(ValidationError::UnknownLine(_))
        ));

        assert_eq!(cart.line(LineId::new(1)).unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn test_set_quantity_failure_keeps_state() {
        let mut api = MockStorefrontApi::new();
        api.expect_update_cart_line().once().return_once(|_, _| {
            Err(ApiError::Api {
                status: 500,
                message: None,
            })
        });

        let mut cart = CartState::from_lines(vec![line(1, 2, 50_000, 10)]);
        let err = cart.set_quantity(&api, LineId::new(1), 4).await.unwrap_err();

        assert!(matches!(err, CheckoutError::Network(_)));
        assert_eq!(cart.line(LineId::new(1)).unwrap().quantity, 2);
        assert_eq!(cart.total(), Money::from_minor(100_000));
    }

    #[tokio::test]
    async fn test_remove_line_after_confirmation() {
        let mut api = MockStorefrontApi::new();
        api.expect_delete_cart_line()
            .once()
            .withf(|id| *id == LineId::new(2))
            .return_once(|_| Ok(()));

        let mut cart = CartState::from_lines(vec![line(1, 1, 1000, 5), line(2, 1, 2000, 5)]);
        cart.remove_line(&api, LineId::new(2)).await.unwrap();

        assert!(cart.line(LineId::new(2)).is_none());
        assert_eq!(cart.total(), Money::from_minor(1000));

        // Second removal is a no-op with no request
        cart.remove_line(&api, LineId::new(2)).await.unwrap();
        assert_eq!(cart.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_line_not_found_counts_as_removed() {
        let mut api = MockStorefrontApi::new();
        api.expect_delete_cart_line()
            .once()
            .return_once(|_| {
                Err(ApiError::NotFound {
                    path: "cart/1".to_string(),
                    message: None,
                })
            });

        let mut cart = CartState::from_lines(vec![line(1, 1, 1000, 5)]);
        cart.remove_line(&api, LineId::new(1)).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_remove_line_failure_keeps_line() {
        let mut api = MockStorefrontApi::new();
        api.expect_delete_cart_line()
            .once()
            .return_once(|_| Err(ApiError::Parse("timeout".to_string())));

        let mut cart = CartState::from_lines(vec![line(1, 1, 1000, 5)]);
        assert!(cart.remove_line(&api, LineId::new(1)).await.is_err());
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_total_of_empty_cart_is_zero() {
        let cart = CartState::new();
        assert!(cart.total().is_zero());
        assert_eq!(cart.item_count(), 0);
    }
}
