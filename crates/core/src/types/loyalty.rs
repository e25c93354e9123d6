//! Loyalty points and their conversion into an order discount.
//!
//! One point is worth [`POINT_VALUE`] minor currency units. The balance is a
//! read-only snapshot; redemption only happens server-side once an order that
//! uses points is created.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::price::Money;

/// Value of a single loyalty point, in minor currency units.
pub const POINT_VALUE: i64 = 1000;

/// A customer's redeemable loyalty balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyBalance {
    /// Points available for redemption.
    pub total_points: u32,
}

impl LoyaltyBalance {
    /// Create a balance snapshot.
    #[must_use]
    pub const fn new(total_points: u32) -> Self {
        Self { total_points }
    }

    /// Clamp a requested redemption to what the balance allows.
    #[must_use]
    pub fn clamp(&self, points: u32) -> u32 {
        points.min(self.total_points)
    }
}

/// Points typed into the checkout form, already clamped to the balance.
///
/// Raw form input can be negative or exceed the balance; this is where it is
/// brought into `[0, total_points]` before the checkout logic ever sees it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointsInput(u32);

impl PointsInput {
    /// Accept raw user input against the current balance.
    ///
    /// ```
    /// use pantry_core::{LoyaltyBalance, PointsInput};
    ///
    /// let balance = LoyaltyBalance::new(100);
    /// assert_eq!(PointsInput::accept(150, balance).points(), 100);
    /// assert_eq!(PointsInput::accept(-5, balance).points(), 0);
    /// assert_eq!(PointsInput::accept(30, balance).points(), 30);
    /// ```
    #[must_use]
    pub fn accept(raw: i64, balance: LoyaltyBalance) -> Self {
        let non_negative = u32::try_from(raw.max(0)).unwrap_or(u32::MAX);
        Self(balance.clamp(non_negative))
    }

    /// The accepted number of points.
    #[must_use]
    pub const fn points(self) -> u32 {
        self.0
    }
}

/// Discount granted for redeeming `points`.
#[must_use]
pub fn discount_for_points(points: u32) -> Money {
    Money::from_minor(POINT_VALUE) * points
}

/// Amount payable after redeeming `points` against `total`, never below zero.
#[must_use]
pub fn final_amount(total: Money, points: u32) -> Money {
    let discount = discount_for_points(points);
    total.saturating_sub(Money::new(discount.amount, total.currency_code))
}

/// Whole points needed to bring `total` down to zero.
#[must_use]
pub fn points_to_cover(total: Money) -> u32 {
    let value = Decimal::from(POINT_VALUE);
    let needed = (total.amount / value).ceil();
    needed.to_u32().unwrap_or(u32::MAX)
}
