//! Type-safe money representation using decimal arithmetic.
//!
//! Amounts are kept in the currency's minor unit as the backend reports them
//! (whole đồng for VND), never as floats.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul, Sub};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's minor unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Zero in the default currency.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(Decimal::ZERO, CurrencyCode::VND)
    }

    /// Amount in the default currency from an integer number of minor units.
    #[must_use]
    pub fn from_minor(units: i64) -> Self {
        Self::new(Decimal::from(units), CurrencyCode::VND)
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Subtract without going below zero.
    #[must_use]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        let amount = (self.amount - rhs.amount).max(Decimal::ZERO);
        Self::new(amount, self.currency_code)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.amount + rhs.amount, self.currency_code)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.amount - rhs.amount, self.currency_code)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self::new(self.amount * Decimal::from(rhs), self.currency_code)
    }
}

/// Sums in the currency of the first amount; an empty sum is zero in the
/// default currency.
impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(mut iter: I) -> Self {
        let Some(first) = iter.next() else {
            return Self::zero();
        };
        iter.fold(first, Add::add)
    }
}

impl fmt::Display for Money {
    /// Formats with thousands separators, e.g. `100.000 ₫`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.amount.round_dp(self.currency_code.minor_digits());
        let text = rounded.abs().to_string();
        let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, c) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(self.currency_code.group_separator());
            }
            grouped.push(c);
        }

        if rounded.is_sign_negative() && !rounded.is_zero() {
            f.write_str("-")?;
        }
        f.write_str(&grouped)?;
        if !fraction.is_empty() {
            write!(f, ",{fraction}")?;
        }
        write!(f, " {}", self.currency_code.symbol())
    }
}

/// ISO 4217 currency codes accepted by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    VND,
    USD,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::VND => "₫",
            Self::USD => "$",
        }
    }

    const fn minor_digits(self) -> u32 {
        match self {
            Self::VND => 0,
            Self::USD => 2,
        }
    }

    const fn group_separator(self) -> char {
        match self {
            Self::VND => '.',
            Self::USD => ',',
        }
    }
}
