//! Core types for Pantry.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod id;
pub mod loyalty;
pub mod price;
pub mod status;

pub use address::{AddressError, ShippingAddress};
pub use id::*;
pub use loyalty::{
    LoyaltyBalance, POINT_VALUE, PointsInput, discount_for_points, final_amount, points_to_cover,
};
pub use price::{CurrencyCode, Money};
pub use status::*;
