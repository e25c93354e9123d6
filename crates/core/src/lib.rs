//! Pantry Core - Shared types library.
//!
//! This crate provides common types used across all Pantry components:
//! - `storefront` - Cart, checkout and payment-gateway return handling
//! - `integration-tests` - End-to-end tests against a fake backend
//!
//! # Architecture
//!
//! The core crate contains only types and pure pricing rules - no I/O, no
//! HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, addresses,
//!   statuses and loyalty-point arithmetic

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
