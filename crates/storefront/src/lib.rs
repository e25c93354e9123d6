//! Pantry storefront: cart and checkout.
//!
//! The library holds the cart state, the checkout orchestrator, the payment
//! gateway return handling and the typed backend client, plus the small HTTP
//! surface the binary serves (gateway return URL and confirmation views).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod notify;
pub mod routes;
pub mod session;
pub mod state;

pub use cart::CartState;
pub use checkout::{CheckoutOrchestrator, CheckoutStage, Navigation, OrderDraft};
pub use error::{CheckoutError, ValidationError};
pub use gateway::{GatewayReturn, PaymentOutcome};
pub use session::SessionContext;
