//! User-facing notices for checkout errors.
//!
//! Validation failures are shown inline next to the input that caused them;
//! missing or rejected sessions prompt a sign-in; everything else becomes a
//! dismissible notification carrying the backend's own message when it sent
//! one.

use serde::Serialize;

use crate::error::CheckoutError;

/// How a notice is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Next to the offending input; blocks submission.
    Inline,
    /// "Please sign in" prompt; no further action is taken.
    SignIn,
    /// Toast-style notification the user can dismiss.
    Dismissible,
}

/// A message to show the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

const SIGN_IN_MESSAGE: &str = "Please sign in to continue.";
const NETWORK_MESSAGE: &str = "We couldn't reach the store. Please check your connection and try again.";
const ORDER_FALLBACK: &str = "We couldn't place your order. Please try again.";

impl From<&CheckoutError> for Notice {
    fn from(err: &CheckoutError) -> Self {
        match err {
            CheckoutError::Validation(validation) => Self {
                kind: NoticeKind::Inline,
                message: capitalize(&validation.to_string()),
            },
            CheckoutError::Auth => Self {
                kind: NoticeKind::SignIn,
                message: SIGN_IN_MESSAGE.to_string(),
            },
            CheckoutError::Network(source) => Self {
                kind: NoticeKind::Dismissible,
                message: source
                    .backend_message()
                    .map_or_else(|| NETWORK_MESSAGE.to_string(), String::from),
            },
            CheckoutError::OrderCreation { message } => Self {
                kind: NoticeKind::Dismissible,
                message: message.clone().unwrap_or_else(|| ORDER_FALLBACK.to_string()),
            },
            CheckoutError::PaymentInit { order_id, message } => Self {
                kind: NoticeKind::Dismissible,
                message: message.clone().unwrap_or_else(|| {
                    format!(
                        "Order #{order_id} was placed but payment could not be started. \
                         You can retry payment for this order."
                    )
                }),
            },
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
