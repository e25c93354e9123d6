//! Shipping address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShippingAddress`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The input is empty or whitespace only.
    #[error("shipping address required")]
    Empty,
    /// The input is too long.
    #[error("shipping address must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A free-form delivery address.
///
/// The backend stores the address as a single string, so validation is kept to
/// what the checkout form can enforce: the address must contain something
/// other than whitespace and fit the backend column.
///
/// ## Examples
///
/// ```
/// use pantry_core::ShippingAddress;
///
/// let address = ShippingAddress::parse("  12 Hang Bac, Hoan Kiem, Ha Noi ").unwrap();
/// assert_eq!(address.as_str(), "12 Hang Bac, Hoan Kiem, Ha Noi");
///
/// assert!(ShippingAddress::parse("").is_err());
/// assert!(ShippingAddress::parse(" \t\n").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ShippingAddress(String);

impl ShippingAddress {
    /// Maximum length of an address, in characters.
    pub const MAX_LENGTH: usize = 500;

    /// Parse a `ShippingAddress`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or longer than
    /// [`Self::MAX_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }

        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(AddressError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShippingAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ShippingAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShippingAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShippingAddress> for String {
    fn from(address: ShippingAddress) -> Self {
        address.0
    }
}

impl AsRef<str> for ShippingAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
