//! Type-safe price representation using decimal arithmetic.
//!
//! The shop trades in a single currency (Omani rial, shown to customers as
//! "ریال"), so a price is just a decimal amount. On the wire it is a plain
//! JSON number; in `SQLite` it is stored as `REAL` and converted at the
//! repository boundary with [`Price::from_f64`] / [`Price::to_f64`].

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

/// Errors that can occur when converting a float into a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PriceError {
    /// The float is NaN or infinite.
    #[error("price must be a finite number (got {0})")]
    NotFinite(f64),
}

/// A monetary amount in the shop currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// A zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Convert a float (as stored in `SQLite`) into a price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::NotFinite` for NaN and infinities.
    pub fn from_f64(value: f64) -> Result<Self, PriceError> {
        Decimal::from_f64(value)
            .map(Self)
            .ok_or(PriceError::NotFinite(value))
    }

    /// The float representation used for storage.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// The amount in minor units (`per_unit` of them per whole unit), rounded
    /// half away from zero. `None` if it does not fit in an `i64`.
    #[must_use]
    pub fn to_minor_units(self, per_unit: u32) -> Option<i64> {
        (self.0 * Decimal::from(per_unit))
            .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
