//! Fixed-point integer types for prices and quantities
//!
//! Prices are signed 64-bit integers in minor currency units ("cents").
//! Quantities are signed 64-bit integers; order quantities are positive,
//! position quantities carry sign (negative = short). Currency-valued
//! outputs (P&L) are f64, derived by dividing by [`PRICE_SCALE`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Minor units per whole currency unit.
pub const PRICE_SCALE: i64 = 100;

/// Price in fixed-point minor units
///
/// A price of 10000 is 100.00 in currency terms. Zero is a legal order
/// price; in best-bid/ask reads zero means "no such side".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    pub const ZERO: Price = Price(0);

    pub const fn new(minor_units: i64) -> Self {
        Self(minor_units)
    }

    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Convert to currency units (e.g. 10050 -> 100.50).
    pub fn to_currency(&self) -> f64 {
        self.0 as f64 / PRICE_SCALE as f64
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Midpoint of two prices, rounded toward negative infinity in
    /// minor units.
    pub const fn midpoint(self, other: Price) -> Price {
        Price((self.0 + other.0) / 2)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quantity in contract units
///
/// Signed: order quantities are validated positive at the engine
/// boundary, while net position quantities use the sign for direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(i64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    pub const fn new(units: i64) -> Self {
        Self(units)
    }

    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    pub const fn abs(&self) -> Quantity {
        Quantity(self.0.abs())
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn min(self, other: Quantity) -> Quantity {
        Quantity(self.0.min(other.0))
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Quantity {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Quantity {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
