//! Instrument specifications and option payoffs
//!
//! Instruments are either plain scalars or cash-settled options on a
//! scalar. The payoff variants live on a sum type so settlement can
//! dispatch on kind without touching the rest of the spec.

use crate::ids::InstrumentId;
use crate::numeric::{Price, Quantity, PRICE_SCALE};
use serde::{Deserialize, Serialize};

/// Instrument payoff kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum InstrumentKind {
    /// Settles at the settlement value itself
    Scalar,
    /// Settles at max(settlement - strike, 0)
    Call { strike: Price },
    /// Settles at max(strike - settlement, 0)
    Put { strike: Price },
}

impl InstrumentKind {
    /// Intrinsic value per contract unit at settlement, in currency units.
    pub fn intrinsic_value(&self, settlement: Price) -> f64 {
        match self {
            InstrumentKind::Scalar => settlement.to_currency(),
            InstrumentKind::Call { strike } => {
                ((settlement.as_i64() - strike.as_i64()).max(0) as f64) / PRICE_SCALE as f64
            }
            InstrumentKind::Put { strike } => {
                ((strike.as_i64() - settlement.as_i64()).max(0) as f64) / PRICE_SCALE as f64
            }
        }
    }

    pub fn is_option(&self) -> bool {
        !matches!(self, InstrumentKind::Scalar)
    }
}

/// Complete instrument specification
///
/// Mutable only in `is_halted`; everything else is fixed at listing.
/// For options, `reference_id` points at the underlying scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub id: InstrumentId,
    pub symbol: String,
    pub kind: InstrumentKind,
    pub reference_id: InstrumentId,
    pub tick_size: Price,
    pub lot_size: Quantity,
    pub tick_value: f64,
    pub is_halted: bool,
}

impl InstrumentSpec {
    /// Create a scalar instrument with unit tick/lot conventions.
    pub fn scalar(id: InstrumentId, symbol: impl Into<String>) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            kind: InstrumentKind::Scalar,
            reference_id: InstrumentId::NONE,
            tick_size: Price::new(1),
            lot_size: Quantity::new(1),
            tick_value: 1.0,
            is_halted: false,
        }
    }

    /// Create a call option on `reference_id` struck at `strike`.
    pub fn call(
        id: InstrumentId,
        symbol: impl Into<String>,
        reference_id: InstrumentId,
        strike: Price,
    ) -> Self {
        Self {
            kind: InstrumentKind::Call { strike },
            reference_id,
            ..Self::scalar(id, symbol)
        }
    }

    /// Create a put option on `reference_id` struck at `strike`.
    pub fn put(
        id: InstrumentId,
        symbol: impl Into<String>,
        reference_id: InstrumentId,
        strike: Price,
    ) -> Self {
        Self {
            kind: InstrumentKind::Put { strike },
            reference_id,
            ..Self::scalar(id, symbol)
        }
    }
}
