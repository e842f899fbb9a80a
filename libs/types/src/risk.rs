//! Risk limit types
//!
//! Limits are keyed by user; a user with no limits set is unrestricted.
//! Only `max_position` is enforced by the pre-trade gate today;
//! `max_notional` and `max_orders_per_sec` are carried for callers that
//! extend the gate.

use crate::numeric::Quantity;
use serde::{Deserialize, Serialize};

/// Per-user risk limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Maximum absolute net position per instrument.
    pub max_position: Quantity,
    /// Maximum total notional exposure (unenforced).
    pub max_notional: f64,
    /// Order rate limit (unenforced).
    pub max_orders_per_sec: u32,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position: Quantity::new(10_000),
            max_notional: 1_000_000.0,
            max_orders_per_sec: 50,
        }
    }
}

impl RiskLimits {
    /// Limits with a specific position cap and default everything else.
    pub fn with_max_position(max_position: Quantity) -> Self {
        Self {
            max_position,
            ..Self::default()
        }
    }
}
