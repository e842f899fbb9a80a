//! Market depth snapshot types

use crate::ids::InstrumentId;
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Aggregated size at one price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Price,
    /// Sum of remaining quantity across resting orders at this price.
    pub size: Quantity,
}

impl DepthLevel {
    pub fn new(price: Price, size: Quantity) -> Self {
        Self { price, size }
    }
}

/// Top-of-book depth for one instrument
///
/// An unknown instrument yields the default snapshot, identifiable by
/// `instrument_id == InstrumentId::NONE`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub instrument_id: InstrumentId,
    /// Best bid first (highest price).
    pub bids: Vec<DepthLevel>,
    /// Best ask first (lowest price).
    pub asks: Vec<DepthLevel>,
    /// Last traded price; zero until the first match.
    pub last_price: Price,
    pub timestamp: i64,
}
