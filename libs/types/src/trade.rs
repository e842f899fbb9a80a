//! Fill and trade record types
//!
//! Every match produces exactly two fills, aggressor first and passive
//! second, adjacent in the returned sequence. A [`TradeRecord`] is the
//! per-match view derived from such a pair.

use crate::ids::{InstrumentId, OrderId, UserId};
use crate::numeric::{Price, Quantity};
use crate::order::{Order, Side};
use serde::{Deserialize, Serialize};

/// One side's execution in a single match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub instrument_id: InstrumentId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    /// Nanoseconds since engine start; both fills of a match carry the
    /// same value.
    pub timestamp: i64,
}

impl Fill {
    /// Build the fill an order receives for `quantity` at `price`.
    pub fn for_order(order: &Order, price: Price, quantity: Quantity, timestamp: i64) -> Self {
        Self {
            order_id: order.id,
            user_id: order.user_id,
            instrument_id: order.instrument_id,
            side: order.side,
            price,
            quantity,
            timestamp,
        }
    }

    /// Quantity signed by side: positive for BUY, negative for SELL.
    pub fn signed_quantity(&self) -> Quantity {
        match self.side {
            Side::BUY => self.quantity,
            Side::SELL => -self.quantity,
        }
    }
}

/// One record per match, with buyer and seller resolved
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub instrument_id: InstrumentId,
    pub price: Price,
    pub quantity: Quantity,
    pub timestamp: i64,
}

impl TradeRecord {
    /// Derive a trade record from a matched fill pair (aggressor first).
    pub fn from_fill_pair(aggressor: &Fill, passive: &Fill) -> Self {
        let (buy, sell) = match aggressor.side {
            Side::BUY => (aggressor, passive),
            Side::SELL => (passive, aggressor),
        };

        Self {
            buy_order_id: buy.order_id,
            sell_order_id: sell.order_id,
            buyer_id: buy.user_id,
            seller_id: sell.user_id,
            instrument_id: aggressor.instrument_id,
            price: aggressor.price,
            quantity: aggressor.quantity,
            timestamp: aggressor.timestamp,
        }
    }
}
