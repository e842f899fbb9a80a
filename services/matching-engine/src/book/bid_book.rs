//! Bid (buy-side) order book
//!
//! Maintains buy orders keyed by price; the highest price is best.
//! BTreeMap keeps iteration deterministic, and at each price level
//! orders sit in FIFO order.

use std::collections::{BTreeMap, HashMap};
use types::ids::OrderId;
use types::market::DepthLevel;
use types::numeric::{Price, Quantity};
use types::order::Order;

use super::price_level::PriceLevel;

/// Bid (buy) side of a book
#[derive(Debug, Clone, Default)]
pub struct BidBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
    /// Create a new empty bid book
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Rest an order at its price level
    pub fn insert(&mut self, price: Price, order_id: OrderId) {
        self.levels.entry(price).or_default().push_back(order_id);
    }

    /// Remove an order from its price level, erasing the level if empty
    ///
    /// Returns true if the order was found and removed.
    pub fn remove(&mut self, order_id: &OrderId, price: Price) -> bool {
        if let Some(level) = self.levels.get_mut(&price) {
            if level.remove(order_id) {
                if level.is_empty() {
                    self.levels.remove(&price);
                }
                return true;
            }
        }
        false
    }

    /// Best bid price (highest)
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next_back().copied()
    }

    /// Front-of-queue order at `price`
    pub fn front_at(&self, price: Price) -> Option<OrderId> {
        self.levels.get(&price).and_then(|level| level.front())
    }

    /// Pop the front order at `price`, erasing the level if it empties
    pub fn drop_front(&mut self, price: Price) {
        if let Some(level) = self.levels.get_mut(&price) {
            level.pop_front();
            if level.is_empty() {
                self.levels.remove(&price);
            }
        }
    }

    /// Depth snapshot: top `depth` levels, best first, summing the
    /// remaining quantity of each resting order. Levels whose remaining
    /// total is zero are skipped.
    pub fn depth_snapshot(
        &self,
        depth: usize,
        orders: &HashMap<OrderId, Order>,
    ) -> Vec<DepthLevel> {
        self.levels
            .iter()
            .rev()
            .filter_map(|(price, level)| {
                let total: i64 = level
                    .iter()
                    .filter_map(|id| orders.get(id))
                    .map(|order| order.remaining().as_i64())
                    .sum();
                (total > 0).then(|| DepthLevel::new(*price, Quantity::new(total)))
            })
            .take(depth)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}
