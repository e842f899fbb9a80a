//! Per-instrument order book
//!
//! The book is the single owner of its resting orders: an id-keyed
//! arena plus the bid/ask price structures holding ids. Matching walks
//! the best opposite level front-to-back, so price-time priority falls
//! out of the data layout.

use std::collections::HashMap;

use types::ids::{InstrumentId, OrderId};
use types::market::MarketSnapshot;
use types::numeric::Price;
use types::order::{Order, OrderStatus, Side, TimeInForce};
use types::trade::Fill;

use super::ask_book::AskBook;
use super::bid_book::BidBook;

/// Order book for a single instrument
#[derive(Debug, Default)]
pub struct OrderBook {
    instrument_id: InstrumentId,
    bids: BidBook,
    asks: AskBook,
    /// Arena of resting orders; levels reference into it by id.
    orders: HashMap<OrderId, Order>,
    /// Last traded price; zero until the first match.
    last_price: Price,
}

impl OrderBook {
    /// Create an empty book for an instrument
    pub fn new(instrument_id: InstrumentId) -> Self {
        Self {
            instrument_id,
            bids: BidBook::new(),
            asks: AskBook::new(),
            orders: HashMap::new(),
            last_price: Price::ZERO,
        }
    }

    /// Submit an order: match against the opposite side, then book any
    /// remainder according to time-in-force.
    ///
    /// Returns the order's final status and the fills produced, one
    /// aggressor/passive pair per match, aggressor first. A post-only
    /// order that would cross is rejected before any fill and leaves
    /// the book untouched.
    pub fn add_order(&mut self, mut order: Order, now: i64) -> (OrderStatus, Vec<Fill>) {
        let mut fills = Vec::new();

        let rejected = match order.side {
            Side::BUY => self.match_buy(&mut order, &mut fills, now),
            Side::SELL => self.match_sell(&mut order, &mut fills, now),
        };

        if rejected {
            return (OrderStatus::Rejected, fills);
        }

        if order.is_filled() {
            return (OrderStatus::Filled, fills);
        }

        if order.tif == TimeInForce::IOC {
            order.status = OrderStatus::Cancelled;
            return (OrderStatus::Cancelled, fills);
        }

        order.status = if order.has_fills() {
            OrderStatus::Partial
        } else {
            OrderStatus::Pending
        };
        let status = order.status;

        match order.side {
            Side::BUY => self.bids.insert(order.price, order.id),
            Side::SELL => self.asks.insert(order.price, order.id),
        }
        self.orders.insert(order.id, order);

        (status, fills)
    }

    /// Match an incoming buy against the asks, lowest price first.
    ///
    /// Returns true if the order is post-only and would have crossed.
    fn match_buy(&mut self, order: &mut Order, fills: &mut Vec<Fill>, now: i64) -> bool {
        while order.remaining().is_positive() {
            let Some(best) = self.asks.best_price() else {
                break;
            };
            if order.price < best {
                break;
            }
            if order.post_only {
                return true;
            }

            let Some(passive_id) = self.asks.front_at(best) else {
                break;
            };
            let Some(passive) = self.orders.get_mut(&passive_id) else {
                // Dangling level entry; drop it and keep walking
                self.asks.drop_front(best);
                continue;
            };

            let match_qty = order.remaining().min(passive.remaining());
            passive.add_fill(match_qty);
            let passive_fill = Fill::for_order(passive, best, match_qty, now);
            let exhausted = passive.is_filled();

            order.add_fill(match_qty);
            fills.push(Fill::for_order(order, best, match_qty, now));
            fills.push(passive_fill);

            self.last_price = best;

            if exhausted {
                self.asks.drop_front(best);
                self.orders.remove(&passive_id);
            }
        }
        false
    }

    /// Match an incoming sell against the bids, highest price first.
    ///
    /// Returns true if the order is post-only and would have crossed.
    fn match_sell(&mut self, order: &mut Order, fills: &mut Vec<Fill>, now: i64) -> bool {
        while order.remaining().is_positive() {
            let Some(best) = self.bids.best_price() else {
                break;
            };
            if order.price > best {
                break;
            }
            if order.post_only {
                return true;
            }

            let Some(passive_id) = self.bids.front_at(best) else {
                break;
            };
            let Some(passive) = self.orders.get_mut(&passive_id) else {
                self.bids.drop_front(best);
                continue;
            };

            let match_qty = order.remaining().min(passive.remaining());
            passive.add_fill(match_qty);
            let passive_fill = Fill::for_order(passive, best, match_qty, now);
            let exhausted = passive.is_filled();

            order.add_fill(match_qty);
            fills.push(Fill::for_order(order, best, match_qty, now));
            fills.push(passive_fill);

            self.last_price = best;

            if exhausted {
                self.bids.drop_front(best);
                self.orders.remove(&passive_id);
            }
        }
        false
    }

    /// Remove a resting order
    ///
    /// Returns false for unknown (or already terminal) ids; the first
    /// success is the only one.
    pub fn cancel_order(&mut self, order_id: OrderId) -> bool {
        let Some(order) = self.orders.remove(&order_id) else {
            return false;
        };
        match order.side {
            Side::BUY => self.bids.remove(&order_id, order.price),
            Side::SELL => self.asks.remove(&order_id, order.price),
        };
        true
    }

    /// Look up a resting order by id
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    /// All resting orders, in id (submission) order
    pub fn resting_orders(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.orders.values().cloned().collect();
        orders.sort_by_key(|order| order.id);
        orders
    }

    /// Aggregate the top `depth` levels per side
    pub fn snapshot(&self, depth: usize, now: i64) -> MarketSnapshot {
        MarketSnapshot {
            instrument_id: self.instrument_id,
            bids: self.bids.depth_snapshot(depth, &self.orders),
            asks: self.asks.depth_snapshot(depth, &self.orders),
            last_price: self.last_price,
            timestamp: now,
        }
    }

    /// Best bid price; zero when the side is empty
    pub fn best_bid(&self) -> Price {
        self.bids.best_price().unwrap_or(Price::ZERO)
    }

    /// Best ask price; zero when the side is empty
    pub fn best_ask(&self) -> Price {
        self.asks.best_price().unwrap_or(Price::ZERO)
    }

    /// Last traded price; zero until the first match
    pub fn last_price(&self) -> Price {
        self.last_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::UserId;
    use types::numeric::Quantity;
    use types::order::OrderRequest;

    fn book() -> OrderBook {
        OrderBook::new(InstrumentId::new(1))
    }

    fn order(id: u64, user: u32, side: Side, price: i64, qty: i64) -> Order {
        let request = OrderRequest::new(
            UserId::new(user),
            InstrumentId::new(1),
            side,
            Price::new(price),
            Quantity::new(qty),
        );
        Order::from_request(OrderId::new(id), &request, id as i64)
    }

    fn ioc(id: u64, user: u32, side: Side, price: i64, qty: i64) -> Order {
        let mut order = order(id, user, side, price, qty);
        order.tif = TimeInForce::IOC;
        order
    }

    #[test]
    fn test_resting_order_no_fills() {
        let mut book = book();
        let (status, fills) = book.add_order(order(1, 1, Side::BUY, 10000, 100), 0);

        assert_eq!(status, OrderStatus::Pending);
        assert!(fills.is_empty());
        assert_eq!(book.best_bid(), Price::new(10000));
        assert_eq!(book.best_ask(), Price::ZERO);
    }

    #[test]
    fn test_simple_match_emits_fill_pair() {
        let mut book = book();
        book.add_order(order(1, 1, Side::BUY, 10000, 100), 0);
        let (status, fills) = book.add_order(order(2, 2, Side::SELL, 10000, 100), 1);

        assert_eq!(status, OrderStatus::Filled);
        assert_eq!(fills.len(), 2);

        // Aggressor first, passive second, same price/quantity/timestamp
        assert_eq!(fills[0].order_id, OrderId::new(2));
        assert_eq!(fills[0].side, Side::SELL);
        assert_eq!(fills[1].order_id, OrderId::new(1));
        assert_eq!(fills[1].side, Side::BUY);
        assert_eq!(fills[0].price, fills[1].price);
        assert_eq!(fills[0].quantity, fills[1].quantity);
        assert_eq!(fills[0].timestamp, fills[1].timestamp);

        assert_eq!(book.last_price(), Price::new(10000));
        assert!(book.order(OrderId::new(1)).is_none());
    }

    #[test]
    fn test_execution_at_passive_price() {
        let mut book = book();
        book.add_order(order(1, 1, Side::SELL, 10000, 100), 0);
        let (_, fills) = book.add_order(order(2, 2, Side::BUY, 10500, 100), 1);

        assert_eq!(fills[0].price, Price::new(10000));
        assert_eq!(book.last_price(), Price::new(10000));
    }

    #[test]
    fn test_partial_fill_rests_remainder() {
        let mut book = book();
        book.add_order(order(1, 1, Side::SELL, 10000, 40), 0);
        let (status, fills) = book.add_order(order(2, 2, Side::BUY, 10000, 100), 1);

        assert_eq!(status, OrderStatus::Partial);
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].quantity, Quantity::new(40));

        let resting = book.order(OrderId::new(2)).unwrap();
        assert_eq!(resting.remaining(), Quantity::new(60));
        assert_eq!(book.best_bid(), Price::new(10000));
    }

    #[test]
    fn test_walks_levels_best_first() {
        let mut book = book();
        book.add_order(order(1, 1, Side::SELL, 10100, 50), 0);
        book.add_order(order(2, 2, Side::SELL, 10000, 50), 1);
        let (status, fills) = book.add_order(order(3, 3, Side::BUY, 10100, 100), 2);

        assert_eq!(status, OrderStatus::Filled);
        assert_eq!(fills.len(), 4);
        // Cheapest ask first
        assert_eq!(fills[0].price, Price::new(10000));
        assert_eq!(fills[1].order_id, OrderId::new(2));
        assert_eq!(fills[2].price, Price::new(10100));
        assert_eq!(fills[3].order_id, OrderId::new(1));
        assert_eq!(book.last_price(), Price::new(10100));
        assert!(book.asks.is_empty());
    }

    #[test]
    fn test_fifo_at_same_price() {
        let mut book = book();
        book.add_order(order(1, 1, Side::BUY, 10000, 100), 0);
        book.add_order(order(2, 2, Side::BUY, 10000, 100), 1);
        book.add_order(order(3, 3, Side::BUY, 10000, 100), 2);

        let (_, fills) = book.add_order(order(9, 9, Side::SELL, 10000, 150), 3);

        // First booked fills first, second gets the remainder
        assert_eq!(fills.len(), 4);
        assert_eq!(fills[1].order_id, OrderId::new(1));
        assert_eq!(fills[1].quantity, Quantity::new(100));
        assert_eq!(fills[3].order_id, OrderId::new(2));
        assert_eq!(fills[3].quantity, Quantity::new(50));

        assert!(book.order(OrderId::new(1)).is_none());
        assert_eq!(
            book.order(OrderId::new(2)).unwrap().status,
            OrderStatus::Partial
        );
        assert_eq!(
            book.order(OrderId::new(3)).unwrap().status,
            OrderStatus::Pending
        );
    }

    #[test]
    fn test_ioc_partial_not_booked() {
        let mut book = book();
        book.add_order(order(1, 1, Side::BUY, 10000, 50), 0);
        let (status, fills) = book.add_order(ioc(2, 2, Side::SELL, 10000, 100), 1);

        assert_eq!(status, OrderStatus::Cancelled);
        assert_eq!(fills.len(), 2);
        assert!(book.order(OrderId::new(2)).is_none());
        assert_eq!(book.best_ask(), Price::ZERO);
    }

    #[test]
    fn test_ioc_unmatched_cancelled() {
        let mut book = book();
        let (status, fills) = book.add_order(ioc(1, 1, Side::SELL, 10000, 100), 0);

        assert_eq!(status, OrderStatus::Cancelled);
        assert!(fills.is_empty());
        assert!(book.asks.is_empty());
    }

    #[test]
    fn test_post_only_cross_rejected_atomically() {
        let mut book = book();
        book.add_order(order(1, 1, Side::BUY, 10000, 100), 0);

        let mut crossing = order(2, 2, Side::SELL, 10000, 100);
        crossing.post_only = true;
        let (status, fills) = book.add_order(crossing, 1);

        assert_eq!(status, OrderStatus::Rejected);
        assert!(fills.is_empty());
        assert!(book.order(OrderId::new(2)).is_none());

        // Resting bid untouched
        let snapshot = book.snapshot(10, 2);
        assert_eq!(snapshot.bids.len(), 1);
        assert_eq!(snapshot.bids[0].price, Price::new(10000));
        assert_eq!(snapshot.bids[0].size, Quantity::new(100));
    }

    #[test]
    fn test_post_only_no_cross_rests() {
        let mut book = book();
        book.add_order(order(1, 1, Side::BUY, 9900, 100), 0);

        let mut passive = order(2, 2, Side::SELL, 10000, 100);
        passive.post_only = true;
        let (status, _) = book.add_order(passive, 1);

        assert_eq!(status, OrderStatus::Pending);
        assert_eq!(book.best_ask(), Price::new(10000));
    }

    #[test]
    fn test_price_zero_is_matchable() {
        let mut book = book();
        book.add_order(order(1, 1, Side::SELL, 0, 10), 0);
        let (status, fills) = book.add_order(order(2, 2, Side::BUY, 0, 10), 1);

        assert_eq!(status, OrderStatus::Filled);
        assert_eq!(fills[0].price, Price::ZERO);
    }

    #[test]
    fn test_cancel_idempotent() {
        let mut book = book();
        book.add_order(order(1, 1, Side::BUY, 10000, 100), 0);

        assert!(book.cancel_order(OrderId::new(1)));
        assert!(!book.cancel_order(OrderId::new(1)));
        assert!(book.bids.is_empty());
    }

    #[test]
    fn test_self_match_allowed() {
        let mut book = book();
        book.add_order(order(1, 7, Side::BUY, 10000, 100), 0);
        let (status, fills) = book.add_order(order(2, 7, Side::SELL, 10000, 100), 1);

        assert_eq!(status, OrderStatus::Filled);
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].user_id, fills[1].user_id);
    }

    #[test]
    fn test_snapshot_depth_limit() {
        let mut book = book();
        for i in 0..5 {
            book.add_order(order(i + 1, 1, Side::BUY, 10000 - i as i64 * 100, 10), 0);
        }

        let snapshot = book.snapshot(3, 0);
        assert_eq!(snapshot.bids.len(), 3);
        assert_eq!(snapshot.bids[0].price, Price::new(10000));
        assert_eq!(snapshot.bids[2].price, Price::new(9800));
    }

    #[test]
    fn test_resting_orders_in_submission_order() {
        let mut book = book();
        book.add_order(order(3, 1, Side::BUY, 9900, 10), 0);
        book.add_order(order(1, 1, Side::BUY, 10000, 10), 1);
        book.add_order(order(2, 2, Side::SELL, 10200, 10), 2);

        let ids: Vec<_> = book.resting_orders().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![OrderId::new(1), OrderId::new(2), OrderId::new(3)]);
    }
}
