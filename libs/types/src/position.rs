//! Position tracking and VWAP accounting
//!
//! A position is one (user, instrument) ledger row: signed net quantity,
//! volume-weighted average entry price, and realized P&L in currency
//! units. Unrealized P&L is recomputed from a mark price on demand.
//!
//! The average entry price is carried at full precision in `avg_entry`;
//! `vwap` is its fixed-point projection for display and depth-style
//! reads. All cost accounting (realized, unrealized, settlement cost
//! basis) uses the full-precision value, so P&L nets to zero across
//! counterparties even when a blend is not exactly representable in
//! minor units.
//!
//! Invariant: `net_qty == 0` implies `vwap == 0` (and `avg_entry == 0`).

use crate::ids::InstrumentId;
use crate::numeric::{Price, Quantity, PRICE_SCALE};
use crate::trade::Fill;
use serde::{Deserialize, Serialize};

/// Per-user, per-instrument position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub instrument_id: InstrumentId,
    /// Signed net quantity; negative means short.
    pub net_qty: Quantity,
    /// Volume-weighted average entry price of the open position, in
    /// minor units truncated to fixed point. Projection of `avg_entry`.
    pub vwap: Price,
    /// Full-precision average entry price in minor units; the source of
    /// truth for cost accounting.
    pub avg_entry: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
}

impl Position {
    /// Create a flat position for an instrument.
    pub fn new(instrument_id: InstrumentId) -> Self {
        Self {
            instrument_id,
            net_qty: Quantity::ZERO,
            vwap: Price::ZERO,
            avg_entry: 0.0,
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.net_qty.is_zero()
    }

    /// Apply one fill to the position.
    ///
    /// Opening sets the entry price to the fill price; adding blends it
    /// volume-weighted; reducing realizes P&L against the entry price
    /// and keeps it (resetting to zero when the position closes);
    /// flipping realizes the closing portion and re-opens at the fill
    /// price.
    pub fn apply_fill(&mut self, fill: &Fill) {
        let q = fill.signed_quantity().as_i64();
        let net = self.net_qty.as_i64();

        if net == 0 {
            self.net_qty = Quantity::new(q);
            self.set_entry(fill.price.as_i64() as f64);
        } else if (net > 0) == (q > 0) {
            // Adding to the position: blend the entry price by absolute size
            let abs_old = net.abs() as f64;
            let abs_new = q.abs() as f64;
            let blended =
                (self.avg_entry * abs_old + fill.price.as_i64() as f64 * abs_new)
                    / (abs_old + abs_new);
            self.set_entry(blended);
            self.net_qty = Quantity::new(net + q);
        } else {
            // Reducing or flipping: realize P&L on the closing portion
            let reduce = net.abs().min(q.abs());
            let mut pnl_per_unit =
                (fill.price.as_i64() as f64 - self.avg_entry) / PRICE_SCALE as f64;
            if net < 0 {
                pnl_per_unit = -pnl_per_unit;
            }
            self.realized_pnl += pnl_per_unit * reduce as f64;

            let post = net + q;
            self.net_qty = Quantity::new(post);
            if post == 0 {
                self.set_entry(0.0);
            } else if (post > 0) != (net > 0) {
                // Position flipped sides; remainder entered at fill price
                self.set_entry(fill.price.as_i64() as f64);
            }
        }
    }

    /// Store the full-precision entry price and its fixed-point
    /// projection together.
    fn set_entry(&mut self, avg_entry: f64) {
        self.avg_entry = avg_entry;
        self.vwap = Price::new(avg_entry as i64);
    }

    /// Unrealized P&L at `mark`, in currency units.
    ///
    /// Zero for flat positions and when no mark exists (`mark <= 0`).
    pub fn unrealized_at(&self, mark: Price) -> f64 {
        if !self.is_open() || !mark.is_positive() {
            return 0.0;
        }
        (mark.as_i64() as f64 - self.avg_entry) / PRICE_SCALE as f64
            * self.net_qty.as_i64() as f64
    }

    /// Cost of the open position in currency units: average entry price
    /// times signed quantity. Full precision, for settlement netting.
    pub fn entry_cost(&self) -> f64 {
        self.avg_entry / PRICE_SCALE as f64 * self.net_qty.as_i64() as f64
    }

    /// Fold a terminal cash settlement into realized P&L and flatten.
    pub fn crystallize(&mut self, settlement_pnl: f64) {
        self.realized_pnl += settlement_pnl;
        self.net_qty = Quantity::ZERO;
        self.set_entry(0.0);
        self.unrealized_pnl = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{OrderId, UserId};
    use crate::order::Side;

    fn fill(side: Side, price: i64, qty: i64) -> Fill {
        Fill {
            order_id: OrderId::new(1),
            user_id: UserId::new(1),
            instrument_id: InstrumentId::new(1),
            side,
            price: Price::new(price),
            quantity: Quantity::new(qty),
            timestamp: 0,
        }
    }

    #[test]
    fn test_open_long() {
        let mut pos = Position::new(InstrumentId::new(1));
        pos.apply_fill(&fill(Side::BUY, 10000, 100));

        assert_eq!(pos.net_qty, Quantity::new(100));
        assert_eq!(pos.vwap, Price::new(10000));
        assert_eq!(pos.realized_pnl, 0.0);
    }

    #[test]
    fn test_vwap_blend_on_add() {
        let mut pos = Position::new(InstrumentId::new(1));
        pos.apply_fill(&fill(Side::BUY, 10000, 100));
        pos.apply_fill(&fill(Side::BUY, 11000, 100));

        assert_eq!(pos.net_qty, Quantity::new(200));
        assert_eq!(pos.vwap, Price::new(10500));
    }

    #[test]
    fn test_reduce_realizes_pnl() {
        let mut pos = Position::new(InstrumentId::new(1));
        pos.apply_fill(&fill(Side::BUY, 10000, 100));
        pos.apply_fill(&fill(Side::SELL, 10500, 100));

        assert!(!pos.is_open());
        assert_eq!(pos.vwap, Price::ZERO);
        assert!((pos.realized_pnl - 500.0).abs() < 0.01);
    }

    #[test]
    fn test_partial_reduce_keeps_vwap() {
        let mut pos = Position::new(InstrumentId::new(1));
        pos.apply_fill(&fill(Side::BUY, 10000, 100));
        pos.apply_fill(&fill(Side::SELL, 10200, 40));

        assert_eq!(pos.net_qty, Quantity::new(60));
        assert_eq!(pos.vwap, Price::new(10000));
        assert!((pos.realized_pnl - 80.0).abs() < 0.01);
    }

    #[test]
    fn test_short_reduce_sign() {
        let mut pos = Position::new(InstrumentId::new(1));
        pos.apply_fill(&fill(Side::SELL, 10000, 100));
        pos.apply_fill(&fill(Side::BUY, 9500, 100));

        // Sold at 100.00, bought back at 95.00: +5.00 per unit
        assert!((pos.realized_pnl - 500.0).abs() < 0.01);
        assert!(!pos.is_open());
    }

    #[test]
    fn test_flip_reopens_at_fill_price() {
        let mut pos = Position::new(InstrumentId::new(1));
        pos.apply_fill(&fill(Side::BUY, 10000, 100));
        pos.apply_fill(&fill(Side::SELL, 10500, 150));

        assert_eq!(pos.net_qty, Quantity::new(-50));
        assert_eq!(pos.vwap, Price::new(10500));
        // Realized only on the 100 closed
        assert!((pos.realized_pnl - 500.0).abs() < 0.01);
    }

    #[test]
    fn test_inexact_blend_keeps_full_precision() {
        let mut pos = Position::new(InstrumentId::new(1));
        pos.apply_fill(&fill(Side::BUY, 10000, 40));
        pos.apply_fill(&fill(Side::BUY, 9900, 30));

        // 697000/70 truncates to 9957 in fixed point
        assert_eq!(pos.vwap, Price::new(9957));
        assert!((pos.avg_entry - 697_000.0 / 70.0).abs() < 1e-9);

        // Closing the whole position realizes against the exact average:
        // (10250·70 − 697000) minor units = 205.00
        pos.apply_fill(&fill(Side::SELL, 10250, 70));
        assert!((pos.realized_pnl - 205.0).abs() < 0.01);
        assert_eq!(pos.avg_entry, 0.0);
        assert_eq!(pos.vwap, Price::ZERO);
    }

    #[test]
    fn test_entry_cost_full_precision() {
        let mut pos = Position::new(InstrumentId::new(1));
        pos.apply_fill(&fill(Side::SELL, 10000, 40));
        pos.apply_fill(&fill(Side::SELL, 9900, 30));

        // 70 units short at 9957.142857... minor units
        assert!((pos.entry_cost() + 6970.0).abs() < 1e-6);
    }

    #[test]
    fn test_unrealized_at_mark() {
        let mut pos = Position::new(InstrumentId::new(1));
        pos.apply_fill(&fill(Side::BUY, 10000, 100));

        assert!((pos.unrealized_at(Price::new(10300)) - 300.0).abs() < 0.01);
        assert_eq!(pos.unrealized_at(Price::ZERO), 0.0);
    }

    #[test]
    fn test_unrealized_short() {
        let mut pos = Position::new(InstrumentId::new(1));
        pos.apply_fill(&fill(Side::SELL, 10000, 100));

        assert!((pos.unrealized_at(Price::new(9800)) - 200.0).abs() < 0.01);
    }

    #[test]
    fn test_crystallize_flattens() {
        let mut pos = Position::new(InstrumentId::new(1));
        pos.apply_fill(&fill(Side::BUY, 500, 10));
        pos.crystallize(150.0);

        assert!(!pos.is_open());
        assert_eq!(pos.vwap, Price::ZERO);
        assert_eq!(pos.unrealized_pnl, 0.0);
        assert!((pos.realized_pnl - 150.0).abs() < 0.01);
    }
}
