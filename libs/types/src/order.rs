//! Order lifecycle types
//!
//! An order moves PENDING -> PARTIAL -> FILLED as fills accumulate, or
//! terminates in CANCELLED / REJECTED. Status never regresses.

use crate::ids::{InstrumentId, OrderId, UserId};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }
}

/// Time-in-force policy for orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-For-Day: rests on the book until filled or cancelled
    GFD,
    /// Immediate-Or-Cancel: match immediately, cancel remainder
    IOC,
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Accepted and resting, no fills yet
    Pending,
    /// Partially matched
    Partial,
    /// Completely matched (terminal)
    Filled,
    /// Cancelled by user or by IOC expiry (terminal)
    Cancelled,
    /// Refused by the book, e.g. a post-only cross (terminal)
    Rejected,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// Order submission request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub user_id: UserId,
    pub instrument_id: InstrumentId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub tif: TimeInForce,
    pub post_only: bool,
}

impl OrderRequest {
    /// Create a plain GFD limit order request.
    pub fn new(
        user_id: UserId,
        instrument_id: InstrumentId,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            user_id,
            instrument_id,
            side,
            price,
            quantity,
            tif: TimeInForce::GFD,
            post_only: false,
        }
    }

    /// Switch to immediate-or-cancel.
    pub fn ioc(mut self) -> Self {
        self.tif = TimeInForce::IOC;
        self
    }

    /// Mark as post-only (reject instead of crossing).
    pub fn post_only(mut self) -> Self {
        self.post_only = true;
        self
    }
}

/// A live or historical order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub instrument_id: InstrumentId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub status: OrderStatus,
    pub tif: TimeInForce,
    pub post_only: bool,
    /// Nanoseconds since engine start; ordering and audit only.
    pub timestamp: i64,
}

impl Order {
    /// Materialize a request into a pending order.
    pub fn from_request(id: OrderId, request: &OrderRequest, timestamp: i64) -> Self {
        Self {
            id,
            user_id: request.user_id,
            instrument_id: request.instrument_id,
            side: request.side,
            price: request.price,
            quantity: request.quantity,
            filled_quantity: Quantity::ZERO,
            status: OrderStatus::Pending,
            tif: request.tif,
            post_only: request.post_only,
            timestamp,
        }
    }

    /// Quantity still open.
    pub fn remaining(&self) -> Quantity {
        self.quantity - self.filled_quantity
    }

    /// Check if order is completely filled
    pub fn is_filled(&self) -> bool {
        self.filled_quantity >= self.quantity
    }

    /// Check if order has any fills
    pub fn has_fills(&self) -> bool {
        !self.filled_quantity.is_zero()
    }

    /// Record a fill and advance the status.
    ///
    /// The caller clamps `fill_quantity` to the open remainder; the
    /// invariant `filled_quantity <= quantity` holds throughout.
    pub fn add_fill(&mut self, fill_quantity: Quantity) {
        debug_assert!(
            fill_quantity <= self.remaining(),
            "fill exceeds open quantity"
        );
        self.filled_quantity += fill_quantity;

        if self.is_filled() {
            self.status = OrderStatus::Filled;
        } else if self.has_fills() {
            self.status = OrderStatus::Partial;
        }
    }
}
