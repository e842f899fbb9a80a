//! Engine facade
//!
//! Coordinates the per-instrument books with the accounting that
//! consumes their fills: order identity minting, instrument registry,
//! pre-trade risk gate, position ledger updates, trade/fill history,
//! and stat counters.
//!
//! The engine is not safe for concurrent use; callers serialize access.
//! Only order-id allocation is atomic, so read-only extensions can mint
//! identities without racing.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use types::errors::RejectReason;
use types::ids::{InstrumentId, OrderId, UserId};
use types::instrument::InstrumentSpec;
use types::market::MarketSnapshot;
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderRequest, OrderStatus, Side};
use types::position::Position;
use types::risk::RiskLimits;
use types::trade::{Fill, TradeRecord};

use crate::book::OrderBook;
use crate::ledger::PositionLedger;
use crate::settlement;

/// Engine tuning knobs
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Price levels per side in [`Engine::get_snapshot`] output.
    pub snapshot_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { snapshot_depth: 10 }
    }
}

/// Lifetime counters across all instruments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub total_orders: u64,
    pub total_fills: u64,
    pub total_cancels: u64,
    pub total_rejects: u64,
}

/// Outcome of a submission
///
/// Failures are in-band: `success == false` with the reject reason,
/// whose `Display` text is the literal client-facing message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: OrderId,
    pub success: bool,
    pub error: Option<RejectReason>,
    pub fills: Vec<Fill>,
}

impl OrderResult {
    fn rejected(reason: RejectReason) -> Self {
        Self {
            order_id: OrderId::NONE,
            success: false,
            error: Some(reason),
            fills: Vec::new(),
        }
    }

    /// Client-facing message for a rejected submission.
    pub fn error_message(&self) -> Option<String> {
        self.error.map(|reason| reason.to_string())
    }
}

/// The exchange engine
pub struct Engine {
    config: EngineConfig,
    /// Basis for monotonic, wall-independent timestamps.
    epoch: Instant,
    next_order_id: AtomicU64,
    instruments: BTreeMap<InstrumentId, InstrumentSpec>,
    books: BTreeMap<InstrumentId, OrderBook>,
    ledger: PositionLedger,
    risk_limits: HashMap<UserId, RiskLimits>,
    /// Observer index over the books' live orders; the owning book is
    /// consulted on every touch.
    active_orders: HashMap<OrderId, InstrumentId>,
    user_orders: HashMap<UserId, BTreeSet<OrderId>>,
    trade_history: Vec<TradeRecord>,
    fill_history: Vec<Fill>,
    stats: EngineStats,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            epoch: Instant::now(),
            next_order_id: AtomicU64::new(1),
            instruments: BTreeMap::new(),
            books: BTreeMap::new(),
            ledger: PositionLedger::new(),
            risk_limits: HashMap::new(),
            active_orders: HashMap::new(),
            user_orders: HashMap::new(),
            trade_history: Vec::new(),
            fill_history: Vec::new(),
            stats: EngineStats::default(),
        }
    }

    /// Nanoseconds since engine start.
    fn now(&self) -> i64 {
        self.epoch.elapsed().as_nanos() as i64
    }

    // ---- Instrument management ----

    /// List an instrument. Returns false on a duplicate id.
    pub fn add_instrument(&mut self, spec: InstrumentSpec) -> bool {
        if self.instruments.contains_key(&spec.id) {
            return false;
        }
        info!(instrument_id = %spec.id, symbol = %spec.symbol, "instrument listed");
        self.books.insert(spec.id, OrderBook::new(spec.id));
        self.instruments.insert(spec.id, spec);
        true
    }

    /// Halt or resume trading in an instrument.
    pub fn halt_instrument(&mut self, instrument_id: InstrumentId, halted: bool) -> bool {
        let Some(spec) = self.instruments.get_mut(&instrument_id) else {
            return false;
        };
        spec.is_halted = halted;
        info!(instrument_id = %instrument_id, halted, "instrument halt state changed");
        true
    }

    pub fn get_instrument(&self, instrument_id: InstrumentId) -> Option<&InstrumentSpec> {
        self.instruments.get(&instrument_id)
    }

    // ---- Order operations ----

    /// Submit an order.
    ///
    /// Validation runs before any state changes: instrument existence,
    /// halt, risk, quantity. Once matching starts, every produced fill
    /// is committed before returning.
    pub fn submit_order(&mut self, request: &OrderRequest) -> OrderResult {
        if !self.instruments.contains_key(&request.instrument_id) {
            return self.reject(request, RejectReason::InstrumentNotFound);
        }
        if self.instruments[&request.instrument_id].is_halted {
            return self.reject(request, RejectReason::InstrumentHalted);
        }
        if !self.check_risk(
            request.user_id,
            request.instrument_id,
            request.side,
            request.quantity,
        ) {
            return self.reject(request, RejectReason::RiskLimitExceeded);
        }
        if !request.quantity.is_positive() {
            return self.reject(request, RejectReason::InvalidQuantity);
        }

        let order_id = OrderId::new(self.next_order_id.fetch_add(1, Ordering::Relaxed));
        let now = self.now();
        let order = Order::from_request(order_id, request, now);

        let book = self
            .books
            .entry(request.instrument_id)
            .or_insert_with(|| OrderBook::new(request.instrument_id));
        let (status, fills) = book.add_order(order, now);

        if matches!(status, OrderStatus::Pending | OrderStatus::Partial) {
            self.active_orders.insert(order_id, request.instrument_id);
            self.user_orders
                .entry(request.user_id)
                .or_default()
                .insert(order_id);
        }

        // Fills arrive in aggressor/passive pairs; each pair is one match
        for pair in fills.chunks(2) {
            for fill in pair {
                self.ledger.apply_fill(fill);
                self.fill_history.push(*fill);
                self.stats.total_fills += 1;
            }
            if let [aggressor, passive] = pair {
                self.trade_history
                    .push(TradeRecord::from_fill_pair(aggressor, passive));
            }
        }

        // Passive orders exhausted during matching left their book;
        // drop them from the engine indices too
        let book = self.books.get(&request.instrument_id);
        for fill in fills.iter().skip(1).step_by(2) {
            let gone = book.map_or(true, |b| b.order(fill.order_id).is_none());
            if gone {
                self.active_orders.remove(&fill.order_id);
                if let Some(open) = self.user_orders.get_mut(&fill.user_id) {
                    open.remove(&fill.order_id);
                }
            }
        }

        self.stats.total_orders += 1;
        debug!(
            order_id = %order_id,
            user_id = %request.user_id,
            instrument_id = %request.instrument_id,
            ?status,
            fills = fills.len(),
            "order processed"
        );

        OrderResult {
            order_id,
            success: true,
            error: None,
            fills,
        }
    }

    fn reject(&mut self, request: &OrderRequest, reason: RejectReason) -> OrderResult {
        self.stats.total_rejects += 1;
        warn!(
            user_id = %request.user_id,
            instrument_id = %request.instrument_id,
            %reason,
            "order rejected"
        );
        OrderResult::rejected(reason)
    }

    /// Cancel one order. Fails on unknown ids and on user mismatch.
    pub fn cancel_order(&mut self, order_id: OrderId, user_id: UserId) -> bool {
        let Some(&instrument_id) = self.active_orders.get(&order_id) else {
            return false;
        };
        let Some(book) = self.books.get_mut(&instrument_id) else {
            return false;
        };
        match book.order(order_id) {
            Some(order) if order.user_id == user_id => {}
            _ => return false,
        }
        if !book.cancel_order(order_id) {
            return false;
        }

        self.active_orders.remove(&order_id);
        if let Some(open) = self.user_orders.get_mut(&user_id) {
            open.remove(&order_id);
        }
        self.stats.total_cancels += 1;
        debug!(order_id = %order_id, user_id = %user_id, "order cancelled");
        true
    }

    /// Replace an order: atomic cancel-then-new.
    ///
    /// Price defaults to the old price, quantity to the open remainder.
    /// The replacement receives a fresh id and loses time priority. If
    /// the new submission fails validation, the cancel has already
    /// happened.
    pub fn replace_order(
        &mut self,
        order_id: OrderId,
        user_id: UserId,
        new_price: Option<Price>,
        new_quantity: Option<Quantity>,
    ) -> bool {
        let Some(&instrument_id) = self.active_orders.get(&order_id) else {
            return false;
        };
        let Some(old) = self
            .books
            .get(&instrument_id)
            .and_then(|book| book.order(order_id))
            .cloned()
        else {
            return false;
        };
        if old.user_id != user_id {
            return false;
        }

        if !self.cancel_order(order_id, user_id) {
            return false;
        }

        let request = OrderRequest {
            user_id,
            instrument_id,
            side: old.side,
            price: new_price.unwrap_or(old.price),
            quantity: new_quantity.unwrap_or_else(|| old.remaining()),
            tif: old.tif,
            post_only: old.post_only,
        };
        self.submit_order(&request).success
    }

    /// Cancel every open order of a user. No-op (true) for unknown users.
    pub fn cancel_all(&mut self, user_id: UserId) -> bool {
        // Copy the id set: cancellation mutates the live one
        let order_ids: Vec<OrderId> = self
            .user_orders
            .get(&user_id)
            .map(|open| open.iter().copied().collect())
            .unwrap_or_default();

        for order_id in order_ids {
            self.cancel_order(order_id, user_id);
        }
        true
    }

    // ---- Market data ----

    /// Depth snapshot at the configured depth. Unknown instruments
    /// yield the default (sentinel) snapshot.
    pub fn get_snapshot(&self, instrument_id: InstrumentId) -> MarketSnapshot {
        match self.books.get(&instrument_id) {
            Some(book) => book.snapshot(self.config.snapshot_depth, self.now()),
            None => MarketSnapshot::default(),
        }
    }

    /// Live orders resting in an instrument's book, in id order.
    pub fn get_orders(&self, instrument_id: InstrumentId) -> Vec<Order> {
        self.books
            .get(&instrument_id)
            .map(|book| book.resting_orders())
            .unwrap_or_default()
    }

    /// Mark price: last traded, else midpoint, else zero.
    pub fn get_mark_price(&self, instrument_id: InstrumentId) -> Price {
        let Some(book) = self.books.get(&instrument_id) else {
            return Price::ZERO;
        };
        let last = book.last_price();
        if last.is_positive() {
            return last;
        }
        let bid = book.best_bid();
        let ask = book.best_ask();
        if bid.is_positive() && ask.is_positive() {
            bid.midpoint(ask)
        } else {
            Price::ZERO
        }
    }

    // ---- Position and P&L ----

    /// Open positions with fresh unrealized P&L.
    pub fn get_positions(&self, user_id: UserId) -> Vec<Position> {
        self.ledger
            .open_positions(user_id, |instrument_id| self.get_mark_price(instrument_id))
    }

    /// Realized P&L across all instruments plus fresh unrealized on
    /// open positions.
    pub fn get_total_pnl(&self, user_id: UserId) -> f64 {
        self.ledger
            .total_pnl(user_id, |instrument_id| self.get_mark_price(instrument_id))
    }

    // ---- Settlement ----

    /// Cash-settle an instrument and halt it.
    pub fn settle_instrument(&mut self, instrument_id: InstrumentId, settlement_value: Price) -> bool {
        let Some(spec) = self.instruments.get(&instrument_id).cloned() else {
            return false;
        };

        settlement::settle_positions(&mut self.ledger, &spec, settlement_value);
        if let Some(live) = self.instruments.get_mut(&instrument_id) {
            live.is_halted = true;
        }
        info!(
            instrument_id = %instrument_id,
            settlement_value = %settlement_value,
            "instrument settled and halted"
        );
        true
    }

    // ---- Risk management ----

    pub fn set_risk_limits(&mut self, user_id: UserId, limits: RiskLimits) {
        self.risk_limits.insert(user_id, limits);
    }

    /// Pre-trade position gate: the post-trade absolute position, were
    /// the full quantity to fill, must stay within `max_position`.
    /// Users with no limits set are unrestricted.
    pub fn check_risk(
        &self,
        user_id: UserId,
        instrument_id: InstrumentId,
        side: Side,
        quantity: Quantity,
    ) -> bool {
        let Some(limits) = self.risk_limits.get(&user_id) else {
            return true;
        };

        let current = self
            .ledger
            .position(user_id, instrument_id)
            .map(|position| position.net_qty)
            .unwrap_or(Quantity::ZERO);
        let delta = match side {
            Side::BUY => quantity,
            Side::SELL => -quantity,
        };
        (current + delta).abs() <= limits.max_position
    }

    // ---- Introspection ----

    pub fn get_stats(&self) -> EngineStats {
        self.stats
    }

    pub fn get_trade_history(&self) -> &[TradeRecord] {
        &self.trade_history
    }

    pub fn get_fill_history(&self) -> &[Fill] {
        &self.fill_history
    }
}
