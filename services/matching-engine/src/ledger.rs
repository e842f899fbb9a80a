//! Position ledger
//!
//! One [`Position`] per (user, instrument), created lazily on first
//! fill and never deleted: a closed position keeps its realized P&L.
//! Fills must be applied in the order the book produced them.

use std::collections::{BTreeMap, HashMap};

use types::ids::{InstrumentId, UserId};
use types::numeric::Price;
use types::position::Position;
use types::trade::Fill;

/// Per-user, per-instrument position store
#[derive(Debug, Default)]
pub struct PositionLedger {
    positions: HashMap<UserId, BTreeMap<InstrumentId, Position>>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one fill to the filled user's position.
    pub fn apply_fill(&mut self, fill: &Fill) {
        let position = self
            .positions
            .entry(fill.user_id)
            .or_default()
            .entry(fill.instrument_id)
            .or_insert_with(|| Position::new(fill.instrument_id));
        position.apply_fill(fill);
    }

    /// Look up a user's position in one instrument.
    pub fn position(&self, user_id: UserId, instrument_id: InstrumentId) -> Option<&Position> {
        self.positions.get(&user_id)?.get(&instrument_id)
    }

    /// Open positions for a user, with unrealized P&L refreshed from
    /// `mark`. Flat positions are suppressed.
    pub fn open_positions(
        &self,
        user_id: UserId,
        mark: impl Fn(InstrumentId) -> Price,
    ) -> Vec<Position> {
        let Some(by_instrument) = self.positions.get(&user_id) else {
            return Vec::new();
        };

        by_instrument
            .values()
            .filter(|position| position.is_open())
            .map(|position| {
                let mut refreshed = *position;
                refreshed.unrealized_pnl = position.unrealized_at(mark(position.instrument_id));
                refreshed
            })
            .collect()
    }

    /// Total P&L for a user: realized across all instruments plus fresh
    /// unrealized on open positions.
    pub fn total_pnl(&self, user_id: UserId, mark: impl Fn(InstrumentId) -> Price) -> f64 {
        let Some(by_instrument) = self.positions.get(&user_id) else {
            return 0.0;
        };

        by_instrument
            .values()
            .map(|position| {
                position.realized_pnl + position.unrealized_at(mark(position.instrument_id))
            })
            .sum()
    }

    /// Visit every user's position in one instrument, mutably.
    pub fn for_each_position_in(
        &mut self,
        instrument_id: InstrumentId,
        mut f: impl FnMut(UserId, &mut Position),
    ) {
        for (user_id, by_instrument) in self.positions.iter_mut() {
            if let Some(position) = by_instrument.get_mut(&instrument_id) {
                f(*user_id, position);
            }
        }
    }
}
