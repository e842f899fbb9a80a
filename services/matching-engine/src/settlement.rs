//! Terminal cash settlement
//!
//! Settling an instrument replaces every open position's positional
//! P&L with the instrument's payoff at the settlement value, net of
//! cost basis, and flattens the position. The engine halts the
//! instrument afterwards; a collapsed reference price supports no
//! further trading.

use tracing::debug;

use types::instrument::InstrumentSpec;
use types::numeric::Price;

use crate::ledger::PositionLedger;

/// Crystallize every open position in `spec` at `settlement_value`.
pub fn settle_positions(
    ledger: &mut PositionLedger,
    spec: &InstrumentSpec,
    settlement_value: Price,
) {
    let intrinsic = spec.kind.intrinsic_value(settlement_value);

    ledger.for_each_position_in(spec.id, |user_id, position| {
        if !position.is_open() {
            return;
        }

        let net = position.net_qty.as_i64() as f64;
        let payoff = intrinsic * net * spec.tick_value;
        // Cost basis from the full-precision entry price, so settled
        // P&L nets to zero across counterparties
        let cost_basis = position.entry_cost() * spec.tick_value;
        position.crystallize(payoff - cost_basis);

        debug!(
            user_id = %user_id,
            instrument_id = %spec.id,
            settlement_pnl = payoff - cost_basis,
            "position settled"
        );
    });
}
