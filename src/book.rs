//! Canonical limit-order-book state.
//!
//! The book keys every level by an integer [`Tick`] (`round(price /
//! tick_size)`) rather than a floating-point price, so comparisons never
//! drift and rounding cannot duplicate keys. Deltas from the feed carry
//! absolute level quantities ("this tick now has this quantity"), so
//! applying an update replaces the stored quantity instead of
//! accumulating it.

use std::collections::BTreeMap;

use tracing::debug;

/// Integer price unit: `round(price / tick_size)`.
pub type Tick = i64;

/// Floor for the pruning radius so a small ladder request never starves
/// the retained book.
const MIN_PRUNE_LEVELS: usize = 200;

/// Pruning keeps this many times the requested ladder radius on each
/// side of the reference tick, so a ladder resize never outruns the
/// retained data before the next delta refills it.
const PRUNE_FACTOR: Tick = 3;

/// One side of the book: tick index to strictly positive quantity.
pub type BookSide = BTreeMap<Tick, f64>;

/// What post-delta maintenance did, so the caller can react.
///
/// A crossed-book repair invalidates any cached ladder window center;
/// the projector re-anchors on its next call.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeltaOutcome {
    /// Entries deleted by the crossed-book correction.
    pub crossed_removed: usize,
    /// Entries discarded by midpoint pruning.
    pub pruned: usize,
}

/// Canonical book state for a single symbol.
///
/// Constructed empty; the tick size is set once from exchange metadata,
/// [`load_snapshot`](OrderBook::load_snapshot) seeds it exactly once per
/// connection, and [`apply_delta`](OrderBook::apply_delta) runs once per
/// depth frame for the rest of the connection's life.
#[derive(Debug, Default)]
pub struct OrderBook {
    bids: BookSide,
    asks: BookSide,
    tick_size: f64,
}

impl OrderBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the price step in quote currency. Non-positive values leave
    /// the book unconfigured: every price-producing query reports
    /// unavailable until a valid tick size arrives.
    pub fn set_tick_size(&mut self, tick_size: f64) {
        self.tick_size = if tick_size > 0.0 { tick_size } else { 0.0 };
    }

    #[must_use]
    pub fn tick_size(&self) -> f64 {
        self.tick_size
    }

    /// Returns `true` once a valid tick size has been configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.tick_size > 0.0
    }

    /// Discretizes a price onto the tick grid, or `None` while the tick
    /// size is unresolved.
    #[must_use]
    pub fn price_to_tick(&self, price: f64) -> Option<Tick> {
        if self.tick_size > 0.0 {
            Some((price / self.tick_size).round() as Tick)
        } else {
            None
        }
    }

    /// Converts a tick index back to a price, or `None` while the tick
    /// size is unresolved.
    #[must_use]
    pub fn tick_to_price(&self, tick: Tick) -> Option<f64> {
        if self.tick_size > 0.0 {
            Some(tick as f64 * self.tick_size)
        } else {
            None
        }
    }

    /// Drops all levels. The tick size is configured separately and
    /// survives a clear.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }

    /// Replaces the whole book with a point-in-time snapshot.
    ///
    /// This is a full reset, not a merge: a reconnect-and-resnapshot
    /// cycle cannot leave stale levels behind. Non-positive quantities
    /// are skipped.
    pub fn load_snapshot(&mut self, bids: &[(Tick, f64)], asks: &[(Tick, f64)]) {
        self.clear();

        for &(tick, qty) in bids {
            if qty > 0.0 {
                self.bids.insert(tick, qty);
            }
        }
        for &(tick, qty) in asks {
            if qty > 0.0 {
                self.asks.insert(tick, qty);
            }
        }
    }

    /// Applies one incremental depth update.
    ///
    /// Quantities are absolute level sizes: `qty > 0` replaces the
    /// stored quantity, `qty <= 0` deletes the tick (a no-op when
    /// absent). After the update the book prunes levels far from the
    /// live midpoint and repairs any crossed state; `level_hint` is the
    /// requested ladder radius used to size the pruning window.
    pub fn apply_delta(
        &mut self,
        bids: &[(Tick, f64)],
        asks: &[(Tick, f64)],
        level_hint: usize,
    ) -> DeltaOutcome {
        apply_side(&mut self.bids, bids);
        apply_side(&mut self.asks, asks);

        let pruned = self.prune(level_hint);
        let crossed_removed = self.uncross();

        if crossed_removed > 0 {
            debug!(removed = crossed_removed, "repaired crossed book");
        }

        DeltaOutcome {
            crossed_removed,
            pruned,
        }
    }

    /// Best bid price, or `None` when the side is empty or the tick
    /// size is unresolved.
    #[must_use]
    pub fn best_bid(&self) -> Option<f64> {
        self.tick_to_price(self.best_bid_tick()?)
    }

    /// Best ask price, or `None` when the side is empty or the tick
    /// size is unresolved.
    #[must_use]
    pub fn best_ask(&self) -> Option<f64> {
        self.tick_to_price(self.best_ask_tick()?)
    }

    /// Highest bid tick, independent of tick-size configuration.
    #[must_use]
    pub fn best_bid_tick(&self) -> Option<Tick> {
        self.bids.last_key_value().map(|(&tick, _)| tick)
    }

    /// Lowest ask tick, independent of tick-size configuration.
    #[must_use]
    pub fn best_ask_tick(&self) -> Option<Tick> {
        self.asks.first_key_value().map(|(&tick, _)| tick)
    }

    /// Midpoint reference tick: the average of the best ticks when both
    /// sides are populated, otherwise whichever side is populated.
    #[must_use]
    pub fn mid_tick(&self) -> Option<Tick> {
        match (self.best_bid_tick(), self.best_ask_tick()) {
            (Some(bid), Some(ask)) => Some(midpoint(bid, ask)),
            (Some(bid), None) => Some(bid),
            (None, Some(ask)) => Some(ask),
            (None, None) => None,
        }
    }

    #[must_use]
    pub fn bids(&self) -> &BookSide {
        &self.bids
    }

    #[must_use]
    pub fn asks(&self) -> &BookSide {
        &self.asks
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Discards every level outside a window of `max(level_hint, 200) * 3`
    /// ticks around the midpoint reference. Bounds memory against a feed
    /// that keeps sending levels far from the live market.
    fn prune(&mut self, level_hint: usize) -> usize {
        let Some(reference) = self.mid_tick() else {
            return 0;
        };

        let radius = (level_hint.max(MIN_PRUNE_LEVELS) as Tick).saturating_mul(PRUNE_FACTOR);
        let lo = reference.saturating_sub(radius);
        let hi = reference.saturating_add(radius);

        let before = self.bids.len() + self.asks.len();
        self.bids.retain(|&tick, _| (lo..=hi).contains(&tick));
        self.asks.retain(|&tick, _| (lo..=hi).contains(&tick));
        before - (self.bids.len() + self.asks.len())
    }

    /// Repairs a crossed book by deleting every bid at or above the best
    /// ask and every ask at or below the best bid. A defensive measure
    /// against out-of-order or malformed deltas, not a normal state.
    fn uncross(&mut self) -> usize {
        let (Some(best_bid), Some(best_ask)) = (self.best_bid_tick(), self.best_ask_tick()) else {
            return 0;
        };
        if best_bid < best_ask {
            return 0;
        }

        let before = self.bids.len() + self.asks.len();
        self.bids.retain(|&tick, _| tick < best_ask);
        self.asks.retain(|&tick, _| tick > best_bid);
        before - (self.bids.len() + self.asks.len())
    }
}

/// Overflow-safe midpoint of two ticks.
fn midpoint(a: Tick, b: Tick) -> Tick {
    ((i128::from(a) + i128::from(b)) / 2) as Tick
}

fn apply_side(side: &mut BookSide, updates: &[(Tick, f64)]) {
    for &(tick, qty) in updates {
        if qty <= 0.0 {
            side.remove(&tick);
        } else {
            side.insert(tick, qty);
        }
    }
}
