//! Ladder projection of the order book.
//!
//! The projector derives a fixed-size, price-ordered window of rows from
//! the canonical [`OrderBook`]. Its only state is the cached window
//! center tick, which moves with hysteresis so the visible window stays
//! put while the best price oscillates by a few ticks and re-centers
//! smoothly once the price genuinely walks away. The cache is derived
//! state and lives here, never inside the book.

use crate::book::{OrderBook, Tick};

/// Hard cap on emitted rows, truncating pathological window sizes.
const MAX_ROWS: Tick = 4000;

/// One projection row. Ephemeral; fully recomputed on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub price: f64,
    pub bid_quantity: f64,
    pub ask_quantity: f64,
}

/// Hysteresis-windowed ladder projector.
#[derive(Debug, Default)]
pub struct LadderProjector {
    center: Option<Tick>,
}

impl LadderProjector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the cached window center so the next projection re-anchors
    /// on the current midpoint. Called after a crossed-book repair and
    /// on reconnect.
    pub fn invalidate_center(&mut self) {
        self.center = None;
    }

    /// Cached window center, if anchored.
    #[must_use]
    pub fn center(&self) -> Option<Tick> {
        self.center
    }

    /// Projects the book into `2 * levels_per_side + 1` rows around the
    /// hysteresis center, highest price first. `levels_per_side == 0`
    /// requests the full retained book instead of a sliding window. The
    /// row count is always bounded by a hard cap; an unconfigured tick
    /// size or an empty book yields no rows.
    pub fn project(&mut self, book: &OrderBook, levels_per_side: usize) -> Vec<Level> {
        if !book.is_configured() {
            return Vec::new();
        }
        let Some(mid) = book.mid_tick() else {
            return Vec::new();
        };

        if levels_per_side == 0 {
            return full_book_rows(book);
        }

        // Clamp rather than wrap: an absurd level request degrades to
        // the row cap instead of a negative window.
        let padding = Tick::try_from(levels_per_side).unwrap_or(Tick::MAX);
        let center = self.recenter(mid, padding);

        let max_tick = center.saturating_add(padding);
        let min_tick = center.saturating_sub(padding);
        emit_rows(book, min_tick, max_tick)
    }

    /// Moves the cached center only when `mid` leaves the inner band
    /// (the window shrunk by `padding / 4` on each edge). Re-anchoring
    /// brings `mid` back to `padding - padding / 4` ticks from the edge
    /// it crossed rather than snapping the center onto `mid`.
    fn recenter(&mut self, mid: Tick, padding: Tick) -> Tick {
        let Some(center) = self.center else {
            self.center = Some(mid);
            return mid;
        };

        let margin = padding / 4;
        let inner_min = center.saturating_sub(padding).saturating_add(margin);
        let inner_max = center.saturating_add(padding).saturating_sub(margin);

        let moved = if mid < inner_min {
            mid.saturating_add(padding - margin)
        } else if mid > inner_max {
            mid.saturating_sub(padding - margin)
        } else {
            center
        };

        self.center = Some(moved);
        moved
    }
}

/// Full-book mode: one row per tick from the lowest to the highest
/// retained level across both sides, capped at the top.
fn full_book_rows(book: &OrderBook) -> Vec<Level> {
    let ticks = book
        .bids()
        .keys()
        .chain(book.asks().keys())
        .copied()
        .collect::<Vec<_>>();
    let (Some(&min), Some(&max)) = (ticks.iter().min(), ticks.iter().max()) else {
        return Vec::new();
    };

    emit_rows(book, min, max)
}

fn emit_rows(book: &OrderBook, mut min_tick: Tick, max_tick: Tick) -> Vec<Level> {
    if max_tick < min_tick {
        return Vec::new();
    }

    let count = max_tick.saturating_sub(min_tick).saturating_add(1);
    if count > MAX_ROWS {
        min_tick = max_tick - (MAX_ROWS - 1);
    }

    let mut rows = Vec::with_capacity(count.min(MAX_ROWS) as usize);
    for tick in (min_tick..=max_tick).rev() {
        let Some(price) = book.tick_to_price(tick) else {
            return rows;
        };
        rows.push(Level {
            price,
            bid_quantity: book.bids().get(&tick).copied().unwrap_or(0.0),
            ask_quantity: book.asks().get(&tick).copied().unwrap_or(0.0),
        });
    }

    rows
}
