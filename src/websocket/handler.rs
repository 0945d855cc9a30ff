//! The single synchronous frame-processing path.
//!
//! Every binary frame flows decode → book mutate → project → emit to
//! completion before the next frame is read. Decode problems stay local
//! to their frame: nothing partial is applied and processing continues.

use std::io::Write;

use tracing::{debug, warn};

use crate::Result;
use crate::book::OrderBook;
use crate::config::Config;
use crate::emit::Emitter;
use crate::ladder::LadderProjector;
use crate::wire::{self, Push};

/// Everything the frame path mutates, owned by one task.
pub struct Pipeline<W: Write> {
    pub book: OrderBook,
    pub projector: LadderProjector,
    pub emitter: Emitter<W>,
}

impl<W: Write> Pipeline<W> {
    /// Processes one binary frame from the stream.
    ///
    /// Frames without a recognized payload, malformed frames, and depth
    /// frames arriving before the tick size is resolved are dropped
    /// without touching the book.
    ///
    /// # Errors
    ///
    /// Returns a [`FeedError`](crate::FeedError) only when writing an
    /// output record fails; decode problems never propagate past the
    /// frame boundary.
    pub fn process_frame(&mut self, frame: &[u8], config: &Config) -> Result<()> {
        let Some(envelope) = wire::decode_envelope(frame) else {
            debug!("frame without recognized payload");
            return Ok(());
        };

        match envelope.payload {
            Push::Deals(body) => {
                for deal in wire::decode_deals(body) {
                    self.emitter.emit_trade(&config.symbol, &deal)?;
                }
            }
            Push::Depth(body) => {
                let Some(update) = wire::decode_depth(body, self.book.tick_size()) else {
                    warn!(channel = envelope.channel, "depth frame before tick size resolved");
                    return Ok(());
                };

                let outcome = self.book.apply_delta(
                    &update.bids,
                    &update.asks,
                    config.ladder_levels_per_side,
                );
                if outcome.crossed_removed > 0 {
                    // Re-anchor the window after a crossed-book repair.
                    self.projector.invalidate_center();
                }

                let rows = self
                    .projector
                    .project(&self.book, config.ladder_levels_per_side);
                self.emitter.emit_ladder(
                    &config.symbol,
                    self.book.tick_size(),
                    self.book.best_bid(),
                    self.book.best_ask(),
                    &rows,
                )?;
            }
        }

        Ok(())
    }
}
