//! Newline-delimited JSON output records.
//!
//! The emitter owns the process's data stream (stdout in production):
//! one JSON object per line, distinguished by an explicit `type` tag.
//! Ladder records are throttled to one emission per configured interval,
//! coalescing whatever depth updates arrived in between; trade records
//! go out immediately as they arrive.

use std::io::Write;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::Result;
use crate::ladder::Level;
use crate::models::Deal;

/// One ladder snapshot on the wire.
#[derive(Serialize)]
struct LadderRecord<'a> {
    #[serde(rename = "type")]
    tpe: &'static str,
    symbol: &'a str,
    timestamp: i64,
    #[serde(rename = "bestBid")]
    best_bid: f64,
    #[serde(rename = "bestAsk")]
    best_ask: f64,
    #[serde(rename = "tickSize")]
    tick_size: f64,
    rows: Vec<Row>,
}

/// One ladder row on the wire.
#[derive(Serialize)]
struct Row {
    price: f64,
    bid: f64,
    ask: f64,
}

/// One trade print on the wire.
#[derive(Serialize)]
struct TradeRecord<'a> {
    #[serde(rename = "type")]
    tpe: &'static str,
    symbol: &'a str,
    price: f64,
    qty: f64,
    side: &'static str,
    timestamp: i64,
}

/// Serializes ladder and trade records to a shared output stream.
///
/// Generic over the sink so tests can capture output in a `Vec<u8>`.
pub struct Emitter<W: Write> {
    out: W,
    throttle: Duration,
    last_ladder: Option<Instant>,
}

impl<W: Write> Emitter<W> {
    #[must_use]
    pub fn new(out: W, throttle: Duration) -> Self {
        Self {
            out,
            throttle,
            last_ladder: None,
        }
    }

    /// Writes a ladder record unless one was emitted within the
    /// throttle interval. Returns whether the record went out.
    ///
    /// `best_bid`/`best_ask` of `None` (side empty or tick size
    /// unresolved) serialize as the `0` sentinel the consumer expects.
    ///
    /// # Errors
    ///
    /// Returns a [`FeedError`](crate::FeedError) if serialization or
    /// the write fails.
    pub fn emit_ladder(
        &mut self,
        symbol: &str,
        tick_size: f64,
        best_bid: Option<f64>,
        best_ask: Option<f64>,
        rows: &[Level],
    ) -> Result<bool> {
        let now = Instant::now();
        if let Some(last) = self.last_ladder
            && now.duration_since(last) < self.throttle
        {
            return Ok(false);
        }
        self.last_ladder = Some(now);

        let record = LadderRecord {
            tpe: "ladder",
            symbol,
            timestamp: epoch_millis(),
            best_bid: best_bid.unwrap_or(0.0),
            best_ask: best_ask.unwrap_or(0.0),
            tick_size,
            rows: rows
                .iter()
                .map(|level| Row {
                    price: level.price,
                    bid: level.bid_quantity,
                    ask: level.ask_quantity,
                })
                .collect(),
        };

        self.write_line(&record)?;
        Ok(true)
    }

    /// Writes one trade record immediately, independent of the ladder
    /// throttle.
    ///
    /// # Errors
    ///
    /// Returns a [`FeedError`](crate::FeedError) if serialization or
    /// the write fails.
    pub fn emit_trade(&mut self, symbol: &str, deal: &Deal) -> Result<()> {
        let record = TradeRecord {
            tpe: "trade",
            symbol,
            price: deal.price,
            qty: deal.quantity,
            side: deal.side.as_str(),
            timestamp: deal.timestamp,
        };
        self.write_line(&record)
    }

    fn write_line<T: Serialize>(&mut self, record: &T) -> Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Current wall-clock time as epoch milliseconds.
fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
