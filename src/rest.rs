//! REST request/response half of the market-data transport.
//!
//! Two calls run before the stream opens: tick-size resolution from
//! exchange metadata (the book is unusable without it) and the initial
//! depth snapshot that seeds the book.

use serde::Deserialize;
use tracing::info;

use crate::book::Tick;
use crate::{FeedError, Result};

/// The subset of `exchangeInfo` this feed reads.
#[derive(Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Deserialize)]
struct SymbolInfo {
    #[serde(rename = "quotePrecision")]
    quote_precision: Option<i32>,
    #[serde(rename = "quoteAssetPrecision")]
    quote_asset_precision: Option<i32>,
}

/// A depth snapshot as served by the exchange: decimal string pairs.
#[derive(Deserialize)]
pub struct DepthSnapshot {
    pub bids: Vec<(String, String)>,
    pub asks: Vec<(String, String)>,
}

/// Resolves the symbol's tick size from its quote-currency decimal
/// precision (`tick = 10^-precision`).
///
/// # Errors
///
/// Returns a [`FeedError`](crate::FeedError) if the HTTP request fails
/// or the response carries no usable precision. Callers treat this as
/// fatal at startup: no book operation is valid without a tick size.
pub async fn resolve_tick_size(
    client: &reqwest::Client,
    rest_endpoint: &str,
    symbol: &str,
) -> Result<f64> {
    let url = format!("{rest_endpoint}/api/v3/exchangeInfo?symbol={symbol}");
    let info: ExchangeInfo = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let sym = info
        .symbols
        .first()
        .ok_or_else(|| FeedError::Metadata(format!("exchangeInfo has no entry for {symbol}")))?;

    let precision = sym
        .quote_precision
        .or(sym.quote_asset_precision)
        .filter(|&p| p > 0)
        .ok_or_else(|| FeedError::Metadata(format!("missing quote precision for {symbol}")))?;

    let tick_size = 10f64.powi(-precision);
    info!(symbol, precision, tick_size, "resolved tick size");
    Ok(tick_size)
}

/// Fetches the initial depth snapshot and discretizes both sides to
/// ticks with the given tick size.
///
/// # Errors
///
/// Returns a [`FeedError`](crate::FeedError) if the HTTP request fails
/// or the body cannot be deserialized. Startup treats this as non-fatal:
/// the book simply starts empty and fills from deltas.
pub async fn fetch_snapshot(
    client: &reqwest::Client,
    rest_endpoint: &str,
    symbol: &str,
    limit: usize,
    tick_size: f64,
) -> Result<(Vec<(Tick, f64)>, Vec<(Tick, f64)>)> {
    let url = format!("{rest_endpoint}/api/v3/depth?symbol={symbol}&limit={limit}");
    let snapshot: DepthSnapshot = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let bids = discretize(&snapshot.bids, tick_size);
    let asks = discretize(&snapshot.asks, tick_size);
    info!(bids = bids.len(), asks = asks.len(), "snapshot fetched");
    Ok((bids, asks))
}

/// Converts decimal-string price/quantity pairs to tick-indexed levels,
/// dropping entries that fail to parse.
fn discretize(levels: &[(String, String)], tick_size: f64) -> Vec<(Tick, f64)> {
    levels
        .iter()
        .filter_map(|(price, qty)| {
            let price: f64 = price.parse().ok()?;
            let qty: f64 = qty.parse().ok()?;
            let tick = (price / tick_size).round() as Tick;
            Some((tick, qty))
        })
        .collect()
}
