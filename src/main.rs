use std::io;

use tracing::{info, warn};

use domfeed::book::OrderBook;
use domfeed::config::parse_args;
use domfeed::emit::Emitter;
use domfeed::ladder::LadderProjector;
use domfeed::websocket::{FeedConnection, handler::Pipeline};
use domfeed::{FeedError, rest};

#[tokio::main]
async fn main() -> Result<(), FeedError> {
    // Diagnostics go to stderr; stdout carries the data records.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .init();

    let config = parse_args(std::env::args().skip(1))?;
    info!(symbol = config.symbol, "starting depth feed");

    let client = reqwest::Client::new();

    // Tick size is a process-lifetime constant; without it no book
    // operation is valid, so failure here is fatal.
    let tick_size =
        rest::resolve_tick_size(&client, &config.rest_endpoint, &config.symbol).await?;

    let mut book = OrderBook::new();
    book.set_tick_size(tick_size);

    match rest::fetch_snapshot(
        &client,
        &config.rest_endpoint,
        &config.symbol,
        config.snapshot_depth,
        tick_size,
    )
    .await
    {
        Ok((bids, asks)) => book.load_snapshot(&bids, &asks),
        Err(e) => warn!("snapshot failed, continuing with empty book: {e}"),
    }

    let pipeline = Pipeline {
        book,
        projector: LadderProjector::new(),
        emitter: Emitter::new(io::stdout(), config.throttle),
    };

    FeedConnection::new(config, client, pipeline).run().await
}
