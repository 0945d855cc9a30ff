//! Process configuration parsed from command-line flags.
//!
//! The feed runs as a child process of the presentation layer, which
//! spawns it with flags; there is no in-process reconfiguration after
//! startup. Recognized flags:
//! - `--symbol` — trading pair to stream (default `BTCUSDT`)
//! - `--endpoint` — WebSocket endpoint URL
//! - `--rest-endpoint` — REST base URL for metadata and snapshots
//! - `--ladder-levels` — ladder levels per side (0 = full book)
//! - `--throttle-ms` — minimum interval between ladder emissions
//! - `--snapshot-depth` — levels per side requested in the REST snapshot

use std::time::Duration;

use crate::{FeedError, Result};

/// Default public WebSocket endpoint.
const DEFAULT_WS_ENDPOINT: &str = "wss://wbs-api.mexc.com/ws";

/// Default REST base URL for metadata and depth snapshots.
const DEFAULT_REST_ENDPOINT: &str = "https://api.mexc.com";

/// Top-level feed configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub symbol: String,
    pub endpoint: String,
    pub rest_endpoint: String,
    /// Ladder levels per side; 0 requests the full retained book.
    pub ladder_levels_per_side: usize,
    /// Minimum interval between ladder emissions.
    pub throttle: Duration,
    /// Levels per side requested in the initial REST snapshot.
    pub snapshot_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            endpoint: DEFAULT_WS_ENDPOINT.to_string(),
            rest_endpoint: DEFAULT_REST_ENDPOINT.to_string(),
            ladder_levels_per_side: 120,
            throttle: Duration::from_millis(50),
            snapshot_depth: 500,
        }
    }
}

/// Parses configuration from an iterator of command-line arguments
/// (excluding the program name).
///
/// Unrecognized flags are ignored so a supervisor can pass through
/// additional options without breaking older builds.
///
/// # Errors
///
/// Returns [`FeedError::Config`] if a flag is missing its value or a
/// numeric value fails to parse.
pub fn parse_args<I>(args: I) -> Result<Config>
where
    I: IntoIterator<Item = String>,
{
    let mut cfg = Config::default();
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .ok_or_else(|| FeedError::Config(format!("missing value for {name}")))
        };

        match arg.as_str() {
            "--symbol" => cfg.symbol = value("--symbol")?,
            "--endpoint" => cfg.endpoint = value("--endpoint")?,
            "--rest-endpoint" => cfg.rest_endpoint = value("--rest-endpoint")?,
            "--ladder-levels" => {
                cfg.ladder_levels_per_side = parse_number("--ladder-levels", &value("--ladder-levels")?)?;
            }
            "--throttle-ms" => {
                cfg.throttle = Duration::from_millis(parse_number("--throttle-ms", &value("--throttle-ms")?)?);
            }
            "--snapshot-depth" => {
                cfg.snapshot_depth = parse_number("--snapshot-depth", &value("--snapshot-depth")?)?;
            }
            _ => {}
        }
    }

    if cfg.snapshot_depth == 0 {
        cfg.snapshot_depth = 50;
    }

    Ok(cfg)
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| FeedError::Config(format!("invalid value for {name}: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config> {
        parse_args(args.iter().map(ToString::to_string))
    }

    #[test]
    fn defaults_without_args() {
        let cfg = parse(&[]).unwrap();
        assert_eq!(cfg.symbol, "BTCUSDT");
        assert_eq!(cfg.endpoint, DEFAULT_WS_ENDPOINT);
        assert_eq!(cfg.rest_endpoint, DEFAULT_REST_ENDPOINT);
        assert_eq!(cfg.ladder_levels_per_side, 120);
        assert_eq!(cfg.throttle, Duration::from_millis(50));
        assert_eq!(cfg.snapshot_depth, 500);
    }

    #[test]
    fn overrides_from_flags() {
        let cfg = parse(&[
            "--symbol",
            "ETHUSDT",
            "--ladder-levels",
            "250",
            "--throttle-ms",
            "100",
            "--snapshot-depth",
            "1000",
        ])
        .unwrap();
        assert_eq!(cfg.symbol, "ETHUSDT");
        assert_eq!(cfg.ladder_levels_per_side, 250);
        assert_eq!(cfg.throttle, Duration::from_millis(100));
        assert_eq!(cfg.snapshot_depth, 1000);
    }

    #[test]
    fn zero_snapshot_depth_falls_back() {
        let cfg = parse(&["--snapshot-depth", "0"]).unwrap();
        assert_eq!(cfg.snapshot_depth, 50);
    }

    #[test]
    fn full_book_mode_is_allowed() {
        let cfg = parse(&["--ladder-levels", "0"]).unwrap();
        assert_eq!(cfg.ladder_levels_per_side, 0);
    }

    #[test]
    fn missing_value_is_rejected() {
        let err = parse(&["--symbol"]).unwrap_err();
        assert!(err.to_string().contains("missing value for --symbol"));
    }

    #[test]
    fn invalid_number_is_rejected() {
        let err = parse(&["--throttle-ms", "fast"]).unwrap_err();
        assert!(err.to_string().contains("invalid value for --throttle-ms"));
    }

    #[test]
    fn unknown_flags_are_ignored() {
        let cfg = parse(&["--verbose", "--symbol", "SOLUSDT"]).unwrap();
        assert_eq!(cfg.symbol, "SOLUSDT");
    }
}
