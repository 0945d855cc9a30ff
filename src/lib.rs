//! MEXC spot depth-of-market ladder feed.
//!
//! Connects to the exchange's public streaming feed, rebuilds a consistent
//! limit-order-book view from a REST snapshot plus incremental protobuf
//! depth updates, and projects it into a bounded, visually-stable ladder
//! emitted as newline-delimited JSON on stdout.

pub mod book;
pub mod config;
pub mod emit;
pub mod error;
pub mod ladder;
pub mod models;
pub mod rest;
pub mod websocket;
pub mod wire;

pub use error::{FeedError, Result};
