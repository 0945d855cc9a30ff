//! Hand-written decoder for the feed's compact binary frames.
//!
//! The stream pushes protobuf-encoded messages, but the field set is
//! small and fixed, so a cursor-based reader over the known field
//! numbers replaces a schema compiler. Unknown fields are skipped
//! generically by wire type. Malformed or truncated input terminates
//! parsing for that frame only: the reader never panics and never reads
//! past the end of the buffer.

use crate::book::Tick;
use crate::models::{Deal, TradeSide};

/// Envelope field: channel name (string).
const FIELD_CHANNEL: u64 = 1;
/// Envelope field: embedded aggregated-depth body.
const FIELD_DEPTH_BODY: u64 = 313;
/// Envelope field: embedded aggregated-deals body.
const FIELD_DEALS_BODY: u64 = 314;

/// Wire types of the protobuf subset the feed uses.
const WIRE_VARINT: u64 = 0;
const WIRE_FIXED64: u64 = 1;
const WIRE_LEN: u64 = 2;
const WIRE_FIXED32: u64 = 5;

/// Payload carried by one push envelope.
#[derive(Debug)]
pub enum Push<'a> {
    /// Aggregated depth update body, raw and undecoded.
    Depth(&'a [u8]),
    /// Aggregated deals body, raw and undecoded.
    Deals(&'a [u8]),
}

/// A decoded push envelope: the channel name plus one embedded payload.
#[derive(Debug)]
pub struct Envelope<'a> {
    pub channel: String,
    pub payload: Push<'a>,
}

/// Level updates for both sides of one depth frame, already discretized
/// to ticks. Quantities of zero mean "remove this tick".
#[derive(Debug, Default, PartialEq)]
pub struct DepthUpdate {
    pub bids: Vec<(Tick, f64)>,
    pub asks: Vec<(Tick, f64)>,
}

/// Cursor over a byte buffer with bounds-checked primitive reads.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn eof(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Reads a little-endian base-128 varint. Iterations are capped at
    /// the 64-bit width so adversarial input cannot loop unboundedly.
    fn read_varint(&mut self) -> Option<u64> {
        let mut out = 0u64;
        let mut shift = 0u32;
        while self.pos < self.buf.len() && shift < 64 {
            let byte = self.buf[self.pos];
            self.pos += 1;
            out |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Some(out);
            }
            shift += 7;
        }
        None
    }

    fn read_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn read_len_delimited(&mut self) -> Option<&'a [u8]> {
        let len = self.read_varint()?;
        self.read_bytes(usize::try_from(len).ok()?)
    }

    /// Skips one field according to its wire type.
    fn skip_field(&mut self, key: u64) -> Option<()> {
        match key & 0x7 {
            WIRE_VARINT => self.read_varint().map(|_| ()),
            WIRE_FIXED64 => self.read_bytes(8).map(|_| ()),
            WIRE_LEN => self.read_len_delimited().map(|_| ()),
            WIRE_FIXED32 => self.read_bytes(4).map(|_| ()),
            _ => None,
        }
    }
}

/// Decodes the outer push envelope: channel name plus one embedded
/// depth or deals body. Returns `None` for frames without a recognized
/// payload (subscription acks, unknown channels). A malformed or
/// truncated field ends the scan early but keeps a payload already
/// captured before it.
#[must_use]
pub fn decode_envelope(frame: &[u8]) -> Option<Envelope<'_>> {
    let mut r = Reader::new(frame);
    let mut channel = String::new();
    let mut payload = None;

    while !r.eof() {
        let Some(key) = r.read_varint() else { break };
        if key & 0x7 != WIRE_LEN {
            if r.skip_field(key).is_none() {
                break;
            }
            continue;
        }

        let Some(value) = r.read_len_delimited() else {
            break;
        };
        match key >> 3 {
            FIELD_CHANNEL => channel = String::from_utf8_lossy(value).into_owned(),
            FIELD_DEPTH_BODY => payload = Some(Push::Depth(value)),
            FIELD_DEALS_BODY => payload = Some(Push::Deals(value)),
            _ => {}
        }
    }

    Some(Envelope {
        channel,
        payload: payload?,
    })
}

/// Decodes an aggregated-depth body into tick-discretized level updates.
///
/// Returns `None` while the tick size is unresolved ("book not ready"):
/// depth content cannot be discretized without it, so the frame's depth
/// is discarded. Truncation mid-body keeps the levels decoded so far.
#[must_use]
pub fn decode_depth(body: &[u8], tick_size: f64) -> Option<DepthUpdate> {
    if tick_size <= 0.0 {
        return None;
    }

    let mut update = DepthUpdate::default();
    let mut r = Reader::new(body);

    while !r.eof() {
        let Some(key) = r.read_varint() else { break };
        if key & 0x7 != WIRE_LEN {
            if r.skip_field(key).is_none() {
                break;
            }
            continue;
        }

        let Some(item) = r.read_len_delimited() else {
            break;
        };
        match key >> 3 {
            1 => decode_depth_level(item, tick_size, &mut update.asks),
            2 => decode_depth_level(item, tick_size, &mut update.bids),
            _ => {}
        }
    }

    Some(update)
}

/// Decodes one price/quantity level sub-message.
fn decode_depth_level(item: &[u8], tick_size: f64, out: &mut Vec<(Tick, f64)>) {
    let mut price = None;
    let mut qty = 0.0f64;

    let mut r = Reader::new(item);
    while !r.eof() {
        let Some(key) = r.read_varint() else { break };
        if key & 0x7 != WIRE_LEN {
            if r.skip_field(key).is_none() {
                break;
            }
            continue;
        }

        let Some(value) = r.read_len_delimited() else {
            break;
        };
        match key >> 3 {
            1 => price = parse_decimal(value),
            2 => qty = parse_decimal(value).unwrap_or(0.0),
            _ => {}
        }
    }

    if let Some(price) = price {
        let tick = (price / tick_size).round() as Tick;
        out.push((tick, qty));
    }
}

/// Decodes an aggregated-deals body into normalized trade records.
/// Trades are independent of the tick size and always parse.
#[must_use]
pub fn decode_deals(body: &[u8]) -> Vec<Deal> {
    let mut deals = Vec::new();
    let mut r = Reader::new(body);

    while !r.eof() {
        let Some(key) = r.read_varint() else { break };
        if key & 0x7 != WIRE_LEN {
            if r.skip_field(key).is_none() {
                break;
            }
            continue;
        }

        let Some(item) = r.read_len_delimited() else {
            break;
        };
        // Field 1 is the repeated deal; field 2 (event type string) is
        // skipped by falling through.
        if key >> 3 == 1
            && let Some(deal) = decode_deal_item(item)
        {
            deals.push(deal);
        }
    }

    deals
}

/// Decodes one deal sub-message. Deals without a price or with a
/// non-positive quantity are dropped.
fn decode_deal_item(item: &[u8]) -> Option<Deal> {
    let mut price = None;
    let mut qty = 0.0f64;
    let mut trade_type = 0u64;
    let mut timestamp = 0i64;

    let mut r = Reader::new(item);
    while !r.eof() {
        let key = r.read_varint()?;
        match key & 0x7 {
            WIRE_LEN => {
                let value = r.read_len_delimited()?;
                match key >> 3 {
                    1 => price = parse_decimal(value),
                    2 => qty = parse_decimal(value).unwrap_or(0.0),
                    _ => {}
                }
            }
            WIRE_VARINT => {
                let value = r.read_varint()?;
                match key >> 3 {
                    3 => trade_type = value,
                    4 => timestamp = value as i64,
                    _ => {}
                }
            }
            _ => r.skip_field(key)?,
        }
    }

    let price = price?;
    if qty <= 0.0 {
        return None;
    }

    Some(Deal {
        price,
        quantity: qty,
        side: TradeSide::from_code(trade_type),
        timestamp,
    })
}

/// Parses a UTF-8 decimal string field to a float.
fn parse_decimal(bytes: &[u8]) -> Option<f64> {
    std::str::from_utf8(bytes).ok()?.trim().parse().ok()
}
