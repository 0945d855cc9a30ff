//! Wire decoder: envelope routing, depth/deal bodies, robustness
//! against truncated and unknown input.

mod common;

use common::{
    deal_item, deals_body, deals_envelope, depth_body, depth_envelope, len_field, str_field,
    varint_field,
};
use domfeed::models::TradeSide;
use domfeed::wire::{Push, decode_deals, decode_depth, decode_envelope};

const DEPTH_CHANNEL: &str = "spot@public.aggre.depth.v3.api.pb@100ms@BTCUSDT";
const DEALS_CHANNEL: &str = "spot@public.aggre.deals.v3.api.pb@100ms@BTCUSDT";

#[test]
fn envelope_routes_depth_payload() {
    let body = depth_body(&[("0.0105", "3.0")], &[("0.0100", "5.0")]);
    let frame = depth_envelope(DEPTH_CHANNEL, &body);

    let envelope = decode_envelope(&frame).unwrap();
    assert_eq!(envelope.channel, DEPTH_CHANNEL);
    assert!(matches!(envelope.payload, Push::Depth(b) if b == body.as_slice()));
}

#[test]
fn envelope_routes_deals_payload() {
    let body = deals_body(&[deal_item("0.0102", "1.5", 1, 1_700_000_000_000)]);
    let frame = deals_envelope(DEALS_CHANNEL, &body);

    let envelope = decode_envelope(&frame).unwrap();
    assert_eq!(envelope.channel, DEALS_CHANNEL);
    assert!(matches!(envelope.payload, Push::Deals(b) if b == body.as_slice()));
}

#[test]
fn envelope_without_payload_is_dropped() {
    // Subscription acks carry only text; a channel alone is not a push.
    let frame = str_field(1, "ack");
    assert!(decode_envelope(&frame).is_none());
}

#[test]
fn envelope_skips_unknown_fields_by_wire_type() {
    let mut frame = varint_field(7, 42); // unknown varint field
    frame.extend(str_field(9, "ignored")); // unknown length-delimited
    frame.extend(str_field(1, DEPTH_CHANNEL));
    frame.extend(len_field(313, &depth_body(&[("2.0", "1.0")], &[])));

    let envelope = decode_envelope(&frame).unwrap();
    assert_eq!(envelope.channel, DEPTH_CHANNEL);
    assert!(matches!(envelope.payload, Push::Depth(_)));
}

#[test]
fn depth_body_discretizes_to_ticks() {
    let body = depth_body(
        &[("0.0105", "3.0"), ("0.0110", "0")],
        &[("0.0100", "5.0"), ("0.0099", "2.25")],
    );

    let update = decode_depth(&body, 0.0001).unwrap();
    assert_eq!(update.asks, vec![(105, 3.0), (110, 0.0)]);
    assert_eq!(update.bids, vec![(100, 5.0), (99, 2.25)]);
}

#[test]
fn depth_requires_a_tick_size() {
    let body = depth_body(&[("0.0105", "3.0")], &[]);
    assert!(decode_depth(&body, 0.0).is_none());
    assert!(decode_depth(&body, -1.0).is_none());
}

#[test]
fn depth_level_without_price_is_dropped() {
    let level = str_field(2, "3.0"); // qty only
    let body = len_field(1, &level);

    let update = decode_depth(&body, 0.0001).unwrap();
    assert!(update.asks.is_empty());
}

#[test]
fn depth_level_without_qty_means_deletion() {
    let level = str_field(1, "0.0105"); // price only
    let body = len_field(1, &level);

    let update = decode_depth(&body, 0.0001).unwrap();
    assert_eq!(update.asks, vec![(105, 0.0)]);
}

#[test]
fn deals_decode_price_qty_side_and_time() {
    let body = deals_body(&[
        deal_item("0.0102", "1.5", 1, 1_700_000_000_001),
        deal_item("0.0101", "0.5", 2, 1_700_000_000_002),
    ]);

    let deals = decode_deals(&body);
    assert_eq!(deals.len(), 2);

    assert_eq!(deals[0].price, 0.0102);
    assert_eq!(deals[0].quantity, 1.5);
    assert_eq!(deals[0].side, TradeSide::Buy);
    assert_eq!(deals[0].timestamp, 1_700_000_000_001);

    assert_eq!(deals[1].side, TradeSide::Sell);
}

#[test]
fn unknown_trade_type_defaults_to_buy() {
    let body = deals_body(&[deal_item("1.0", "1.0", 9, 0)]);
    let deals = decode_deals(&body);
    assert_eq!(deals[0].side, TradeSide::Buy);
}

#[test]
fn non_positive_quantity_deals_are_dropped() {
    let body = deals_body(&[
        deal_item("1.0", "0", 1, 0),
        deal_item("1.0", "-2", 1, 0),
        deal_item("1.0", "3.0", 1, 0),
    ]);

    let deals = decode_deals(&body);
    assert_eq!(deals.len(), 1);
    assert_eq!(deals[0].quantity, 3.0);
}

#[test]
fn truncated_frames_never_panic_and_never_read_past_the_end() {
    let body = depth_body(
        &[("0.0105", "3.0"), ("0.0106", "1.0")],
        &[("0.0100", "5.0")],
    );
    let frame = depth_envelope(DEPTH_CHANNEL, &body);

    for cut in 0..frame.len() {
        let _ = decode_envelope(&frame[..cut]);
    }

    let deals = deals_body(&[deal_item("0.0102", "1.5", 1, 1)]);
    for cut in 0..deals.len() {
        let _ = decode_deals(&deals[..cut]);
    }
}

#[test]
fn trailing_truncated_field_keeps_the_complete_payload() {
    let body = depth_body(&[("0.0105", "3.0")], &[("0.0100", "5.0")]);
    let mut frame = depth_envelope(DEPTH_CHANNEL, &body);
    // A dangling continuation byte after the complete embedded body:
    // the scan ends there but the captured payload survives.
    frame.push(0x80);

    let envelope = decode_envelope(&frame).unwrap();
    assert_eq!(envelope.channel, DEPTH_CHANNEL);
    assert!(matches!(envelope.payload, Push::Depth(b) if b == body.as_slice()));

    // Same with a trailing field whose length runs past the buffer.
    let mut frame = deals_envelope(
        DEALS_CHANNEL,
        &deals_body(&[deal_item("0.0102", "1.5", 1, 1)]),
    );
    frame.extend(len_field(20, &[0u8; 4]));
    frame.truncate(frame.len() - 3);

    let envelope = decode_envelope(&frame).unwrap();
    assert!(matches!(envelope.payload, Push::Deals(_)));
}

#[test]
fn truncated_depth_body_keeps_complete_levels() {
    let full = depth_body(&[("0.0105", "3.0")], &[("0.0100", "5.0")]);
    let first_item_len = len_field(1, &common::depth_level("0.0105", "3.0")).len();

    // Cut in the middle of the second (bid) sub-message: the complete
    // ask level decoded before the cut survives.
    let update = decode_depth(&full[..first_item_len + 3], 0.0001).unwrap();
    assert_eq!(update.asks, vec![(105, 3.0)]);
    assert!(update.bids.is_empty());
}

#[test]
fn garbage_bytes_decode_to_nothing() {
    let garbage = [0xFFu8; 64];
    assert!(decode_envelope(&garbage).is_none());
    assert!(decode_deals(&garbage).is_empty());
}
