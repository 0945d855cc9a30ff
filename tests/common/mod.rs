//! Shared helpers for building protobuf-encoded test frames.

/// Encodes a value as a little-endian base-128 varint.
pub fn varint(mut value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
    out
}

/// Encodes a length-delimited field (wire type 2).
pub fn len_field(field: u64, payload: &[u8]) -> Vec<u8> {
    let mut out = varint(field << 3 | 2);
    out.extend(varint(payload.len() as u64));
    out.extend_from_slice(payload);
    out
}

/// Encodes a string field (wire type 2).
pub fn str_field(field: u64, value: &str) -> Vec<u8> {
    len_field(field, value.as_bytes())
}

/// Encodes a varint field (wire type 0).
pub fn varint_field(field: u64, value: u64) -> Vec<u8> {
    let mut out = varint(field << 3);
    out.extend(varint(value));
    out
}

/// Builds a depth level sub-message: price and quantity decimal strings.
pub fn depth_level(price: &str, qty: &str) -> Vec<u8> {
    let mut out = str_field(1, price);
    out.extend(str_field(2, qty));
    out
}

/// Builds an aggregated-depth body from ask and bid levels.
pub fn depth_body(asks: &[(&str, &str)], bids: &[(&str, &str)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (price, qty) in asks {
        out.extend(len_field(1, &depth_level(price, qty)));
    }
    for (price, qty) in bids {
        out.extend(len_field(2, &depth_level(price, qty)));
    }
    out
}

/// Builds one deal sub-message.
pub fn deal_item(price: &str, qty: &str, trade_type: u64, timestamp: u64) -> Vec<u8> {
    let mut out = str_field(1, price);
    out.extend(str_field(2, qty));
    out.extend(varint_field(3, trade_type));
    out.extend(varint_field(4, timestamp));
    out
}

/// Builds an aggregated-deals body from deal sub-messages.
pub fn deals_body(deals: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for deal in deals {
        out.extend(len_field(1, deal));
    }
    out
}

/// Wraps a depth body in a push envelope (field 313).
pub fn depth_envelope(channel: &str, body: &[u8]) -> Vec<u8> {
    let mut out = str_field(1, channel);
    out.extend(len_field(313, body));
    out
}

/// Wraps a deals body in a push envelope (field 314).
pub fn deals_envelope(channel: &str, body: &[u8]) -> Vec<u8> {
    let mut out = str_field(1, channel);
    out.extend(len_field(314, body));
    out
}
