pub mod correlate;
pub mod created;
pub mod filled;

use crate::amount::Amount;

/// Fixed identity used for native-currency transfers.
pub const NATIVE_TOKEN_KEY: &str = "So11111111111111111111111111111111111111112";
pub const NATIVE_TOKEN_SYMBOL: &str = "SOL";
pub const NATIVE_TOKEN_PRECISION: u8 = 9;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Filled,
}

/// A reconstructed order event.
///
/// Amounts are exact decimals already scaled by the token's precision.
/// Fees are 0 when the event carried no fee fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedOrder {
    Created {
        /// Hex encoding of the 32-byte order id.
        order_id: String,
        token_key: String,
        token_symbol: String,
        amount: Amount,
        percent_fee: Amount,
        fixed_fee: Amount,
    },
    Filled {
        /// Hex encoding of the 32-byte order id.
        order_id: String,
        token_key: String,
        token_symbol: String,
        amount: Amount,
    },
}

impl ParsedOrder {
    pub fn order_id(&self) -> &str {
        match self {
            Self::Created { order_id, .. } | Self::Filled { order_id, .. } => order_id,
        }
    }

    pub fn status(&self) -> OrderStatus {
        match self {
            Self::Created { .. } => OrderStatus::Created,
            Self::Filled { .. } => OrderStatus::Filled,
        }
    }
}

/// The pipeline's sole output unit: one order event tied to the transaction
/// that produced it. Uniquely identified by `signature` plus the order's
/// position within that transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderInfoResult {
    pub order: ParsedOrder,
    /// Transaction signature (base58).
    pub signature: String,
    pub status: OrderStatus,
    /// Block time in unix seconds; 0 when the chain omitted it.
    pub timestamp: i64,
}

/// Collect a JSON array of byte values into a `Vec<u8>`.
fn value_to_bytes(value: &serde_json::Value) -> Option<Vec<u8>> {
    let arr = value.as_array()?;
    let bytes: Vec<u8> = arr
        .iter()
        .filter_map(|v| v.as_u64().map(|n| n as u8))
        .collect();
    if bytes.len() == arr.len() { Some(bytes) } else { None }
}

/// Convert a JSON value to a base58 pubkey string.
/// Handles both byte arrays (`[u8; 32]`) and direct strings.
pub fn value_to_pubkey(value: &serde_json::Value) -> Option<String> {
    if let Some(s) = value.as_str() {
        return Some(s.to_string());
    }
    let bytes = value_to_bytes(value)?;
    if bytes.len() == 32 {
        Some(bs58::encode(&bytes).into_string())
    } else {
        None
    }
}

/// Hex-encode a fixed-length byte-array field.
pub fn value_to_hex(value: &serde_json::Value, len: usize) -> Option<String> {
    let bytes = value_to_bytes(value)?;
    if bytes.len() == len {
        Some(hex::encode(bytes))
    } else {
        None
    }
}

/// Decode a big-endian unsigned integer field.
/// Handles both byte arrays (up to 16 bytes) and direct JSON numbers.
pub fn be_uint(value: &serde_json::Value) -> Option<u128> {
    if let Some(n) = value.as_u64() {
        return Some(u128::from(n));
    }
    let bytes = value_to_bytes(value)?;
    if bytes.len() > 16 {
        return None;
    }
    Some(bytes.iter().fold(0u128, |acc, b| (acc << 8) | u128::from(*b)))
}

/// Walk a nested object path.
pub fn nested<'a>(value: &'a serde_json::Value, path: &[&str]) -> Option<&'a serde_json::Value> {
    path.iter().try_fold(value, |v, key| v.get(key))
}

/// Extract the raw transfer quantity from a parsed token instruction: either
/// the flat `amount` field or the checked `tokenAmount.amount` field.
pub fn amount_field(info: &serde_json::Value) -> Option<u128> {
    let flat = info
        .get("amount")
        .or_else(|| nested(info, &["tokenAmount", "amount"]))?;
    if let Some(n) = flat.as_u64() {
        return Some(u128::from(n));
    }
    flat.as_str()?.parse().ok()
}
