use crate::amount::Converter;
use crate::events::ProgramEvent;
use crate::metadata::{TokenCache, TokenMetadataSource, TokenResolver};
use crate::orders::{ParsedOrder, be_uint, nested, value_to_hex, value_to_pubkey};

/// Event carrying the 32-byte id of a freshly created order.
pub const CREATED_ORDER_ID_EVENT: &str = "CreatedOrderId";
/// Event carrying the created order body (token, amount, fees).
pub const CREATED_ORDER_EVENT: &str = "CreatedOrder";

const ORDER_ID_LEN: usize = 32;

/// Token identity used when the traded token cannot be resolved.
#[derive(Debug, Clone)]
pub struct CreatedOrderDefaults {
    pub symbol: String,
    pub precision: u8,
}

impl Default for CreatedOrderDefaults {
    fn default() -> Self {
        Self {
            symbol: "UNKNOWN".to_string(),
            precision: 6,
        }
    }
}

/// Reconstruct the created order from one transaction's decoded events.
///
/// Returns `None` when the transaction does not carry both the id event and
/// the detail event; most transactions are unrelated to order creation.
/// Only the first matching pair is used.
pub async fn reconstruct<S: TokenMetadataSource, C: TokenCache>(
    events: &[ProgramEvent],
    resolver: &TokenResolver<S, C>,
    defaults: &CreatedOrderDefaults,
) -> Option<ParsedOrder> {
    let id_event = events.iter().find(|e| e.name == CREATED_ORDER_ID_EVENT)?;
    let detail_event = events.iter().find(|e| e.name == CREATED_ORDER_EVENT)?;

    let order_id = value_to_hex(id_event.fields.get("order_id")?, ORDER_ID_LEN)?;
    let token_key = nested(&detail_event.fields, &["order", "give", "token_address"])
        .and_then(value_to_pubkey)?;

    let (token_symbol, precision) = match resolver.resolve(&token_key).await {
        Ok(info) => (info.symbol, info.precision),
        Err(err) => {
            tracing::warn!(
                order_id = %order_id,
                token = %token_key,
                %err,
                "token resolution failed, using configured defaults"
            );
            (defaults.symbol.clone(), defaults.precision)
        }
    };

    let converter = Converter::new(precision);
    let amount = be_uint_or_zero(nested(&detail_event.fields, &["order", "give", "amount"]));
    let percent_fee = be_uint_or_zero(nested(&detail_event.fields, &["order", "fees", "percent"]));
    let fixed_fee = be_uint_or_zero(nested(&detail_event.fields, &["order", "fees", "fixed"]));

    Some(ParsedOrder::Created {
        order_id,
        token_key,
        token_symbol,
        amount: converter.from_raw(amount),
        percent_fee: converter.from_raw(percent_fee),
        fixed_fee: converter.from_raw(fixed_fee),
    })
}

/// Fee and amount fields are legitimately absent on some order shapes.
fn be_uint_or_zero(value: Option<&serde_json::Value>) -> u128 {
    value.and_then(be_uint).unwrap_or(0)
}
