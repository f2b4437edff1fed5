use crate::amount::Converter;
use crate::error::Error;
use crate::events::ProgramEvent;
use crate::metadata::{TokenCache, TokenInfo, TokenMetadataSource, TokenResolver};
use crate::orders::{
    NATIVE_TOKEN_KEY, NATIVE_TOKEN_PRECISION, NATIVE_TOKEN_SYMBOL, ParsedOrder, amount_field,
    correlate::invocation_indexes, value_to_hex,
};
use crate::types::{InnerInstructionGroup, ParsedInstruction};

/// Event emitted by the destination program once per fulfilled order.
pub const FULFILLED_ORDER_EVENT: &str = "FulfilledOrderId";
/// Log marker of the fulfillment instruction.
pub const FULFILL_INSTRUCTION_MARKER: &str = "Instruction: FulfillOrder";

const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";
const ORDER_ID_LEN: usize = 32;

/// Reconstruct every fulfilled order in one transaction.
///
/// A fulfillment event only carries an order id; the payout amount lives in
/// a token transfer nested under the top-level instruction that triggered
/// the fulfillment, with no explicit pointer between the two. The pairing is
/// recovered positionally from the log walk, so a count mismatch between
/// events and recovered indexes rejects the whole transaction; positional
/// pairing can no longer be trusted.
///
/// Returns an empty list when the transaction carries no fulfillment events.
/// Individual orders whose transfer cannot be located are skipped (logged),
/// never the whole transaction.
pub async fn reconstruct<S: TokenMetadataSource, C: TokenCache>(
    events: &[ProgramEvent],
    log_messages: &[String],
    inner_instructions: &[InnerInstructionGroup],
    resolver: &TokenResolver<S, C>,
    program_address: &str,
) -> Result<Vec<ParsedOrder>, Error> {
    let fulfillments: Vec<&ProgramEvent> = events
        .iter()
        .filter(|e| e.name == FULFILLED_ORDER_EVENT)
        .collect();
    if fulfillments.is_empty() {
        return Ok(Vec::new());
    }

    let mut order_ids = Vec::with_capacity(fulfillments.len());
    for event in fulfillments {
        let order_id = event
            .fields
            .get("order_id")
            .and_then(|v| value_to_hex(v, ORDER_ID_LEN))
            .ok_or_else(|| Error::Parse {
                reason: format!("malformed order_id in {FULFILLED_ORDER_EVENT} event"),
            })?;
        order_ids.push(order_id);
    }

    let indexes = invocation_indexes(log_messages, program_address, FULFILL_INSTRUCTION_MARKER);
    if indexes.len() != order_ids.len() {
        return Err(Error::CorrelationMismatch {
            event_count: order_ids.len(),
            index_count: indexes.len(),
        });
    }

    let mut orders = Vec::with_capacity(order_ids.len());
    for (order_id, index) in order_ids.into_iter().zip(indexes) {
        let Some(transfer) = payout_transfer(inner_instructions, index) else {
            tracing::warn!(
                order_id = %order_id,
                index,
                "no payout transfer under invoking instruction, skipping order"
            );
            continue;
        };
        let Some((token, raw_amount)) = resolve_payout(transfer, resolver).await else {
            tracing::warn!(
                order_id = %order_id,
                index,
                "payout transfer carries no readable amount, skipping order"
            );
            continue;
        };
        orders.push(ParsedOrder::Filled {
            order_id,
            amount: Converter::new(token.precision).from_raw(raw_amount),
            token_key: token.key,
            token_symbol: token.symbol,
        });
    }
    Ok(orders)
}

/// First value transfer nested under the top-level instruction at `index`.
fn payout_transfer(groups: &[InnerInstructionGroup], index: u32) -> Option<&ParsedInstruction> {
    let group = groups.iter().find(|g| g.index == index)?;
    group
        .instructions
        .iter()
        .find(|ix| matches!(ix.kind.as_str(), "transfer" | "transferChecked"))
}

/// Identify the transferred token and raw quantity.
///
/// System-program transfers move native currency in lamports; token-program
/// transfers name a mint (or, for the plain `transfer` shape that omits the
/// mint, only the destination token account) that goes through the resolver.
async fn resolve_payout<S: TokenMetadataSource, C: TokenCache>(
    transfer: &ParsedInstruction,
    resolver: &TokenResolver<S, C>,
) -> Option<(TokenInfo, u128)> {
    if transfer.program_id == SYSTEM_PROGRAM_ID {
        let lamports = transfer.info.get("lamports").and_then(|v| v.as_u64())?;
        return Some((
            TokenInfo {
                key: NATIVE_TOKEN_KEY.to_string(),
                symbol: NATIVE_TOKEN_SYMBOL.to_string(),
                precision: NATIVE_TOKEN_PRECISION,
            },
            u128::from(lamports),
        ));
    }

    let address = transfer
        .info
        .get("mint")
        .or_else(|| transfer.info.get("destination"))
        .and_then(|v| v.as_str())?;
    let raw_amount = amount_field(&transfer.info)?;

    let token = match resolver.resolve(address).await {
        Ok(info) => info,
        Err(err) => {
            tracing::warn!(token = %address, %err, "token resolution failed, using address fallback");
            TokenInfo::address_fallback(address)
        }
    };
    Some((token, raw_amount))
}
