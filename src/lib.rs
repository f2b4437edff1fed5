#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::dbg_macro,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::panic,
    )
)]

pub mod amount;
pub mod error;
pub mod events;
pub mod fetch;
pub mod metadata;
pub mod orders;
pub mod types;

pub use amount::{Amount, Converter};
pub use error::Error;
pub use events::{EventDecoder, ProgramEvent};
pub use fetch::{ChainRpc, FetchConfig, OrderPipeline, order_batches, order_batches_with_sleep};
pub use metadata::{
    TokenCache, TokenInfo, TokenMetadata, TokenMetadataSource, TokenResolver, UnboundedTokenCache,
};
pub use orders::created::CreatedOrderDefaults;
pub use orders::{OrderInfoResult, OrderStatus, ParsedOrder};
pub use types::{InnerInstructionGroup, ParsedInstruction, SignatureInfo, TransactionRecord};
