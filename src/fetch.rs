use std::future::Future;
use std::time::Duration;

use futures::{Stream, StreamExt, stream};

use crate::error::Error;
use crate::events::EventDecoder;
use crate::metadata::{TokenCache, TokenMetadataSource, TokenResolver, UnboundedTokenCache};
use crate::orders::created::{self, CreatedOrderDefaults};
use crate::orders::{OrderInfoResult, OrderStatus, filled};
use crate::types::{SignatureInfo, TransactionRecord};

/// Signatures requested per history page, independent of the caller's batch size.
const SIGNATURE_PAGE_LIMIT: usize = 100;
/// Transaction bodies in flight at once within a page.
const FETCH_CONCURRENCY: usize = 5;
/// Attempt ceiling for rate-limited transaction fetches.
const MAX_FETCH_ATTEMPTS: u32 = 5;
/// Base delay for the linear backoff between attempts.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Chain RPC surface consumed by the fetcher.
pub trait ChainRpc {
    /// One page of signature history for `address`, newest first, strictly
    /// older than `before` when given.
    async fn signatures_for_address(
        &self,
        address: &str,
        before: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, Error>;

    /// Full transaction body; `Ok(None)` when the node has no record of it.
    async fn transaction(&self, signature: &str) -> Result<Option<TransactionRecord>, Error>;
}

/// Parameters of one fetch run.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    program_address: String,
    target_count: usize,
    batch_size: usize,
    starting_cursor: Option<String>,
}

impl FetchConfig {
    pub fn new(
        program_address: impl Into<String>,
        target_count: usize,
        batch_size: usize,
    ) -> Result<Self, Error> {
        if target_count == 0 {
            return Err(Error::Config {
                reason: "target_count must be positive".to_string(),
            });
        }
        if batch_size == 0 {
            return Err(Error::Config {
                reason: "batch_size must be positive".to_string(),
            });
        }
        Ok(Self {
            program_address: program_address.into(),
            target_count,
            batch_size,
            starting_cursor: None,
        })
    }

    /// Resume fetching strictly older than `cursor` (e.g. the signature of
    /// the last stored record).
    pub fn with_starting_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.starting_cursor = Some(cursor.into());
        self
    }
}

/// Everything needed to turn one retrieved transaction into order records:
/// the two program schemas, the token resolver, and the destination program
/// address the log walk matches against.
pub struct OrderPipeline<SD, DD, S, C = UnboundedTokenCache> {
    source_decoder: SD,
    destination_decoder: DD,
    resolver: TokenResolver<S, C>,
    created_defaults: CreatedOrderDefaults,
    destination_address: String,
}

impl<SD, DD, S, C> OrderPipeline<SD, DD, S, C>
where
    SD: EventDecoder,
    DD: EventDecoder,
    S: TokenMetadataSource,
    C: TokenCache,
{
    pub fn new(
        source_decoder: SD,
        destination_decoder: DD,
        resolver: TokenResolver<S, C>,
        destination_address: impl Into<String>,
    ) -> Self {
        Self {
            source_decoder,
            destination_decoder,
            resolver,
            created_defaults: CreatedOrderDefaults::default(),
            destination_address: destination_address.into(),
        }
    }

    pub fn with_created_defaults(mut self, defaults: CreatedOrderDefaults) -> Self {
        self.created_defaults = defaults;
        self
    }

    /// Route one transaction through both reconstructors.
    ///
    /// A structurally unparseable fulfillment set drops the transaction's
    /// fulfillments with a log line; the pipeline moves on.
    pub async fn orders_from_transaction(&self, tx: &TransactionRecord) -> Vec<OrderInfoResult> {
        let timestamp = tx.block_time.unwrap_or(0);
        let mut results = Vec::new();

        let source_events = self.source_decoder.decode_events(&tx.log_messages);
        if let Some(order) =
            created::reconstruct(&source_events, &self.resolver, &self.created_defaults).await
        {
            results.push(OrderInfoResult {
                order,
                signature: tx.signature.clone(),
                status: OrderStatus::Created,
                timestamp,
            });
        }

        let destination_events = self.destination_decoder.decode_events(&tx.log_messages);
        match filled::reconstruct(
            &destination_events,
            &tx.log_messages,
            &tx.inner_instructions,
            &self.resolver,
            &self.destination_address,
        )
        .await
        {
            Ok(orders) => {
                for order in orders {
                    results.push(OrderInfoResult {
                        order,
                        signature: tx.signature.clone(),
                        status: OrderStatus::Filled,
                        timestamp,
                    });
                }
            }
            Err(err) => {
                tracing::warn!(
                    signature = %tx.signature,
                    %err,
                    "dropping fulfillments of unparseable transaction"
                );
            }
        }
        results
    }
}

/// Lazy, finite sequence of order-record batches for one program address.
///
/// Pages signature history backward from the configured cursor, retrieves
/// bodies under bounded concurrency, and reconstructs order records until
/// the target count is reached or history is exhausted. Each yielded batch
/// holds at most `batch_size` records, in page order. Per-transaction
/// failures are dropped with a log line; a paging failure ends the stream
/// with the error.
pub fn order_batches<R, SD, DD, S, C>(
    rpc: R,
    pipeline: OrderPipeline<SD, DD, S, C>,
    config: FetchConfig,
) -> impl Stream<Item = Result<Vec<OrderInfoResult>, Error>>
where
    R: ChainRpc,
    SD: EventDecoder,
    DD: EventDecoder,
    S: TokenMetadataSource,
    C: TokenCache,
{
    order_batches_with_sleep(rpc, pipeline, config, tokio::time::sleep)
}

/// [`order_batches`] with an injected sleep, so tests drive the retry path
/// without timers.
pub fn order_batches_with_sleep<R, SD, DD, S, C, Sl, SlFut>(
    rpc: R,
    pipeline: OrderPipeline<SD, DD, S, C>,
    config: FetchConfig,
    sleep: Sl,
) -> impl Stream<Item = Result<Vec<OrderInfoResult>, Error>>
where
    R: ChainRpc,
    SD: EventDecoder,
    DD: EventDecoder,
    S: TokenMetadataSource,
    C: TokenCache,
    Sl: Fn(Duration) -> SlFut + Copy,
    SlFut: Future<Output = ()>,
{
    let run = FetchRun {
        rpc,
        pipeline,
        sleep,
        cursor: config.starting_cursor.clone(),
        config,
        emitted: 0,
        pending: Vec::new(),
        exhausted: false,
    };
    stream::unfold(run, |mut run| async move {
        run.next_batch().await.map(|batch| (batch, run))
    })
}

struct FetchRun<R, SD, DD, S, C, Sl> {
    rpc: R,
    pipeline: OrderPipeline<SD, DD, S, C>,
    config: FetchConfig,
    sleep: Sl,
    cursor: Option<String>,
    emitted: usize,
    pending: Vec<OrderInfoResult>,
    exhausted: bool,
}

impl<R, SD, DD, S, C, Sl, SlFut> FetchRun<R, SD, DD, S, C, Sl>
where
    R: ChainRpc,
    SD: EventDecoder,
    DD: EventDecoder,
    S: TokenMetadataSource,
    C: TokenCache,
    Sl: Fn(Duration) -> SlFut + Copy,
    SlFut: Future<Output = ()>,
{
    async fn next_batch(&mut self) -> Option<Result<Vec<OrderInfoResult>, Error>> {
        loop {
            if self.emitted >= self.config.target_count {
                self.exhausted = true;
            }
            if self.exhausted {
                if self.pending.is_empty() || self.emitted >= self.config.target_count {
                    return None;
                }
                // Flush the remainder below batch size.
                return Some(Ok(self.drain_batch()));
            }
            if self.pending.len() >= self.config.batch_size {
                return Some(Ok(self.drain_batch()));
            }

            let page = match self
                .rpc
                .signatures_for_address(
                    &self.config.program_address,
                    self.cursor.as_deref(),
                    SIGNATURE_PAGE_LIMIT,
                )
                .await
            {
                Ok(page) => page,
                Err(err) => {
                    self.exhausted = true;
                    self.pending.clear();
                    return Some(Err(err));
                }
            };
            if page.is_empty() {
                self.exhausted = true;
                continue;
            }
            if let Some(oldest) = page.last() {
                self.cursor = Some(oldest.signature.clone());
            }

            let transactions = self.retrieve_page(&page).await;
            for tx in transactions.into_iter().flatten() {
                let records = self.pipeline.orders_from_transaction(&tx).await;
                self.pending.extend(records);
            }
        }
    }

    /// Retrieve a page's transaction bodies under bounded concurrency,
    /// preserving page order.
    async fn retrieve_page(&self, page: &[SignatureInfo]) -> Vec<Option<TransactionRecord>> {
        stream::iter(page.iter().map(|sig| self.fetch_with_retry(&sig.signature)))
            .buffered(FETCH_CONCURRENCY)
            .collect()
            .await
    }

    /// Fetch one transaction, retrying rate limits with linearly increasing
    /// delay. Every failure path drops the transaction rather than stalling
    /// the pipeline.
    async fn fetch_with_retry(&self, signature: &str) -> Option<TransactionRecord> {
        for attempt in 1..=MAX_FETCH_ATTEMPTS {
            match self.rpc.transaction(signature).await {
                Ok(Some(tx)) => return Some(tx),
                Ok(None) => {
                    tracing::debug!(signature, "transaction not found, dropping");
                    return None;
                }
                Err(Error::RateLimited) => {
                    tracing::debug!(signature, attempt, "rate limited, backing off");
                    (self.sleep)(RETRY_BASE_DELAY * attempt).await;
                }
                Err(err) => {
                    tracing::warn!(signature, %err, "transaction fetch failed, dropping");
                    return None;
                }
            }
        }
        tracing::warn!(signature, "retry ceiling reached, dropping transaction");
        None
    }

    fn drain_batch(&mut self) -> Vec<OrderInfoResult> {
        let remaining = self.config.target_count - self.emitted;
        let take = self
            .config
            .batch_size
            .min(remaining)
            .min(self.pending.len());
        let batch: Vec<OrderInfoResult> = self.pending.drain(..take).collect();
        self.emitted += batch.len();
        batch
    }
}
