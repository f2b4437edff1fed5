use dashmap::DashMap;

use crate::error::Error;

/// Precision assumed for tokens the metadata source has never seen.
/// Downstream aggregation always needs some precision to scale by.
pub const FALLBACK_PRECISION: u8 = 6;

/// Resolved token identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    /// Token address (base58).
    pub key: String,
    pub symbol: String,
    /// Decimal places used to scale raw integer amounts.
    pub precision: u8,
}

impl TokenInfo {
    /// Identity used when an address resolves to nothing: the address stands
    /// in for the symbol and the precision is [`FALLBACK_PRECISION`].
    pub fn address_fallback(address: &str) -> Self {
        Self {
            key: address.to_string(),
            symbol: address.to_string(),
            precision: FALLBACK_PRECISION,
        }
    }
}

/// Raw metadata row returned by the external source.
#[derive(Debug, Clone)]
pub struct TokenMetadata {
    pub symbol: String,
    pub decimals: u8,
}

/// External token metadata source (registry service, mint account lookup, ...).
pub trait TokenMetadataSource {
    /// Look up a token address. `Ok(None)` means the source has no entry for
    /// it; `Err` means the request itself failed and must not be cached.
    async fn lookup(&self, address: &str) -> Result<Option<TokenMetadata>, Error>;
}

/// Cache capability behind [`TokenResolver`], keyed by token address.
/// Swap in a bounded or evicting implementation without touching
/// reconstruction logic.
pub trait TokenCache {
    fn get(&self, address: &str) -> Option<TokenInfo>;
    fn insert(&self, info: TokenInfo);
}

/// Process-lifetime cache. Unbounded; the token universe is small relative
/// to order volume.
#[derive(Default)]
pub struct UnboundedTokenCache {
    entries: DashMap<String, TokenInfo>,
}

impl TokenCache for UnboundedTokenCache {
    fn get(&self, address: &str) -> Option<TokenInfo> {
        self.entries.get(address).map(|hit| hit.value().clone())
    }

    fn insert(&self, info: TokenInfo) {
        self.entries.insert(info.key.clone(), info);
    }
}

/// Memoizing resolver in front of a [`TokenMetadataSource`].
///
/// Racing first lookups for the same key may both hit the source; the
/// second write wins.
pub struct TokenResolver<S, C = UnboundedTokenCache> {
    source: S,
    cache: C,
}

impl<S: TokenMetadataSource> TokenResolver<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: UnboundedTokenCache::default(),
        }
    }
}

impl<S: TokenMetadataSource, C: TokenCache> TokenResolver<S, C> {
    pub fn with_cache(source: S, cache: C) -> Self {
        Self { source, cache }
    }

    /// Resolve a token address to its symbol and precision.
    ///
    /// Unknown addresses resolve to [`TokenInfo::address_fallback`]. A failed
    /// lookup request propagates instead, so a transient outage is never
    /// cached as "token not found".
    pub async fn resolve(&self, address: &str) -> Result<TokenInfo, Error> {
        if let Some(hit) = self.cache.get(address) {
            return Ok(hit);
        }

        let info = match self.source.lookup(address).await? {
            Some(meta) => TokenInfo {
                key: address.to_string(),
                symbol: meta.symbol,
                precision: meta.decimals,
            },
            None => {
                tracing::debug!(address, "no metadata entry, using address fallback");
                TokenInfo::address_fallback(address)
            }
        };
        self.cache.insert(info.clone());
        Ok(info)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingSource {
        known: HashMap<String, TokenMetadata>,
        fail_first: AtomicUsize,
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn new(known: &[(&str, &str, u8)]) -> Self {
            Self {
                known: known
                    .iter()
                    .map(|(address, symbol, decimals)| {
                        (
                            (*address).to_string(),
                            TokenMetadata {
                                symbol: (*symbol).to_string(),
                                decimals: *decimals,
                            },
                        )
                    })
                    .collect(),
                fail_first: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing_first(mut self, failures: usize) -> Self {
            self.fail_first = AtomicUsize::new(failures);
            self
        }
    }

    impl TokenMetadataSource for CountingSource {
        async fn lookup(&self, address: &str) -> Result<Option<TokenMetadata>, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first.load(Ordering::SeqCst) > 0 {
                self.fail_first.fetch_sub(1, Ordering::SeqCst);
                return Err(Error::Metadata {
                    reason: "source unavailable".to_string(),
                });
            }
            Ok(self.known.get(address).cloned())
        }
    }

    #[tokio::test]
    async fn resolve_is_memoized() {
        let resolver = TokenResolver::new(CountingSource::new(&[("usdc_mint", "USDC", 6)]));

        let first = resolver.resolve("usdc_mint").await.unwrap();
        let second = resolver.resolve("usdc_mint").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.symbol, "USDC");
        assert_eq!(first.precision, 6);
        assert_eq!(resolver.source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_address_falls_back_to_address_identity() {
        let resolver = TokenResolver::new(CountingSource::new(&[]));

        let info = resolver.resolve("mystery_mint").await.unwrap();

        assert_eq!(info.key, "mystery_mint");
        assert_eq!(info.symbol, "mystery_mint");
        assert_eq!(info.precision, FALLBACK_PRECISION);

        // The fallback is cached like any other resolution.
        resolver.resolve("mystery_mint").await.unwrap();
        assert_eq!(resolver.source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_lookup_propagates_and_is_not_cached() {
        let resolver =
            TokenResolver::new(CountingSource::new(&[("usdc_mint", "USDC", 6)]).failing_first(1));

        assert!(resolver.resolve("usdc_mint").await.is_err());

        let info = resolver.resolve("usdc_mint").await.unwrap();
        assert_eq!(info.symbol, "USDC");
        assert_eq!(resolver.source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn alternate_cache_implementations_can_be_injected() {
        struct NoCache;

        impl TokenCache for NoCache {
            fn get(&self, _address: &str) -> Option<TokenInfo> {
                None
            }
            fn insert(&self, _info: TokenInfo) {}
        }

        let resolver =
            TokenResolver::with_cache(CountingSource::new(&[("usdc_mint", "USDC", 6)]), NoCache);

        resolver.resolve("usdc_mint").await.unwrap();
        resolver.resolve("usdc_mint").await.unwrap();
        assert_eq!(resolver.source.calls.load(Ordering::SeqCst), 2);
    }
}
