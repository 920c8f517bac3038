//! Chain connections
//!
//! Everything that talks to a node sits behind the traits in this module so
//! builders and the router stay testable. A [`ConnectionGuard`] hands a
//! connection back to its client when dropped, on success and failure alike.

use crate::builder::calls::{RuntimeEncoder, XcmCall};
use crate::error::XcmError;
use crate::fees::PaymentInfo;
use crate::registry::{AssetInfo, ChainMeta};
use crate::types::Chain;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Open connection to one chain
#[async_trait]
pub trait ChainConnection: Send + Sync {
    /// SCALE-encode a call against the chain's runtime
    fn encode_call(&self, call: &XcmCall) -> Result<Vec<u8>, XcmError>;

    /// Query fee information for encoded call data
    async fn payment_info(&self, call: &[u8], sender: &str) -> Result<PaymentInfo, XcmError>;
}

/// Source of chain connections
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn connect(&self, chain: &ChainMeta) -> Result<Arc<dyn ChainConnection>, XcmError>;

    /// Called once for every successful [`ChainClient::connect`]
    fn release(&self, chain: &Chain);
}

/// Expected output of an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub amount_out: u128,
}

/// Swap pricing on exchange chains
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn quote(
        &self,
        exchange: &Chain,
        asset_in: &AssetInfo,
        asset_out: &AssetInfo,
        amount_in: u128,
    ) -> Result<Quote, XcmError>;
}

/// Connection that is released when dropped
pub struct ConnectionGuard<'a> {
    client: &'a dyn ChainClient,
    chain: Chain,
    connection: Arc<dyn ChainConnection>,
}

impl<'a> ConnectionGuard<'a> {
    pub async fn acquire(client: &'a dyn ChainClient, chain: &ChainMeta) -> Result<Self, XcmError> {
        let connection = client.connect(chain).await?;
        debug!(chain = %chain.name, "Acquired connection");
        Ok(ConnectionGuard {
            client,
            chain: chain.name.clone(),
            connection,
        })
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }
}

impl Deref for ConnectionGuard<'_> {
    type Target = dyn ChainConnection;

    fn deref(&self) -> &Self::Target {
        self.connection.as_ref()
    }
}

impl Drop for ConnectionGuard<'_> {
    fn drop(&mut self) {
        self.client.release(&self.chain);
        debug!(chain = %self.chain, "Released connection");
    }
}

/// Per-chain cache filled at least once
///
/// Concurrent misses may fetch more than once; the first stored value wins
/// and every caller gets it.
pub struct ChainCache<V> {
    entries: DashMap<Chain, Arc<V>>,
}

impl<V> Default for ChainCache<V> {
    fn default() -> Self {
        ChainCache {
            entries: DashMap::new(),
        }
    }
}

impl<V> ChainCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, chain: &Chain) -> Option<Arc<V>> {
        self.entries.get(chain).map(|v| Arc::clone(&v))
    }

    pub async fn get_or_fetch<F, Fut>(&self, chain: &Chain, fetch: F) -> Result<Arc<V>, XcmError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, XcmError>>,
    {
        if let Some(cached) = self.get(chain) {
            debug!(%chain, "Cache hit");
            return Ok(cached);
        }

        let fetched = Arc::new(fetch().await?);
        let stored = Arc::clone(
            self.entries
                .entry(chain.clone())
                .or_insert_with(|| Arc::clone(&fetched))
                .value(),
        );
        if !Arc::ptr_eq(&stored, &fetched) {
            debug!(%chain, "Discarding concurrent fetch");
        }
        Ok(stored)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Node RPC used by [`CachingClient`]
#[async_trait]
pub trait RuntimeFetcher: Send + Sync {
    /// SCALE-encoded runtime metadata
    async fn metadata(&self, endpoint: &str) -> Result<Vec<u8>, XcmError>;

    async fn payment_info(
        &self,
        endpoint: &str,
        call: &[u8],
        sender: &str,
    ) -> Result<PaymentInfo, XcmError>;
}

/// [`ChainClient`] that fetches metadata once per chain and encodes locally
pub struct CachingClient<F> {
    fetcher: Arc<F>,
    endpoints: HashMap<Chain, String>,
    encoders: ChainCache<RuntimeEncoder>,
    active: DashMap<Chain, usize>,
}

impl<F: RuntimeFetcher + 'static> CachingClient<F> {
    pub fn new(fetcher: F) -> Self {
        CachingClient {
            fetcher: Arc::new(fetcher),
            endpoints: HashMap::new(),
            encoders: ChainCache::new(),
            active: DashMap::new(),
        }
    }

    /// Use `endpoint` for `chain` instead of its registered providers
    pub fn with_endpoint(mut self, chain: Chain, endpoint: impl Into<String>) -> Self {
        self.endpoints.insert(chain, endpoint.into());
        self
    }

    /// Open connections to a chain
    pub fn active_handles(&self, chain: &Chain) -> usize {
        self.active.get(chain).map_or(0, |n| *n)
    }

    fn endpoint(&self, chain: &ChainMeta) -> Result<String, XcmError> {
        self.endpoints
            .get(&chain.name)
            .or_else(|| chain.providers.first())
            .cloned()
            .ok_or_else(|| {
                XcmError::MissingChainApi(format!("No endpoint configured for {}", chain.name))
            })
    }
}

#[async_trait]
impl<F: RuntimeFetcher + 'static> ChainClient for CachingClient<F> {
    async fn connect(&self, chain: &ChainMeta) -> Result<Arc<dyn ChainConnection>, XcmError> {
        let endpoint = self.endpoint(chain)?;
        let fetcher = Arc::clone(&self.fetcher);
        let metadata_endpoint = endpoint.clone();
        let encoder = self
            .encoders
            .get_or_fetch(&chain.name, || async move {
                info!(endpoint = %metadata_endpoint, "Fetching runtime metadata");
                let bytes = fetcher.metadata(&metadata_endpoint).await?;
                RuntimeEncoder::from_bytes(&bytes)
            })
            .await?;

        *self.active.entry(chain.name.clone()).or_insert(0) += 1;
        Ok(Arc::new(RuntimeConnection {
            encoder,
            fetcher: Arc::clone(&self.fetcher),
            endpoint,
        }))
    }

    fn release(&self, chain: &Chain) {
        match self.active.get_mut(chain) {
            Some(mut count) if *count > 0 => *count -= 1,
            _ => warn!(%chain, "Release without matching connect"),
        }
    }
}

struct RuntimeConnection<F> {
    encoder: Arc<RuntimeEncoder>,
    fetcher: Arc<F>,
    endpoint: String,
}

#[async_trait]
impl<F: RuntimeFetcher> ChainConnection for RuntimeConnection<F> {
    fn encode_call(&self, call: &XcmCall) -> Result<Vec<u8>, XcmError> {
        self.encoder.encode(call)
    }

    async fn payment_info(&self, call: &[u8], sender: &str) -> Result<PaymentInfo, XcmError> {
        self.fetcher.payment_info(&self.endpoint, call, sender).await
    }
}
