//! Icon resolution engine.
//!
//! # Responsibilities
//! - Canonicalize requests and look them up in the active cache
//! - Start (and spawn) one fetch chain per missing key
//! - Re-provision the cache whenever the configuration changes
//!
//! # Design Decisions
//! - Configuration and cache are swapped together as one generation, so a
//!   request never pairs a new configuration with an old cache
//! - Chains keep the generation they started under; after a reconfigure they
//!   finish against the old cache, which nobody reads any more

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::registry::ConfigurationRegistry;
use crate::config::schema::{CachePolicy, ConfigPatch, Configuration};
use crate::error::IconResult;
use crate::fetch::failover::{self, FetchChain, IconCache};
use crate::fetch::transport::{HttpTransport, Transport};
use crate::icon::{canonicalize, IconData, IconRequest};
use crate::observability::metrics;

/// Configuration snapshot plus the cache provisioned for it.
struct Generation {
    config: Arc<Configuration>,
    cache: Option<Arc<IconCache>>,
}

impl Generation {
    fn new(config: Arc<Configuration>) -> IconResult<Self> {
        let cache = provision_cache(config.cache)?;
        Ok(Self { config, cache })
    }
}

fn provision_cache(policy: CachePolicy) -> IconResult<Option<Arc<IconCache>>> {
    policy
        .capacity()
        .map(|capacity| IconCache::new(capacity).map(Arc::new))
        .transpose()
}

/// Resolves icon requests into sanitized SVG data.
pub struct IconEngine {
    registry: ConfigurationRegistry,
    generation: ArcSwap<Generation>,
    transport: Arc<dyn Transport>,
}

impl IconEngine {
    /// Engine with the default configuration and an HTTP transport.
    pub fn new() -> IconResult<Self> {
        Self::with_transport(Arc::new(HttpTransport::new()?))
    }

    /// Engine with the default configuration and a custom transport.
    pub fn with_transport(transport: Arc<dyn Transport>) -> IconResult<Self> {
        Self::with_config(Configuration::default(), transport)
    }

    pub fn with_config(config: Configuration, transport: Arc<dyn Transport>) -> IconResult<Self> {
        let registry = ConfigurationRegistry::new(config)?;
        let generation = Generation::new(registry.get())?;
        Ok(Self {
            registry,
            generation: ArcSwap::from_pointee(generation),
            transport,
        })
    }

    /// Resolve `request`, sharing work with identical in-flight requests.
    ///
    /// The only error a caller sees is [`IconError::ExhaustedHosts`].
    ///
    /// [`IconError::ExhaustedHosts`]: crate::error::IconError::ExhaustedHosts
    pub async fn resolve_icon(&self, request: &IconRequest) -> IconResult<Arc<IconData>> {
        let canonical = canonicalize(request);
        let generation = self.generation.load_full();

        let fetch = match &generation.cache {
            Some(cache) => {
                let (fetch, created) = cache.get_or_insert_with(canonical.key.clone(), || {
                    FetchChain::create(
                        canonical.clone(),
                        generation.config.clone(),
                        Some(cache.clone()),
                        self.transport.clone(),
                    )
                });
                if created {
                    tracing::debug!(key = %canonical.key, "Cache miss, starting fetch");
                    metrics::record_cache_miss();
                    metrics::record_cache_entries(cache.len());
                    failover::spawn(&fetch);
                } else {
                    tracing::debug!(key = %canonical.key, "Cache hit");
                    metrics::record_cache_hit();
                }
                fetch
            }
            None => {
                metrics::record_cache_miss();
                let fetch = FetchChain::create(
                    canonical,
                    generation.config.clone(),
                    None,
                    self.transport.clone(),
                );
                failover::spawn(&fetch);
                fetch
            }
        };

        fetch.await
    }

    /// Apply `patch`, then replace the cache according to the new policy.
    ///
    /// On error nothing changes.
    pub fn configure(&self, patch: ConfigPatch) -> IconResult<Arc<Configuration>> {
        self.registry.configure_with(
            patch,
            |candidate| provision_cache(candidate.cache),
            |config, cache| {
                tracing::debug!(cached = cache.is_some(), "Cache re-provisioned");
                self.generation.store(Arc::new(Generation {
                    config: config.clone(),
                    cache,
                }));
            },
        )
    }

    pub fn get_configuration(&self) -> Arc<Configuration> {
        self.registry.get()
    }

    /// Whether the active cache holds an entry (pending or resolved) for
    /// `request`. Does not touch recency.
    pub fn is_cached(&self, request: &IconRequest) -> bool {
        let key = canonicalize(request).key;
        self.generation
            .load()
            .cache
            .as_ref()
            .is_some_and(|cache| cache.has(&key))
    }

    /// Entries in the active cache (0 when caching is disabled).
    pub fn cached_len(&self) -> usize {
        self.generation
            .load()
            .cache
            .as_ref()
            .map_or(0, |cache| cache.len())
    }

    /// Cache keys in recency order, least recently used first.
    pub fn cached_keys(&self) -> Vec<String> {
        self.generation
            .load()
            .cache
            .as_ref()
            .map(|cache| cache.keys())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for IconEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let generation = self.generation.load();
        f.debug_struct("IconEngine")
            .field("hosts", &generation.config.hosts)
            .field("cache", &generation.config.cache)
            .field("cached", &self.cached_len())
            .finish()
    }
}
