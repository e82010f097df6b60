//! Per-key fetch chains with multi-host failover.
//!
//! A chain tries each configured host in order until one yields usable
//! markup. Its handle lives in the cache while it runs, so callers that
//! arrive in the meantime await the same chain instead of fetching again.

use std::sync::{Arc, OnceLock};

use futures_util::future::{BoxFuture, Shared, WeakShared};
use futures_util::FutureExt;

use crate::cache::SharedCache;
use crate::config::schema::Configuration;
use crate::error::{IconError, IconResult};
use crate::fetch::delay::failover_delay;
use crate::fetch::transport::Transport;
use crate::icon::{CanonicalRequest, IconData};
use crate::markup::{filter_root_attributes, parse_svg, sanitize};
use crate::observability::metrics;

type ChainFuture = BoxFuture<'static, IconResult<Arc<IconData>>>;

/// Cloneable handle to an in-progress-or-completed fetch chain.
pub type SharedFetch = Shared<ChainFuture>;

/// Cache of fetch chains keyed by canonical cache key.
pub type IconCache = SharedCache<String, SharedFetch>;

/// Failover progress of one chain.
///
/// ```text
/// Requested → Fetching(0) → Resolved
///                 ↓
///           HostFailed(i) → Fetching(i+1) → ...
///                 ↓ (no hosts left)
///             Exhausted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailoverState {
    Requested,
    Fetching(usize),
    HostFailed(usize),
    Resolved,
    Exhausted,
}

/// Inputs that move a chain between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailoverEvent {
    Start,
    AttemptSucceeded,
    AttemptFailed,
    /// The failover delay has elapsed (or there was nothing to wait for).
    Advance,
}

impl FailoverState {
    /// Next state for `event` with `host_count` configured hosts. Events
    /// that do not apply to the current state leave it unchanged.
    pub fn transition(self, event: FailoverEvent, host_count: usize) -> Self {
        use FailoverEvent::*;
        use FailoverState::*;

        match (self, event) {
            (Requested, Start) if host_count > 0 => Fetching(0),
            (Requested, Start) => Exhausted,
            (Fetching(_), AttemptSucceeded) => Resolved,
            (Fetching(i), AttemptFailed) => HostFailed(i),
            (HostFailed(i), Advance) if i + 1 < host_count => Fetching(i + 1),
            (HostFailed(_), Advance) => Exhausted,
            (state, _) => state,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FailoverState::Resolved | FailoverState::Exhausted)
    }
}

/// One resolution of one cache key.
pub struct FetchChain {
    request: CanonicalRequest,
    config: Arc<Configuration>,
    cache: Option<Arc<IconCache>>,
    transport: Arc<dyn Transport>,
    /// Weak handle to this chain's own shared future, for identity checks
    /// against the cache and for re-registering.
    handle: OnceLock<WeakShared<ChainFuture>>,
}

impl FetchChain {
    /// Build a chain for `request`. Nothing runs until the returned handle is
    /// polled or passed to [`spawn`].
    pub fn create(
        request: CanonicalRequest,
        config: Arc<Configuration>,
        cache: Option<Arc<IconCache>>,
        transport: Arc<dyn Transport>,
    ) -> SharedFetch {
        let chain = Arc::new(FetchChain {
            request,
            config,
            cache,
            transport,
            handle: OnceLock::new(),
        });
        let fetch = chain.clone().run().boxed().shared();
        if let Some(weak) = fetch.downgrade() {
            let _ = chain.handle.set(weak);
        }
        fetch
    }

    fn own_handle(&self) -> Option<SharedFetch> {
        self.handle.get().and_then(WeakShared::upgrade)
    }

    fn is_own(&self, other: &SharedFetch) -> bool {
        self.own_handle().is_some_and(|own| own.ptr_eq(other))
    }

    async fn run(self: Arc<Self>) -> IconResult<Arc<IconData>> {
        let host_count = self.config.hosts.len();
        let mut state = FailoverState::Requested.transition(FailoverEvent::Start, host_count);
        let mut attempts = 0usize;
        let mut last_error = None;
        let mut resolved = None;

        while !state.is_terminal() {
            state = match state {
                FailoverState::Fetching(index) => {
                    attempts += 1;
                    let host = self.config.hosts.get(index).unwrap_or_default();
                    match self.attempt(index).await {
                        Ok(data) => {
                            tracing::debug!(key = %self.request.key, host, "Icon resolved");
                            metrics::record_fetch_attempt(host, "ok");
                            resolved = Some(data);
                            state.transition(FailoverEvent::AttemptSucceeded, host_count)
                        }
                        Err(e) => {
                            tracing::warn!(
                                key = %self.request.key,
                                host_idx = index,
                                host,
                                error = %e,
                                "Icon fetch failed"
                            );
                            metrics::record_fetch_attempt(host, e.kind());
                            self.evict_own();
                            last_error = Some(e);
                            state.transition(FailoverEvent::AttemptFailed, host_count)
                        }
                    }
                }
                FailoverState::HostFailed(index) => {
                    if index + 1 < host_count {
                        // Stay registered through the delay so new callers
                        // join this chain instead of starting another one.
                        if let Some(other) = self.reclaim_or_delegate() {
                            return self.delegate(other).await;
                        }
                        tokio::time::sleep(failover_delay(&self.config.failover)).await;
                        // The entry may have been evicted or replaced while
                        // sleeping.
                        if let Some(other) = self.reclaim_or_delegate() {
                            return self.delegate(other).await;
                        }
                    }
                    state.transition(FailoverEvent::Advance, host_count)
                }
                FailoverState::Requested | FailoverState::Resolved | FailoverState::Exhausted => {
                    state.transition(FailoverEvent::Start, host_count)
                }
            };
        }

        match resolved {
            Some(data) => {
                self.register_resolved();
                Ok(data)
            }
            None => {
                let last_error = last_error.unwrap_or_else(|| {
                    IconError::InvalidConfiguration("no hosts configured".to_string())
                });
                tracing::error!(
                    key = %self.request.key,
                    attempts,
                    error = %last_error,
                    "All hosts failed"
                );
                metrics::record_exhausted();
                Err(IconError::ExhaustedHosts {
                    attempts,
                    last_error: Box::new(last_error),
                })
            }
        }
    }

    /// Fetch, parse and (optionally) sanitize from host `index`.
    async fn attempt(&self, index: usize) -> IconResult<Arc<IconData>> {
        let url = self.request.url(&self.config.hosts, index)?;
        tracing::debug!(key = %self.request.key, url = %url, "Fetching icon");

        let response = self.transport.fetch(&url, &self.config.request).await?;
        if !response.is_success() {
            return Err(IconError::status(response.status));
        }
        if response.body.trim().is_empty() {
            return Err(IconError::InvalidMarkup("empty response body".to_string()));
        }

        let parsed = parse_svg(&response.body)?;
        let (root, vector) = match &self.config.sanitize {
            Some(policy) => (
                filter_root_attributes(parsed.attributes),
                sanitize(&parsed.inner, policy)?,
            ),
            None => (parsed.attributes, parsed.inner),
        };

        let mut attributes = self.config.default_attributes.clone();
        attributes.extend(root);
        Ok(Arc::new(IconData { attributes, vector }))
    }

    /// Drop this chain's cache entry; entries owned by other chains stay.
    fn evict_own(&self) {
        if let Some(cache) = &self.cache {
            cache.remove_if(&self.request.key, |entry| self.is_own(entry));
        }
    }

    /// Re-register under the key if it is free. Returns the chain that
    /// claimed the key in the meantime, if any.
    fn reclaim_or_delegate(&self) -> Option<SharedFetch> {
        let cache = self.cache.as_ref()?;
        let own = self.own_handle()?;
        let occupant =
            cache.set_unless(self.request.key.clone(), own.clone(), |entry| !entry.ptr_eq(&own));
        (!occupant.ptr_eq(&own)).then_some(occupant)
    }

    async fn delegate(&self, other: SharedFetch) -> IconResult<Arc<IconData>> {
        tracing::debug!(key = %self.request.key, "Another chain owns this key, awaiting it");
        other.await
    }

    /// Store this chain as the most recently used entry, unless another chain
    /// took the key.
    fn register_resolved(&self) {
        let (Some(cache), Some(own)) = (&self.cache, self.own_handle()) else {
            return;
        };
        let occupant =
            cache.set_unless(self.request.key.clone(), own.clone(), |entry| !entry.ptr_eq(&own));
        if !occupant.ptr_eq(&own) {
            tracing::debug!(key = %self.request.key, "Key taken by another chain, not caching");
        }
        metrics::record_cache_entries(cache.len());
    }
}

/// Drive `fetch` on the runtime so it completes even if every caller
/// stops waiting.
pub fn spawn(fetch: &SharedFetch) {
    tokio::spawn(fetch.clone().map(|_| ()));
}
