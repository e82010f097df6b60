//! Configuration schema definitions.
//!
//! This module defines the engine configuration and the partial patch applied
//! by `configure`. All types derive Serde traits for loading from TOML.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{IconError, IconResult};
use crate::markup::policy::SanitizePolicy;

/// Capacity used for [`CachePolicy::Unlimited`].
pub const UNLIMITED_CACHE_CAPACITY: usize = 4096;

/// Root configuration for the icon engine.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Configuration {
    /// API hosts in priority order; index 0 is primary.
    pub hosts: HostList,

    /// Cache sizing.
    pub cache: CachePolicy,

    /// Options handed to the transport with every request.
    pub request: RequestOptions,

    /// Active sanitizer rule table. `None` disables sanitization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanitize: Option<SanitizePolicy>,

    /// Attributes every resolved icon starts from.
    pub default_attributes: BTreeMap<String, String>,

    /// Delay between hosts.
    pub failover: FailoverConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            hosts: HostList::default(),
            cache: CachePolicy::default(),
            request: RequestOptions::default(),
            sanitize: Some(SanitizePolicy::default()),
            default_attributes: default_svg_attributes(),
            failover: FailoverConfig::default(),
        }
    }
}

impl Configuration {
    pub fn sanitize_enabled(&self) -> bool {
        self.sanitize.is_some()
    }
}

fn default_svg_attributes() -> BTreeMap<String, String> {
    [
        ("xmlns", "http://www.w3.org/2000/svg"),
        ("width", "1em"),
        ("height", "1em"),
        ("viewBox", "0 0 24 24"),
        ("fill", "currentColor"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Ordered, non-empty list of icon API hosts.
///
/// A bare host such as `api.iconify.design` means `https://api.iconify.design/`;
/// anything containing `://` is used as a base URL as-is.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct HostList {
    hosts: Vec<String>,
    bases: Vec<Url>,
}

impl HostList {
    pub fn new(hosts: Vec<String>) -> IconResult<Self> {
        if hosts.is_empty() {
            return Err(IconError::InvalidConfiguration(
                "host list must not be empty".to_string(),
            ));
        }
        let bases = hosts
            .iter()
            .map(|h| parse_base(h))
            .collect::<IconResult<Vec<_>>>()?;
        Ok(Self { hosts, bases })
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn primary(&self) -> &str {
        &self.hosts[0]
    }

    /// Host as configured.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.hosts.get(index).map(String::as_str)
    }

    /// Base URL (always ending in `/`) for host `index`.
    pub fn base_url(&self, index: usize) -> Option<&Url> {
        self.bases.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }
}

impl Default for HostList {
    fn default() -> Self {
        let host = "api.iconify.design".to_string();
        let base = Url::parse("https://api.iconify.design/").expect("static default host is valid");
        Self {
            hosts: vec![host],
            bases: vec![base],
        }
    }
}

impl TryFrom<Vec<String>> for HostList {
    type Error = IconError;

    fn try_from(hosts: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(hosts)
    }
}

impl From<HostList> for Vec<String> {
    fn from(list: HostList) -> Self {
        list.hosts
    }
}

fn parse_base(host: &str) -> IconResult<Url> {
    let host = host.trim();
    if host.is_empty() {
        return Err(IconError::InvalidConfiguration("host must not be blank".to_string()));
    }
    let raw = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };
    let mut url = Url::parse(&raw)
        .map_err(|e| IconError::InvalidConfiguration(format!("invalid host '{host}': {e}")))?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(IconError::InvalidConfiguration(format!(
            "invalid host '{host}': not a base URL"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Options passed to the transport with every request.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RequestOptions {
    /// Total request timeout in milliseconds (0 disables the timeout).
    pub timeout_ms: u64,

    /// User-Agent header.
    pub user_agent: String,

    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            user_agent: concat!("icon-resolver/", env!("CARGO_PKG_VERSION")).to_string(),
            headers: BTreeMap::new(),
        }
    }
}

/// Cache sizing policy.
///
/// In TOML: a positive integer, `"unlimited"` or `"no-cache"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "CachePolicyRepr", into = "CachePolicyRepr")]
pub enum CachePolicy {
    /// LRU cache holding at most `n` entries.
    Bounded(usize),
    /// LRU cache with a large practical bound ([`UNLIMITED_CACHE_CAPACITY`]).
    Unlimited,
    /// No cache at all. Every request is a fresh fetch, which also means
    /// concurrent identical requests are no longer coalesced.
    Disabled,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::Bounded(256)
    }
}

impl CachePolicy {
    /// Capacity to provision, or `None` when caching is disabled.
    pub fn capacity(&self) -> Option<usize> {
        match self {
            CachePolicy::Bounded(n) => Some(*n),
            CachePolicy::Unlimited => Some(UNLIMITED_CACHE_CAPACITY),
            CachePolicy::Disabled => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
enum CachePolicyRepr {
    Size(i64),
    Keyword(String),
}

impl TryFrom<CachePolicyRepr> for CachePolicy {
    type Error = String;

    fn try_from(repr: CachePolicyRepr) -> Result<Self, Self::Error> {
        match repr {
            CachePolicyRepr::Size(n) if n > 0 => usize::try_from(n)
                .map(CachePolicy::Bounded)
                .map_err(|e| e.to_string()),
            CachePolicyRepr::Size(n) => {
                Err(format!("cache capacity must be a positive integer, got {n}"))
            }
            CachePolicyRepr::Keyword(k) => match k.as_str() {
                "unlimited" => Ok(CachePolicy::Unlimited),
                "no-cache" => Ok(CachePolicy::Disabled),
                other => Err(format!(
                    "unknown cache policy '{other}' (expected a size, \"unlimited\" or \"no-cache\")"
                )),
            },
        }
    }
}

impl From<CachePolicy> for CachePolicyRepr {
    fn from(policy: CachePolicy) -> Self {
        match policy {
            CachePolicy::Bounded(n) => CachePolicyRepr::Size(n as i64),
            CachePolicy::Unlimited => CachePolicyRepr::Keyword("unlimited".to_string()),
            CachePolicy::Disabled => CachePolicyRepr::Keyword("no-cache".to_string()),
        }
    }
}

/// Failover pacing.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FailoverConfig {
    /// Delay before moving to the next host, in milliseconds.
    pub delay_ms: u64,

    /// Random extra delay as a fraction of `delay_ms` (0.0 = fixed delay).
    pub jitter_ratio: f64,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            delay_ms: 500,
            jitter_ratio: 0.0,
        }
    }
}

/// A partial configuration. Present fields replace the active values.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ConfigPatch {
    pub hosts: Option<Vec<String>>,
    pub request: Option<RequestOptions>,
    pub cache: Option<CachePolicy>,
    /// Enable or disable sanitization. Disabling also drops the rule table.
    pub sanitize: Option<bool>,
    pub sanitize_policy: Option<SanitizePolicy>,
    pub default_attributes: Option<BTreeMap<String, String>>,
    pub failover: Option<FailoverConfig>,
}

impl ConfigPatch {
    pub fn hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = Some(hosts.into_iter().map(Into::into).collect());
        self
    }

    pub fn cache(mut self, cache: CachePolicy) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn sanitize(mut self, enabled: bool) -> Self {
        self.sanitize = Some(enabled);
        self
    }

    pub fn sanitize_policy(mut self, policy: SanitizePolicy) -> Self {
        self.sanitize_policy = Some(policy);
        self
    }

    pub fn request(mut self, request: RequestOptions) -> Self {
        self.request = Some(request);
        self
    }

    pub fn default_attributes(mut self, attributes: BTreeMap<String, String>) -> Self {
        self.default_attributes = Some(attributes);
        self
    }

    pub fn failover_delay_ms(mut self, delay_ms: u64) -> Self {
        let mut failover = self.failover.take().unwrap_or_default();
        failover.delay_ms = delay_ms;
        self.failover = Some(failover);
        self
    }

    pub fn failover(mut self, failover: FailoverConfig) -> Self {
        self.failover = Some(failover);
        self
    }

    /// Produce the configuration that results from applying this patch to
    /// `base`. The result still has to pass validation.
    pub fn apply(self, base: &Configuration) -> IconResult<Configuration> {
        let hosts = match self.hosts {
            Some(hosts) => HostList::new(hosts)?,
            None => base.hosts.clone(),
        };

        let enabled = self.sanitize.unwrap_or(base.sanitize.is_some());
        let sanitize = if enabled {
            Some(
                self.sanitize_policy
                    .or_else(|| base.sanitize.clone())
                    .unwrap_or_default(),
            )
        } else {
            if self.sanitize_policy.is_some() {
                tracing::warn!("Ignoring sanitize policy in a patch that disables sanitization");
            }
            None
        };

        Ok(Configuration {
            hosts,
            request: self.request.unwrap_or_else(|| base.request.clone()),
            cache: self.cache.unwrap_or(base.cache),
            sanitize,
            default_attributes: self
                .default_attributes
                .unwrap_or_else(|| base.default_attributes.clone()),
            failover: self.failover.unwrap_or_else(|| base.failover.clone()),
        })
    }
}
