//! Fetch/failover pipeline.
//!
//! # Data Flow
//! ```text
//! CanonicalRequest + Configuration snapshot
//!     → failover.rs FetchChain (one per cache key, spawned on tokio)
//!         for host i in order:
//!             → transport.rs Transport::fetch(url_i)
//!             → status / empty body checks
//!             → markup::parse_svg → markup::sanitize (if enabled)
//!             ok  → IconData, chain stays cached as MRU
//!             err → evict own entry; if a host is left: reclaim key,
//!                   wait delay.rs, reclaim again (or await the chain
//!                   that claimed it), next host
//!     → Arc<IconData> | ExhaustedHosts
//! ```
//!
//! # Design Decisions
//! - The transport is a trait object so tests and embedders can swap it
//! - Failover is an explicit state machine with a bounded number of steps
//! - At most one chain per key has network work outstanding

pub mod delay;
pub mod failover;
pub mod transport;

pub use failover::{FailoverEvent, FailoverState, FetchChain, IconCache, SharedFetch};
pub use transport::{HttpTransport, Transport, TransportResponse};
