//! Active configuration holder.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;

use crate::config::schema::{ConfigPatch, Configuration};
use crate::config::validation::{into_icon_error, validate_config};
use crate::error::IconResult;

/// Holds the single active [`Configuration`] and replaces it atomically.
///
/// Readers never block: `get` is a lock-free load. Writers are serialized so
/// two concurrent patches cannot both start from the same base and lose one
/// of the updates.
#[derive(Debug)]
pub struct ConfigurationRegistry {
    active: ArcSwap<Configuration>,
    write: Mutex<()>,
}

impl Default for ConfigurationRegistry {
    fn default() -> Self {
        Self {
            active: ArcSwap::from_pointee(Configuration::default()),
            write: Mutex::new(()),
        }
    }
}

impl ConfigurationRegistry {
    /// Start from an explicit configuration, validating it first.
    pub fn new(config: Configuration) -> IconResult<Self> {
        validate_config(&config).map_err(into_icon_error)?;
        Ok(Self {
            active: ArcSwap::from_pointee(config),
            write: Mutex::new(()),
        })
    }

    /// Snapshot of the active configuration.
    pub fn get(&self) -> Arc<Configuration> {
        self.active.load_full()
    }

    /// Build and validate the configuration `patch` would produce, without
    /// activating it.
    pub fn merge(&self, patch: ConfigPatch) -> IconResult<Configuration> {
        let candidate = patch.apply(&self.active.load())?;
        validate_config(&candidate).map_err(into_icon_error)?;
        Ok(candidate)
    }

    /// Make `config` the active configuration.
    pub fn store(&self, config: Configuration) -> Arc<Configuration> {
        let config = Arc::new(config);
        self.active.store(config.clone());
        config
    }

    /// Apply `patch` to the active configuration and activate the result.
    ///
    /// On error the previous configuration stays active.
    pub fn configure(&self, patch: ConfigPatch) -> IconResult<Arc<Configuration>> {
        self.configure_with(patch, |_| Ok(()), |_, ()| {})
    }

    /// Like [`configure`](Self::configure), with hooks for state that has to
    /// change together with the configuration.
    ///
    /// `prepare` sees the validated candidate and may still reject it; nothing
    /// is activated if it fails. `commit` runs right after the candidate is
    /// stored. Both run under the write lock, so concurrent writers commit in
    /// the same order they store.
    pub fn configure_with<T>(
        &self,
        patch: ConfigPatch,
        prepare: impl FnOnce(&Configuration) -> IconResult<T>,
        commit: impl FnOnce(&Arc<Configuration>, T),
    ) -> IconResult<Arc<Configuration>> {
        let _guard = self.lock_writes();
        let candidate = self.merge(patch)?;
        let prepared = prepare(&candidate)?;

        let config = self.store(candidate);
        commit(&config, prepared);
        tracing::info!(
            hosts = config.hosts.len(),
            cache = ?config.cache,
            sanitize = config.sanitize_enabled(),
            "Configuration updated"
        );
        Ok(config)
    }

    fn lock_writes(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write.lock().unwrap_or_else(|e| e.into_inner())
    }
}
