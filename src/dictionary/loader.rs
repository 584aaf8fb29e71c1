//! At-most-once dictionary loading with fallback to the default locale.
//!
//! The [`DictionaryCache`] maps each requested locale code to a slot that is
//! created, together with its shared load future, before the load starts.
//! Callers arriving while a load is still in flight await the same future,
//! so each code is loaded once for the life of the cache. The future lives in
//! the slot rather than in any caller, so a caller that is dropped mid-load
//! leaves the load for the next caller to resume. Slots keep failures as well
//! as successes; nothing is ever evicted or replaced.
//!
//! A failed non-default load resolves to the default locale's dictionary,
//! itself obtained through the cache. A failed default load is terminal.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::OnceCell;
use tracing::{debug, error, warn};

use super::{Dictionary, DictionaryError, DictionarySource, SourceError};
use crate::locale::LocaleRegistry;

/// Outcome of one source load, shared by every caller of the same key.
type LoadOutcome = Result<Dictionary, Arc<SourceError>>;
/// Outcome stored for a requested key after fallback has been applied.
type Resolved = Result<Dictionary, DictionaryError>;
/// A source load that any number of callers can await.
type SharedLoad = Shared<BoxFuture<'static, LoadOutcome>>;

struct Slot {
    /// What the source returns for this key.
    load: SharedLoad,
    /// What `get` returns for this key.
    resolved: OnceCell<Resolved>,
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("loaded", &self.load.peek())
            .field("resolved", &self.resolved.get())
            .finish()
    }
}

/// Append-only map from locale code to its in-flight or completed load.
///
/// Share one cache per process (or per test) by wrapping it in an [`Arc`] and
/// handing it to each [`DictionaryLoader`].
#[derive(Debug, Default)]
pub struct DictionaryCache {
    slots: Mutex<HashMap<String, Arc<Slot>>>,
}

impl DictionaryCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of locale codes that have been requested.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_slots().len()
    }

    /// Return `true` when no locale has been requested yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_slots().is_empty()
    }

    /// Return `true` when `locale` has a slot, whether pending or complete.
    #[must_use]
    pub fn contains(&self, locale: &str) -> bool {
        self.lock_slots().contains_key(locale)
    }

    /// Return `true` when the source load for `locale` has finished, whether
    /// it was requested directly or as the fallback of another locale.
    #[must_use]
    pub fn is_settled(&self, locale: &str) -> bool {
        self.lock_slots()
            .get(locale)
            .is_some_and(|slot| slot.load.peek().is_some())
    }

    fn slot(&self, locale: &str, start: impl FnOnce() -> SharedLoad) -> Arc<Slot> {
        let mut slots = self.lock_slots();
        if let Some(existing) = slots.get(locale) {
            debug!(locale, "dictionary cache hit");
            return Arc::clone(existing);
        }
        debug!(locale, "dictionary cache miss");
        let slot = Arc::new(Slot {
            load: start(),
            resolved: OnceCell::new(),
        });
        slots.insert(locale.to_owned(), Arc::clone(&slot));
        slot
    }

    fn lock_slots(&self) -> MutexGuard<'_, HashMap<String, Arc<Slot>>> {
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Loads dictionaries from a [`DictionarySource`] through a shared cache.
#[derive(Debug)]
pub struct DictionaryLoader<S> {
    registry: Arc<LocaleRegistry>,
    source: Arc<S>,
    cache: Arc<DictionaryCache>,
}

impl<S: DictionarySource + 'static> DictionaryLoader<S> {
    /// Build a loader over `source`, sharing `cache` with any other loader
    /// given the same handle.
    #[must_use]
    pub fn new(registry: Arc<LocaleRegistry>, source: S, cache: Arc<DictionaryCache>) -> Self {
        Self {
            registry,
            source: Arc::new(source),
            cache,
        }
    }

    /// Registry used to pick the fallback locale.
    #[must_use]
    pub fn registry(&self) -> &LocaleRegistry {
        &self.registry
    }

    /// Shared handle to the registry, for building a matching router.
    #[must_use]
    pub const fn registry_handle(&self) -> &Arc<LocaleRegistry> {
        &self.registry
    }

    /// The cache this loader populates.
    #[must_use]
    pub const fn cache(&self) -> &Arc<DictionaryCache> {
        &self.cache
    }

    /// The underlying resource source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Return the dictionary for `locale`, loading it on first request.
    ///
    /// `locale` does not have to be registered. When its resource cannot be
    /// loaded the default locale's dictionary is returned instead, and that
    /// outcome is cached under `locale` too.
    ///
    /// # Errors
    ///
    /// Returns [`DictionaryError::DefaultUnavailable`] when the default
    /// locale's resource cannot be loaded, either because it was requested
    /// directly or because another locale fell back to it.
    pub async fn get(&self, locale: &str) -> Result<Dictionary, DictionaryError> {
        let slot = self.slot(locale);
        slot.resolved
            .get_or_init(|| self.resolve_uncached(locale, &slot))
            .await
            .clone()
    }

    fn slot(&self, locale: &str) -> Arc<Slot> {
        self.cache.slot(locale, || self.start_load(locale))
    }

    fn start_load(&self, locale: &str) -> SharedLoad {
        let source = Arc::clone(&self.source);
        let code = locale.to_owned();
        async move {
            debug!(locale = %code, "loading dictionary");
            source.load(&code).await.map_err(Arc::new)
        }
        .boxed()
        .shared()
    }

    async fn resolve_uncached(&self, locale: &str, slot: &Slot) -> Resolved {
        let default = self.registry.default_locale();
        let cause = match slot.load.clone().await {
            Ok(dictionary) => return Ok(dictionary),
            Err(cause) => cause,
        };
        if self.registry.is_default(locale) {
            error!(locale, error = %cause, "failed to load default dictionary");
            return Err(DictionaryError::DefaultUnavailable {
                locale: default.clone(),
                source: cause,
            });
        }
        warn!(
            locale,
            fallback = %default,
            error = %cause,
            "falling back to default dictionary"
        );
        let fallback = self.slot(default.as_str()).load.clone();
        match fallback.await {
            Ok(dictionary) => Ok(dictionary),
            Err(default_cause) => {
                error!(
                    locale = %default,
                    error = %default_cause,
                    "failed to load default dictionary"
                );
                Err(DictionaryError::DefaultUnavailable {
                    locale: default.clone(),
                    source: default_cause,
                })
            }
        }
    }
}
