//! Instrumented dictionary sources.
//!
//! Both wrappers delegate to an inner source. [`CountingSource`] records how
//! many loads reached it per locale; [`GatedSource`] additionally holds every
//! load until the test opens the gate, so several callers can be observed
//! while a load is still in flight.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use kotoba::dictionary::{Dictionary, DictionarySource, SourceError};
use tokio::sync::watch;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Counts loads per locale before delegating.
#[derive(Debug, Default)]
pub struct CountingSource<S> {
    inner: S,
    loads: Mutex<HashMap<String, usize>>,
}

impl<S> CountingSource<S> {
    /// Wrap `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            loads: Mutex::new(HashMap::new()),
        }
    }

    /// Loads that reached the source for `locale`.
    pub fn loads(&self, locale: &str) -> usize {
        lock(&self.loads).get(locale).copied().unwrap_or_default()
    }

    /// Loads that reached the source across all locales.
    pub fn total(&self) -> usize {
        lock(&self.loads).values().sum()
    }

    fn record(&self, locale: &str) {
        *lock(&self.loads).entry(locale.to_owned()).or_default() += 1;
    }
}

impl<S: DictionarySource> DictionarySource for CountingSource<S> {
    async fn load(&self, locale: &str) -> Result<Dictionary, SourceError> {
        self.record(locale);
        self.inner.load(locale).await
    }
}

/// Holds every load until [`GatedSource::open`] is called.
#[derive(Debug)]
pub struct GatedSource<S> {
    counter: CountingSource<S>,
    gate: watch::Sender<bool>,
}

impl<S> GatedSource<S> {
    /// Wrap `inner` with a closed gate.
    pub fn new(inner: S) -> Self {
        let (gate, _) = watch::channel(false);
        Self {
            counter: CountingSource::new(inner),
            gate,
        }
    }

    /// Release every waiting and future load.
    pub fn open(&self) {
        self.gate.send_replace(true);
    }

    /// Loads started for `locale`, whether or not they have been released.
    pub fn loads(&self, locale: &str) -> usize {
        self.counter.loads(locale)
    }

    /// Loads started across all locales.
    pub fn total(&self) -> usize {
        self.counter.total()
    }
}

impl<S: DictionarySource> DictionarySource for GatedSource<S> {
    async fn load(&self, locale: &str) -> Result<Dictionary, SourceError> {
        self.counter.record(locale);
        let mut opened = self.gate.subscribe();
        // A closed channel cannot happen while `self` holds the sender.
        let _ = opened.wait_for(|open| *open).await;
        self.counter.inner.load(locale).await
    }
}
