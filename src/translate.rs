//! Dot-path lookup of translated strings.
//!
//! A translation path such as `home.welcome` names a route through nested
//! dictionary tables. Lookups never fail from the caller's point of view: any
//! path that does not end on a string resolves to the path itself, so a
//! translation gap shows up as the raw key instead of breaking the page.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

use lru::LruCache;
use tracing::debug;

use crate::dictionary::Dictionary;

/// Separator between path segments.
pub const PATH_DELIMITER: char = '.';

/// Number of resolved paths a [`Translator`] remembers by default.
pub const DEFAULT_MEMO_CAPACITY: NonZeroUsize = NonZeroUsize::MIN.saturating_add(255);

/// Why a path did not resolve to a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Miss {
    /// Traversal stopped at the segment with this index, either because the
    /// key is absent or because the value before it is not a table.
    MissingKey {
        /// Zero-based index of the segment that could not be followed.
        segment: usize,
    },
    /// Every segment matched but the final value is not a string.
    NotText,
}

/// Resolve `path` against `dictionary`, reporting why a lookup missed.
///
/// # Errors
///
/// Returns a [`Miss`] when the path is absent or ends on a non-string value.
pub fn lookup<'a>(dictionary: &'a Dictionary, path: &str) -> Result<&'a str, Miss> {
    let mut segments = path.split(PATH_DELIMITER).enumerate();
    let (_, first) = segments.next().ok_or(Miss::MissingKey { segment: 0 })?;
    let mut current = dictionary
        .root()
        .get(first)
        .ok_or(Miss::MissingKey { segment: 0 })?;
    for (index, segment) in segments {
        current = current
            .as_table()
            .and_then(|table| table.get(segment))
            .ok_or(Miss::MissingKey { segment: index })?;
    }
    current.as_text().ok_or(Miss::NotText)
}

/// Resolve `path`, falling back to `path` itself when it does not name a string.
#[must_use]
pub fn translate<'a>(dictionary: &'a Dictionary, path: &'a str) -> &'a str {
    match lookup(dictionary, path) {
        Ok(text) => text,
        Err(miss) => {
            log_miss(dictionary, path, miss);
            path
        }
    }
}

fn log_miss(dictionary: &Dictionary, path: &str, miss: Miss) {
    match miss {
        Miss::MissingKey { .. } => {
            debug!(locale = %dictionary.locale(), path, "translation key not found");
        }
        Miss::NotText => {
            debug!(locale = %dictionary.locale(), path, "translation key does not resolve to a string");
        }
    }
}

/// A memoized lookup; misses are remembered as well as hits.
#[derive(Debug, Clone)]
struct Memo {
    /// The translated text, or the path itself on a miss.
    text: Arc<str>,
    found: bool,
}

/// Memoizing translation handle bound to one dictionary.
///
/// The memo lives and dies with the translator, so a result resolved against
/// one dictionary is never served for another.
#[derive(Debug)]
pub struct Translator {
    dictionary: Dictionary,
    memo: Mutex<LruCache<String, Memo>>,
}

impl Translator {
    /// Translate against `dictionary` with the default memo size.
    #[must_use]
    pub fn new(dictionary: Dictionary) -> Self {
        Self::with_capacity(dictionary, DEFAULT_MEMO_CAPACITY)
    }

    /// Translate against `dictionary`, remembering up to `capacity` paths.
    #[must_use]
    pub fn with_capacity(dictionary: Dictionary, capacity: NonZeroUsize) -> Self {
        Self {
            dictionary,
            memo: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// The dictionary this translator reads.
    #[must_use]
    pub const fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Translate `path`, returning the path itself when it does not resolve.
    #[must_use]
    pub fn t(&self, path: &str) -> Arc<str> {
        self.memoized_lookup(path).text
    }

    /// Translate `path`, returning `fallback` when it does not resolve.
    ///
    /// Useful where a raw key would look wrong to a reader, such as page titles.
    #[must_use]
    pub fn t_or(&self, path: &str, fallback: &str) -> Arc<str> {
        let memo = self.memoized_lookup(path);
        if memo.found {
            memo.text
        } else {
            Arc::from(fallback)
        }
    }

    /// Number of memoized paths.
    #[must_use]
    pub fn memoized(&self) -> usize {
        self.lock_memo().len()
    }

    fn memoized_lookup(&self, path: &str) -> Memo {
        if let Some(hit) = self.lock_memo().get(path) {
            return hit.clone();
        }
        let memo = match lookup(&self.dictionary, path) {
            Ok(text) => Memo {
                text: Arc::from(text),
                found: true,
            },
            Err(miss) => {
                log_miss(&self.dictionary, path, miss);
                Memo {
                    text: Arc::from(path),
                    found: false,
                }
            }
        };
        self.lock_memo().put(path.to_owned(), memo.clone());
        memo
    }

    fn lock_memo(&self) -> MutexGuard<'_, LruCache<String, Memo>> {
        match self.memo.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
