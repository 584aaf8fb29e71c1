//! Translation dictionaries and their loading machinery.
//!
//! A [`Dictionary`] is the parsed, immutable content of one locale's
//! translation resource. Resources come from a [`DictionarySource`] and are
//! loaded at most once per locale through a shared [`DictionaryCache`] by the
//! [`DictionaryLoader`].

mod error;
pub mod loader;
pub mod source;

pub use error::{DictionaryError, SourceError};
pub use loader::{DictionaryCache, DictionaryLoader};
pub use source::{DictionarySource, DirectorySource, EmbeddedSource};

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::locale::Locale;

/// Nested table of translation entries keyed by segment name.
pub type Table = IndexMap<String, Entry>;

/// One value inside a dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    /// A translated string; the only value a lookup can resolve to.
    Text(String),
    /// A nested group of entries.
    Table(Table),
    /// Any other JSON value. Kept so one odd leaf does not reject the whole
    /// resource, but never returned as a translation.
    Other(serde_json::Value),
}

impl Entry {
    /// Borrow the string when this entry is [`Entry::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Table(_) | Self::Other(_) => None,
        }
    }

    /// Borrow the nested table when this entry is [`Entry::Table`].
    #[must_use]
    pub const fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Table(table) => Some(table),
            Self::Text(_) | Self::Other(_) => None,
        }
    }
}

/// Immutable translation data for one locale.
///
/// Cloning is cheap: clones share the same underlying table, and
/// [`Dictionary::ptr_eq`] tells whether two handles came from the same load.
#[derive(Debug, Clone)]
pub struct Dictionary {
    locale: Locale,
    root: Arc<Table>,
}

impl Dictionary {
    /// Wrap an already parsed table.
    #[must_use]
    pub fn new(locale: Locale, root: Table) -> Self {
        Self {
            locale,
            root: Arc::new(root),
        }
    }

    /// Parse a JSON resource whose root must be an object.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when `json` is not valid JSON or its
    /// root is not an object.
    pub fn from_json(locale: Locale, json: &str) -> Result<Self, serde_json::Error> {
        let root: Table = serde_json::from_str(json)?;
        Ok(Self::new(locale, root))
    }

    /// Locale whose resource produced this dictionary.
    ///
    /// After a fallback this is the default locale, not the one requested.
    #[must_use]
    pub const fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Top-level table.
    #[must_use]
    pub fn root(&self) -> &Table {
        &self.root
    }

    /// Return `true` when both handles share the same loaded table.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }

    /// Dot-paths of every text leaf, in document order.
    #[must_use]
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_leaf_paths(&self.root, None, &mut paths);
        paths
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        self.locale == other.locale && self.root == other.root
    }
}

impl Serialize for Dictionary {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.root.serialize(serializer)
    }
}

fn collect_leaf_paths(table: &Table, prefix: Option<&str>, out: &mut Vec<String>) {
    for (key, entry) in table {
        let path = prefix.map_or_else(|| key.clone(), |parent| format!("{parent}.{key}"));
        match entry {
            Entry::Text(_) => out.push(path),
            Entry::Table(nested) => collect_leaf_paths(nested, Some(&path), out),
            Entry::Other(_) => {}
        }
    }
}
