//! Keyed translation resources.
//!
//! A source turns a locale code into a parsed [`Dictionary`] or a
//! [`SourceError`]. Sources do no caching and no fallback; both belong to the
//! loader.

use std::borrow::Cow;
use std::future::{self, Future};
use std::io;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use tracing::debug;

use super::{Dictionary, SourceError};
use crate::locale::Locale;

const EN_JSON: &str = include_str!("../../locales/en.json");
const ES_JSON: &str = include_str!("../../locales/es.json");

/// File extension of on-disk translation resources.
pub const RESOURCE_EXTENSION: &str = "json";

/// Produces the dictionary for a locale code.
pub trait DictionarySource: Send + Sync {
    /// Load and parse the resource for `locale`.
    ///
    /// `locale` is whatever the caller asked for and may not be registered.
    fn load(&self, locale: &str) -> impl Future<Output = Result<Dictionary, SourceError>> + Send;
}

impl<S: DictionarySource> DictionarySource for Arc<S> {
    fn load(&self, locale: &str) -> impl Future<Output = Result<Dictionary, SourceError>> + Send {
        S::load(self, locale)
    }
}

fn resource_name(locale: &str) -> Result<Locale, SourceError> {
    Locale::parse(locale).map_err(|_| SourceError::InvalidName {
        locale: locale.to_owned(),
    })
}

fn parse_resource(locale: Locale, json: &str) -> Result<Dictionary, SourceError> {
    let code = locale.as_str().to_owned();
    Dictionary::from_json(locale, json)
        .map_err(|source| SourceError::Malformed { locale: code, source })
}

/// Reads `<root>/<locale>.json` from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySource {
    root: Utf8PathBuf,
}

impl DirectorySource {
    /// Serve resources from `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the resources.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Path of the resource for `locale`.
    #[must_use]
    pub fn resource_path(&self, locale: &Locale) -> Utf8PathBuf {
        self.root
            .join(format!("{}.{RESOURCE_EXTENSION}", locale.as_str()))
    }
}

impl DictionarySource for DirectorySource {
    async fn load(&self, locale: &str) -> Result<Dictionary, SourceError> {
        let name = resource_name(locale)?;
        let path = self.resource_path(&name);
        debug!(%path, "reading dictionary resource");
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(SourceError::Missing {
                    locale: locale.to_owned(),
                    path: Some(path),
                });
            }
            Err(source) => {
                return Err(SourceError::Io {
                    locale: locale.to_owned(),
                    path,
                    source,
                });
            }
        };
        parse_resource(name, &json)
    }
}

/// Resources held in memory, either compiled in or registered at runtime.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedSource {
    resources: IndexMap<String, Cow<'static, str>>,
}

impl EmbeddedSource {
    /// An empty source; every load reports [`SourceError::Missing`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The dictionaries compiled into the crate (`en` and `es`).
    #[must_use]
    pub fn builtin() -> Self {
        Self::new()
            .with_resource("en", EN_JSON)
            .with_resource("es", ES_JSON)
    }

    /// Register (or replace) the JSON text served for `locale`.
    #[must_use]
    pub fn with_resource(mut self, locale: &str, json: impl Into<Cow<'static, str>>) -> Self {
        self.resources.insert(locale.to_owned(), json.into());
        self
    }

    /// Codes with a registered resource, in registration order.
    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    fn load_now(&self, locale: &str) -> Result<Dictionary, SourceError> {
        let name = resource_name(locale)?;
        let json = self
            .resources
            .get(locale)
            .ok_or_else(|| SourceError::Missing {
                locale: locale.to_owned(),
                path: None,
            })?;
        parse_resource(name, json)
    }
}

impl DictionarySource for EmbeddedSource {
    fn load(&self, locale: &str) -> impl Future<Output = Result<Dictionary, SourceError>> + Send {
        future::ready(self.load_now(locale))
    }
}
