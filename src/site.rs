//! Per-request flow: route the path, load the dictionary, hand out a translator.

use std::sync::Arc;

use crate::dictionary::{DictionaryCache, DictionaryError, DictionaryLoader, DictionarySource};
use crate::locale::{Locale, LocaleRegistry};
use crate::routing::{LocaleRouter, RouteDecision};
use crate::translate::Translator;

/// What to do with a request.
#[derive(Debug)]
pub enum Page {
    /// Send an HTTP redirect to this path.
    Redirect(String),
    /// Render the page in `locale`.
    Render {
        /// Locale from the request path.
        locale: Locale,
        /// Translator over that locale's dictionary (or the default's, after
        /// a fallback).
        translator: Translator,
    },
}

/// Router and loader sharing one registry.
#[derive(Debug)]
pub struct Site<S> {
    router: LocaleRouter,
    loader: DictionaryLoader<S>,
}

impl<S: DictionarySource + 'static> Site<S> {
    /// Assemble a site from its parts.
    #[must_use]
    pub fn new(registry: Arc<LocaleRegistry>, source: S, cache: Arc<DictionaryCache>) -> Self {
        Self {
            router: LocaleRouter::new(Arc::clone(&registry)),
            loader: DictionaryLoader::new(registry, source, cache),
        }
    }

    /// Replace the prefixes the router leaves alone. The router is rebuilt
    /// over the loader's registry.
    #[must_use]
    pub fn with_bypass_prefixes<I, P>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.router = LocaleRouter::new(Arc::clone(self.loader.registry_handle()))
            .with_bypass_prefixes(prefixes);
        self
    }

    /// The request router.
    #[must_use]
    pub const fn router(&self) -> &LocaleRouter {
        &self.router
    }

    /// The dictionary loader.
    #[must_use]
    pub const fn loader(&self) -> &DictionaryLoader<S> {
        &self.loader
    }

    /// Route `target` and, when it carries a locale, load that locale's
    /// dictionary.
    ///
    /// # Errors
    ///
    /// Returns [`DictionaryError::DefaultUnavailable`] when no dictionary can
    /// be loaded for the page; callers should render a generic error page.
    pub async fn prepare(&self, target: &str) -> Result<Page, DictionaryError> {
        match self.router.resolve(target) {
            RouteDecision::Redirect(path) => Ok(Page::Redirect(path)),
            RouteDecision::Continue(locale) => {
                let dictionary = self.loader.get(locale.as_str()).await?;
                Ok(Page::Render {
                    locale,
                    translator: Translator::new(dictionary),
                })
            }
        }
    }
}
