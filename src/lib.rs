//! Kotoba core library.
//!
//! Locale-prefixed request routing and translation dictionaries for a
//! localized site: a registry of supported locales, a cached loader that
//! falls back to the default locale, and dot-path translation lookup.

pub mod audit;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod dictionary;
pub mod locale;
pub mod routing;
pub mod runner;
pub mod site;
pub mod translate;

pub use dictionary::{Dictionary, DictionaryCache, DictionaryError, DictionaryLoader};
pub use locale::{Locale, LocaleRegistry};
pub use routing::{LocaleRouter, RouteDecision};
pub use site::{Page, Site};
pub use translate::{Translator, translate};
