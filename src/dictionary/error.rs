//! Error types for dictionary sources and the loader.

use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

use crate::locale::Locale;

/// Failure to produce a dictionary from a single resource.
#[derive(Debug, Error, Diagnostic)]
pub enum SourceError {
    /// The locale code cannot name a resource.
    #[error("locale code '{locale}' is not a valid resource name")]
    #[diagnostic(code(kotoba::dictionary::invalid_name))]
    InvalidName {
        /// The requested code.
        locale: String,
    },
    /// No resource exists for the locale.
    #[error("no dictionary resource for locale '{locale}'")]
    #[diagnostic(code(kotoba::dictionary::missing))]
    Missing {
        /// The requested code.
        locale: String,
        /// Where the resource was expected, for file-backed sources.
        path: Option<Utf8PathBuf>,
    },
    /// The resource exists but could not be read.
    #[error("failed to read dictionary for locale '{locale}' from {path}")]
    #[diagnostic(code(kotoba::dictionary::io))]
    Io {
        /// The requested code.
        locale: String,
        /// The resource path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The resource is not a JSON object of translation entries.
    #[error("dictionary for locale '{locale}' is malformed")]
    #[diagnostic(
        code(kotoba::dictionary::malformed),
        help("translation resources must be a JSON object of strings and nested objects")
    )]
    Malformed {
        /// The requested code.
        locale: String,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Failure returned by [`super::DictionaryLoader::get`].
///
/// Only the default locale can fail terminally; every other locale falls back
/// to it first.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum DictionaryError {
    /// The default locale's own resource could not be loaded.
    #[error("failed to load dictionary for default locale '{locale}'")]
    #[diagnostic(code(kotoba::dictionary::default_unavailable))]
    DefaultUnavailable {
        /// The default locale.
        locale: Locale,
        /// Why its resource failed.
        #[source]
        source: Arc<SourceError>,
    },
}
