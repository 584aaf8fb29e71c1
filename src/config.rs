//! Site configuration: supported locales, dictionary location, routing.
//!
//! Layers are merged by `ortho_config` in increasing precedence: defaults,
//! a config file, `KOTOBA_*` environment variables, and finally
//! command-line overrides. Every field is optional; a layer only overrides
//! the fields it sets.
//!
//! The config file is the explicit path when one is given, else the path in
//! `KOTOBA_CONFIG_PATH`, else whatever [`ConfigDiscovery`] finds for the
//! `kotoba` application.

use std::convert::Infallible;
use std::fs;
use std::io;
use std::str::FromStr;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use miette::Diagnostic;
use ortho_config::declarative::LayerComposition;
use ortho_config::figment::{Figment, providers::Env};
use ortho_config::{
    ConfigDiscovery, MergeComposer, OrthoConfig, OrthoError, OrthoMergeExt, OrthoResult,
    sanitize_value,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::locale::{BUILTIN_DEFAULT_LOCALE, BUILTIN_LOCALES, LocaleRegistry, RegistryError};
use crate::routing::LocaleRouter;

/// Application name used for config discovery.
pub const APP_NAME: &str = "kotoba";
/// Prefix shared by every configuration environment variable.
pub const ENV_PREFIX: &str = "KOTOBA_";
/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "KOTOBA_CONFIG_PATH";
/// Environment variable listing locales, comma-separated.
pub const LOCALES_ENV: &str = "KOTOBA_LOCALES";
/// Environment variable naming the default locale.
pub const DEFAULT_LOCALE_ENV: &str = "KOTOBA_DEFAULT_LOCALE";
/// Environment variable naming the dictionary directory.
pub const DICTIONARY_DIR_ENV: &str = "KOTOBA_DICTIONARY_DIR";
/// Environment variable listing routing bypass prefixes, comma-separated.
pub const BYPASS_PREFIXES_ENV: &str = "KOTOBA_BYPASS_PREFIXES";

const FIELDS: [&str; 4] = ["locales", "default_locale", "dictionary_dir", "bypass_prefixes"];

/// Read-only environment access used for configuration.
pub trait EnvProvider {
    /// Fetch the environment variable value for `key`.
    fn var(&self, key: &str) -> Option<String>;

    /// Every [`ENV_PREFIX`] variable as a JSON object, keyed by the variable
    /// name with the prefix removed.
    ///
    /// # Errors
    ///
    /// Returns an [`OrthoError`] when the environment cannot be extracted.
    fn layer(&self) -> OrthoResult<Value>;
}

/// Environment provider backed by the process environment.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemEnv;

impl EnvProvider for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn layer(&self) -> OrthoResult<Value> {
        Figment::from(Env::prefixed(ENV_PREFIX))
            .extract::<Value>()
            .into_ortho_merge()
    }
}

/// Errors raised while reading configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}")]
    #[diagnostic(code(kotoba::config::read))]
    Read {
        /// Path of the config file.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The config file is not valid JSON.
    #[error("invalid config in {origin}")]
    #[diagnostic(
        code(kotoba::config::parse),
        help("expected a JSON object with optional keys: locales, default_locale, dictionary_dir, bypass_prefixes")
    )]
    Parse {
        /// Where the config came from.
        origin: String,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// The layers could not be composed into a [`SiteConfig`].
    #[error("failed to merge configuration layers")]
    #[diagnostic(code(kotoba::config::merge))]
    Merge(#[from] Arc<OrthoError>),
    /// The configured locales do not form a valid registry.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),
}

/// A list read from either a JSON array or one comma-separated string.
///
/// Entries are trimmed and blank entries dropped, so `" fr, de ,,"` and
/// `["fr", "de"]` describe the same list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ListForm")]
pub struct CommaList(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum ListForm {
    Joined(String),
    Items(Vec<String>),
}

impl From<ListForm> for CommaList {
    fn from(form: ListForm) -> Self {
        match form {
            ListForm::Joined(joined) => Self::new(joined.split(',')),
            ListForm::Items(items) => Self::new(items),
        }
    }
}

impl FromStr for CommaList {
    type Err = Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(raw.split(',')))
    }
}

impl CommaList {
    /// Collect `items`, trimming each and dropping blanks.
    #[must_use]
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            items
                .into_iter()
                .map(|item| item.as_ref().trim().to_owned())
                .filter(|item| !item.is_empty())
                .collect(),
        )
    }

    /// The entries in order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Site settings merged from every configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "KOTOBA")]
pub struct SiteConfig {
    /// Supported locale codes, in display order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locales: Option<CommaList>,
    /// Default locale; the first listed locale when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_locale: Option<String>,
    /// Directory of `<locale>.json` resources; the embedded dictionaries are
    /// used when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dictionary_dir: Option<Utf8PathBuf>,
    /// Path prefixes exempt from locale routing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bypass_prefixes: Option<CommaList>,
}

impl SiteConfig {
    /// Merge defaults, the config file, the environment of `env`, and then
    /// `overrides`, which carries command-line values.
    ///
    /// `explicit` names the config file; when absent, `KOTOBA_CONFIG_PATH`
    /// from `env` is tried before discovery.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`] when a named
    /// config file is unusable, and [`ConfigError::Merge`] when a layer cannot
    /// be extracted or the merged layers do not describe a [`SiteConfig`].
    pub fn load(
        overrides: &Self,
        explicit: Option<&Utf8Path>,
        env: &impl EnvProvider,
    ) -> Result<Self, ConfigError> {
        let mut errors = Vec::new();
        let mut composer = MergeComposer::with_capacity(4);

        match sanitize_value(&Self::default()) {
            Ok(value) => composer.push_defaults(value),
            Err(err) => errors.push(err),
        }

        let env_path = env
            .var(CONFIG_PATH_ENV)
            .filter(|path| !path.trim().is_empty())
            .map(Utf8PathBuf::from);
        if let Some(path) = explicit.or(env_path.as_deref()) {
            composer.push_file(read_layer(path)?, None);
        } else {
            let discovery = ConfigDiscovery::builder(APP_NAME)
                .env_var(CONFIG_PATH_ENV)
                .build();
            let mut file_layers = discovery.compose_layers();
            errors.append(&mut file_layers.required_errors);
            if file_layers.value.is_empty() {
                errors.append(&mut file_layers.optional_errors);
            }
            for layer in file_layers.value {
                composer.push_layer(layer);
            }
        }

        match env.layer() {
            Ok(value) => composer.push_environment(known_fields(value)),
            Err(err) => errors.push(err),
        }

        match sanitize_value(overrides) {
            Ok(value) if !is_empty_value(&value) => composer.push_cli(value),
            Ok(_) => {}
            Err(err) => errors.push(err),
        }

        let composition = LayerComposition::new(composer.layers(), errors);
        composition
            .into_merge_result(Self::merge_from_layers)
            .map_err(ConfigError::from)
    }

    /// Build the locale registry this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Registry`] when the locales are inconsistent.
    pub fn registry(&self) -> Result<LocaleRegistry, ConfigError> {
        let listed = self
            .locales
            .as_ref()
            .map(CommaList::as_slice)
            .filter(|codes| !codes.is_empty());
        let chosen = self
            .default_locale
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty());
        let registry = match (listed, chosen) {
            (None, None) => LocaleRegistry::builtin(),
            (None, Some(default)) => LocaleRegistry::new(BUILTIN_LOCALES, default)?,
            (Some(codes), default) => {
                let first = codes.first().map_or(BUILTIN_DEFAULT_LOCALE, String::as_str);
                LocaleRegistry::new(codes, default.unwrap_or(first))?
            }
        };
        Ok(registry)
    }

    /// Build a router over `registry` honouring the configured bypass prefixes.
    #[must_use]
    pub fn router(&self, registry: Arc<LocaleRegistry>) -> LocaleRouter {
        let router = LocaleRouter::new(registry);
        match &self.bypass_prefixes {
            Some(prefixes) => router.with_bypass_prefixes(prefixes.as_slice()),
            None => router,
        }
    }
}

/// Read a JSON config file as a merge layer.
fn read_layer(path: &Utf8Path) -> Result<Value, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        origin: path.to_string(),
        source,
    })
}

/// Keep only the [`SiteConfig`] keys of an environment layer, lower-cased.
/// Blank values count as unset.
fn known_fields(value: Value) -> Value {
    let Value::Object(vars) = value else {
        return Value::Object(Map::new());
    };
    let fields = vars
        .into_iter()
        .filter(|(_, entry)| !matches!(entry, Value::String(text) if text.trim().is_empty()))
        .filter_map(|(key, entry)| {
            let field = key.to_ascii_lowercase();
            FIELDS.contains(&field.as_str()).then_some((field, entry))
        })
        .collect();
    Value::Object(fields)
}

fn is_empty_value(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.is_empty())
}
