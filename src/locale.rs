//! Supported locales and the designated default.
//!
//! The registry is static configuration: an ordered list of locale codes with
//! exactly one default. Everything else in the crate asks the registry whether
//! a code is supported rather than keeping its own list.

use std::borrow::Borrow;
use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Locale codes shipped with the crate, in display order.
pub const BUILTIN_LOCALES: [&str; 2] = ["en", "es"];
/// Default locale of the builtin registry.
pub const BUILTIN_DEFAULT_LOCALE: &str = "en";

/// A locale code such as `en` or `es-MX`.
///
/// Codes are restricted to ASCII letters, digits, `-` and `_` so they can be
/// used directly as resource names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locale(String);

impl Locale {
    /// Validate `code` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidCode`] when `code` is empty or contains
    /// characters outside `[A-Za-z0-9_-]`.
    pub fn parse(code: &str) -> Result<Self, RegistryError> {
        if is_valid_code(code) {
            Ok(Self(code.to_owned()))
        } else {
            Err(RegistryError::InvalidCode {
                code: code.to_owned(),
            })
        }
    }

    /// Borrow the locale code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Locale {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Locale {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Locale {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Return `true` when `code` is non-empty and only uses resource-safe characters.
#[must_use]
pub fn is_valid_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
}

/// Errors raised while building a [`LocaleRegistry`] from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum RegistryError {
    /// No locales were configured.
    #[error("at least one locale must be configured")]
    #[diagnostic(code(kotoba::locale::empty))]
    Empty,
    /// A locale code is not usable as a resource name.
    #[error("invalid locale code '{code}'")]
    #[diagnostic(
        code(kotoba::locale::invalid_code),
        help("locale codes may only contain ASCII letters, digits, '-' and '_'")
    )]
    InvalidCode {
        /// The rejected code.
        code: String,
    },
    /// The same code appears twice.
    #[error("locale '{code}' is listed more than once")]
    #[diagnostic(code(kotoba::locale::duplicate))]
    Duplicate {
        /// The repeated code.
        code: String,
    },
    /// The default locale is not part of the configured list.
    #[error("default locale '{code}' is not one of the configured locales")]
    #[diagnostic(code(kotoba::locale::default_not_registered))]
    DefaultNotRegistered {
        /// The configured default.
        code: String,
    },
}

/// Ordered set of supported locales with one default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleRegistry {
    locales: Vec<Locale>,
    default: Locale,
}

impl LocaleRegistry {
    /// Build a registry from configured codes and a default.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] when the list is empty, contains invalid or
    /// duplicate codes, or does not contain `default`.
    pub fn new<I, S>(codes: I, default: &str) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut locales: Vec<Locale> = Vec::new();
        for code in codes {
            let locale = Locale::parse(code.as_ref())?;
            if locales.contains(&locale) {
                return Err(RegistryError::Duplicate {
                    code: locale.0,
                });
            }
            locales.push(locale);
        }
        if locales.is_empty() {
            return Err(RegistryError::Empty);
        }
        let default_locale = locales
            .iter()
            .find(|locale| *locale == default)
            .cloned()
            .ok_or_else(|| RegistryError::DefaultNotRegistered {
                code: default.to_owned(),
            })?;
        Ok(Self {
            locales,
            default: default_locale,
        })
    }

    /// The locales shipped with the crate: `en` (default) and `es`.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            locales: BUILTIN_LOCALES
                .iter()
                .map(|code| Locale((*code).to_owned()))
                .collect(),
            default: Locale(BUILTIN_DEFAULT_LOCALE.to_owned()),
        }
    }

    /// Supported locales in configured order.
    #[must_use]
    pub fn list(&self) -> &[Locale] {
        &self.locales
    }

    /// The default locale; always a member of [`Self::list`].
    #[must_use]
    pub const fn default_locale(&self) -> &Locale {
        &self.default
    }

    /// Return `true` when `candidate` is a registered locale code.
    #[must_use]
    pub fn is_supported(&self, candidate: &str) -> bool {
        self.get(candidate).is_some()
    }

    /// Look up the registered locale matching `candidate` exactly.
    #[must_use]
    pub fn get(&self, candidate: &str) -> Option<&Locale> {
        self.locales.iter().find(|locale| *locale == candidate)
    }

    /// Return `true` when `candidate` names the default locale.
    #[must_use]
    pub fn is_default(&self, candidate: &str) -> bool {
        self.default == candidate
    }
}

impl Default for LocaleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn builtin_registry_lists_english_first() {
        let registry = LocaleRegistry::builtin();
        let codes: Vec<_> = registry.list().iter().map(Locale::as_str).collect();
        assert_eq!(codes, ["en", "es"]);
        assert_eq!(registry.default_locale().as_str(), "en");
        assert!(registry.is_supported("es"));
        assert!(!registry.is_supported("fr"));
        assert!(!registry.is_supported("EN"));
    }

    #[rstest]
    #[case(&[], "en", RegistryError::Empty)]
    #[case(&["en", "en"], "en", RegistryError::Duplicate { code: "en".into() })]
    #[case(&["en", "../x"], "en", RegistryError::InvalidCode { code: "../x".into() })]
    #[case(&["en", "es"], "fr", RegistryError::DefaultNotRegistered { code: "fr".into() })]
    fn rejects_inconsistent_configuration(
        #[case] codes: &[&str],
        #[case] default: &str,
        #[case] expected: RegistryError,
    ) {
        assert_eq!(LocaleRegistry::new(codes, default), Err(expected));
    }

    #[rstest]
    fn configured_default_need_not_be_first() {
        let registry = LocaleRegistry::new(["de", "fr"], "fr").expect("valid registry");
        assert_eq!(registry.default_locale().as_str(), "fr");
        assert!(registry.is_default("fr"));
        assert!(!registry.is_default("de"));
    }
}
