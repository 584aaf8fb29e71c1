//! Key parity checks between locale dictionaries.
//!
//! The default locale's dictionary is the reference: every other locale
//! should define the same text leaves. Keys absent from a locale render as raw
//! paths; keys present only in a locale are never looked up.

use std::collections::BTreeSet;

use crate::dictionary::{Dictionary, DictionaryError, DictionaryLoader, DictionarySource};
use crate::locale::Locale;

/// Differences between one locale and the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleAudit {
    /// The audited locale.
    pub locale: Locale,
    /// The locale's own resource failed and the default was served instead.
    pub fell_back: bool,
    /// Keys the default defines and this locale does not.
    pub missing: Vec<String>,
    /// Keys this locale defines and the default does not.
    pub orphaned: Vec<String>,
}

impl LocaleAudit {
    /// Return `true` when the locale is not in step with the default.
    #[must_use]
    pub const fn has_issues(&self) -> bool {
        self.fell_back || !self.missing.is_empty() || !self.orphaned.is_empty()
    }
}

/// Result of auditing every registered locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    /// Reference locale.
    pub default: Locale,
    /// One entry per non-default locale, in registry order.
    pub locales: Vec<LocaleAudit>,
}

impl AuditReport {
    /// Return `true` when any locale has issues.
    #[must_use]
    pub fn has_issues(&self) -> bool {
        self.locales.iter().any(LocaleAudit::has_issues)
    }
}

/// Compare `candidate` (requested as `locale`) against `reference`.
#[must_use]
pub fn compare(reference: &Dictionary, locale: &Locale, candidate: &Dictionary) -> LocaleAudit {
    let expected: BTreeSet<String> = reference.leaf_paths().into_iter().collect();
    let actual: BTreeSet<String> = candidate.leaf_paths().into_iter().collect();
    LocaleAudit {
        locale: locale.clone(),
        fell_back: candidate.locale() != locale,
        missing: expected.difference(&actual).cloned().collect(),
        orphaned: actual.difference(&expected).cloned().collect(),
    }
}

/// Load every registered locale through `loader` and compare it with the
/// default.
///
/// # Errors
///
/// Returns [`DictionaryError::DefaultUnavailable`] when the reference
/// dictionary itself cannot be loaded.
pub async fn audit<S: DictionarySource + 'static>(
    loader: &DictionaryLoader<S>,
) -> Result<AuditReport, DictionaryError> {
    let registry = loader.registry();
    let default = registry.default_locale();
    let reference = loader.get(default.as_str()).await?;
    let mut locales = Vec::new();
    for locale in registry.list().iter().filter(|locale| *locale != default) {
        let candidate = loader.get(locale.as_str()).await?;
        locales.push(compare(&reference, locale, &candidate));
    }
    Ok(AuditReport {
        default: default.clone(),
        locales,
    })
}
