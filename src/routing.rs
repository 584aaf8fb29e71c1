//! Request-time locale detection and redirection.
//!
//! Every page lives under a locale prefix (`/en/about`). A request whose path
//! does not start with a registered locale is redirected to the same path
//! under the default locale, keeping its query string. Any first segment that
//! equals a registered code counts as a prefix, even if no page exists below
//! it.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::locale::{Locale, LocaleRegistry};

/// Path prefixes that skip locale routing by default (static assets).
pub const DEFAULT_BYPASS_PREFIXES: [&str; 4] =
    ["/_next/static", "/_next/image", "/favicon.ico", "/public"];

/// Header carrying the original request path downstream.
pub const PATHNAME_HEADER: &str = "x-pathname";
/// Header carrying the request scheme downstream.
pub const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";
/// Header carrying the resolved locale downstream.
pub const LOCALE_HEADER: &str = "x-locale";

/// Outcome of routing a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// The path already carries this locale; serve it unchanged.
    Continue(Locale),
    /// Redirect the client to this path (query string included).
    Redirect(String),
}

/// Outcome of routing an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlDecision {
    /// Serve the request, annotated for downstream handlers.
    Continue(ForwardedRequest),
    /// Redirect the client to this URL.
    Redirect(Url),
}

/// Annotations attached to a request that passed locale routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedRequest {
    /// Locale taken from the path prefix.
    pub locale: Locale,
    /// Request path without query or fragment.
    pub pathname: String,
    /// URL scheme without the trailing colon, for example `https`.
    pub protocol: String,
}

impl ForwardedRequest {
    /// Header name/value pairs to attach before forwarding the request.
    #[must_use]
    pub fn headers(&self) -> [(&'static str, &str); 3] {
        [
            (PATHNAME_HEADER, self.pathname.as_str()),
            (FORWARDED_PROTO_HEADER, self.protocol.as_str()),
            (LOCALE_HEADER, self.locale.as_str()),
        ]
    }
}

/// Routes request paths against a [`LocaleRegistry`].
#[derive(Debug, Clone)]
pub struct LocaleRouter {
    registry: Arc<LocaleRegistry>,
    bypass_prefixes: Vec<String>,
}

impl LocaleRouter {
    /// Route against `registry`, bypassing [`DEFAULT_BYPASS_PREFIXES`].
    #[must_use]
    pub fn new(registry: Arc<LocaleRegistry>) -> Self {
        Self {
            registry,
            bypass_prefixes: DEFAULT_BYPASS_PREFIXES
                .iter()
                .map(|prefix| (*prefix).to_owned())
                .collect(),
        }
    }

    /// Replace the prefixes that [`Self::intercept`] leaves alone.
    #[must_use]
    pub fn with_bypass_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bypass_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// The registry this router consults.
    #[must_use]
    pub fn registry(&self) -> &LocaleRegistry {
        &self.registry
    }

    /// Prefixes exempt from locale routing.
    #[must_use]
    pub fn bypass_prefixes(&self) -> &[String] {
        &self.bypass_prefixes
    }

    /// Decide whether `target` (a path with optional query and fragment)
    /// carries a locale or must be redirected.
    ///
    /// `/` redirects to exactly `/<default>`; any other unprefixed path `p`
    /// redirects to `/<default>p`. A target missing its leading `/` is
    /// treated as if it had one.
    #[must_use]
    pub fn resolve(&self, target: &str) -> RouteDecision {
        let (path, suffix) = split_target(target);
        if let Some(locale) = self.locale_prefix(&path) {
            debug!(path = %path, locale = %locale, "request carries locale prefix");
            return RouteDecision::Continue(locale.clone());
        }
        let redirect = format!("{}{suffix}", self.default_prefixed(&path));
        debug!(path = %path, redirect = %redirect, "redirecting to default locale");
        RouteDecision::Redirect(redirect)
    }

    /// Like [`Self::resolve`], but returns `None` for paths under a bypass
    /// prefix, which should be served without locale handling.
    #[must_use]
    pub fn intercept(&self, target: &str) -> Option<RouteDecision> {
        let (path, _) = split_target(target);
        if self.is_bypassed(&path) {
            debug!(path = %path, "bypassing locale routing");
            return None;
        }
        Some(self.resolve(target))
    }

    /// Route an absolute request URL.
    ///
    /// Redirects keep scheme, host, port, query and fragment. Requests that
    /// carry a locale are annotated with the values of the headers listed in
    /// [`ForwardedRequest::headers`].
    #[must_use]
    pub fn resolve_url(&self, url: &Url) -> UrlDecision {
        let path = url.path();
        if let Some(locale) = self.locale_prefix(path) {
            return UrlDecision::Continue(ForwardedRequest {
                locale: locale.clone(),
                pathname: path.to_owned(),
                protocol: url.scheme().to_owned(),
            });
        }
        let mut target = url.clone();
        target.set_path(&self.default_prefixed(path));
        UrlDecision::Redirect(target)
    }

    /// The registered locale named by the first segment of `path`, if any.
    #[must_use]
    pub fn locale_prefix(&self, path: &str) -> Option<&Locale> {
        let segment = path.strip_prefix('/')?.split('/').next()?;
        self.registry.get(segment)
    }

    /// Locale shown by a page at `pathname`: its first non-empty segment when
    /// registered, otherwise the default.
    #[must_use]
    pub fn current_locale(&self, pathname: &str) -> &Locale {
        pathname
            .split('/')
            .find(|segment| !segment.is_empty())
            .and_then(|segment| self.registry.get(segment))
            .unwrap_or_else(|| self.registry.default_locale())
    }

    /// Path of the same page in `target`.
    ///
    /// A leading registered locale segment is replaced; otherwise `target` is
    /// inserted in front. The root maps to `/<target>`.
    #[must_use]
    pub fn switch_locale(&self, pathname: &str, target: &Locale) -> String {
        let mut segments: Vec<&str> = pathname
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();
        match segments.first() {
            None => return format!("/{target}"),
            Some(first) if self.registry.is_supported(first) => {
                segments.remove(0);
            }
            Some(_) => {}
        }
        segments.insert(0, target.as_str());
        format!("/{}", segments.join("/"))
    }

    fn is_bypassed(&self, path: &str) -> bool {
        self.bypass_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    fn default_prefixed(&self, path: &str) -> String {
        let default = self.registry.default_locale();
        if path == "/" {
            format!("/{default}")
        } else {
            format!("/{default}{path}")
        }
    }
}

/// Split a request target into its normalized path and the `?`/`#` suffix.
fn split_target(target: &str) -> (Cow<'_, str>, &str) {
    let (path, suffix) = target
        .find(['?', '#'])
        .map_or((target, ""), |index| target.split_at(index));
    let normalized = if path.is_empty() {
        Cow::Borrowed("/")
    } else if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{path}"))
    };
    (normalized, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "/", "")]
    #[case("/about?x=1#top", "/about", "?x=1#top")]
    #[case("about", "/about", "")]
    #[case("#frag", "/", "#frag")]
    fn split_target_normalizes_path(
        #[case] target: &str,
        #[case] path: &str,
        #[case] suffix: &str,
    ) {
        let (split_path, split_suffix) = split_target(target);
        assert_eq!(split_path, path);
        assert_eq!(split_suffix, suffix);
    }
}
