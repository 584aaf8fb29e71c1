//! Terminal rendering of command failures.
//!
//! The first error in a chain that carries a [`Diagnostic`] is drawn by
//! miette's graphical handler, so its code and help text reach the user.
//! Errors without one print as the plain `anyhow` chain.

use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};

use crate::config::ConfigError;
use crate::dictionary::{DictionaryError, SourceError};
use crate::locale::RegistryError;

/// First error in `err`'s chain with diagnostic metadata.
#[must_use]
pub fn find_diagnostic(err: &anyhow::Error) -> Option<&dyn Diagnostic> {
    err.chain().find_map(|cause| {
        cause
            .downcast_ref::<ConfigError>()
            .map(|found| found as &dyn Diagnostic)
            .or_else(|| {
                cause
                    .downcast_ref::<DictionaryError>()
                    .map(|found| found as &dyn Diagnostic)
            })
            .or_else(|| {
                cause
                    .downcast_ref::<RegistryError>()
                    .map(|found| found as &dyn Diagnostic)
            })
            .or_else(|| {
                cause
                    .downcast_ref::<SourceError>()
                    .map(|found| found as &dyn Diagnostic)
            })
    })
}

/// Render `err` for stderr, without colour.
#[must_use]
pub fn render(err: &anyhow::Error) -> String {
    let Some(diagnostic) = find_diagnostic(err) else {
        return format!("{err:#}");
    };
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    let mut report = String::new();
    match handler.render_report(&mut report, diagnostic) {
        Ok(()) => format!("{err}\n{report}"),
        Err(_) => format!("{err:#}"),
    }
}
