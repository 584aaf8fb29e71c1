//! Command line interface definition using clap.
//!
//! Kept free of crate-internal imports so `build.rs` can include it to render
//! the manual page.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Route request paths and inspect translation dictionaries for a localized site.
#[derive(Debug, Parser, Clone, PartialEq, Eq)]
#[command(name = "kotoba", author, version, about, long_about = None)]
pub struct Cli {
    /// JSON config file (overrides `KOTOBA_CONFIG_PATH`).
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Directory of `<locale>.json` dictionaries (overrides config and
    /// `KOTOBA_DICTIONARY_DIR`). The embedded dictionaries are used when no
    /// directory is configured.
    #[arg(short, long, value_name = "DIR", global = true)]
    pub dictionaries: Option<PathBuf>,

    /// Enable verbose diagnostic logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available top-level commands.
#[derive(Debug, Subcommand, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show how a request path is routed.
    Route {
        /// Request path, optionally with a query string.
        #[arg(value_name = "PATH")]
        target: String,
    },

    /// Translate one or more dot-separated keys.
    Lookup {
        /// Locale to translate into; unknown locales fall back to the default.
        #[arg(short, long, value_name = "LOCALE")]
        locale: Option<String>,

        /// Keys such as `home.welcome`.
        #[arg(value_name = "KEY", required = true)]
        keys: Vec<String>,
    },

    /// List supported locales.
    Locales,

    /// Report keys missing from, or only present in, non-default locales.
    Audit,
}
