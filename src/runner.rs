//! CLI execution and command dispatch logic.
//!
//! Keeps `main` minimal: configuration is merged here, the async runtime is
//! started here, and every command writes its report to the supplied writer.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use camino::Utf8PathBuf;
use tracing::{debug, info};

use crate::audit::{self, AuditReport};
use crate::cli::{Cli, Commands};
use crate::config::{EnvProvider, SiteConfig};
use crate::dictionary::{
    Dictionary, DictionaryCache, DictionaryLoader, DictionarySource, DirectorySource,
    EmbeddedSource, SourceError,
};
use crate::locale::LocaleRegistry;
use crate::routing::{LocaleRouter, RouteDecision};
use crate::translate::Translator;

/// Dictionary source selected by configuration.
#[derive(Debug, Clone)]
enum ConfiguredSource {
    Directory(DirectorySource),
    Embedded(EmbeddedSource),
}

impl DictionarySource for ConfiguredSource {
    async fn load(&self, locale: &str) -> Result<Dictionary, SourceError> {
        match self {
            Self::Directory(source) => source.load(locale).await,
            Self::Embedded(source) => source.load(locale).await,
        }
    }
}

struct Settings {
    registry: Arc<LocaleRegistry>,
    router: LocaleRouter,
    source: ConfiguredSource,
}

impl Settings {
    fn resolve(cli: &Cli, env: &impl EnvProvider) -> Result<Self> {
        let explicit = cli.config.clone().map(utf8_path).transpose()?;
        let overrides = SiteConfig {
            dictionary_dir: cli.dictionaries.clone().map(utf8_path).transpose()?,
            ..SiteConfig::default()
        };
        let config = SiteConfig::load(&overrides, explicit.as_deref(), env)
            .context("load configuration")?;
        debug!(?config, "resolved configuration");
        let registry = Arc::new(config.registry().context("build locale registry")?);
        let router = config.router(Arc::clone(&registry));
        let source = config.dictionary_dir.map_or_else(
            || ConfiguredSource::Embedded(EmbeddedSource::builtin()),
            |dir| ConfiguredSource::Directory(DirectorySource::new(dir)),
        );
        Ok(Self {
            registry,
            router,
            source,
        })
    }

    fn loader(self) -> DictionaryLoader<ConfiguredSource> {
        DictionaryLoader::new(self.registry, self.source, Arc::new(DictionaryCache::new()))
    }
}

fn utf8_path(path: std::path::PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path)
        .map_err(|raw| anyhow!("path is not valid UTF-8: {}", raw.display()))
}

/// Execute the parsed [`Cli`] commands, writing reports to `out`.
///
/// # Errors
///
/// Returns an error when configuration is invalid, the default dictionary
/// cannot be loaded, writing to `out` fails, or an audit finds issues.
pub fn run(cli: &Cli, env: &impl EnvProvider, out: &mut dyn Write) -> Result<()> {
    let settings = Settings::resolve(cli, env)?;
    match &cli.command {
        Commands::Route { target } => write_route(&settings.router, target, out),
        Commands::Locales => write_locales(&settings.registry, out),
        Commands::Lookup { locale, keys } => {
            let requested = locale
                .clone()
                .unwrap_or_else(|| settings.registry.default_locale().to_string());
            let loader = settings.loader();
            let dictionary = block_on(loader.get(&requested))?
                .with_context(|| format!("load dictionary for '{requested}'"))?;
            if dictionary.locale() != requested.as_str() {
                info!(requested = %requested, served = %dictionary.locale(), "served fallback dictionary");
            }
            write_lookups(&Translator::new(dictionary), keys, out)
        }
        Commands::Audit => {
            let loader = settings.loader();
            let report = block_on(audit::audit(&loader))?.context("audit dictionaries")?;
            write_audit(&report, out)?;
            if report.has_issues() {
                bail!("dictionaries for {} are out of step", report.default);
            }
            Ok(())
        }
    }
}

fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    Ok(runtime.block_on(future))
}

fn write_route(router: &LocaleRouter, target: &str, out: &mut dyn Write) -> Result<()> {
    let written = match router.intercept(target) {
        None => writeln!(out, "bypass"),
        Some(RouteDecision::Continue(locale)) => writeln!(out, "continue {locale}"),
        Some(RouteDecision::Redirect(path)) => writeln!(out, "redirect {path}"),
    };
    written.context("write route decision")
}

fn write_locales(registry: &LocaleRegistry, out: &mut dyn Write) -> Result<()> {
    for locale in registry.list() {
        let marker = if registry.is_default(locale.as_str()) {
            " (default)"
        } else {
            ""
        };
        writeln!(out, "{locale}{marker}").context("write locale list")?;
    }
    Ok(())
}

fn write_lookups(translator: &Translator, keys: &[String], out: &mut dyn Write) -> Result<()> {
    for key in keys {
        writeln!(out, "{}", translator.t(key)).context("write translation")?;
    }
    Ok(())
}

fn write_audit(report: &AuditReport, out: &mut dyn Write) -> Result<()> {
    for entry in &report.locales {
        let code = &entry.locale;
        if !entry.has_issues() {
            writeln!(out, "{code}: ok").context("write audit report")?;
            continue;
        }
        if entry.fell_back {
            writeln!(out, "{code}: resource unavailable, serving {}", report.default)
                .context("write audit report")?;
        }
        for key in &entry.missing {
            writeln!(out, "{code}: missing {key}").context("write audit report")?;
        }
        for key in &entry.orphaned {
            writeln!(out, "{code}: orphaned {key}").context("write audit report")?;
        }
    }
    Ok(())
}
