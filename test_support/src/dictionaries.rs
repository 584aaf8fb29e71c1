//! Dictionary fixtures and on-disk resource helpers.

use std::fs;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// Small English dictionary used across tests.
pub const EN_FIXTURE: &str = r#"{
  "home": { "welcome": "Hi", "description": "Start here" },
  "errors": { "tryAgain": "Try again" },
  "meta": { "title": "Site" }
}"#;

/// Spanish counterpart of [`EN_FIXTURE`] missing `meta.title` and adding
/// `home.extra`.
pub const ES_FIXTURE: &str = r#"{
  "home": { "welcome": "Hola", "description": "Empieza aquí", "extra": "Más" },
  "errors": { "tryAgain": "Inténtalo de nuevo" },
  "meta": {}
}"#;

/// Temporary directory of `<locale>.json` resources.
#[derive(Debug)]
pub struct DictionaryDir {
    _dir: TempDir,
    path: Utf8PathBuf,
}

impl DictionaryDir {
    /// Create an empty resource directory.
    ///
    /// # Errors
    ///
    /// Fails when the temporary directory cannot be created or its path is
    /// not UTF-8.
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create dictionary dir")?;
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|raw| anyhow::anyhow!("temp dir is not UTF-8: {}", raw.display()))?;
        Ok(Self { _dir: dir, path })
    }

    /// Write `contents` as the resource for `locale`.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be written.
    pub fn write(&self, locale: &str, contents: &str) -> Result<&Self> {
        let file = self.path.join(format!("{locale}.json"));
        fs::write(&file, contents).with_context(|| format!("write {file}"))?;
        Ok(self)
    }

    /// Directory path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}
