//! Stub environment providers for configuration tests.
//!
//! These helpers implement the configuration traits so tests can inject
//! deterministic `KOTOBA_*` variables without touching the process
//! environment.

use std::collections::HashMap;

use kotoba::config::{ENV_PREFIX, EnvProvider};
use ortho_config::OrthoResult;
use serde_json::{Map, Value};

/// Stub environment holding a fixed set of variables.
#[derive(Debug, Default, Clone)]
pub struct StubEnv {
    vars: HashMap<String, String>,
}

impl StubEnv {
    /// Create an empty stub environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of the environment with `key` set to `value`.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_owned(), value.into());
        self
    }
}

impl EnvProvider for StubEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn layer(&self) -> OrthoResult<Value> {
        let fields: Map<String, Value> = self
            .vars
            .iter()
            .filter_map(|(key, value)| {
                let field = key.strip_prefix(ENV_PREFIX)?;
                Some((field.to_ascii_lowercase(), Value::String(value.clone())))
            })
            .collect();
        Ok(Value::Object(fields))
    }
}
