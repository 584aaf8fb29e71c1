//! Test utilities for the dictionary loader, routing and CLI tests.
//!
//! Provides instrumented dictionary sources, stub environments, and helpers
//! for writing dictionary resources to temporary directories.

pub mod dictionaries;
pub mod locale_stubs;
pub mod sources;

pub use dictionaries::{DictionaryDir, EN_FIXTURE, ES_FIXTURE};
pub use locale_stubs::StubEnv;
pub use sources::{CountingSource, GatedSource};
