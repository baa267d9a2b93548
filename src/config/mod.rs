//! Application configuration module
//!
//! Type-safe settings loaded with the `config` crate. Values come from an
//! optional YAML file layered under environment variables with the
//! `ENTITLEMENTS_` prefix (nested values separated by `__`).
//!
//! The plan catalog and the baseline feature set are plain data here; they
//! are constructed once at startup and passed into the resolution and
//! synchronization components as values. There is no global mutable
//! registry.

mod error;
mod settings;

pub use error::ConfigError;
pub use settings::Settings;
