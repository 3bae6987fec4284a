//! Settings that control a fetch run.

#[expect(clippy::module_inception, reason = "mirrors the crate's module layout")]
mod config;

pub use config::{Config, Credential, DEFAULT_CONFIG_TOML};
