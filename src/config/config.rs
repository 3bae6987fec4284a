use crate::Result;
use crate::fetch::DEFAULT_API_BASE_URL;
use camino::{Utf8Path, Utf8PathBuf};
use core::fmt;
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

const LOG_TARGET: &str = "    config";

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// File names searched for, in order, when no configuration path is given.
const CONFIG_FILE_NAMES: [&str; 4] = ["pulse.toml", "pulse.yml", "pulse.yaml", "pulse.json"];

/// An API access token.
///
/// The value is passed through to the transport untouched and is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Number of top repositories to fetch
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Maximum number of API requests in flight at once
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Maximum number of API requests started within any one-second window
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<Credential>,
}

const fn default_limit() -> u32 {
    100
}

const fn default_max_concurrent_requests() -> usize {
    10
}

const fn default_requests_per_second() -> u32 {
    30
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    60
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `pulse.toml`, `pulse.yml`, `pulse.yaml` and `pulse.json`
    /// are tried in `dir`, in that order. The file format follows the file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or holds invalid values
    pub fn load(dir: &Utf8Path, config_path: Option<&Utf8Path>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading repo-pulse configuration from {path}"))?;
            (path.to_path_buf(), text)
        } else {
            let Some(found) = Self::find(dir)? else {
                log::debug!(target: LOG_TARGET, "No configuration file found in '{dir}', using defaults");
                return Ok(Self::default());
            };
            found
        };

        let extension = final_path.extension().unwrap_or_default();
        let config: Self = match extension {
            "toml" => toml::from_str(&text).into_app_err_with(|| format!("parsing TOML configuration from {final_path}"))?,
            "yml" | "yaml" => serde_yaml::from_str(&text).into_app_err_with(|| format!("parsing YAML configuration from {final_path}"))?,
            "json" => serde_json::from_str(&text).into_app_err_with(|| format!("parsing JSON configuration from {final_path}"))?,
            _ => return Err(app_err!("unsupported configuration file extension: {extension}")),
        };

        config.validate()?;

        log::debug!(target: LOG_TARGET, "Loaded configuration from '{final_path}'");
        Ok(config)
    }

    fn find(dir: &Utf8Path) -> Result<Option<(Utf8PathBuf, String)>> {
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            match fs::read_to_string(&path) {
                Ok(text) => return Ok(Some((path, text))),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e).into_app_err_with(|| format!("reading repo-pulse configuration from {path}")),
            }
        }

        Ok(None)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a limit or capacity is zero or the base URL is empty
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(app_err!("limit must be at least 1"));
        }

        if self.max_concurrent_requests == 0 {
            return Err(app_err!("max_concurrent_requests must be at least 1"));
        }

        if self.requests_per_second == 0 {
            return Err(app_err!("requests_per_second must be at least 1"));
        }

        if self.request_timeout_secs == 0 {
            return Err(app_err!("request_timeout_secs must be at least 1"));
        }

        if self.api_base_url.trim().is_empty() {
            return Err(app_err!("api_base_url must not be empty"));
        }

        Ok(())
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_ref().map(Credential::expose)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
