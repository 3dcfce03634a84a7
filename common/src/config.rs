use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigurationError;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const TOKEN_ENV: &str = "LABSYNC_TOKEN";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the remote directory.
///
/// Opaque to the synchronization engine: only the client adapter reads it.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Scheme and authority, e.g. `https://gitlab.example.com`.
    pub host: String,
    /// API prefix appended to `host`, e.g. `/api/v4`.
    #[serde(default)]
    pub api_path: String,
    pub token: String,
    /// Per-request timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Config {
    /// Reads `path`, applies the `LABSYNC_TOKEN` override and validates the result.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let token_override = std::env::var(TOKEN_ENV).ok();
        Self::from_json(&raw, path, token_override)
    }

    pub fn from_json(
        raw: &str,
        path: &Path,
        token_override: Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let mut config: Config =
            serde_json::from_str(raw).map_err(|source| ConfigurationError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(token) = token_override.filter(|t| !t.trim().is_empty()) {
            config.token = token;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.host.trim().is_empty() {
            return Err(ConfigurationError::MissingField("host"));
        }
        if self.token.trim().is_empty() {
            return Err(ConfigurationError::MissingField("token"));
        }
        if !(self.host.starts_with("http://") || self.host.starts_with("https://")) {
            return Err(ConfigurationError::InvalidUrl {
                url: self.host.clone(),
                reason: "host must start with http:// or https://".into(),
            });
        }
        Ok(())
    }

    /// `host` and `api_path` joined with exactly one slash between them.
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        let api_path = self.api_path.trim_matches('/');
        if api_path.is_empty() {
            host.to_string()
        } else {
            format!("{host}/{api_path}")
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("api_path", &self.api_path)
            .field("token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Terminal output settings, set from command-line flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// 0 prints everything, 1 drops banners and headers, 2 prints results only.
    pub quiet: u8,
    /// Print results as JSON instead of text.
    pub json: bool,
}
