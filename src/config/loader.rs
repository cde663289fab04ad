//! Configuration loader

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, FossDriverError};

use super::{default_request_timeout, CONFIG_DIR, CONFIG_FILENAME};
use super::{ENV_PASSWORD, ENV_SERVER_URL, ENV_USERNAME};

/// Connection settings for one FOSSology server
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FossConfig {
    /// Base URL of the server, without the `/repo` suffix
    #[serde(default)]
    pub server_url: String,

    /// Login name
    #[serde(default)]
    pub username: String,

    /// Login password
    #[serde(default)]
    pub password: String,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Upper bound on waiting for a single agent job, unlimited if absent
    #[serde(default)]
    pub job_timeout_secs: Option<u64>,
}

// The password never reaches log output.
impl fmt::Debug for FossConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FossConfig")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("job_timeout_secs", &self.job_timeout_secs)
            .finish()
    }
}

impl FossConfig {
    /// Build a configuration directly from its three required values
    pub fn new(
        server_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, FossDriverError> {
        let config = Self {
            server_url: server_url.into(),
            username: username.into(),
            password: password.into(),
            request_timeout_secs: default_request_timeout(),
            job_timeout_secs: None,
        };
        config.validated().map_err(Into::into)
    }

    /// Path of the default config file, `~/.fossdriver/fossdriverrc.json`
    pub fn default_path() -> Result<PathBuf, FossDriverError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(home.join(CONFIG_DIR).join(CONFIG_FILENAME))
    }

    /// Load configuration from the given file, or the default path if `None`
    pub fn load(path: Option<&Path>) -> Result<Self, FossDriverError> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Self::load_from_file(&Self::default_path()?),
        }
    }

    /// Load configuration from a specific file
    ///
    /// Environment overrides are applied before validation, so a file may
    /// leave out the password when `FOSSDRIVER_PASSWORD` is set.
    pub fn load_from_file(path: &Path) -> Result<Self, FossDriverError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        let mut config = Self::parse(&content, path)?;
        config.apply_env_overrides();
        tracing::debug!("Loaded configuration from {}", path.display());
        config.validated().map_err(Into::into)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            toml::from_str(content).map_err(|e| ConfigError::Toml {
                path: path.display().to_string(),
                source: e,
            })
        } else {
            serde_json::from_str(content).map_err(|e| ConfigError::Json {
                path: path.display().to_string(),
                source: e,
            })
        }
    }

    /// Replace file values with any `FOSSDRIVER_*` environment variables set
    pub fn apply_env_overrides(&mut self) {
        let overrides = [
            (ENV_SERVER_URL, &mut self.server_url),
            (ENV_USERNAME, &mut self.username),
            (ENV_PASSWORD, &mut self.password),
        ];
        for (var, field) in overrides {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    *field = value;
                }
            }
        }
    }

    /// Check required fields and normalise the server URL
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        if self.server_url.trim().is_empty() {
            missing.push("serverUrl".to_string());
        }
        if self.username.is_empty() {
            missing.push("username".to_string());
        }
        if self.password.is_empty() {
            missing.push("password".to_string());
        }
        if !missing.is_empty() {
            for field in &missing {
                tracing::error!("{} not found in config file", field);
            }
            return Err(ConfigError::MissingFields { fields: missing });
        }

        self.server_url = self.server_url.trim().trim_end_matches('/').to_string();
        let parsed = url::Url::parse(&self.server_url).map_err(|e| {
            ConfigError::InvalidServerUrl {
                url: self.server_url.clone(),
                reason: e.to_string(),
            }
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ConfigError::InvalidServerUrl {
                url: self.server_url.clone(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        Ok(self)
    }

    /// Absolute URL for a server endpoint such as `/repo/?mod=auth`
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.server_url, endpoint)
    }

    /// Per-request HTTP timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Deadline for waiting on one agent job
    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }
}
