//! Configuration module
//!
//! Server URL and credentials are read once from a local file (JSON by
//! default, TOML when the file name ends in `.toml`) and are immutable
//! afterwards.

pub mod loader;

pub use loader::FossConfig;

/// Directory under the home directory holding the default config file
pub const CONFIG_DIR: &str = ".fossdriver";

/// File name of the default config file
pub const CONFIG_FILENAME: &str = "fossdriverrc.json";

/// Environment variable overriding `serverUrl`
pub const ENV_SERVER_URL: &str = "FOSSDRIVER_SERVER_URL";

/// Environment variable overriding `username`
pub const ENV_USERNAME: &str = "FOSSDRIVER_USERNAME";

/// Environment variable overriding `password`
pub const ENV_PASSWORD: &str = "FOSSDRIVER_PASSWORD";

fn default_request_timeout() -> u64 {
    60
}
