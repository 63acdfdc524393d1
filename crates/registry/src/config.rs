use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use dirs_next::{config_dir, home_dir};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "CLIAPI_CONFIG_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// User configuration for the command-line tool.
///
/// The file is YAML; JSON documents parse as well. Every field is optional.
///
/// ```yaml
/// default_provider: test
/// disabled_providers: [azure]
/// options:
///   test:
///     smurf: papa
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliapiConfig {
    /// Provider used when neither `--provider` nor the program name selects one
    pub default_provider: Option<String>,
    /// Providers that are never loaded
    pub disabled_providers: Vec<String>,
    /// Option values per provider; these override compiled-in defaults and
    /// are in turn overridden by command-line values
    pub options: IndexMap<String, IndexMap<String, String>>,
}

impl CliapiConfig {
    /// Loads the configuration from [`default_config_path`].
    ///
    /// A missing file yields the defaults. An unreadable or malformed file is
    /// reported with a warning and also yields the defaults, so a broken
    /// configuration never prevents the tool from running.
    pub fn load() -> Self {
        let path = default_config_path();
        if !path.exists() {
            debug!(path = %path.display(), "no config file");
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(error) => {
                warn!(%error, "ignoring config file");
                Self::default()
            }
        }
    }

    /// Loads the configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Configured option values for `provider`, in file order.
    pub fn options_for(&self, provider: &str) -> impl Iterator<Item = (&str, &str)> {
        self.options
            .get(provider)
            .into_iter()
            .flat_map(|options| options.iter().map(|(name, value)| (name.as_str(), value.as_str())))
    }

    pub fn is_disabled(&self, provider: &str) -> bool {
        self.disabled_providers.iter().any(|name| name == provider)
    }
}

/// Get the default path for the configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cliapi")
        .join("config.yaml")
}

fn expand_tilde(path: &str) -> PathBuf {
    let path = path.trim();
    if path == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(path)
}
