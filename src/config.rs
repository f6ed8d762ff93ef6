//! Connection settings and run policy.
//!
//! Connection settings come from the environment:
//! - `CANVAS_API_URL` - Base URL of the Canvas instance (e.g. `https://school.instructure.com`)
//! - `CANVAS_API_TOKEN` - API access token
//! - `CANVAS_TIMEOUT_SECS` - Per-request timeout (default: 60)
//!
//! The run policy is a JSON file, looked up at `--policy` or in the user's
//! config directory, falling back to built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dirs::config_dir;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const APP_NAME: &str = "welcome-migrator";
const POLICY_FILE: &str = "policy.json";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read policy file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse policy file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ============================================================
// Canvas connection
// ============================================================

/// How to reach the Canvas API.
///
/// Debug output redacts the token via [`SecretString`].
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    base_url: String,
    token: Option<SecretString>,
    timeout: Duration,
}

impl CanvasConfig {
    /// Create with an explicit base URL and no token.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read `CANVAS_API_URL`, `CANVAS_API_TOKEN` and `CANVAS_TIMEOUT_SECS`.
    ///
    /// Unset values are left empty so command-line flags can fill them in;
    /// [`validate`](Self::validate) reports whatever is still missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new(env_non_empty("CANVAS_API_URL").unwrap_or_default());

        if let Some(token) = env_non_empty("CANVAS_API_TOKEN") {
            config = config.with_token(token);
        }

        if let Some(secs) = env_non_empty("CANVAS_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|_| {
                ConfigError::Invalid(format!("CANVAS_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The bearer token, if one is configured and non-blank.
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_ref()
            .map(|t| t.expose_secret().trim())
            .filter(|t| !t.is_empty())
    }

    /// Join an API path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Reject configurations that cannot possibly authenticate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("CANVAS_API_URL"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "Canvas URL must start with http:// or https://: {}",
                self.base_url
            )));
        }
        if self.token().is_none() {
            return Err(ConfigError::Missing("CANVAS_API_TOKEN"));
        }
        Ok(())
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================
// Run policy
// ============================================================

/// What to do when creating a sub-header fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderFailure {
    /// Report the error and keep going.
    #[default]
    LogAndContinue,
    /// Abort the run.
    Fatal,
}

/// Tunables consulted by the reorganization pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorgPolicy {
    /// Name given to the target module when it has to be created.
    pub target_module_name: String,
    /// Title of the sub-header placed above the canonical items.
    pub standard_header: String,
    /// Title of the sub-header placed at the top of the target module.
    pub supplemental_header: String,
    /// Titles that go under the standard header, in this order.
    /// Matching ignores case and surrounding/repeated whitespace.
    pub canonical_order: Vec<String>,
    /// Titles deleted from the Welcome module instead of being moved.
    pub cleanup_titles: Vec<String>,
    pub standard_header_failure: HeaderFailure,
    pub supplemental_header_failure: HeaderFailure,
}

impl Default for ReorgPolicy {
    fn default() -> Self {
        Self {
            target_module_name: "Student Resources".to_string(),
            standard_header: "Standard Resources".to_string(),
            supplemental_header: "Supplemental Resources".to_string(),
            canonical_order: [
                "University Policies",
                "Online Support Center",
                "Library Research Guide",
                "Library Research Guides",
                "Academic Support Center",
                "Copyright & Source Info",
                "Copyright and Source Info",
                "Copyright & Source Information",
                "Copyright and Source Information",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            cleanup_titles: vec![
                "How to Understand Due Dates".to_string(),
                "How to Understand Due Date".to_string(),
            ],
            standard_header_failure: HeaderFailure::LogAndContinue,
            supplemental_header_failure: HeaderFailure::LogAndContinue,
        }
    }
}

impl ReorgPolicy {
    /// Load from an explicit file. Missing or malformed files are errors.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path` if given, otherwise from the user's config directory.
    ///
    /// A broken file at the default location is reported and replaced by the
    /// defaults; a broken explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let Some(default_path) = default_policy_path() else {
            return Ok(Self::default());
        };
        if !default_path.exists() {
            return Ok(Self::default());
        }

        match Self::from_file(&default_path) {
            Ok(policy) => Ok(policy),
            Err(e) => {
                tracing::warn!("Failed to load policy, using defaults: {}", e);
                Ok(Self::default())
            }
        }
    }

    /// Write the policy as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize policy")?;
        fs::write(path, content).context("Failed to write policy file")?;
        Ok(())
    }
}

/// `<config_dir>/welcome-migrator/policy.json`, when a config dir exists.
pub fn default_policy_path() -> Option<PathBuf> {
    let mut path = config_dir()?;
    path.push(APP_NAME);
    path.push(POLICY_FILE);
    Some(path)
}
