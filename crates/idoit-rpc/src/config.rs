//! Session configuration and config-file loading.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use idoit_types::Endpoint;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::transport::Timeouts;

/// Everything needed to open a [`CmdbSession`](crate::CmdbSession)
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(default)]
    pub endpoint: Endpoint,

    /// Overrides the endpoint's fixed URL (self-hosted or test servers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub username: String,

    /// Read from the file when present but never written back by `save`
    #[serde(default, skip_serializing)]
    pub password: String,

    /// Whole-request timeout; unset keeps the HTTP client default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,
}

const KNOWN_FIELDS: [&str; 7] = [
    "endpoint",
    "url",
    "apiKey",
    "username",
    "password",
    "timeoutMs",
    "connectTimeoutMs",
];

impl SessionConfig {
    /// Build a config for one of the fixed endpoints, selected by name.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `selector` is not a known endpoint.
    pub fn for_selector(
        selector: &str,
        api_key: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            endpoint: selector.parse()?,
            api_key: api_key.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        })
    }

    /// The URL requests are posted to
    #[must_use]
    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or_else(|| self.endpoint.url())
    }

    #[must_use]
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            request: self.timeout_ms.map(Duration::from_millis),
            connect: self.connect_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Load config from file. A missing file yields the default config.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Config` if it
    /// is not valid JSON or names an unknown endpoint.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        warn_unknown_fields(&content, path);
        serde_json::from_str(&content)
            .map_err(|e| Error::config(format!("Invalid config {}: {e}", path.display())))
    }

    /// Save config to file. The password is left out; the file still holds
    /// the API key, so on unix it is written with mode 0600.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("endpoint", &self.endpoint)
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_ms", &self.timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .finish()
    }
}

/// Default config file location (`~/.config/idoit/config.json` on Linux).
///
/// Falls back to `./idoit.json` when no home directory can be determined.
#[must_use]
pub fn default_config_path() -> PathBuf {
    ProjectDirs::from("", "", "idoit").map_or_else(
        || PathBuf::from("idoit.json"),
        |project| project.config_dir().join("config.json"),
    )
}

/// Warn about top-level keys the config does not recognize.
fn warn_unknown_fields(content: &str, path: &Path) {
    let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(content) else {
        return;
    };

    let known: HashSet<&str> = KNOWN_FIELDS.into_iter().collect();
    for key in obj.keys().filter(|k| !known.contains(k.as_str())) {
        warn!("Unknown config field in {}: {key}", path.display());
    }
}
