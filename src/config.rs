//! Configuration file parser for ~/.config/datafeed/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde, though we log a warning when the
//! file contains potential typos.
use crate::client::{ClientSettings, DEFAULT_USER_AGENT};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides the `password` key.
pub const PASSWORD_ENV: &str = "DATAFEED_PASSWORD";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large (exceeds {limit} bytes)")]
    TooLarge { limit: u64 },

    #[error("No site id configured (set `site_id` in the config file or pass --site)")]
    MissingSiteId,
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level client configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// The `Debug` impl masks `password`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API root that `v1/...` paths are resolved against.
    pub base_url: String,

    /// Site (tenant) all requests are scoped to.
    pub site_id: Option<String>,

    /// Basic-auth user name. Requests are unauthenticated when unset.
    pub username: Option<String>,

    /// Basic-auth password. `DATAFEED_PASSWORD` takes precedence.
    pub password: Option<String>,

    /// Whole-request timeout applied to the HTTP client. 0 disables it.
    pub timeout_secs: u64,

    /// Overrides the default `datafeed/<version>` user agent.
    pub user_agent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://api.relay42.com/".to_string(),
            site_id: None,
            username: None,
            password: None,
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("site_id", &self.site_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "base_url",
        "site_id",
        "username",
        "password",
        "timeout_secs",
        "user_agent",
    ];

    /// Load configuration from a TOML file.
    ///
    /// A missing, empty or whitespace-only file yields the defaults. The
    /// file is read through a bounded reader, so an oversized file is
    /// rejected without being buffered whole. Keys outside `KNOWN_KEYS` are
    /// logged and otherwise ignored.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut content = String::new();
        file.take(Self::MAX_FILE_SIZE + 1)
            .read_to_string(&mut content)?;
        if content.len() as u64 > Self::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge {
                limit: Self::MAX_FILE_SIZE,
            });
        }
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let table: toml::Table = content.parse()?;
        for key in table.keys().filter(|k| !Self::KNOWN_KEYS.contains(&k.as_str())) {
            tracing::warn!(key = %key, path = %path.display(), "Unknown config key ignored");
        }

        let config: Config = toml::Value::Table(table).try_into()?;
        tracing::info!(
            path = %path.display(),
            site_id = ?config.site_id,
            base_url = %config.base_url,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Password from `DATAFEED_PASSWORD` if set, else from the file.
    pub fn resolve_password(&self) -> Option<SecretString> {
        std::env::var(PASSWORD_ENV)
            .ok()
            .or_else(|| self.password.clone())
            .map(SecretString::from)
    }

    /// Settings for [`ApiClient::new`](crate::client::ApiClient::new).
    pub fn client_settings(&self) -> Result<ClientSettings, ConfigError> {
        let site_id = self
            .site_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingSiteId)?;

        let mut settings = ClientSettings::new(self.base_url.clone(), site_id);
        if let Some(username) = &self.username {
            settings = settings.with_credentials(username.clone(), self.resolve_password());
        }
        settings.user_agent = self
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        Ok(settings)
    }

    /// HTTP client carrying the configured timeout.
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if self.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(self.timeout_secs));
        }
        builder.build()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn write_config(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, "https://api.relay42.com/");
        assert!(config.site_id.is_none());
        assert!(config.username.is_none());
        assert!(config.password.is_none());
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/datafeed_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let path = write_config("datafeed_config_test_whitespace", "   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert!(config.site_id.is_none());
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_full_config() {
        let content = r#"
base_url = "https://api.example.com/"
site_id = "abc"
username = "svc"
password = "secret-pw"
timeout_secs = 5
user_agent = "custom/1.0"
"#;
        let path = write_config("datafeed_config_test_full", content);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.base_url, "https://api.example.com/");
        assert_eq!(config.site_id.as_deref(), Some("abc"));
        assert_eq!(config.username.as_deref(), Some("svc"));
        assert_eq!(config.timeout_secs, 5);

        let settings = config.client_settings().unwrap();
        assert_eq!(settings.site_id, "abc");
        assert_eq!(settings.user_agent, "custom/1.0");
        assert_eq!(settings.username.as_deref(), Some("svc"));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let path = write_config("datafeed_config_test_invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let path = write_config(
            "datafeed_config_test_unknown",
            "site_id = \"abc\"\ntotally_fake_key = 1\n",
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.site_id.as_deref(), Some("abc"));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let path = write_config("datafeed_config_test_wrongtype", "timeout_secs = \"soon\"\n");
        assert!(Config::load(&path).is_err());
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let path = write_config("datafeed_config_test_too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge { limit: 1_048_576 }));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_file_at_size_limit_accepted() {
        let mut content = "site_id = \"abc\"\n".to_string();
        content.push_str(&" ".repeat(1_048_576 - content.len()));
        let path = write_config("datafeed_config_test_at_limit", &content);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.site_id.as_deref(), Some("abc"));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_missing_site_id_rejected() {
        let config = Config::default();
        assert!(matches!(
            config.client_settings(),
            Err(ConfigError::MissingSiteId)
        ));

        let config = Config {
            site_id: Some("  ".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            config.client_settings(),
            Err(ConfigError::MissingSiteId)
        ));
    }

    #[test]
    fn test_no_username_means_no_credentials() {
        let config = Config {
            site_id: Some("abc".to_string()),
            password: Some("ignored".to_string()),
            ..Config::default()
        };
        let settings = config.client_settings().unwrap();
        assert!(settings.username.is_none());
        assert!(settings.password.is_none());
        assert_eq!(settings.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_password_from_file_when_env_unset() {
        if std::env::var(PASSWORD_ENV).is_ok() {
            return;
        }
        let config = Config {
            password: Some("file-pw".to_string()),
            ..Config::default()
        };
        let pw = config.resolve_password().unwrap();
        assert_eq!(pw.expose_secret(), "file-pw");
    }

    #[test]
    fn test_debug_masks_password() {
        let config = Config {
            password: Some("super-secret-12345".to_string()),
            ..Config::default()
        };
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("super-secret-12345"));
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn test_http_client_builds() {
        assert!(Config::default().http_client().is_ok());
        let config = Config {
            timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.http_client().is_ok());
    }
}
