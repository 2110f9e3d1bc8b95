use anyhow::{bail, Context, Result};
use argon2::password_hash::rand_core::{OsRng, RngCore};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding `datastore.url`.
pub const ENV_DATASTORE_URL: &str = "SUPABASE_URL";
/// Environment variable overriding `datastore.api_key`.
pub const ENV_DATASTORE_KEY: &str = "SUPABASE_ANON_KEY";
/// Environment variable overriding `auth.session_secret`.
pub const ENV_SESSION_SECRET: &str = "DEVAGENCY_SESSION_SECRET";

const MIN_SESSION_SECRET_LEN: usize = 32;
const GENERATED_SESSION_KEY_LEN: usize = 32;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub datastore: DatastoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the built front-end bundle (must contain index.html)
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static/dist")
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatastoreBackend {
    /// Hosted PostgREST-compatible service
    Rest,
    /// Local SQLite file, for development
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatastoreConfig {
    #[serde(default = "default_backend")]
    pub backend: DatastoreBackend,
    /// Service endpoint, e.g. https://xyzcompany.supabase.co
    pub url: Option<String>,
    /// Public (anon) API key sent with every request
    pub api_key: Option<String>,
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: None,
            api_key: None,
            sqlite_path: default_sqlite_path(),
        }
    }
}

fn default_backend() -> DatastoreBackend {
    DatastoreBackend::Rest
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./data/devagency.db")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Key for signing the session cookie. Random per process when unset.
    pub session_secret: Option<String>,
    /// Admin account created on startup (sqlite backend only)
    pub bootstrap_email: Option<String>,
    pub bootstrap_password: Option<String>,
    #[serde(default = "default_bootstrap_name")]
    pub bootstrap_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: None,
            bootstrap_email: None,
            bootstrap_password: None,
            bootstrap_name: default_bootstrap_name(),
        }
    }
}

fn default_bootstrap_name() -> String {
    "Administrator".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse configuration file")
    }

    /// Overlay values from the process environment. `lookup` is injected so
    /// tests do not have to mutate the real environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_DATASTORE_URL) {
            self.datastore.url = Some(url);
        }
        if let Some(key) = lookup(ENV_DATASTORE_KEY) {
            self.datastore.api_key = Some(key);
        }
        if let Some(secret) = lookup(ENV_SESSION_SECRET) {
            self.auth.session_secret = Some(secret);
        }
    }

    /// Reject configurations that would only fail later, deep inside a request.
    pub fn validate(&self) -> Result<()> {
        if self.datastore.backend == DatastoreBackend::Rest {
            let url = non_empty(self.datastore.url.as_deref());
            let key = non_empty(self.datastore.api_key.as_deref());

            match (url, key) {
                (None, None) => bail!(
                    "Missing data service configuration: set {} and {} (or datastore.url and datastore.api_key)",
                    ENV_DATASTORE_URL,
                    ENV_DATASTORE_KEY
                ),
                (None, Some(_)) => bail!(
                    "Missing data service URL: set {} or datastore.url",
                    ENV_DATASTORE_URL
                ),
                (Some(_), None) => bail!(
                    "Missing data service API key: set {} or datastore.api_key",
                    ENV_DATASTORE_KEY
                ),
                (Some(url), Some(_)) => {
                    reqwest::Url::parse(url)
                        .with_context(|| format!("Invalid data service URL: {}", url))?;
                }
            }
        }

        if let Some(secret) = self.auth.session_secret.as_deref() {
            if secret.len() < MIN_SESSION_SECRET_LEN {
                bail!(
                    "auth.session_secret must be at least {} bytes",
                    MIN_SESSION_SECRET_LEN
                );
            }
        }

        Ok(())
    }

    /// The secret used to sign session cookies.
    pub fn session_key(&self) -> Vec<u8> {
        match self.auth.session_secret.as_deref() {
            Some(secret) => secret.as_bytes().to_vec(),
            None => {
                warn!("No session secret configured; admin sessions will not survive a restart");
                let mut key = vec![0u8; GENERATED_SESSION_KEY_LEN];
                OsRng.fill_bytes(&mut key);
                key
            }
        }
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            datastore: DatastoreConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.datastore.backend, DatastoreBackend::Rest);
        assert_eq!(config.logging.level, "info");
        assert!(config.datastore.url.is_none());
    }

    #[test]
    fn test_parse_toml() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 3000

            [datastore]
            backend = "sqlite"
            sqlite_path = "/tmp/site.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.datastore.backend, DatastoreBackend::Sqlite);
        assert_eq!(config.datastore.sqlite_path, PathBuf::from("/tmp/site.db"));
    }

    #[test]
    fn test_missing_rest_settings_are_fatal() {
        let config = Config::default();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains(ENV_DATASTORE_URL));
        assert!(err.contains(ENV_DATASTORE_KEY));

        let mut config = Config::default();
        config.apply_env_overrides(env(&[(ENV_DATASTORE_URL, "https://abc.supabase.co")]));
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("API key"));

        let mut config = Config::default();
        config.apply_env_overrides(env(&[(ENV_DATASTORE_KEY, "anon")]));
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("URL"));
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[
            (ENV_DATASTORE_URL, "  "),
            (ENV_DATASTORE_KEY, "anon"),
        ]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config::from_toml(
            r#"
            [datastore]
            url = "https://from-file.supabase.co"
            api_key = "file-key"
            "#,
        )
        .unwrap();
        config.apply_env_overrides(env(&[(ENV_DATASTORE_KEY, "env-key")]));

        assert_eq!(config.datastore.url.as_deref(), Some("https://from-file.supabase.co"));
        assert_eq!(config.datastore.api_key.as_deref(), Some("env-key"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[
            (ENV_DATASTORE_URL, "not a url"),
            (ENV_DATASTORE_KEY, "anon"),
        ]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sqlite_backend_needs_no_remote_settings() {
        let mut config = Config::default();
        config.datastore.backend = DatastoreBackend::Sqlite;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_short_session_secret_rejected() {
        let mut config = Config::default();
        config.datastore.backend = DatastoreBackend::Sqlite;
        config.auth.session_secret = Some("too-short".to_string());
        assert!(config.validate().is_err());

        config.auth.session_secret = Some("x".repeat(32));
        assert!(config.validate().is_ok());
        assert_eq!(config.session_key().len(), 32);
    }

    #[test]
    fn test_generated_session_key_length() {
        let config = Config::default();
        assert_eq!(config.session_key().len(), 32);
    }

    #[test]
    fn test_generated_session_keys_differ() {
        let config = Config::default();
        let first = config.session_key();
        let second = config.session_key();
        assert_ne!(first, second);
        assert!(first.iter().any(|b| *b != 0));
    }
}
