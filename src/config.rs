//! WolfCDN Configuration
//!
//! Configuration is read from an optional TOML file and then overridden by
//! the `CDN_*` environment variables, which may also come from a `.env`
//! file. Everything here is resolved once at startup and handed to the HTTP
//! server by value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::auth::parse_user_list;

/// Environment variable overriding `server.content_dir`
pub const ENV_CONTENT_DIR: &str = "CDN_CONTENT_DIR";
/// Environment variable adding `username=secret` pairs to `auth.users`
pub const ENV_USERS: &str = "CDN_USERS";
/// Environment variable overriding `server.bind_address`
pub const ENV_BIND_ADDRESS: &str = "CDN_BIND_ADDRESS";

/// Main WolfCDN configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CdnConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Upload credentials
    #[serde(default)]
    pub auth: AuthConfig,

    /// Storage capacity settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Directory all served and stored files live under
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    /// Enable permissive CORS headers
    #[serde(default)]
    pub cors_enabled: bool,
}

/// Credential configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Username to secret table
    #[serde(default)]
    pub users: BTreeMap<String, String>,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Report this many available bytes instead of probing the disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_override_bytes: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("./content")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            content_dir: default_content_dir(),
            cors_enabled: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl CdnConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let config: CdnConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise start from defaults, then
    /// apply environment overrides
    pub fn load(path: &Path) -> crate::Result<Self> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::info!("No config file at {:?}, using defaults", path);
            Self::default()
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `CDN_*` overrides from the process environment
    pub fn apply_env(&mut self) -> crate::Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(dir) = get(ENV_CONTENT_DIR) {
            self.server.content_dir = PathBuf::from(dir);
        }

        if let Some(addr) = get(ENV_BIND_ADDRESS) {
            self.server.bind_address = addr;
        }

        if let Some(users) = get(ENV_USERS) {
            for (username, secret) in parse_user_list(&users)? {
                self.auth.users.insert(username, secret);
            }
        }

        self.validate()
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.server.bind_address.is_empty() {
            return Err(crate::Error::Config("server.bind_address cannot be empty".into()));
        }

        if self.server.content_dir.as_os_str().is_empty() {
            return Err(crate::Error::Config("server.content_dir cannot be empty".into()));
        }

        if self.auth.users.keys().any(|name| name.is_empty()) {
            return Err(crate::Error::Config("auth.users contains an empty username".into()));
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the content root directory
    pub fn content_dir(&self) -> &Path {
        &self.server.content_dir
    }
}

/// Load `KEY=value` lines from a dotenv file into the process environment
///
/// With no `path`, `.env` is searched for from the working directory
/// upwards. Variables that are already set are left alone. Returns the file
/// that was loaded, or `None` when there is none.
pub fn load_dotenv(path: Option<&Path>) -> crate::Result<Option<PathBuf>> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };

    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
bind_address = "127.0.0.1:9000"
content_dir = "/srv/cdn"
cors_enabled = true

[auth.users]
alice = "wonderland"
bob = "builder"

[storage]
capacity_override_bytes = 1024
"#;

        let config = CdnConfig::from_str(toml).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(config.content_dir(), Path::new("/srv/cdn"));
        assert!(config.server.cors_enabled);
        assert_eq!(config.auth.users.len(), 2);
        assert_eq!(config.auth.users["alice"], "wonderland");
        assert_eq!(config.storage.capacity_override_bytes, Some(1024));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = CdnConfig::from_str("").unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8000");
        assert_eq!(config.content_dir(), Path::new("./content"));
        assert!(config.auth.users.is_empty());
        assert!(config.storage.capacity_override_bytes.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_CONTENT_DIR, "/data/content"),
            (ENV_USERS, "alice=one,carol=two=three"),
            (ENV_BIND_ADDRESS, ""),
        ]
        .into_iter()
        .collect();

        let mut config = CdnConfig::from_str("[auth.users]\nalice = \"old\"\n").unwrap();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.content_dir(), Path::new("/data/content"));
        // Empty override leaves the default in place
        assert_eq!(config.server.bind_address, "0.0.0.0:8000");
        assert_eq!(config.auth.users["alice"], "one");
        assert_eq!(config.auth.users["carol"], "two=three");
    }

    #[test]
    fn test_malformed_env_users_rejected() {
        let mut config = CdnConfig::default();
        let err = config
            .apply_overrides(|key| (key == ENV_USERS).then(|| "alice".to_string()))
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_empty_username_rejected() {
        let err = CdnConfig::from_str("[auth.users]\n\"\" = \"secret\"\n").unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_dotenv_feeds_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "# upload users\nCDN_USERS=dotenv_user=from-file\n").unwrap();

        assert_eq!(load_dotenv(Some(&path)).unwrap(), Some(path.clone()));

        let mut config = CdnConfig::default();
        config.apply_env().unwrap();
        assert_eq!(config.auth.users["dotenv_user"], "from-file");

        assert_eq!(load_dotenv(Some(&dir.path().join("absent.env"))).unwrap(), None);
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wolfcdn.toml");

        let mut config = CdnConfig::default();
        config.auth.users.insert("alice".into(), "secret".into());
        config.save(&path).unwrap();

        let loaded = CdnConfig::from_file(&path).unwrap();
        assert_eq!(loaded.auth.users["alice"], "secret");
        assert_eq!(loaded.server.bind_address, config.server.bind_address);
    }
}
