use crate::api::Role;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A validation error in the configuration
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.field, self.message)
    }
}

/// Connection settings for the library backend
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// A login credential. The backend has no login endpoint, so the client
/// resolves logins against this table (see DESIGN.md).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AuthUser {
    pub id: u64,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_users")]
    pub users: Vec<AuthUser>,
}

fn default_users() -> Vec<AuthUser> {
    vec![
        AuthUser {
            id: 1,
            username: "admin".to_string(),
            password: "admin123".to_string(),
            role: Role::Admin,
        },
        AuthUser {
            id: 2,
            username: "user".to_string(),
            password: "user123".to_string(),
            role: Role::User,
        },
    ]
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            users: default_users(),
        }
    }
}

/// Presentation knobs for the pages
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UiConfig {
    /// How many borrow records the records page keeps from the server list
    #[serde(default = "default_records_limit")]
    pub records_limit: usize,
    /// How long a return-desk status message stays visible
    #[serde(default = "default_message_ttl_secs")]
    pub message_ttl_secs: i64,
}

fn default_records_limit() -> usize {
    10
}

fn default_message_ttl_secs() -> i64 {
    3
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            records_limit: default_records_limit(),
            message_ttl_secs: default_message_ttl_secs(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl Config {
    /// Load configuration from default paths
    /// Priority: local (.biblio/config.local.toml) > project (.biblio/config.toml) > user (~/.biblio/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".biblio").join("config.toml");
            if user_config.exists() {
                config.merge(Self::load_from(&user_config)?);
            }
        }

        let project_config = Path::new(".biblio").join("config.toml");
        if project_config.exists() {
            config.merge(Self::load_from(&project_config)?);
        }

        let local_config = Path::new(".biblio").join("config.local.toml");
        if local_config.exists() {
            config.merge(Self::load_from(&local_config)?);
        }

        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes priority).
    /// A section is taken from `other` only when it differs from the
    /// defaults, so a file that sets `[ui]` alone does not clobber an
    /// earlier file's `[api]`.
    pub fn merge(&mut self, other: Config) {
        if other.api != ApiConfig::default() {
            self.api = other.api;
        }
        if other.auth != AuthConfig::default() {
            self.auth = other.auth;
        }
        if other.ui != UiConfig::default() {
            self.ui = other.ui;
        }
    }

    /// Validate configuration and return any errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            errors.push(ValidationError {
                field: "api.base_url".to_string(),
                message: format!("Must be an http(s) URL, got '{}'", self.api.base_url),
            });
        }
        if self.api.timeout_ms == 0 {
            errors.push(ValidationError {
                field: "api.timeout_ms".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.auth.users.is_empty() {
            errors.push(ValidationError {
                field: "auth.users".to_string(),
                message: "At least one user is required".to_string(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        for (i, user) in self.auth.users.iter().enumerate() {
            if user.username.is_empty() {
                errors.push(ValidationError {
                    field: format!("auth.users[{}].username", i),
                    message: "Username must not be empty".to_string(),
                });
            } else if !seen.insert(user.username.as_str()) {
                errors.push(ValidationError {
                    field: format!("auth.users[{}].username", i),
                    message: format!("Duplicate username '{}'", user.username),
                });
            }
            if user.password.is_empty() {
                errors.push(ValidationError {
                    field: format!("auth.users[{}].password", i),
                    message: "Password must not be empty".to_string(),
                });
            }
        }

        if self.ui.records_limit == 0 {
            errors.push(ValidationError {
                field: "ui.records_limit".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }
        if self.ui.message_ttl_secs <= 0 {
            errors.push(ValidationError {
                field: "ui.message_ttl_secs".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
