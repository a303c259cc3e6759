use std::fmt;
use thiserror::Error;

/// SQLite file used when no remote store is configured.
pub const DEFAULT_DB_PATH: &str = "dak.db";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DAK_API_KEY must be set when DAK_STORE_URL is set")]
    MissingApiKey,

    #[error("DAK_EMAIL and DAK_PASSWORD must be set together")]
    PartialCredentials,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Rest { url: String, api_key: String },
    Sqlite { path: String },
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend: Backend,
    pub credentials: Option<Credentials>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("DAK_STORE_URL") {
            Some(url) => Backend::Rest {
                url,
                api_key: get("DAK_API_KEY").ok_or(ConfigError::MissingApiKey)?,
            },
            None => Backend::Sqlite {
                path: get("DAK_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            },
        };

        let credentials = match (get("DAK_EMAIL"), get("DAK_PASSWORD")) {
            (Some(email), Some(password)) => Some(Credentials { email, password }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialCredentials),
        };

        Ok(Self {
            backend,
            credentials,
        })
    }
}
