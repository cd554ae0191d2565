//! HR assistant configuration, read from the environment (after `.env` has
//! been loaded by the binary).
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GROQ_API_KEY` | required |
//! | `MODEL_NAME` | `openai/gpt-oss-20b` |
//! | `GROQ_BASE_URL` | Groq's public endpoint |
//! | `DATABASE_URL` | built from the `DB_*` parts when absent |
//! | `DB_DRIVER` | `postgres` |
//! | `DB_SERVER`, `DB_NAME`, `DB_USER`, `DB_PASSWORD` | required without `DATABASE_URL` |
//! | `DB_TIMEOUT_SECS` | `30` |

use crate::error::ConfigError;
use std::env;
use std::fmt;
use url::Url;

pub const DEFAULT_MODEL_NAME: &str = "openai/gpt-oss-20b";
pub const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbDriver {
    Postgres,
    Sqlite,
}

impl DbDriver {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            other => Err(ConfigError::new("DB_DRIVER", format!("unsupported driver '{}'", other))
                .with_suggestion("Use 'postgres' or 'sqlite'")),
        }
    }

    /// Infers the driver from a connection URL scheme.
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        let scheme = url.split(':').next().unwrap_or_default();
        Self::parse(scheme).map_err(|_| {
            ConfigError::new("DATABASE_URL", format!("unsupported scheme '{}'", scheme))
                .with_suggestion("Use a postgres:// or sqlite: URL")
        })
    }

    /// Dialect name used in the SQL generation prompt.
    pub fn dialect(&self) -> &'static str {
        match self {
            Self::Postgres => "PostgreSQL",
            Self::Sqlite => "SQLite",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub driver: DbDriver,
    pub timeout_secs: u64,
}

// keep the password out of logs
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = match Url::parse(&self.url) {
            Ok(mut url) if url.password().is_some() => {
                let _ = url.set_password(Some("***"));
                url.to_string()
            }
            _ => self.url.clone(),
        };
        f.debug_struct("DatabaseConfig")
            .field("url", &redacted)
            .field("driver", &self.driver)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let driver = DbDriver::from_url(&url)?;
        Ok(Self { url, driver, timeout_secs: DEFAULT_DB_TIMEOUT_SECS })
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let timeout_secs = match lookup("DB_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::new("DB_TIMEOUT_SECS", format!("'{}' is not a number of seconds", raw))
            })?,
            None => DEFAULT_DB_TIMEOUT_SECS,
        };

        if let Some(url) = lookup("DATABASE_URL") {
            return Ok(Self::new(url)?.with_timeout_secs(timeout_secs));
        }

        let driver = match lookup("DB_DRIVER") {
            Some(raw) => DbDriver::parse(&raw)?,
            None => DbDriver::Postgres,
        };

        let url = match driver {
            DbDriver::Sqlite => {
                let name = lookup("DB_NAME").ok_or_else(missing_credentials)?;
                format!("sqlite://{}", name)
            }
            DbDriver::Postgres => {
                let (Some(server), Some(name), Some(user), Some(password)) = (
                    lookup("DB_SERVER"),
                    lookup("DB_NAME"),
                    lookup("DB_USER"),
                    lookup("DB_PASSWORD"),
                ) else {
                    return Err(missing_credentials());
                };
                let mut url = Url::parse(&format!("postgres://{}/{}", server, name)).map_err(|e| {
                    ConfigError::new("DB_SERVER", format!("invalid server '{}': {}", server, e))
                })?;
                url.set_username(&user)
                    .and_then(|_| url.set_password(Some(&password)))
                    .map_err(|_| ConfigError::new("DB_USER", "cannot be used in a connection URL"))?;
                url.to_string()
            }
        };

        Ok(Self { url, driver, timeout_secs })
    }
}

fn missing_credentials() -> ConfigError {
    ConfigError::new("DB_SERVER/DB_NAME/DB_USER/DB_PASSWORD", "Missing DB credentials")
        .with_suggestion("Set DATABASE_URL or all of DB_SERVER, DB_NAME, DB_USER and DB_PASSWORD")
}

#[derive(Debug, Clone)]
pub struct HrConfig {
    pub groq_api_key: String,
    pub model_name: String,
    pub groq_base_url: Option<String>,
    pub database: DatabaseConfig,
}

impl HrConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let groq_api_key = lookup("GROQ_API_KEY").ok_or_else(|| {
            ConfigError::new("GROQ_API_KEY", "not set")
                .with_suggestion("Create a key at https://console.groq.com and add it to .env")
        })?;

        Ok(Self {
            groq_api_key,
            model_name: lookup("MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string()),
            groq_base_url: lookup("GROQ_BASE_URL"),
            database: DatabaseConfig::from_lookup(&lookup)?,
        })
    }
}
