//! Console configuration.
//!
//! Values come from defaults, an optional JSON file, then environment
//! variables, later sources winning:
//!
//! | variable | field |
//! |---|---|
//! | `PARKWARDEN_CONFIRM_MS` | `confirmation_ms` |
//! | `PARKWARDEN_TICKET_POLICY` | `ticket_policy` |
//! | `PARKWARDEN_ACCESS_TOKEN` | `access_token` |
//! | `PARKWARDEN_LOG_FORMAT` | `log_json` (`json` enables) |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::lot_status::TicketPolicy;

pub const DEFAULT_CONFIRMATION_MS: u64 = 2500;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// How long the success confirmation stays up.
    pub confirmation_ms: u64,
    pub ticket_policy: TicketPolicy,
    pub access_token: Option<String>,
    pub log_json: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            confirmation_ms: DEFAULT_CONFIRMATION_MS,
            ticket_policy: TicketPolicy::default(),
            access_token: None,
            log_json: false,
        }
    }
}

impl ConsoleConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::default().with_env_overrides()
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.with_overrides_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from any variable lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("PARKWARDEN_CONFIRM_MS") {
            self.confirmation_ms =
                value
                    .trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                        var: "PARKWARDEN_CONFIRM_MS",
                        value: value.clone(),
                        reason: e.to_string(),
                    })?;
        }
        if let Some(value) = lookup("PARKWARDEN_TICKET_POLICY") {
            self.ticket_policy = value
                .parse::<TicketPolicy>()
                .map_err(|reason| ConfigError::InvalidValue {
                    var: "PARKWARDEN_TICKET_POLICY",
                    value: value.clone(),
                    reason,
                })?;
        }
        if let Some(value) = lookup("PARKWARDEN_ACCESS_TOKEN") {
            self.access_token = Some(value).filter(|t| !t.trim().is_empty());
        }
        if let Some(value) = lookup("PARKWARDEN_LOG_FORMAT") {
            self.log_json = value.trim().eq_ignore_ascii_case("json");
        }
        Ok(self)
    }

    pub fn with_confirmation_ms(mut self, ms: u64) -> Self {
        self.confirmation_ms = ms;
        self
    }

    pub fn with_ticket_policy(mut self, policy: TicketPolicy) -> Self {
        self.ticket_policy = policy;
        self
    }

    pub fn with_access_token(mut self, token: &str) -> Self {
        self.access_token = Some(token.to_string());
        self
    }

    pub fn confirmation(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.confirmation_ms).unwrap_or(i64::MAX))
    }
}
