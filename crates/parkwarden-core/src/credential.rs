//! Access-token gate in front of every view.
//!
//! ```text
//! Locked ──submit──▶ Validating ──ok──▶ Unlocked
//!    ▲                   │
//!    └──────rejected─────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("access token is required")]
    Blank,

    #[error("token validation already in progress")]
    AlreadyValidating,

    #[error("console is already unlocked")]
    AlreadyUnlocked,

    #[error("no validation in progress")]
    NotValidating,

    #[error("access token rejected: {0}")]
    Rejected(String),
}

pub type CredentialResult<T> = std::result::Result<T, CredentialError>;

/// Checks an access token. Implementations decide what "valid" means.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> CredentialResult<()>;
}

/// Accepts any token of printable, whitespace-free characters.
#[derive(Debug, Clone, Default)]
pub struct FormatTokenValidator {
    min_len: usize,
}

impl FormatTokenValidator {
    pub fn new(min_len: usize) -> Self {
        Self { min_len }
    }
}

#[async_trait]
impl TokenValidator for FormatTokenValidator {
    async fn validate(&self, token: &str) -> CredentialResult<()> {
        if token.chars().count() < self.min_len {
            return Err(CredentialError::Rejected(format!(
                "token shorter than {} characters",
                self.min_len
            )));
        }
        if token.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(CredentialError::Rejected(
                "token contains whitespace or control characters".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    #[default]
    Locked,
    Validating,
    Unlocked,
}

#[derive(Debug, Clone, Default)]
pub struct CredentialGate {
    state: GateState,
    pending: Option<String>,
    token: Option<String>,
    last_error: Option<CredentialError>,
}

impl CredentialGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == GateState::Unlocked
    }

    /// The accepted token, once unlocked.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn last_error(&self) -> Option<&CredentialError> {
        self.last_error.as_ref()
    }

    /// Start validating `raw`. Returns the trimmed token to check.
    pub fn begin(&mut self, raw: &str) -> CredentialResult<String> {
        match self.state {
            GateState::Validating => return Err(CredentialError::AlreadyValidating),
            GateState::Unlocked => return Err(CredentialError::AlreadyUnlocked),
            GateState::Locked => {}
        }
        let token = raw.trim();
        if token.is_empty() {
            self.last_error = Some(CredentialError::Blank);
            return Err(CredentialError::Blank);
        }
        self.state = GateState::Validating;
        self.last_error = None;
        self.pending = Some(token.to_string());
        Ok(token.to_string())
    }

    pub fn complete(&mut self, result: CredentialResult<()>) -> CredentialResult<()> {
        if self.state != GateState::Validating {
            return Err(CredentialError::NotValidating);
        }
        let token = self.pending.take();
        match result {
            Ok(()) => {
                info!(event = "credential.unlocked");
                self.state = GateState::Unlocked;
                self.token = token;
                Ok(())
            }
            Err(err) => {
                warn!(event = "credential.rejected", error = %err);
                self.state = GateState::Locked;
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub async fn unlock<V>(&mut self, raw: &str, validator: &V) -> CredentialResult<()>
    where
        V: TokenValidator + ?Sized,
    {
        let token = self.begin(raw)?;
        let result = validator.validate(&token).await;
        self.complete(result)
    }

    /// Forget the token and return to the token entry screen.
    pub fn lock(&mut self) {
        self.state = GateState::Locked;
        self.token = None;
        self.pending = None;
    }
}
