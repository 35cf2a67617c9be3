//! Console-level error taxonomy.

use crate::config::ConfigError;
use crate::credential::CredentialError;
use crate::lot_status::LotStatusError;
use crate::navigation::NavigationError;
use crate::store::StoreError;
use crate::wizard::WizardError;

/// Every error an operator event can produce. None of them is fatal: the
/// console state is unchanged, or changed only as documented by the variant.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("lot status error: {0}")]
    LotStatus(#[from] LotStatusError),

    #[error("wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("navigation error: {0}")]
    Navigation(#[from] NavigationError),

    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for console operations.
pub type Result<T> = std::result::Result<T, ConsoleError>;
