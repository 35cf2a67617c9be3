use super::overlay::OverlayKind;

/// Errors from routing operator events to the right surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("no wizard is open")]
    NoActiveWizard,

    #[error("the open wizard is busy submitting")]
    WizardBusy,

    #[error("no bay is selected")]
    NoSelection,

    #[error("unknown zone: {0}")]
    UnknownZone(String),

    #[error("event requires a {expected} overlay on top")]
    WrongOverlay { expected: OverlayKind },

    #[error("console is locked until an access token is accepted")]
    Locked,
}

pub type NavigationResult<T> = std::result::Result<T, NavigationError>;
