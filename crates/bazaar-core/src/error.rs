//! Error taxonomy shared by every Bazaar crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BazaarError>;

#[derive(Debug, Error)]
pub enum BazaarError {
    /// Token absent, already consumed, or expired.
    #[error("Task token not found: {0}")]
    TokenNotFound(String),

    /// A stored task names an action that has no handler bound.
    #[error("Action not registered: {0}")]
    ActionNotRegistered(String),

    /// Composition-time error: the same action was bound twice.
    #[error("Action already registered: {0}")]
    DuplicateAction(String),

    /// Stored arguments do not match the schema of their action.
    #[error("Invalid task payload: {0}")]
    Payload(String),

    #[error("Task store error: {0}")]
    Store(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Good not found: {0}")]
    GoodNotFound(String),

    #[error("Should have at least one confirmation source")]
    NoConfirmationSource,

    #[error("Address {value} on {channel} is already in use")]
    ConfirmationInUse { channel: String, value: String },

    #[error("Old password provided to update it isn't correct")]
    IncorrectOldPassword,

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl BazaarError {
    /// Whether the condition is caused by the caller's input and may be shown
    /// to them verbatim. Everything else is an internal fault and should be
    /// reported opaquely.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::TokenNotFound(_)
                | Self::Validation(_)
                | Self::UserNotFound(_)
                | Self::GoodNotFound(_)
                | Self::NoConfirmationSource
                | Self::ConfirmationInUse { .. }
                | Self::IncorrectOldPassword
        )
    }
}
