//! Deferred actions: what a confirmation token points at.
//!
//! Every action kind has a fixed argument schema. Arguments travel as the
//! tagged union [`TaskArgs`], so a token can never carry arguments of the
//! wrong shape for its kind.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BazaarError, Result};
use crate::types::User;

/// Name of a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    ActivateUser,
    UpdateUser,
    ResetPassword,
    UpdateConfirmationSource,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        Self::ActivateUser,
        Self::UpdateUser,
        Self::ResetPassword,
        Self::UpdateConfirmationSource,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActivateUser => "activate-user",
            Self::UpdateUser => "update-user",
            Self::ResetPassword => "reset-password",
            Self::UpdateConfirmationSource => "update-confirmation-source",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = BazaarError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| BazaarError::ActionNotRegistered(s.to_string()))
    }
}

/// Arguments of a deferred action, one variant per [`ActionKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "args", rename_all = "kebab-case")]
pub enum TaskArgs {
    ActivateUser {
        user_id: Uuid,
    },
    UpdateUser {
        user: User,
    },
    ResetPassword {
        user: User,
    },
    UpdateConfirmationSource {
        user: User,
        #[serde(default)]
        email: Option<String>,
        #[serde(default)]
        telegram: Option<String>,
    },
}

impl TaskArgs {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::ActivateUser { .. } => ActionKind::ActivateUser,
            Self::UpdateUser { .. } => ActionKind::UpdateUser,
            Self::ResetPassword { .. } => ActionKind::ResetPassword,
            Self::UpdateConfirmationSource { .. } => ActionKind::UpdateConfirmationSource,
        }
    }

    /// Serialize the arguments alone (without the kind tag) for storage.
    pub fn to_payload(&self) -> Result<String> {
        let tagged = serde_json::to_value(self)?;
        let args = tagged.get("args").cloned().unwrap_or(serde_json::Value::Null);
        Ok(args.to_string())
    }

    /// Rebuild arguments from a stored `(kind, payload)` pair using the
    /// schema of `kind`.
    pub fn from_payload(kind: ActionKind, payload: &str) -> Result<Self> {
        let args: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| BazaarError::Payload(format!("{kind}: {e}")))?;
        serde_json::from_value(serde_json::json!({ "kind": kind, "args": args }))
            .map_err(|e| BazaarError::Payload(format!("{kind}: {e}")))
    }
}

/// Single-use opaque identifier of a pending action (128-bit random).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskToken(Uuid);

impl TaskToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskToken {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TaskToken {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for TaskToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for TaskToken {
    type Err = BazaarError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| BazaarError::Validation(format!("malformed token '{s}': {e}")))
    }
}
