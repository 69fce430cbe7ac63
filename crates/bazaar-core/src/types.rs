//! Domain models shared across crates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BazaarError, Result};

/// Hours (UTC) during which a recipient accepts immediate notifications.
/// `to_hour <= from_hour` means the window crosses midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWindow", into = "RawWindow")]
pub struct ActiveWindow {
    from_hour: u8,
    to_hour: u8,
}

#[derive(Serialize, Deserialize)]
struct RawWindow {
    #[serde(rename = "fromHour")]
    from_hour: u8,
    #[serde(rename = "toHour")]
    to_hour: u8,
}

impl ActiveWindow {
    pub fn new(from_hour: u8, to_hour: u8) -> Result<Self> {
        if from_hour > 23 || to_hour > 23 {
            return Err(BazaarError::Validation(format!(
                "active window hours must be within 0..=23, got {from_hour}..{to_hour}"
            )));
        }
        Ok(Self { from_hour, to_hour })
    }

    pub fn from_hour(&self) -> u8 {
        self.from_hour
    }

    pub fn to_hour(&self) -> u8 {
        self.to_hour
    }

    pub fn wraps_midnight(&self) -> bool {
        self.to_hour <= self.from_hour
    }
}

impl TryFrom<RawWindow> for ActiveWindow {
    type Error = BazaarError;

    fn try_from(raw: RawWindow) -> Result<Self> {
        Self::new(raw.from_hour, raw.to_hour)
    }
}

impl From<ActiveWindow> for RawWindow {
    fn from(w: ActiveWindow) -> Self {
        Self {
            from_hour: w.from_hour,
            to_hour: w.to_hour,
        }
    }
}

/// A contact address on one of the delivery channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "address", rename_all = "lowercase")]
pub enum Address {
    Email(String),
    Telegram(String),
}

impl Address {
    pub fn channel(&self) -> &'static str {
        match self {
            Self::Email(_) => "email",
            Self::Telegram(_) => "telegram",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Email(v) | Self::Telegram(v) => v,
        }
    }
}

/// Marketplace user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub hashed_password: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub active_time: Option<ActiveWindow>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telegram: Option<String>,
}

impl User {
    /// Preferred confirmation address: email first, then telegram.
    pub fn preferred_address(&self) -> Option<Address> {
        self.email
            .clone()
            .map(Address::Email)
            .or_else(|| self.telegram.clone().map(Address::Telegram))
    }

    /// Every address the user can be reached on.
    pub fn addresses(&self) -> Vec<Address> {
        let mut out = Vec::with_capacity(2);
        if let Some(email) = &self.email {
            out.push(Address::Email(email.clone()));
        }
        if let Some(tg) = &self.telegram {
            out.push(Address::Telegram(tg.clone()));
        }
        out
    }
}

/// A listed good. Only the fields the notification path needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Good {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
}

/// A contact message sent to the owner of a good.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub good_id: Uuid,
    pub sender: Uuid,
    pub message: String,
    pub contact_info: String,
}
