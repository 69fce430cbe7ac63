//! # Bazaar Core
//!
//! Shared vocabulary for the marketplace backend: the error taxonomy,
//! configuration, domain models, the typed action payloads carried by
//! confirmation tokens, and the traits of the external collaborators
//! (token store, message writers).

pub mod action;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use action::{ActionKind, TaskArgs, TaskToken};
pub use config::BazaarConfig;
pub use error::{BazaarError, Result};
pub use traits::{MessageWriter, StoredTask, TaskTokenStore};
pub use types::{ActiveWindow, Address, ContactMessage, Good, User};
