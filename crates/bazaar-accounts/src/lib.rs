//! # Bazaar Accounts
//!
//! Account usecases that need the recipient to confirm something by
//! following a link, and the action handlers those links run.
//!
//! ```text
//! UserUsecase.register_user   ──confirm_address──▶ activate-user
//! UserUsecase.change_password ──ask──────────────▶ update-user
//! UserUsecase.reset_password  ──ask──────────────▶ reset-password
//! UserUsecase.update_confirmation ──ask──────────▶ update-confirmation-source
//!                                                    └─confirm_address (new address)─▶ update-user
//! UserUsecase.message_owner   ──notify (active window)
//! ```

pub mod actions;
pub mod context;
pub mod hasher;
pub mod repo;
pub mod usecases;

#[cfg(test)]
mod testing;

pub use actions::register_all;
pub use context::{AccountsContext, AccountsExecutor, build_executor};
pub use hasher::{Argon2Hasher, PasswordHasher};
pub use repo::{GoodRepo, MemoryGoodRepo, MemoryUserRepo, UserRepo};
pub use usecases::UserUsecase;
