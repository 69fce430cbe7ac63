//! # Bazaar Gateway
//!
//! The public HTTP surface: the confirmation endpoint recipients land on
//! after following a link, plus a health probe.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
