//! # Bazaar Scheduler
//!
//! Deferred confirmation actions and quiet-hours notification delivery.
//!
//! ## Architecture
//! ```text
//! Usecase ── Notifier.confirm_address / ask ──▶ LateExecutor.enqueue ──▶ TaskTokenStore.put
//!                  └── MessageWriter.send_now("... {domain}/confirm/{token}")
//!
//! GET /confirm/{token} ──▶ LateExecutor.dispatch
//!                             ├── TaskTokenStore.take      (atomic read + delete)
//!                             └── ActionRegistry.resolve ──▶ ActionHandler.handle(ctx, args)
//!
//! Usecase ── Notifier.notify ──▶ NotificationScheduler.decide(window, hour)
//!                                   ├── Now            → MessageWriter.send_now
//!                                   └── Later { eta }  → MessageWriter.send_later
//! ```
//!
//! Token stores: [`MemoryTaskStore`] and [`SqliteTaskStore`]; expired
//! tokens are swept by [`spawn_token_reaper`].

pub mod engine;
pub mod executor;
pub mod notify;
pub mod persistence;
pub mod registry;
pub mod store;
pub mod window;

pub use engine::spawn_token_reaper;
pub use executor::LateExecutor;
pub use notify::{CONFIRM_PREFIX, Notifier};
pub use persistence::SqliteTaskStore;
pub use registry::{ActionHandler, ActionRegistry};
pub use store::MemoryTaskStore;
pub use window::{Delivery, NotificationScheduler};
