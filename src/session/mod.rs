//! Session-scoped model lifecycle
//!
//! A session owns at most one fitted model. Retraining replaces it, a
//! disconnect drops it, and predictions read it.

pub mod engine;
pub mod prediction;
pub mod registry;
pub mod store;

pub use engine::SessionEngine;
pub use registry::dispatch;
pub use store::{InMemorySessionStore, SessionStore};
