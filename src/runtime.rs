//! Runtime for driving conversations
//!
//! Owns the live sessions and connects the pure state machine to storage
//! and entity extraction.

mod engine;
mod session_store;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use engine::{DialogEngine, MessageHandler};
pub use session_store::{SessionStore, DEFAULT_IDLE_TIMEOUT};
pub use traits::*;

use crate::nlp::EntityExtractor;
use std::sync::Arc;

/// Engine wired to SQLite and whichever extractor the config selects
pub type ProductionEngine = DialogEngine<DatabaseStorage, Arc<dyn EntityExtractor>>;
