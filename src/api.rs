//! HTTP API
//!
//! A minimal transport in front of the dialogue engine: one endpoint per
//! inbound message, plus health and version probes.

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::runtime::{MessageHandler, SessionStore};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<dyn MessageHandler>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(handler: Arc<dyn MessageHandler>, sessions: SessionStore) -> Self {
        Self { handler, sessions }
    }
}
