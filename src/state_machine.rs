//! Dialogue state machine
//!
//! Elm-style: [`transition`] is pure and returns the next session plus the
//! effects the runtime must execute. Collaborator results re-enter as events.

pub mod catalog;
mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::{Event, Message};
pub use state::{Session, StateType, TurnContext};
pub use transition::{transition, TransitionError};
