//! Application layer managing terminal UI state.
//!
//! This module sits between the domain layer and the presentation layer,
//! turning user intents into record service calls.

pub mod state;

pub use state::*;
