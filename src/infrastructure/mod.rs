//! Infrastructure layer providing external service integrations.
//!
//! This module contains the file-backed record store and logger setup.

pub mod persistence;
pub mod logging;

pub use persistence::*;
pub use logging::*;
