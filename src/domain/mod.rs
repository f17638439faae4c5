//! Domain layer: the student record, its rules and the record service.

pub mod models;
pub mod services;
pub mod errors;
pub mod repository;

pub use models::*;
pub use services::*;
pub use errors::*;
pub use repository::*;
