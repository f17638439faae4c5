//! Roster - Student Tracking Library
//!
//! Keeps a roster of students with grades and attendance in a JSON data file,
//! with a terminal UI and a text menu on top of one record service.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;
pub mod config;

pub use domain::*;
pub use application::*;
