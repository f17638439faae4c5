//! Presentation layer: the terminal UI and the text menu.
//!
//! The terminal UI is drawn with ratatui and driven by crossterm key events;
//! the text menu works on plain line input.

pub mod ui;
pub mod input;
pub mod menu;

pub use ui::*;
pub use input::*;
pub use menu::*;
