//! Input handling module
//!
//! Tracks key and mouse button state and cursor movement between frames.

mod state;

pub use state::Input;
