//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `helpers` - Background task spawning and panic capture
//! - `render` - View rendering dispatch
//! - `deck` - Card stack widget
//! - `detail` - Fact detail and narration control
//! - `favorites` - Search box, category chips and favorites list
//! - `onboarding` - First-run overlay
//! - `help` - Keybinding overlay
//! - `status` - Status bar widget

mod deck;
mod detail;
mod events;
mod favorites;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod onboarding;
mod render;
mod status;

// Re-export the public API
pub use loop_runner::{run, Action};
