//! nightdeck: a terminal deck of AI-generated paranormal facts.
//!
//! The binary in `main.rs` wires these modules together; the library target
//! exists so integration tests can drive the deck, favorites, filter,
//! narration and loader without a terminal.

pub mod app;
pub mod config;
pub mod content;
pub mod deck;
pub mod favorites;
pub mod filter;
pub mod i18n;
pub mod keybindings;
pub mod loader;
pub mod model;
pub mod narration;
pub mod share;
pub mod storage;
pub mod theme;
pub mod ui;
pub mod util;
