//! Utility functions shared by the UI and the content layer.
//!
//! - **URL validation**: links from the provider are checked before they are
//!   opened in the system browser
//! - **Text processing**: Unicode-aware width, truncation and control
//!   character stripping for provider text
//!
//! ```
//! use nightdeck::util::{display_width, truncate_to_width};
//!
//! assert_eq!(display_width("Fantôme"), 7);
//! assert_eq!(truncate_to_width("The Bell Witch of Tennessee", 12), "The Bell ...");
//! ```

mod text;
mod url_validator;

pub use text::{display_width, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_url_for_open, UrlValidationError};

/// Longest search query accepted by the favorites search box.
pub const MAX_SEARCH_QUERY_LENGTH: usize = 128;
