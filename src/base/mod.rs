//! Foundation types for the larimar engine.
//!
//! This module provides primitive types used throughout the crate:
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//! - [`Position`], [`Span`] - Line/column positions for diagnostics
//! - [`Cursor`] - The mutable parse position owned by one parse attempt
//! - [`Edit`] - A single text mutation fed to the incremental reparser
//!
//! This module has NO dependencies on other larimar modules.

mod edit;
mod position;

pub use edit::{Edit, EditError};
pub use position::{Cursor, Position, Span};

// Re-export text-size types for convenience
pub use text_size;
pub use text_size::{TextRange, TextSize};
