//! Foundation types for the RIDL toolchain.
//!
//! This module provides fundamental types used throughout the analyzer:
//! - [`FileId`] - Compact file identifiers
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//! - [`Position`], [`Span`] - Line/column positions for diagnostics and navigation
//! - [`LineIndex`] - Byte-offset to line/column conversion
//!
//! This module has NO dependencies on other ridl modules.

mod file_id;
mod line_index;
mod position;

pub use file_id::FileId;
pub use line_index::LineIndex;
pub use position::{Position, Span};

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
