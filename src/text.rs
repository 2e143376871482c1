//! Text manipulation utilities.
//!
//! This module provides utilities for working with text content:
//! - Position mapping between LSP (UTF-16) and byte offsets
//! - Byte spans
//! - Content fingerprints for version tokens

mod hash;
pub mod position;
mod span;

pub use hash::{fingerprint, fnv1a_hash};
pub use position::{
    PositionMapper, compute_line_starts, convert_byte_to_utf16_in_line,
    convert_utf16_to_byte_in_line,
};
pub use span::Span;
