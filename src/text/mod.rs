//! Text utilities for incremental parsing.
//!
//! - Byte offset to tree-sitter point conversion
//! - Translation of content changes into tree-sitter edits

pub mod edits;
pub mod position;

pub use edits::{EditBatch, translate_change, translate_changes};
pub use position::{PointMapper, advance_point, floor_char_boundary, point_at};
