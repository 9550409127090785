//! Cellgraph engine API.
//!
//! This module provides the leaf types and the formula front end:
//!
//! - [`Position`], [`Size`] - Cell coordinates (A1 notation ↔ row/col indices) and sheet extents
//! - [`Value`], [`FormulaError`] - What a cell evaluates to
//! - [`Formula`] - Parsed formula facade (evaluate, print, referenced cells)
//! - [`CellLookup`] - The capability a formula evaluates against
//! - [`format_number`] - Format numbers for display

pub mod formula;
mod position;
mod value;

pub use formula::{CellLookup, Formula, FormulaParseError};
pub use position::{Position, Size};
pub use value::{FormulaError, Value, format_number};
