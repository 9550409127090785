//! Error types for cellgraph core.

use thiserror::Error;

use cellgraph_engine::engine::{FormulaParseError, Position};

/// Errors that reject a sheet mutation. None of them leave partial state behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SheetError {
    #[error("Invalid position: row {}, col {}", .0.row, .0.col)]
    InvalidPosition(Position),

    #[error("Circular dependency detected: {}", format_path(.path))]
    CircularDependency { cell: Position, path: Vec<Position> },

    #[error(transparent)]
    Parse(#[from] FormulaParseError),
}

fn format_path(path: &[Position]) -> String {
    path.iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub type Result<T> = std::result::Result<T, SheetError>;
