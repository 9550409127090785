//! Formula front end and the facade cells hold.
//!
//! [`Formula::parse`] turns formula source (the text after the leading `=`)
//! into an expression tree. The resulting [`Formula`] can be evaluated
//! against any [`CellLookup`], printed back as canonical source, and asked
//! which cells it reads.

mod ast;
mod parser;

pub use ast::{BinaryOp, Expr, UnaryOp};

use thiserror::Error;

use super::{FormulaError, Position, Value};

/// Read access to cell values, as seen by a formula while it evaluates.
pub trait CellLookup {
    /// The value at `pos`, or None if no cell exists there.
    fn lookup_value(&self, pos: Position) -> Option<Value>;
}

/// Formula source that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Formula parse error at offset {offset}: {message}")]
pub struct FormulaParseError {
    pub message: String,
    pub offset: usize,
}

impl FormulaParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        FormulaParseError {
            message: message.into(),
            offset,
        }
    }
}

/// A parsed formula together with its referenced-cell set.
#[derive(Debug, Clone)]
pub struct Formula {
    expr: Expr,
    /// Valid references only, sorted row-major and deduplicated.
    refs: Vec<Position>,
}

impl Formula {
    pub fn parse(source: &str) -> Result<Formula, FormulaParseError> {
        let expr = parser::parse(source)?;

        let mut refs = Vec::new();
        expr.collect_cells(&mut refs);
        refs.retain(Position::is_valid);
        refs.sort();
        refs.dedup();

        Ok(Formula { expr, refs })
    }

    /// Evaluate against `lookup`. Runtime failures come back as the error
    /// half of the result, never as a panic.
    pub fn evaluate(&self, lookup: &dyn CellLookup) -> Result<f64, FormulaError> {
        self.expr.evaluate(lookup)
    }

    /// Canonical source for this formula, without the leading `=`.
    pub fn expression(&self) -> String {
        self.expr.to_string()
    }

    pub fn referenced_cells(&self) -> &[Position] {
        &self.refs
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl std::str::FromStr for Formula {
    type Err = FormulaParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formula::parse(s)
    }
}
