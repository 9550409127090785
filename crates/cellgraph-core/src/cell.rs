//! Cell data structures for the sheet.
//!
//! - [`CellContent`] - What a cell holds (empty, literal text, or formula)
//! - [`Cell`] - Content plus the cached formula result and the cell's
//!   dependency edges
//!
//! Edges are stored as positions and resolved through the owning sheet, so a
//! cell never keeps another cell alive.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet};

use cellgraph_engine::engine::{Formula, FormulaParseError, Position, Value};

/// Leading character that marks formula input.
pub const FORMULA_SIGN: char = '=';
/// Leading character that forces the rest of the input to be literal text.
pub const ESCAPE_SIGN: char = '\'';

/// The content stored in a cell.
#[derive(Clone, Debug, Default)]
pub enum CellContent {
    #[default]
    Empty,
    Text(String),
    Formula(Formula),
}

impl CellContent {
    /// Parse user input into content.
    /// - Empty string -> Empty
    /// - `=` followed by at least one character -> Formula (without the `=`)
    /// - Anything else -> Text, stored verbatim
    pub fn from_input(input: &str) -> Result<CellContent, FormulaParseError> {
        if input.is_empty() {
            return Ok(CellContent::Empty);
        }
        match input.strip_prefix(FORMULA_SIGN) {
            Some(source) if !source.is_empty() => Ok(CellContent::Formula(Formula::parse(source)?)),
            _ => Ok(CellContent::Text(input.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellContent::Empty)
    }

    /// Text as the user would edit it. Formulas come back in canonical form.
    pub fn text(&self) -> String {
        match self {
            CellContent::Empty => String::new(),
            CellContent::Text(s) => s.clone(),
            CellContent::Formula(f) => format!("{}{}", FORMULA_SIGN, f.expression()),
        }
    }

    pub fn referenced_cells(&self) -> &[Position] {
        match self {
            CellContent::Formula(f) => f.referenced_cells(),
            _ => &[],
        }
    }
}

/// A cell in the sheet.
#[derive(Debug, Default)]
pub struct Cell {
    pub(crate) content: CellContent,
    /// Last computed value of a formula; None for other content.
    cache: RefCell<Option<Value>>,
    /// Cells this cell's formula reads from.
    pub(crate) children: BTreeSet<Position>,
    /// Cells whose formulas read from this cell.
    pub(crate) parents: HashSet<Position>,
}

impl Cell {
    pub fn new_empty() -> Cell {
        Cell::default()
    }

    pub fn content(&self) -> &CellContent {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn text(&self) -> String {
        self.content.text()
    }

    pub fn referenced_cells(&self) -> Vec<Position> {
        self.children.iter().copied().collect()
    }

    pub fn children(&self) -> impl Iterator<Item = Position> + '_ {
        self.children.iter().copied()
    }

    pub fn parents(&self) -> impl Iterator<Item = Position> + '_ {
        self.parents.iter().copied()
    }

    pub fn cached_value(&self) -> Option<Value> {
        self.cache.borrow().clone()
    }

    pub fn has_cache(&self) -> bool {
        self.cache.borrow().is_some()
    }

    /// Drop the cached value. Returns whether there was one.
    pub(crate) fn clear_cache(&self) -> bool {
        self.cache.borrow_mut().take().is_some()
    }

    pub(crate) fn store_cache(&self, value: Value) {
        *self.cache.borrow_mut() = Some(value);
    }

    /// Value of non-formula content. Formulas need the sheet and are handled there.
    pub(crate) fn literal_value(&self) -> Option<Value> {
        match &self.content {
            CellContent::Empty => Some(Value::empty()),
            CellContent::Text(s) => {
                let shown = s.strip_prefix(ESCAPE_SIGN).unwrap_or(s);
                Some(Value::Text(shown.to_string()))
            }
            CellContent::Formula(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_input_variants() {
        assert!(CellContent::from_input("").unwrap().is_empty());
        assert!(matches!(
            CellContent::from_input("hello").unwrap(),
            CellContent::Text(s) if s == "hello"
        ));
        assert!(matches!(
            CellContent::from_input("=1+2").unwrap(),
            CellContent::Formula(_)
        ));
    }

    #[test]
    fn test_lone_formula_sign_is_text() {
        assert!(matches!(
            CellContent::from_input("=").unwrap(),
            CellContent::Text(s) if s == "="
        ));
    }

    #[test]
    fn test_bad_formula_is_parse_error() {
        assert!(CellContent::from_input("=1+").is_err());
    }

    #[test]
    fn test_escaped_text_value_strips_sign() {
        let cell = Cell {
            content: CellContent::from_input("'=1+2").unwrap(),
            ..Cell::default()
        };
        assert_eq!(cell.text(), "'=1+2");
        assert_eq!(cell.literal_value(), Some(Value::Text("=1+2".into())));
    }

    #[test]
    fn test_formula_text_is_canonical() {
        let content = CellContent::from_input("= ( 1 + 2 ) ").unwrap();
        assert_eq!(content.text(), "=1+2");
    }

    #[test]
    fn test_cache_slot() {
        let cell = Cell::new_empty();
        assert!(!cell.has_cache());
        assert!(!cell.clear_cache());
        cell.store_cache(Value::Number(1.0));
        assert_eq!(cell.cached_value(), Some(Value::Number(1.0)));
        assert!(cell.clear_cache());
        assert!(!cell.has_cache());
    }
}
