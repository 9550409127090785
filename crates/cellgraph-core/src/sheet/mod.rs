//! Sheet state and logic.
//!
//! The [`Sheet`] exclusively owns every [`Cell`]. Mutations go through it so
//! that dependency edges, cycle checks and cache invalidation stay in step:
//!
//! - `ops` - set/clear/lookup entry points
//! - `graph` - cycle detection, cache invalidation, dependency-ordered evaluation
//! - `print` - tab-separated value/text dumps

mod graph;
mod ops;
mod print;

use std::collections::HashMap;

use cellgraph_engine::engine::{CellLookup, Position, Size, Value};

use crate::cell::{Cell, CellContent};
use crate::error::Result;

/// An in-memory sheet of cells keyed by position.
#[derive(Debug, Default)]
pub struct Sheet {
    /// Every cell node, including empty cells created because a formula
    /// references them.
    cells: HashMap<Position, Cell>,
    /// Bounding rectangle of non-empty cells.
    size: Size,
    /// Number of formula evaluations performed so far.
    evaluations: std::cell::Cell<u64>,
}

/// Create a fresh, empty sheet.
pub fn create_sheet() -> Sheet {
    Sheet::new()
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn printable_size(&self) -> Size {
        self.size
    }

    /// Number of cell nodes, empty ones included.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// How many times a formula has been evaluated since the sheet was created.
    pub fn evaluation_count(&self) -> u64 {
        self.evaluations.get()
    }

    /// Value at `pos`, or None if no cell occupies it.
    pub fn value(&self, pos: Position) -> Result<Option<Value>> {
        Ok(self.get_cell(pos)?.map(|cell| cell.value()))
    }

    /// Text at `pos`, or None if no cell occupies it.
    pub fn text(&self, pos: Position) -> Result<Option<String>> {
        Ok(self.get_cell(pos)?.map(|cell| cell.text()))
    }

    /// Cells whose formulas read `pos`, sorted.
    pub fn dependents(&self, pos: Position) -> Result<Vec<Position>> {
        self.check_position(pos)?;
        let mut parents: Vec<Position> = self
            .cells
            .get(&pos)
            .map(|cell| cell.parents().collect())
            .unwrap_or_default();
        parents.sort();
        Ok(parents)
    }

    fn recompute_size(&mut self) {
        let mut size = Size::default();
        for (pos, cell) in &self.cells {
            if !cell.is_empty() {
                size.include(*pos);
            }
        }
        self.size = size;
    }
}

impl CellLookup for Sheet {
    fn lookup_value(&self, pos: Position) -> Option<Value> {
        self.cells.contains_key(&pos).then(|| self.evaluate(pos))
    }
}

/// Read-only view of a cell and the sheet it lives in.
#[derive(Clone, Copy)]
pub struct CellView<'a> {
    sheet: &'a Sheet,
    pos: Position,
    cell: &'a Cell,
}

impl<'a> CellView<'a> {
    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn content(&self) -> &'a CellContent {
        self.cell.content()
    }

    pub fn value(&self) -> Value {
        self.sheet.evaluate(self.pos)
    }

    pub fn text(&self) -> String {
        self.cell.text()
    }

    pub fn referenced_cells(&self) -> Vec<Position> {
        self.cell.referenced_cells()
    }

    pub fn has_cache(&self) -> bool {
        self.cell.has_cache()
    }
}

/// Mutable handle to an existing cell. Writes are routed through the sheet.
pub struct CellViewMut<'a> {
    sheet: &'a mut Sheet,
    pos: Position,
}

impl<'a> CellViewMut<'a> {
    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn set(&mut self, text: &str) -> Result<()> {
        self.sheet.set_cell(self.pos, text)
    }

    /// Make the cell empty. The node itself stays in the sheet.
    pub fn clear(&mut self) {
        self.sheet.reset_cell(self.pos);
    }

    pub fn value(&self) -> Value {
        self.sheet.evaluate(self.pos)
    }

    pub fn text(&self) -> String {
        self.sheet
            .cells
            .get(&self.pos)
            .map(Cell::text)
            .unwrap_or_default()
    }

    pub fn referenced_cells(&self) -> Vec<Position> {
        self.sheet
            .cells
            .get(&self.pos)
            .map(Cell::referenced_cells)
            .unwrap_or_default()
    }
}
