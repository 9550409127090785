use std::collections::BTreeSet;

use cellgraph_engine::engine::Position;
use log::debug;

use super::{CellView, CellViewMut, Sheet};
use crate::cell::{Cell, CellContent};
use crate::error::{Result, SheetError};

impl Sheet {
    pub(crate) fn check_position(&self, pos: Position) -> Result<()> {
        if pos.is_valid() {
            Ok(())
        } else {
            debug!("rejecting invalid position ({}, {})", pos.row, pos.col);
            Err(SheetError::InvalidPosition(pos))
        }
    }

    /// Set cell contents from input text.
    ///
    /// Parsing and the cycle check both run before anything is touched, so a
    /// rejected write leaves the sheet exactly as it was.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<()> {
        self.check_position(pos)?;

        let content = CellContent::from_input(text).inspect_err(|e| {
            debug!("{}: rejected formula: {}", pos, e);
        })?;
        let children: BTreeSet<Position> = content.referenced_cells().iter().copied().collect();

        if let Some(path) = self.detect_cycle(pos, &children) {
            debug!("{}: rejected circular formula {}", pos, text);
            return Err(SheetError::CircularDependency { cell: pos, path });
        }

        // Every dependency resolves to a real node.
        for child in &children {
            self.cells.entry(*child).or_insert_with(Cell::new_empty);
        }
        self.cells.entry(pos).or_insert_with(Cell::new_empty);

        let now_empty = content.is_empty();
        self.replace_content(pos, content, children);

        if now_empty {
            if self.size.on_edge(pos) {
                self.recompute_size();
            }
        } else {
            self.size.include(pos);
        }

        debug!("{}: set to {:?}", pos, text);
        Ok(())
    }

    /// Clear the specified cell.
    ///
    /// A cell that other formulas still read is emptied in place so those
    /// formulas keep a node to depend on; otherwise it is removed. In the
    /// first case `get_cell` keeps returning `Some` with empty text.
    pub fn clear_cell(&mut self, pos: Position) -> Result<()> {
        self.check_position(pos)?;
        let Some(cell) = self.cells.get(&pos) else {
            return Ok(());
        };
        let referenced = !cell.parents.is_empty();

        self.reset_cell(pos);
        if !referenced {
            self.cells.remove(&pos);
        }

        debug!("{}: cleared (node kept: {})", pos, referenced);
        Ok(())
    }

    pub fn get_cell(&self, pos: Position) -> Result<Option<CellView<'_>>> {
        self.check_position(pos)?;
        Ok(self.cells.get(&pos).map(|cell| CellView {
            sheet: self,
            pos,
            cell,
        }))
    }

    pub fn get_cell_mut(&mut self, pos: Position) -> Result<Option<CellViewMut<'_>>> {
        self.check_position(pos)?;
        if !self.cells.contains_key(&pos) {
            return Ok(None);
        }
        Ok(Some(CellViewMut { sheet: self, pos }))
    }

    /// Empty an existing cell, detaching its edges and shrinking the size if needed.
    pub(crate) fn reset_cell(&mut self, pos: Position) {
        let had_content = match self.cells.get(&pos) {
            Some(cell) => !cell.is_empty(),
            None => return,
        };
        self.replace_content(pos, CellContent::Empty, BTreeSet::new());
        if had_content && self.size.on_edge(pos) {
            self.recompute_size();
        }
    }

    /// Install new content and child set for an existing cell, splice the
    /// parent edges on both sides, then invalidate caches upward.
    fn replace_content(
        &mut self,
        pos: Position,
        content: CellContent,
        children: BTreeSet<Position>,
    ) {
        let Some(cell) = self.cells.get_mut(&pos) else {
            return;
        };
        cell.content = content;
        let old_children = std::mem::replace(&mut cell.children, children.clone());

        for child in old_children.difference(&children) {
            let orphaned = match self.cells.get_mut(child) {
                Some(child_cell) => {
                    child_cell.parents.remove(&pos);
                    child_cell.parents.is_empty() && child_cell.is_empty()
                }
                None => false,
            };
            // Placeholder nodes only live while something reads them.
            if orphaned {
                self.cells.remove(child);
            }
        }
        for child in &children {
            if let Some(child_cell) = self.cells.get_mut(child) {
                child_cell.parents.insert(pos);
            }
        }

        self.invalidate_from(pos);
    }
}
