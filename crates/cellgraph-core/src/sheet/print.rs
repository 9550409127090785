//! Tab-separated dumps of the printable area.

use std::io::{self, Write};

use cellgraph_engine::engine::Position;

use super::{CellView, Sheet};

impl Sheet {
    /// Write one line per row of the printable area, values separated by tabs.
    pub fn print_values<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_table(out, |cell| cell.value().to_string())
    }

    /// Write one line per row of the printable area, texts separated by tabs.
    pub fn print_texts<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_table(out, |cell| cell.text())
    }

    fn print_table<W, F>(&self, out: &mut W, render: F) -> io::Result<()>
    where
        W: Write,
        F: Fn(&CellView<'_>) -> String,
    {
        let size = self.size;
        for row in 0..size.rows {
            let mut fields = Vec::with_capacity(size.cols as usize);
            for col in 0..size.cols {
                let pos = Position::new(row, col);
                let field = match self.cells.get(&pos) {
                    Some(cell) => render(&CellView {
                        sheet: self,
                        pos,
                        cell,
                    }),
                    None => String::new(),
                };
                fields.push(field);
            }
            writeln!(out, "{}", fields.join("\t"))?;
        }
        Ok(())
    }
}
