//! cellgraph-core - Cells, the sheet that owns them, and the dependency
//! graph that keeps cached formula values honest.

pub mod cell;
pub mod error;
pub mod sheet;

pub use cell::{Cell, CellContent};
pub use error::{Result, SheetError};
pub use sheet::{CellView, CellViewMut, Sheet, create_sheet};

pub use cellgraph_engine::engine::{FormulaError, Position, Size, Value};
