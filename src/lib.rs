//! cellgraph - Command driver over the cellgraph sheet engine.

pub mod command;
pub mod error;

pub use command::{Command, run_script};
pub use error::{CommandError, Result};
