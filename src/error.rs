//! Error types for the cellgraph driver

use thiserror::Error;

use cellgraph_core::SheetError;

/// Errors that can occur while running driver commands
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("{command} requires a cell reference")]
    MissingCell { command: String },

    #[error("{0}")]
    BadCell(String),

    #[error("{command} takes no arguments")]
    UnexpectedArgument { command: String },
}

pub type Result<T> = std::result::Result<T, CommandError>;
