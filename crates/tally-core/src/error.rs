//! Error types for Tally core.

use thiserror::Error;

use tally_engine::engine::{CycleError, FormulaFormatError};

/// Errors that can occur when editing, saving or loading a spreadsheet.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid cell name: {0:?}")]
    InvalidName(String),

    #[error("invalid formula: {0}")]
    Formula(#[from] FormulaFormatError),

    #[error("Circular dependency detected: {0}")]
    CircularDependency(#[from] CycleError),

    #[error("invalid validity pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The saved file is malformed or inconsistent with itself.
    #[error("Read error at line {line}: {message}")]
    Read { line: usize, message: String },

    /// The saved file is fine, but its cells do not fit the new validity pattern.
    #[error("Version error at line {line}: {message}")]
    Version { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, SheetError>;
