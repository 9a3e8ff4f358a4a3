//! tally-core - Spreadsheet document model + storage.

pub mod document;
pub mod error;
pub mod storage;

pub use document::{ACCEPT_ALL, Spreadsheet};
pub use error::{Result, SheetError};

pub use tally_engine::engine::{CellContents, CellRef, CellValue, Formula, FormulaErrorValue};
