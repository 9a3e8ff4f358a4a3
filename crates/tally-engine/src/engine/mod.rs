//! Spreadsheet engine API.
//!
//! This module provides the core computation engine for the spreadsheet:
//!
//! - [`tokenize`] - Split formula text into lexemes
//! - [`Formula`], [`Token`] - Validated infix formulas
//! - [`evaluate`] - Stack-based formula evaluation
//! - [`Cell`], [`CellContents`], [`CellValue`] - Cell storage types
//! - [`CellRef`], [`is_cell_name`] - Cell names (A1 notation ↔ row/col indices)
//! - [`DependencyGraph`] - Who-depends-on-whom between cell names
//! - [`cells_to_recalculate`] - Recalculation order with circular dependency detection

mod cell;
mod cell_ref;
mod cycle;
mod eval;
mod formula;
mod graph;
mod tokenizer;

pub use cell::{Cell, CellContents, CellValue, FormulaErrorValue};
pub use cell_ref::{CellRef, canonical_name, is_cell_name};
pub use cycle::{CycleError, cells_to_recalculate, detect_cycle};
pub use eval::{EvalError, evaluate};
pub use formula::{Formula, FormulaFormatError, Operator, Token, is_variable};
pub use graph::DependencyGraph;
pub use tokenizer::{Lexeme, LexemeKind, Lexemes, tokenize};
