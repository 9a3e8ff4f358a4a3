//! Spreadsheet document: state, edits and persistence.

mod io;
mod ops;
mod state;

pub use state::{ACCEPT_ALL, Spreadsheet};
