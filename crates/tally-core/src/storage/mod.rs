//! Storage for the `.tly` text format.

mod parser;
mod writer;

pub use parser::{ParsedCell, ParsedSheet, StoredContents, parse_tly_content};
pub use writer::write_tly_content;
