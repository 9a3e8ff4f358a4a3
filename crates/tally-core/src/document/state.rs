use crate::error::{Result, SheetError};
use regex::Regex;
use std::collections::HashMap;
use tally_engine::engine::{Cell, DependencyGraph, canonical_name, is_cell_name};

/// Validity pattern that accepts every cell name.
pub const ACCEPT_ALL: &str = ".*";

/// UI-agnostic spreadsheet: the cell store, its dependency graph, the
/// cell-name validity pattern and the "changed since last save" flag.
#[derive(Clone, Debug)]
pub struct Spreadsheet {
    /// Non-empty cells keyed by canonical name
    pub(crate) cells: HashMap<String, Cell>,
    /// `s -> t` whenever the formula in `t` reads `s`
    pub(crate) graph: DependencyGraph,
    /// Extra restriction on cell names, matched against the canonical name
    pub(crate) is_valid: Regex,
    /// Whether the sheet has been modified since it was created, loaded or saved
    pub(crate) changed: bool,
}

impl Spreadsheet {
    /// Create an empty spreadsheet that accepts every well-formed cell name.
    pub fn new() -> Self {
        Self::with_validator(Regex::new(ACCEPT_ALL).expect("accept-all pattern must compile"))
    }

    /// Create an empty spreadsheet whose cell names must also match `is_valid`.
    ///
    /// The pattern is matched (unanchored) against the upper-case name.
    pub fn with_validator(is_valid: Regex) -> Self {
        Spreadsheet {
            cells: HashMap::new(),
            graph: DependencyGraph::new(),
            is_valid,
            changed: false,
        }
    }

    /// Create an empty spreadsheet from a validity pattern source.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        Ok(Self::with_validator(Regex::new(pattern)?))
    }

    /// The validity pattern cell names must match.
    pub fn validator(&self) -> &Regex {
        &self.is_valid
    }

    /// True if the sheet has been modified since it was created, loaded or
    /// saved (whichever happened most recently).
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Dependency edges between the sheet's cells.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// True if `name` is a cell name this sheet accepts.
    pub fn is_valid_name(&self, name: &str) -> bool {
        is_cell_name(name) && self.is_valid.is_match(&canonical_name(name))
    }

    /// Canonical form of `name`, or [`SheetError::InvalidName`].
    pub(crate) fn check_name(&self, name: &str) -> Result<String> {
        if self.is_valid_name(name) {
            Ok(canonical_name(name))
        } else {
            Err(SheetError::InvalidName(name.to_string()))
        }
    }
}

impl Default for Spreadsheet {
    fn default() -> Self {
        Self::new()
    }
}
