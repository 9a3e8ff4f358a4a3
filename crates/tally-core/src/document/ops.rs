use super::Spreadsheet;
use crate::error::{Result, SheetError};
use std::collections::HashSet;
use tally_engine::engine::{Cell, CellContents, CellValue, cells_to_recalculate};

impl Spreadsheet {
    /// Contents of the named cell; an empty cell reads as empty text.
    pub fn get_cell_contents(&self, name: &str) -> Result<CellContents> {
        let name = self.check_name(name)?;
        Ok(self
            .cells
            .get(&name)
            .map(|cell| cell.contents.clone())
            .unwrap_or_else(|| CellContents::Text(String::new())))
    }

    /// Value of the named cell; an empty cell reads as empty text.
    pub fn get_cell_value(&self, name: &str) -> Result<CellValue> {
        let name = self.check_name(name)?;
        Ok(self
            .cells
            .get(&name)
            .map(|cell| cell.value.clone())
            .unwrap_or_else(CellValue::empty))
    }

    /// Canonical names of all non-empty cells, in no particular order.
    pub fn names_of_all_nonempty_cells(&self) -> impl Iterator<Item = &str> + '_ {
        self.cells.keys().map(String::as_str)
    }

    /// Names of the cells whose formulas mention `name` directly.
    pub fn direct_dependents(&self, name: &str) -> Result<Vec<String>> {
        let name = self.check_name(name)?;
        Ok(self.graph.dependents(&name).map(str::to_string).collect())
    }

    /// Set the named cell from user input.
    ///
    /// - `""` empties the cell
    /// - a number becomes a number cell
    /// - text starting with `=` is parsed as a formula whose variables must be
    ///   valid cell names; they are upper-cased
    /// - anything else becomes a text cell
    ///
    /// Returns the cell's canonical name plus every cell depending on it,
    /// directly or indirectly; all of them have been recomputed. On error the
    /// sheet is left exactly as it was.
    pub fn set_contents_of_cell(&mut self, name: &str, content: &str) -> Result<HashSet<String>> {
        let name = self.check_name(name)?;
        let contents = CellContents::from_input(content, |var| self.is_valid_name(var))?;
        self.apply_edit(name, contents)
    }

    /// Set the named cell to already-classified contents.
    ///
    /// Formula variables must be valid cell names for this sheet.
    pub fn set_cell_contents(&mut self, name: &str, contents: CellContents) -> Result<HashSet<String>> {
        let name = self.check_name(name)?;
        if let CellContents::Formula(formula) = &contents {
            if let Some(bad) = formula.variables().into_iter().find(|v| !self.is_valid_name(v)) {
                return Err(SheetError::InvalidName(bad));
            }
        }
        self.apply_edit(name, Some(contents))
    }

    /// Empty the named cell. Same as setting its contents to `""`.
    pub fn clear_cell(&mut self, name: &str) -> Result<HashSet<String>> {
        let name = self.check_name(name)?;
        self.apply_edit(name, None)
    }

    /// Replace the contents of `name` (canonical) and recompute everything
    /// downstream. `None` empties the cell.
    fn apply_edit(&mut self, name: String, contents: Option<CellContents>) -> Result<HashSet<String>> {
        let old_dependees: Vec<String> = self.graph.dependees(&name).map(str::to_string).collect();
        let new_dependees: Vec<String> = match &contents {
            Some(CellContents::Formula(formula)) => formula.variables().into_iter().collect(),
            _ => Vec::new(),
        };

        // The cell store is untouched until the cycle check passes, so undoing
        // a rejected edit only needs the old edges.
        self.graph.replace_dependees(&name, &new_dependees);
        let order: std::result::Result<Vec<String>, _> = cells_to_recalculate(&self.graph, &name)
            .map(|order| order.into_iter().map(str::to_string).collect());
        let order = match order {
            Ok(order) => order,
            Err(err) => {
                self.graph.replace_dependees(&name, &old_dependees);
                log::debug!("rejected edit of {}: {}", name, err);
                return Err(err.into());
            }
        };

        match contents {
            Some(contents) => {
                self.cells.insert(name.clone(), Cell::new(contents));
            }
            None => {
                self.cells.remove(&name);
            }
        }

        for cell_name in &order {
            self.recompute(cell_name);
        }

        self.changed = true;
        log::debug!("set {} ({} cells recalculated)", name, order.len());
        Ok(order.into_iter().collect())
    }

    fn recompute(&mut self, name: &str) {
        let Some(value) = self.cells.get(name).map(|cell| {
            cell.compute_value(|var| self.cells.get(var).and_then(|c| c.value.as_number()))
        }) else {
            return;
        };
        if let Some(cell) = self.cells.get_mut(name) {
            cell.value = value;
        }
    }
}
