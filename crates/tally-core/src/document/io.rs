use super::Spreadsheet;
use super::state::ACCEPT_ALL;
use crate::error::{Result, SheetError};
use crate::storage::{ParsedCell, StoredContents, parse_tly_content, write_tly_content};
use regex::Regex;
use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;
use tally_engine::engine::{CellContents, Formula, canonical_name, is_cell_name};

impl Spreadsheet {
    /// Render the sheet in .tly format.
    pub fn to_tly_string(&self) -> String {
        write_tly_content(
            self.is_valid.as_str(),
            self.cells.iter().map(|(name, cell)| (name.as_str(), &cell.contents)),
        )
    }

    /// Write the sheet to `writer` and clear the changed flag.
    pub fn save<W: Write>(&mut self, mut writer: W) -> Result<()> {
        writer.write_all(self.to_tly_string().as_bytes())?;
        writer.flush()?;
        self.changed = false;
        log::debug!("saved {} cells", self.cells.len());
        Ok(())
    }

    /// Write the sheet to the file at `path`, replacing it.
    pub fn save_to_path(&mut self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.save(std::io::BufWriter::new(file))
    }

    /// Read a sheet saved by [`Spreadsheet::save`], giving it the validity
    /// pattern `new_is_valid`.
    ///
    /// Problems with the file itself, including names or formulas that the
    /// saved pattern would not have accepted, are [`SheetError::Read`].
    /// Cells that were fine under the saved pattern but fail `new_is_valid`
    /// are [`SheetError::Version`].
    pub fn load<R: Read>(mut reader: R, new_is_valid: Regex) -> Result<Spreadsheet> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;

        let parsed = parse_tly_content(&content)?;
        let saved_is_valid = match &parsed.pattern {
            Some((line, source)) => Regex::new(source).map_err(|err| SheetError::Read {
                line: *line,
                message: format!("invalid validity pattern: {}", err),
            })?,
            None => Regex::new(ACCEPT_ALL)?,
        };
        let saved_accepts = |name: &str| is_cell_name(name) && saved_is_valid.is_match(&canonical_name(name));

        let mut sheet = Spreadsheet::with_validator(new_is_valid);
        let mut seen: HashSet<String> = HashSet::new();

        for cell in &parsed.cells {
            if !saved_accepts(&cell.name) {
                return Err(read_error(cell, format!("invalid cell name {}", cell.name)));
            }
            let name = canonical_name(&cell.name);
            if !seen.insert(name.clone()) {
                return Err(read_error(cell, format!("duplicate cell {}", name)));
            }

            let contents = match &cell.contents {
                StoredContents::Number(n) => CellContents::Number(*n),
                StoredContents::Text(s) => CellContents::Text(s.clone()),
                StoredContents::Formula(text) => {
                    let formula = Formula::parse_with(text, canonical_name, saved_accepts)
                        .map_err(|err| read_error(cell, format!("invalid formula in {}: {}", name, err)))?;
                    CellContents::Formula(formula)
                }
            };

            if !sheet.is_valid_name(&name) {
                return Err(version_error(cell, format!("cell name {} is no longer valid", name)));
            }

            match sheet.set_cell_contents(&name, contents) {
                Ok(_) => {}
                Err(SheetError::InvalidName(var)) => {
                    return Err(version_error(
                        cell,
                        format!("formula in {} reads {}, which is no longer valid", name, var),
                    ));
                }
                Err(SheetError::CircularDependency(err)) => {
                    return Err(read_error(cell, err.to_string()));
                }
                Err(err) => return Err(err),
            }
        }

        sheet.changed = false;
        log::debug!("loaded {} cells", sheet.cells.len());
        Ok(sheet)
    }

    /// Read the sheet stored at `path`. See [`Spreadsheet::load`].
    pub fn load_from_path(path: &Path, new_is_valid: Regex) -> Result<Spreadsheet> {
        let file = std::fs::File::open(path)?;
        Self::load(std::io::BufReader::new(file), new_is_valid)
    }
}

fn read_error(cell: &ParsedCell, message: String) -> SheetError {
    SheetError::Read {
        line: cell.line,
        message,
    }
}

fn version_error(cell: &ParsedCell, message: String) -> SheetError {
    SheetError::Version {
        line: cell.line,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tally_engine::engine::CellValue;

    fn accept_all() -> Regex {
        Regex::new(ACCEPT_ALL).unwrap()
    }

    fn load_str(content: &str) -> Result<Spreadsheet> {
        Spreadsheet::load(content.as_bytes(), accept_all())
    }

    fn sample() -> Spreadsheet {
        let mut sheet = Spreadsheet::new();
        for (name, content) in [
            ("A1", "5"),
            ("A2", "=a1 + 3"),
            ("A3", "=(A2*2)"),
            ("B1", "hello \"world\""),
            ("B2", "=Z9"),
            ("c10", "line one\nline two"),
        ] {
            sheet.set_contents_of_cell(name, content).unwrap();
        }
        sheet
            .set_cell_contents("B3", CellContents::Text("42".to_string()))
            .unwrap();
        sheet
    }

    #[test]
    fn test_save_writes_sorted_lines() {
        let mut sheet = sample();
        let mut out = Vec::new();
        sheet.save(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            concat!(
                "# Tally Spreadsheet\n",
                "@valid: .*\n",
                "A1: 5\n",
                "B1: \"hello \\\"world\\\"\"\n",
                "A2: =A1 + 3\n",
                "B2: =Z9\n",
                "A3: =(A2 * 2)\n",
                "B3: \"42\"\n",
                "C10: \"line one\\nline two\"\n",
            )
        );
        assert!(!sheet.changed());
    }

    #[test]
    fn test_round_trip() {
        let mut sheet = sample();
        let mut out = Vec::new();
        sheet.save(&mut out).unwrap();

        let loaded = Spreadsheet::load(out.as_slice(), accept_all()).unwrap();
        assert_eq!(loaded.cells, sheet.cells);
        assert_eq!(loaded.graph, sheet.graph);
        assert!(!loaded.changed());
        assert_eq!(loaded.get_cell_value("A3").unwrap(), CellValue::Number(16.0));
        assert_eq!(
            loaded.get_cell_value("B3").unwrap(),
            CellValue::Text("42".to_string())
        );
    }

    #[test]
    fn test_multiline_pattern_round_trips() {
        let pattern = "(?x) ^A  # only column A\n  [0-9]+$";
        let mut sheet = Spreadsheet::with_pattern(pattern).unwrap();
        sheet.set_contents_of_cell("A1", "1").unwrap();
        assert!(sheet.set_contents_of_cell("B1", "1").is_err());

        let mut out = Vec::new();
        sheet.save(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3);

        let parsed = parse_tly_content(&text).unwrap();
        assert_eq!(parsed.pattern, Some((2, pattern.to_string())));

        let loaded = Spreadsheet::load(text.as_bytes(), Regex::new(pattern).unwrap()).unwrap();
        assert_eq!(loaded.cells, sheet.cells);

        // The saved pattern still applies to what the file may contain.
        let tampered = text.replace("A1: 1", "B1: 1");
        let err = load_str(&tampered).unwrap_err();
        assert!(matches!(err, SheetError::Read { line: 3, .. }));
    }

    #[test]
    fn test_load_out_of_order_formulas() {
        let sheet = load_str("A1: =B1 * 2\nB1: =C1 + 1\nC1: 4\n").unwrap();
        assert_eq!(sheet.get_cell_value("A1").unwrap(), CellValue::Number(10.0));
    }

    #[test]
    fn test_load_keeps_new_pattern() {
        let sheet = Spreadsheet::load("@valid: .*\nA1: 1\n".as_bytes(), Regex::new("^A").unwrap()).unwrap();
        assert_eq!(sheet.validator().as_str(), "^A");
    }

    #[test]
    fn test_load_rejects_duplicates_case_insensitively() {
        let err = load_str("A1: 1\na1: 2\n").unwrap_err();
        assert!(matches!(err, SheetError::Read { line: 2, .. }));
    }

    #[test]
    fn test_load_rejects_cycle() {
        let err = load_str("A1: =B1\nB1: =C1\nC1: =A1\n").unwrap_err();
        assert!(matches!(err, SheetError::Read { line: 3, .. }));
    }

    #[test]
    fn test_load_rejects_names_invalid_under_saved_pattern() {
        let err = load_str("@valid: ^A\nB1: 1\n").unwrap_err();
        assert!(matches!(err, SheetError::Read { line: 2, .. }));

        let err = load_str("@valid: ^A\nA1: =B1\n").unwrap_err();
        assert!(matches!(err, SheetError::Read { line: 2, .. }));

        let err = load_str("1A: 1\n").unwrap_err();
        assert!(matches!(err, SheetError::Read { line: 1, .. }));
    }

    #[test]
    fn test_load_rejects_bad_formula_and_pattern() {
        let err = load_str("A1: =1 +\n").unwrap_err();
        assert!(matches!(err, SheetError::Read { line: 1, .. }));

        let err = load_str("@valid: (\nA1: 1\n").unwrap_err();
        assert!(matches!(err, SheetError::Read { line: 1, .. }));
    }

    #[test]
    fn test_load_reports_version_errors() {
        let only_a = Regex::new("^A").unwrap();
        let err = Spreadsheet::load("B1: 1\n".as_bytes(), only_a.clone()).unwrap_err();
        assert!(matches!(err, SheetError::Version { line: 1, .. }));

        let err = Spreadsheet::load("A1: 1\nA2: =B1\n".as_bytes(), only_a).unwrap_err();
        assert!(matches!(err, SheetError::Version { line: 2, .. }));
    }

    #[test]
    fn test_load_reports_first_problem_by_line() {
        let only_a = Regex::new("^A").unwrap();
        let err = Spreadsheet::load("B1: 1\nb1: 2\n".as_bytes(), only_a).unwrap_err();
        assert!(matches!(err, SheetError::Version { line: 1, .. }));

        let err = Spreadsheet::load("A1: 1\na1: 2\n".as_bytes(), Regex::new("^Z").unwrap()).unwrap_err();
        assert!(matches!(err, SheetError::Version { line: 1, .. }));
    }

    #[test]
    fn test_save_to_path_and_load_from_path() {
        let path = std::env::temp_dir().join(format!(
            "tally_io_{}_{:?}.tly",
            std::process::id(),
            std::thread::current().id(),
        ));
        struct Cleanup(std::path::PathBuf);
        impl Drop for Cleanup {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.0);
            }
        }
        let _cleanup = Cleanup(path.clone());

        let mut sheet = sample();
        assert!(sheet.changed());
        sheet.save_to_path(&path).unwrap();
        assert!(!sheet.changed());

        let loaded = Spreadsheet::load_from_path(&path, accept_all()).unwrap();
        assert_eq!(loaded.cells, sheet.cells);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("tally_definitely_missing_file.tly");
        let err = Spreadsheet::load_from_path(&path, accept_all()).unwrap_err();
        assert!(matches!(err, SheetError::Io(_)));
    }
}
