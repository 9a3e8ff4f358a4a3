//! Writer for the .tly file format

use tally_engine::engine::{CellContents, CellRef};

/// First line of every file written.
pub const HEADER: &str = "# Tally Spreadsheet";

/// Render cells in .tly format.
///
/// Cells are written in row-major order; names that are not plain cell
/// references sort last, alphabetically.
pub fn write_tly_content<'a, I>(pattern: &str, cells: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a CellContents)>,
{
    let mut lines = vec![
        HEADER.to_string(),
        format!("@valid: {}", escape_tly_pattern(pattern)),
    ];

    let mut cells: Vec<_> = cells
        .into_iter()
        .map(|(name, contents)| (CellRef::from_str(name), name, contents))
        .collect();
    cells.sort_by(|a, b| match (&a.0, &b.0) {
        (Some(x), Some(y)) => x.cmp(y).then_with(|| a.1.cmp(b.1)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.1.cmp(b.1),
    });

    for (_, name, contents) in cells {
        let value_str = match contents {
            CellContents::Number(n) => n.to_string(),
            CellContents::Text(s) => format!("\"{}\"", escape_tly_text(s)),
            CellContents::Formula(f) => f.to_canonical_text(),
        };
        lines.push(format!("{}: {}", name, value_str));
    }

    lines.join("\n") + "\n"
}

fn escape_tly_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape line breaks so the pattern stays on the `@valid:` line. A backslash
/// is doubled only where it would otherwise read as an escape, so `\d` is
/// written as is.
fn escape_tly_pattern(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if matches!(chars.peek(), Some('\\' | 'n' | 'r' | '\n' | '\r') | None) => {
                out.push_str("\\\\")
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}
