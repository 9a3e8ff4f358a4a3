//! Parser for the .tly file format
//!
//! The parser only checks the line structure. Name validity, formula syntax
//! and cycles are checked when the cells are put into a sheet.

use crate::error::{Result, SheetError};

/// Cell contents as written in the file, before formula parsing.
#[derive(Clone, Debug, PartialEq)]
pub enum StoredContents {
    Number(f64),
    Text(String),
    /// Formula text without the leading `=`
    Formula(String),
}

/// One `NAME: VALUE` line.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedCell {
    /// 1-based line number
    pub line: usize,
    /// Name as written
    pub name: String,
    pub contents: StoredContents,
}

/// A parsed .tly document.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedSheet {
    /// Saved validity pattern and the line it was on; `None` if absent
    pub pattern: Option<(usize, String)>,
    pub cells: Vec<ParsedCell>,
}

/// Parse .tly content from a string
pub fn parse_tly_content(content: &str) -> Result<ParsedSheet> {
    let mut pattern = None;
    let mut cells = Vec::new();

    for (line_num, raw) in content.lines().enumerate() {
        let line_num = line_num + 1;
        let raw = raw.strip_suffix('\r').unwrap_or(raw);

        if let Some(source) = raw.strip_prefix("@valid:") {
            if pattern.is_some() {
                return Err(read_error(line_num, "duplicate @valid line"));
            }
            if !cells.is_empty() {
                return Err(read_error(line_num, "@valid must come before any cell"));
            }
            let source = source.strip_prefix(' ').unwrap_or(source);
            pattern = Some((line_num, unescape_tly_pattern(source)));
            continue;
        }

        let line = raw.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Parse "NAME: VALUE" format
        let Some((name, value)) = line.split_once(':') else {
            return Err(read_error(line_num, "expected 'NAME: VALUE'"));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(read_error(line_num, "missing cell name"));
        }

        let contents = parse_cell_value(value.trim(), line_num)?;
        cells.push(ParsedCell {
            line: line_num,
            name: name.to_string(),
            contents,
        });
    }

    Ok(ParsedSheet { pattern, cells })
}

fn parse_cell_value(value: &str, line_num: usize) -> Result<StoredContents> {
    if value.is_empty() {
        return Err(read_error(line_num, "missing cell value"));
    }

    if let Some(formula) = value.strip_prefix('=') {
        return Ok(StoredContents::Formula(formula.to_string()));
    }

    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        let text = unescape_tly_text(&value[1..value.len() - 1], line_num)?;
        return Ok(StoredContents::Text(text));
    }

    if let Ok(n) = value.parse::<f64>()
        && n.is_finite()
    {
        return Ok(StoredContents::Number(n));
    }

    Err(read_error(
        line_num,
        format!("invalid value: {}. Text must be quoted.", value),
    ))
}

fn unescape_tly_text(input: &str, line_num: usize) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some(other) => {
                    return Err(read_error(line_num, format!("unknown escape \\{}", other)));
                }
                None => return Err(read_error(line_num, "dangling backslash")),
            },
            '"' => return Err(read_error(line_num, "unescaped quote in text")),
            _ => out.push(ch),
        }
    }
    Ok(out)
}

/// Undo the writer's pattern escaping. Backslashes not followed by `\\`,
/// `n` or `r` are part of the pattern.
fn unescape_tly_pattern(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            _ => {
                out.push('\\');
                continue;
            }
        }
        chars.next();
    }
    out
}

fn read_error(line: usize, message: impl Into<String>) -> SheetError {
    SheetError::Read {
        line,
        message: message.into(),
    }
}
