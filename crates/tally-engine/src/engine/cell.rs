//! Cell data structures.
//!
//! - [`CellContents`] - what the user typed: a number, text, or a formula
//! - [`CellValue`] - what the cell currently shows: a number, text, or an error
//! - [`Cell`] - contents plus the cached value

use std::fmt;

use super::cell_ref::canonical_name;
use super::eval::EvalError;
use super::formula::{Formula, FormulaFormatError};

/// The contents of a non-empty cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellContents {
    Number(f64),
    Text(String),
    Formula(Formula),
}

impl CellContents {
    /// Classify user input.
    ///
    /// - `""` -> `None` (the cell becomes empty)
    /// - finite number, surrounding whitespace allowed -> `Number`
    /// - starts with `=` -> `Formula`, variables upper-cased and checked with `validate`
    /// - anything else -> `Text`, kept verbatim
    pub fn from_input<V>(input: &str, validate: V) -> Result<Option<CellContents>, FormulaFormatError>
    where
        V: Fn(&str) -> bool,
    {
        if input.is_empty() {
            return Ok(None);
        }

        if let Ok(n) = input.trim().parse::<f64>()
            && n.is_finite()
        {
            return Ok(Some(CellContents::Number(n)));
        }

        if let Some(formula) = input.strip_prefix('=') {
            let formula = Formula::parse_with(formula, canonical_name, validate)?;
            return Ok(Some(CellContents::Formula(formula)));
        }

        Ok(Some(CellContents::Text(input.to_string())))
    }

    /// The input string that reproduces these contents.
    pub fn to_input_string(&self) -> String {
        match self {
            CellContents::Number(n) => n.to_string(),
            CellContents::Text(s) => s.clone(),
            CellContents::Formula(f) => f.to_canonical_text(),
        }
    }
}

impl fmt::Display for CellContents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_input_string())
    }
}

/// The value a formula has when it cannot be evaluated.
#[derive(Clone, Debug, PartialEq)]
pub struct FormulaErrorValue {
    pub reason: String,
}

impl FormulaErrorValue {
    pub fn new(reason: impl Into<String>) -> Self {
        FormulaErrorValue {
            reason: reason.into(),
        }
    }
}

impl From<EvalError> for FormulaErrorValue {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::UndefinedVariable(name) => {
                FormulaErrorValue::new(format!("the value of cell {} is not a number", name))
            }
            other => FormulaErrorValue::new(other.to_string()),
        }
    }
}

impl fmt::Display for FormulaErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#ERR! {}", self.reason)
    }
}

/// The computed value of a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Error(FormulaErrorValue),
}

impl CellValue {
    /// The value of an empty cell.
    pub fn empty() -> CellValue {
        CellValue::Text(String::new())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(_) | CellValue::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

/// A non-empty cell: its contents and the value last computed from them.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub contents: CellContents,
    pub value: CellValue,
}

impl Cell {
    /// A new cell whose value has not been computed yet.
    pub fn new(contents: CellContents) -> Cell {
        Cell {
            contents,
            value: CellValue::empty(),
        }
    }

    /// The formula, if this is a formula cell.
    pub fn formula(&self) -> Option<&Formula> {
        match &self.contents {
            CellContents::Formula(f) => Some(f),
            CellContents::Number(_) | CellContents::Text(_) => None,
        }
    }

    /// Compute the value `contents` currently evaluate to, resolving formula
    /// variables with `lookup`.
    ///
    /// Evaluation failures become [`CellValue::Error`]; they are not returned
    /// to the caller.
    pub fn compute_value<L>(&self, lookup: L) -> CellValue
    where
        L: Fn(&str) -> Option<f64>,
    {
        match &self.contents {
            CellContents::Number(n) => CellValue::Number(*n),
            CellContents::Text(s) => CellValue::Text(s.clone()),
            CellContents::Formula(f) => match f.evaluate(lookup) {
                Ok(n) => CellValue::Number(n),
                Err(err) => {
                    log::trace!("formula {} evaluated to an error: {}", f, err);
                    CellValue::Error(err.into())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classify(input: &str) -> Option<CellContents> {
        CellContents::from_input(input, |_| true).unwrap()
    }

    #[test]
    fn test_from_input_empty() {
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_from_input_number() {
        assert_eq!(classify("42"), Some(CellContents::Number(42.0)));
        assert_eq!(classify(" -3.5 "), Some(CellContents::Number(-3.5)));
        assert_eq!(classify("1e3"), Some(CellContents::Number(1000.0)));
    }

    #[test]
    fn test_from_input_non_finite_is_text() {
        assert_eq!(classify("nan"), Some(CellContents::Text("nan".to_string())));
        assert_eq!(classify("inf"), Some(CellContents::Text("inf".to_string())));
    }

    #[test]
    fn test_from_input_text() {
        assert_eq!(classify("hello"), Some(CellContents::Text("hello".to_string())));
        assert_eq!(classify("  "), Some(CellContents::Text("  ".to_string())));
    }

    #[test]
    fn test_from_input_formula_uppercases_variables() {
        let Some(CellContents::Formula(f)) = classify("=a1 + b2") else {
            panic!("expected formula");
        };
        assert_eq!(f.to_canonical_text(), "=A1 + B2");
    }

    #[test]
    fn test_from_input_formula_errors() {
        assert_eq!(
            CellContents::from_input("=", |_| true),
            Err(FormulaFormatError::Empty)
        );
        assert!(CellContents::from_input("=x", |name| name == "A1").is_err());
    }

    #[test]
    fn test_compute_value() {
        let cell = Cell::new(CellContents::Formula(Formula::parse("X + 1").unwrap()));
        assert_eq!(cell.compute_value(|_| Some(2.0)), CellValue::Number(3.0));
        assert!(cell.compute_value(|_| None).is_error());

        let text = Cell::new(CellContents::Text("hi".to_string()));
        assert_eq!(text.compute_value(|_| None), CellValue::Text("hi".to_string()));
    }
}
