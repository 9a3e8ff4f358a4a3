//! Formula parsing and validation.
//!
//! A [`Formula`] is an immutable, validated sequence of [`Token`]s built from
//! infix text such as `(A1 + 2) * b3`. Construction enforces the grammar:
//!
//! - numbers are non-negative (there is no unary minus)
//! - variables are normalised by a caller-supplied function and must still
//!   look like a variable afterwards, then pass a caller-supplied validator
//! - parentheses balance
//! - operands and operators alternate, starting and ending with an operand
//!
//! Once built, a formula can be evaluated many times (see [`Formula::evaluate`]),
//! rendered back to canonical text, or asked which variables it reads.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use super::tokenizer::{LexemeKind, tokenize};

/// One of the four binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    fn from_symbol(symbol: &str) -> Option<Operator> {
        match symbol {
            "+" => Some(Operator::Add),
            "-" => Some(Operator::Sub),
            "*" => Some(Operator::Mul),
            "/" => Some(Operator::Div),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
        }
    }
}

/// A validated formula token.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    /// A variable in canonical (normalised) form.
    Variable(String),
    Operator(Operator),
    LeftParen,
    RightParen,
}

impl Token {
    /// True for tokens that may end an expression: numbers, variables and `)`.
    fn closes_operand(&self) -> bool {
        matches!(self, Token::Number(_) | Token::Variable(_) | Token::RightParen)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Variable(name) => f.write_str(name),
            Token::Operator(op) => write!(f, "{}", op.symbol()),
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
        }
    }
}

/// Reasons a formula string can be rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaFormatError {
    #[error("'{0}' is not a valid token")]
    InvalidToken(String),

    #[error("'{0}' is not a valid non-negative number")]
    InvalidNumber(String),

    #[error("normalizer turned '{original}' into the illegal variable name '{normalized}'")]
    IllegalNormalizedName { original: String, normalized: String },

    #[error("'{0}' is not a valid name")]
    RejectedName(String),

    #[error("unexpected closing parenthesis: ')'")]
    UnexpectedClosingParen,

    #[error("missing closing parenthesis: ')'")]
    MissingClosingParen,

    #[error("'{token}' cannot follow '{after}'")]
    UnexpectedToken { token: String, after: String },

    #[error("the first token of a formula must be a number, variable, or '(', found '{0}'")]
    InvalidFirstToken(String),

    #[error("'{0}' is an invalid final token")]
    InvalidLastToken(String),

    #[error("there must be at least one token in the formula")]
    Empty,
}

fn variable_re() -> &'static Regex {
    static VARIABLE_RE: OnceLock<Regex> = OnceLock::new();
    VARIABLE_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z][0-9a-zA-Z]*$").expect("variable shape regex must compile")
    })
}

/// True if `name` has the shape of a formula variable.
pub fn is_variable(name: &str) -> bool {
    variable_re().is_match(name)
}

/// An immutable, validated infix formula.
#[derive(Clone, Debug, PartialEq)]
pub struct Formula {
    tokens: Vec<Token>,
}

impl Formula {
    /// Parse `text` keeping variable names as written and accepting every
    /// variable.
    pub fn parse(text: &str) -> Result<Formula, FormulaFormatError> {
        Self::parse_with(text, |name| name.to_string(), |_| true)
    }

    /// Parse `text`, canonicalising each variable with `normalize` and
    /// rejecting any canonical name for which `validate` returns false.
    pub fn parse_with<N, V>(text: &str, normalize: N, validate: V) -> Result<Formula, FormulaFormatError>
    where
        N: Fn(&str) -> String,
        V: Fn(&str) -> bool,
    {
        let mut tokens: Vec<Token> = Vec::new();
        let mut opening = 0usize;
        let mut closing = 0usize;

        for lexeme in tokenize(text) {
            let token = match lexeme.kind {
                LexemeKind::Number => {
                    let value: f64 = lexeme
                        .text
                        .parse()
                        .map_err(|_| FormulaFormatError::InvalidNumber(lexeme.text.to_string()))?;
                    if !value.is_finite() || value < 0.0 {
                        return Err(FormulaFormatError::InvalidNumber(lexeme.text.to_string()));
                    }
                    Token::Number(value)
                }
                LexemeKind::Variable => {
                    let normalized = normalize(lexeme.text);
                    if !is_variable(&normalized) {
                        return Err(FormulaFormatError::IllegalNormalizedName {
                            original: lexeme.text.to_string(),
                            normalized,
                        });
                    }
                    if !validate(&normalized) {
                        return Err(FormulaFormatError::RejectedName(lexeme.text.to_string()));
                    }
                    Token::Variable(normalized)
                }
                LexemeKind::Operator => match Operator::from_symbol(lexeme.text) {
                    Some(op) => Token::Operator(op),
                    None => return Err(FormulaFormatError::InvalidToken(lexeme.text.to_string())),
                },
                LexemeKind::LeftParen => {
                    opening += 1;
                    Token::LeftParen
                }
                LexemeKind::RightParen => {
                    closing += 1;
                    if closing > opening {
                        return Err(FormulaFormatError::UnexpectedClosingParen);
                    }
                    Token::RightParen
                }
                LexemeKind::Invalid => {
                    return Err(FormulaFormatError::InvalidToken(lexeme.text.to_string()));
                }
            };

            match tokens.last() {
                None => {
                    if matches!(token, Token::Operator(_) | Token::RightParen) {
                        return Err(FormulaFormatError::InvalidFirstToken(token.to_string()));
                    }
                }
                Some(prev) => {
                    let allowed = if prev.closes_operand() {
                        matches!(token, Token::Operator(_) | Token::RightParen)
                    } else {
                        matches!(token, Token::Number(_) | Token::Variable(_) | Token::LeftParen)
                    };
                    if !allowed {
                        return Err(FormulaFormatError::UnexpectedToken {
                            token: token.to_string(),
                            after: prev.to_string(),
                        });
                    }
                }
            }

            tokens.push(token);
        }

        let Some(last) = tokens.last() else {
            return Err(FormulaFormatError::Empty);
        };
        if opening > closing {
            return Err(FormulaFormatError::MissingClosingParen);
        }
        if !last.closes_operand() {
            return Err(FormulaFormatError::InvalidLastToken(last.to_string()));
        }

        Ok(Formula { tokens })
    }

    /// The validated token sequence.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Each distinct variable (in canonical form) the formula reads.
    pub fn variables(&self) -> HashSet<String> {
        self.tokens
            .iter()
            .filter_map(|token| match token {
                Token::Variable(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Render as `=` followed by the normalised infix text, with a single
    /// space between tokens except directly after `(` and before `)`.
    pub fn to_canonical_text(&self) -> String {
        self.to_string()
    }
}

impl Default for Formula {
    /// The formula `0`.
    fn default() -> Self {
        Formula {
            tokens: vec![Token::Number(0.0)],
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("=")?;
        let mut iter = self.tokens.iter().peekable();
        while let Some(token) = iter.next() {
            write!(f, "{}", token)?;
            let Some(next) = iter.peek() else {
                break;
            };
            let tight = matches!(token, Token::LeftParen) || matches!(next, Token::RightParen);
            if !tight {
                f.write_str(" ")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Formula {
    type Err = FormulaFormatError;

    /// Parses with the identity normaliser; a leading `=` is accepted so that
    /// canonical text round-trips.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formula::parse(s.strip_prefix('=').unwrap_or(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn upper(name: &str) -> String {
        name.to_ascii_uppercase()
    }

    #[test]
    fn test_parse_valid_formulas() {
        for text in ["2.5e9 + x5 / 17", "(5 * 2) + 8", "x*y-2+35/9", "((a))", "7"] {
            assert!(Formula::parse(text).is_ok(), "expected '{}' to parse", text);
        }
    }

    #[test]
    fn test_parse_rejects_invalid_token() {
        assert_eq!(
            Formula::parse("_"),
            Err(FormulaFormatError::InvalidToken("_".to_string()))
        );
        assert_eq!(
            Formula::parse("2 $ 3"),
            Err(FormulaFormatError::InvalidToken("$".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_unary_minus() {
        assert_eq!(
            Formula::parse("-5.3"),
            Err(FormulaFormatError::InvalidFirstToken("-".to_string()))
        );
        assert!(matches!(
            Formula::parse("2 * -3"),
            Err(FormulaFormatError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_adjacent_operands() {
        assert_eq!(
            Formula::parse("2 5 + 3"),
            Err(FormulaFormatError::UnexpectedToken {
                token: "5".to_string(),
                after: "2".to_string(),
            })
        );
        assert!(Formula::parse("(2)(3)").is_err());
        assert!(Formula::parse("a1 (2)").is_err());
    }

    #[test]
    fn test_parse_rejects_unbalanced_parens() {
        assert_eq!(
            Formula::parse("(1 + 2"),
            Err(FormulaFormatError::MissingClosingParen)
        );
        assert_eq!(
            Formula::parse("1 + 2)"),
            Err(FormulaFormatError::UnexpectedClosingParen)
        );
        assert_eq!(Formula::parse(")("), Err(FormulaFormatError::UnexpectedClosingParen));
    }

    #[test]
    fn test_parse_rejects_empty_and_bad_ends() {
        assert_eq!(Formula::parse(""), Err(FormulaFormatError::Empty));
        assert_eq!(Formula::parse("   "), Err(FormulaFormatError::Empty));
        assert_eq!(
            Formula::parse("1 +"),
            Err(FormulaFormatError::InvalidLastToken("+".to_string()))
        );
        assert_eq!(
            Formula::parse("*1"),
            Err(FormulaFormatError::InvalidFirstToken("*".to_string()))
        );
        assert!(Formula::parse("()").is_err());
    }

    #[test]
    fn test_parse_normalizer_and_validator() {
        let f = Formula::parse_with("a1 + b2", upper, |_| true).unwrap();
        let mut vars: Vec<_> = f.variables().into_iter().collect();
        vars.sort();
        assert_eq!(vars, vec!["A1".to_string(), "B2".to_string()]);

        let err = Formula::parse_with("a1", |_| "1a".to_string(), |_| true).unwrap_err();
        assert!(matches!(err, FormulaFormatError::IllegalNormalizedName { .. }));

        let err = Formula::parse_with("a1 + zz", upper, |n| n != "ZZ").unwrap_err();
        assert_eq!(err, FormulaFormatError::RejectedName("zz".to_string()));
    }

    #[test]
    fn test_variables_are_distinct() {
        let f = Formula::parse("x + x * y").unwrap();
        assert_eq!(f.variables().len(), 2);
        assert!(Formula::parse("1 + 2").unwrap().variables().is_empty());
    }

    #[test]
    fn test_canonical_text() {
        let f = Formula::parse_with("(a1+2)*b3", upper, |_| true).unwrap();
        assert_eq!(f.to_canonical_text(), "=(A1 + 2) * B3");

        let f = Formula::parse("((x))").unwrap();
        assert_eq!(f.to_string(), "=((x))");

        let f = Formula::parse("2.50 / .5").unwrap();
        assert_eq!(f.to_string(), "=2.5 / 0.5");
    }

    #[test]
    fn test_parse_rejects_overflowing_number() {
        assert_eq!(
            Formula::parse("1e999"),
            Err(FormulaFormatError::InvalidNumber("1e999".to_string()))
        );
        assert!(Formula::parse("2 * 1e999 - 1").is_err());
        // Underflow is fine: it is just zero.
        assert_eq!(Formula::parse("1e-999").unwrap().to_string(), "=0");
    }

    #[test]
    fn test_canonical_text_reparses() {
        let f = Formula::parse("x*(y-2)+35/9").unwrap();
        let again: Formula = f.to_canonical_text().parse().unwrap();
        assert_eq!(f, again);
    }

    #[test]
    fn test_default_formula_is_zero() {
        let f = Formula::default();
        assert_eq!(f.to_string(), "=0");
        assert!(f.variables().is_empty());
    }
}
