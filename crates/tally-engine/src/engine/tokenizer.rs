//! Lexical scanning of formula text.
//!
//! Splits a formula into raw lexemes without judging whether they form a
//! valid expression. Recognised lexemes are:
//!
//! - `(` and `)`
//! - one of the operators `+ - * /`
//! - variables: a letter followed by letters and/or digits (`A1`, `x2y`)
//! - numeric literals with an optional exponent (`3`, `2.5`, `.5`, `1e-3`)
//!
//! Whitespace runs are discarded. Any other stretch of text is handed on
//! unchanged as an [`LexemeKind::Invalid`] lexeme so the parser can report it.
//! No lexeme is ever empty.

use regex::{CaptureMatches, Regex};
use std::sync::OnceLock;

/// What a lexeme looked like to the scanner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LexemeKind {
    LeftParen,
    RightParen,
    Operator,
    Variable,
    Number,
    Invalid,
}

/// A slice of formula text tagged with its lexical class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lexeme<'a> {
    pub kind: LexemeKind,
    pub text: &'a str,
}

impl<'a> Lexeme<'a> {
    fn new(kind: LexemeKind, text: &'a str) -> Self {
        Lexeme { kind, text }
    }
}

fn lexeme_re() -> &'static Regex {
    static LEXEME_RE: OnceLock<Regex> = OnceLock::new();
    LEXEME_RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            (?P<lp>\()
            | (?P<rp>\))
            | (?P<op>[+\-*/])
            | (?P<var>[a-zA-Z][0-9a-zA-Z]*)
            | (?P<num>(?:\d+\.\d*|\d*\.\d+|\d+)(?:e[+-]?\d+)?)
            | (?P<ws>\s+)
            ",
        )
        .expect("formula lexeme regex must compile")
    })
}

/// Lazily scan `text` into lexemes.
///
/// The returned iterator borrows `text` and yields each lexeme exactly once;
/// it cannot be rewound.
pub fn tokenize(text: &str) -> Lexemes<'_> {
    Lexemes {
        text,
        matches: lexeme_re().captures_iter(text),
        cursor: 0,
        pending: None,
    }
}

/// Iterator over the lexemes of a formula. See [`tokenize`].
pub struct Lexemes<'a> {
    text: &'a str,
    matches: CaptureMatches<'static, 'a>,
    cursor: usize,
    /// A recognised lexeme found after an unrecognised gap; emitted next.
    pending: Option<Lexeme<'a>>,
}

impl<'a> Iterator for Lexemes<'a> {
    type Item = Lexeme<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(lexeme) = self.pending.take() {
            return Some(lexeme);
        }

        loop {
            let Some(caps) = self.matches.next() else {
                // Trailing garbage after the last recognised lexeme.
                if self.cursor < self.text.len() {
                    let rest = &self.text[self.cursor..];
                    self.cursor = self.text.len();
                    return Some(Lexeme::new(LexemeKind::Invalid, rest));
                }
                return None;
            };

            let whole = caps.get(0)?;
            let gap = (self.cursor < whole.start())
                .then(|| Lexeme::new(LexemeKind::Invalid, &self.text[self.cursor..whole.start()]));
            self.cursor = whole.end();

            let kind = if caps.name("lp").is_some() {
                Some(LexemeKind::LeftParen)
            } else if caps.name("rp").is_some() {
                Some(LexemeKind::RightParen)
            } else if caps.name("op").is_some() {
                Some(LexemeKind::Operator)
            } else if caps.name("var").is_some() {
                Some(LexemeKind::Variable)
            } else if caps.name("num").is_some() {
                Some(LexemeKind::Number)
            } else {
                None // whitespace
            };
            let lexeme = kind.map(|kind| Lexeme::new(kind, whole.as_str()));

            match (gap, lexeme) {
                (Some(gap), Some(lexeme)) => {
                    self.pending = Some(lexeme);
                    return Some(gap);
                }
                (Some(gap), None) => return Some(gap),
                (None, Some(lexeme)) => return Some(lexeme),
                (None, None) => continue,
            }
        }
    }
}
