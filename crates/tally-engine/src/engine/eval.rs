//! Formula evaluation.
//!
//! Evaluates a validated [`Formula`] in a single left-to-right pass using a
//! value stack and an operator stack. `*` and `/` are applied as soon as their
//! right operand is known, `+` and `-` are deferred until the next additive
//! operator, `)` or the end of input, which gives the usual precedence and
//! left-to-right associativity without building a tree.

use thiserror::Error;

use super::formula::{Formula, Operator, Token};

/// Why a formula could not produce a number.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("division by zero")]
    DivideByZero,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Pending {
    Op(Operator),
    LeftParen,
}

struct Stacks {
    values: Vec<f64>,
    ops: Vec<Pending>,
}

impl Stacks {
    fn pending_op(&self) -> Option<Operator> {
        match self.ops.last() {
            Some(Pending::Op(op)) => Some(*op),
            _ => None,
        }
    }

    fn pop_value(&mut self) -> f64 {
        // The parser guarantees operands and operators alternate, so the stack
        // always holds enough values here.
        self.values.pop().unwrap_or(0.0)
    }

    /// Push an operand, folding it into a pending `*` or `/`.
    fn push_value(&mut self, value: f64) -> Result<(), EvalError> {
        match self.pending_op() {
            Some(op @ (Operator::Mul | Operator::Div)) => {
                self.ops.pop();
                let left = self.pop_value();
                self.values.push(apply(op, left, value)?);
            }
            _ => self.values.push(value),
        }
        Ok(())
    }

    /// Apply a pending `+` or `-` to the two topmost values.
    fn resolve_additive(&mut self) {
        if let Some(op @ (Operator::Add | Operator::Sub)) = self.pending_op() {
            self.ops.pop();
            let right = self.pop_value();
            let left = self.pop_value();
            let result = if op == Operator::Sub { left - right } else { left + right };
            self.values.push(result);
        }
    }

    fn close_paren(&mut self) -> Result<(), EvalError> {
        self.resolve_additive();
        // Matching `(` marker.
        self.ops.pop();
        if matches!(self.pending_op(), Some(Operator::Mul | Operator::Div)) {
            let right = self.pop_value();
            self.push_value(right)?;
        }
        Ok(())
    }
}

fn apply(op: Operator, left: f64, right: f64) -> Result<f64, EvalError> {
    match op {
        Operator::Add => Ok(left + right),
        Operator::Sub => Ok(left - right),
        Operator::Mul => Ok(left * right),
        Operator::Div => {
            if right == 0.0 {
                Err(EvalError::DivideByZero)
            } else {
                Ok(left / right)
            }
        }
    }
}

/// Evaluate `formula`, resolving variables with `lookup`.
///
/// `lookup` returns `None` for a variable that has no numeric value; that
/// aborts evaluation with [`EvalError::UndefinedVariable`].
pub fn evaluate<L>(formula: &Formula, lookup: L) -> Result<f64, EvalError>
where
    L: Fn(&str) -> Option<f64>,
{
    let mut stacks = Stacks {
        values: Vec::new(),
        ops: Vec::new(),
    };

    for token in formula.tokens() {
        match token {
            Token::Number(n) => stacks.push_value(*n)?,
            Token::Variable(name) => {
                let value = lookup(name).ok_or_else(|| EvalError::UndefinedVariable(name.clone()))?;
                stacks.push_value(value)?;
            }
            Token::LeftParen => stacks.ops.push(Pending::LeftParen),
            Token::Operator(op @ (Operator::Add | Operator::Sub)) => {
                stacks.resolve_additive();
                stacks.ops.push(Pending::Op(*op));
            }
            Token::Operator(op) => stacks.ops.push(Pending::Op(*op)),
            Token::RightParen => stacks.close_paren()?,
        }
    }

    stacks.resolve_additive();
    Ok(stacks.pop_value())
}

impl Formula {
    /// Evaluate this formula. See [`evaluate`].
    pub fn evaluate<L>(&self, lookup: L) -> Result<f64, EvalError>
    where
        L: Fn(&str) -> Option<f64>,
    {
        evaluate(self, lookup)
    }
}
