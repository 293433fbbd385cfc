//! Restricted arithmetic and boolean expressions used by scoring rules.
//!
//! Formulas and conditions are written by survey authors, so they are never
//! handed to a general-purpose interpreter. The language is numbers, names,
//! `+ - * / %`, comparisons, `&& || !` and parentheses.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use eval::{Bindings, Value};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("expression is empty")]
    Empty,
    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedCharacter { found: char, offset: usize },
    #[error("invalid number '{text}' at offset {offset}")]
    InvalidNumber { text: String, offset: usize },
    #[error("unexpected '{found}' at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("expression nested deeper than {limit} levels")]
    TooDeep { limit: usize },
    #[error("unknown name '{0}'")]
    UnknownIdentifier(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NonFinite,
}

/// A parsed formula or condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    tree: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        Ok(Self {
            source: source.to_string(),
            tree: parser::parse(source)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &Expr {
        &self.tree
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.tree.identifiers()
    }

    /// Evaluate in an arithmetic context.
    pub fn evaluate_number<B: Bindings + ?Sized>(&self, bindings: &B) -> Result<f64, ExprError> {
        eval::evaluate(&self.tree, bindings).map(Value::as_number)
    }

    /// Evaluate in a boolean context.
    pub fn evaluate_condition<B: Bindings + ?Sized>(
        &self,
        bindings: &B,
    ) -> Result<bool, ExprError> {
        eval::evaluate(&self.tree, bindings).map(Value::as_bool)
    }
}

/// Names referenced by an expression string.
///
/// Walks the parsed tree when the text parses; otherwise falls back to the
/// identifier tokens, and to nothing when the text does not even lex.
pub fn referenced_names(source: &str) -> Vec<String> {
    match parser::parse(source) {
        Ok(tree) => tree.identifiers().into_iter().map(str::to_string).collect(),
        Err(_) => lexer::identifier_tokens(source).unwrap_or_default(),
    }
}
