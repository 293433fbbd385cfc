use super::ast::{BinaryOp, Expr, UnaryOp};
use super::ExprError;
use std::collections::HashMap;

/// Name lookup used while evaluating an expression.
pub trait Bindings {
    fn lookup(&self, name: &str) -> Option<f64>;
}

impl Bindings for HashMap<String, f64> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl Bindings for [(&str, f64)] {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, value)| *value)
    }
}

/// Result of evaluating a node. Numbers and booleans coerce into each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
}

impl Value {
    pub fn as_number(self) -> f64 {
        match self {
            Value::Number(n) => n,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
        }
    }

    pub fn as_bool(self) -> bool {
        match self {
            Value::Bool(b) => b,
            Value::Number(n) => n != 0.0 && !n.is_nan(),
        }
    }
}

pub fn evaluate<B: Bindings + ?Sized>(expr: &Expr, bindings: &B) -> Result<Value, ExprError> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Ident(name) => bindings
            .lookup(name)
            .map(Value::Number)
            .ok_or_else(|| ExprError::UnknownIdentifier(name.clone())),
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, bindings)?;
            Ok(match op {
                UnaryOp::Neg => Value::Number(-value.as_number()),
                UnaryOp::Not => Value::Bool(!value.as_bool()),
            })
        }
        Expr::Binary { op, lhs, rhs } => evaluate_binary(*op, lhs, rhs, bindings),
    }
}

fn evaluate_binary<B: Bindings + ?Sized>(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    bindings: &B,
) -> Result<Value, ExprError> {
    // Logical operators short-circuit, so the right side may reference
    // names that are never looked up.
    match op {
        BinaryOp::And => {
            if !evaluate(lhs, bindings)?.as_bool() {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(evaluate(rhs, bindings)?.as_bool()))
        }
        BinaryOp::Or => {
            if evaluate(lhs, bindings)?.as_bool() {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(evaluate(rhs, bindings)?.as_bool()))
        }
        _ => evaluate_arithmetic(op, lhs, rhs, bindings),
    }
}

fn evaluate_arithmetic<B: Bindings + ?Sized>(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    bindings: &B,
) -> Result<Value, ExprError> {
    let a = evaluate(lhs, bindings)?.as_number();
    let b = evaluate(rhs, bindings)?.as_number();

    let value = match op {
        BinaryOp::Add => Value::Number(a + b),
        BinaryOp::Sub => Value::Number(a - b),
        BinaryOp::Mul => Value::Number(a * b),
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            Value::Number(a / b)
        }
        BinaryOp::Rem => {
            if b == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            Value::Number(a % b)
        }
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::Ge => Value::Bool(a >= b),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::Le => Value::Bool(a <= b),
        BinaryOp::Eq => Value::Bool(a == b),
        BinaryOp::Ne => Value::Bool(a != b),
        BinaryOp::And => Value::Bool(a != 0.0 && b != 0.0),
        BinaryOp::Or => Value::Bool(a != 0.0 || b != 0.0),
    };

    if let Value::Number(n) = value {
        if !n.is_finite() {
            return Err(ExprError::NonFinite);
        }
    }

    Ok(value)
}
