use log::debug;

use crate::ast::{BinaryOp, UnaryOp};
use crate::error::{BrewinError, Result};
use crate::value::Value;

/// Apply a binary operator to two already-evaluated operands.
pub(super) fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    debug!("Binary {} on {} and {}", op.symbol(), left, right);

    match op {
        BinaryOp::Equal => Ok(Value::Bool(left.equals(&right))),
        BinaryOp::NotEqual => Ok(Value::Bool(!left.equals(&right))),

        BinaryOp::And | BinaryOp::Or => {
            let (a, b) = match (left.as_bool(), right.as_bool()) {
                (Some(a), Some(b)) => (a, b),
                _ => return Err(mismatch(op, &left, &right)),
            };

            Ok(Value::Bool(if op == BinaryOp::And { a && b } else { a || b }))
        }

        BinaryOp::Add => match (left, right) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
            (Value::Int(a), Value::Int(b)) => checked(op, a.checked_add(b)),
            (left, right) => Err(mismatch(op, &left, &right)),
        },

        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            let (a, b) = ints(op, &left, &right)?;

            match op {
                BinaryOp::Sub => checked(op, a.checked_sub(b)),
                BinaryOp::Mul => checked(op, a.checked_mul(b)),
                _ => {
                    if b == 0 {
                        return Err(BrewinError::type_error("division by zero"));
                    }
                    checked(op, floor_div(a, b))
                }
            }
        }

        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
            let (a, b) = ints(op, &left, &right)?;

            Ok(Value::Bool(match op {
                BinaryOp::Less => a < b,
                BinaryOp::LessEqual => a <= b,
                BinaryOp::Greater => a > b,
                _ => a >= b,
            }))
        }
    }
}

/// Apply `-` or `!` to an evaluated operand.
pub(super) fn unary(op: UnaryOp, operand: Value) -> Result<Value> {
    match (op, &operand) {
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| BrewinError::type_error("integer overflow in negation")),

        (UnaryOp::Not, _) => match operand.as_bool() {
            Some(b) => Ok(Value::Bool(!b)),
            None => Err(BrewinError::type_error(format!(
                "incompatible type for boolean negation: {}",
                operand.kind()
            ))),
        },

        (UnaryOp::Neg, _) => Err(BrewinError::type_error(format!(
            "incompatible type for arithmetic negation: {}",
            operand.kind()
        ))),
    }
}

/// Division rounding toward negative infinity. `None` on overflow.
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;

    if (a % b != 0) && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

fn ints(op: BinaryOp, left: &Value, right: &Value) -> Result<(i64, i64)> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok((*a, *b)),
        _ => Err(mismatch(op, left, right)),
    }
}

fn checked(op: BinaryOp, result: Option<i64>) -> Result<Value> {
    result
        .map(Value::Int)
        .ok_or_else(|| BrewinError::type_error(format!("integer overflow in '{}'", op.symbol())))
}

fn mismatch(op: BinaryOp, left: &Value, right: &Value) -> BrewinError {
    BrewinError::type_error(format!(
        "incompatible types for '{}': {} and {}",
        op.symbol(),
        left.kind(),
        right.kind()
    ))
}
