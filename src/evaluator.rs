use std::ops::Range;

use tracing::trace;

use crate::{
    error::CalcError,
    lexer::{LexMode, Op},
    parser::{Expression, Parser},
};

/// Evaluates a keypad expression with `*` and `/` taking precedence over
/// `+` and `-`, all operators left-associative.
///
/// The empty string evaluates to `0`.
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    evaluate_with(expression, LexMode::Permissive)
}

pub fn evaluate_with(expression: &str, mode: LexMode) -> Result<f64, CalcError> {
    if expression.is_empty() {
        return Ok(0.0);
    }

    let parsed = Parser::with_mode(expression, mode).parse()?;
    trace!(%parsed, "parsed expression");

    let (head, additive) = reduce_multiplicative(expression, parsed)?;
    let result = reduce_additive(head, &additive);

    trace!(expression, result, "evaluated");
    Ok(result)
}

/// First pass: folds every `*`/`/` into the operand on its left, leaving a
/// head value followed by `+`/`-` pairs only.
fn reduce_multiplicative(
    source: &str,
    expr: Expression,
) -> Result<(f64, Vec<(Op, f64)>), CalcError> {
    let mut head = expr.first.value;
    let mut additive: Vec<(Op, f64)> = Vec::with_capacity(expr.rest.len());

    for (op, operand) in expr.rest {
        if op.is_multiplicative() {
            let left = match additive.last_mut() {
                Some((_, last)) => last,
                None => &mut head,
            };
            *left = apply_multiplicative(op, *left, operand.value)
                .ok_or_else(|| division_by_zero(source, operand.span))?;
        } else {
            additive.push((op, operand.value));
        }
    }

    Ok((head, additive))
}

/// Second pass: left-to-right sum of the multiplicative results.
fn reduce_additive(head: f64, rest: &[(Op, f64)]) -> f64 {
    rest.iter().fold(head, |acc, &(op, n)| match op {
        Op::Minus => minus(acc, n),
        _ => add(acc, n),
    })
}

fn apply_multiplicative(op: Op, a: f64, b: f64) -> Option<f64> {
    match op {
        Op::Star => Some(mult(a, b)),
        _ => div(a, b),
    }
}

fn division_by_zero(source: &str, span: Range<usize>) -> CalcError {
    CalcError::DivisionByZero {
        src: source.to_string(),
        span: span.into(),
    }
}

fn add(a: f64, b: f64) -> f64 {
    a + b
}

fn minus(a: f64, b: f64) -> f64 {
    a - b
}

fn mult(a: f64, b: f64) -> f64 {
    a * b
}

fn div(a: f64, b: f64) -> Option<f64> {
    if b == 0.0 {
        None
    } else {
        Some(a / b)
    }
}
