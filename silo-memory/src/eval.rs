use silo::{Error, Result, Value};
use sqlparser::ast as sql_ast;
use std::{cmp::Ordering, collections::HashMap};

/// The subset of SQL expressions the engine evaluates, detached from the
/// parser's AST. Placeholders carry the zero-based index they resolve to in
/// the bound parameter list.
#[derive(Clone, Debug)]
pub(crate) enum Expr {
    Literal(Value),
    Column(String),
    Placeholder(usize),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum UnaryOp {
    Neg,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

/// Lowers a parsed expression, numbering `?` placeholders left to right.
/// The counter is shared across every expression of one statement so the
/// numbering follows the statement text.
pub(crate) fn convert(expr: &sql_ast::Expr, placeholders: &mut usize) -> Result<Expr> {
    Ok(match expr {
        sql_ast::Expr::Identifier(ident) => Expr::Column(ident.value.clone()),
        sql_ast::Expr::CompoundIdentifier(parts) => Expr::Column(
            parts
                .last()
                .map(|ident| ident.value.clone())
                .unwrap_or_default(),
        ),
        sql_ast::Expr::Value(value) => match &value.value {
            sql_ast::Value::Placeholder(_) => {
                let index = *placeholders;
                *placeholders += 1;
                Expr::Placeholder(index)
            }
            value => Expr::Literal(literal(value)?),
        },
        sql_ast::Expr::BinaryOp { left, op, right } => {
            let lhs = Box::new(convert(left, placeholders)?);
            let rhs = Box::new(convert(right, placeholders)?);
            Expr::Binary {
                op: binary_operator(op)?,
                lhs,
                rhs,
            }
        }
        sql_ast::Expr::UnaryOp { op, expr } => {
            let expr = Box::new(convert(expr, placeholders)?);
            match op {
                sql_ast::UnaryOperator::Plus => *expr,
                sql_ast::UnaryOperator::Minus => Expr::Unary {
                    op: UnaryOp::Neg,
                    expr,
                },
                sql_ast::UnaryOperator::Not => Expr::Unary {
                    op: UnaryOp::Not,
                    expr,
                },
                op => return Err(Error::msg(format!("Unsupported operator `{op}`"))),
            }
        }
        sql_ast::Expr::IsNull(expr) => Expr::IsNull {
            expr: Box::new(convert(expr, placeholders)?),
            negated: false,
        },
        sql_ast::Expr::IsNotNull(expr) => Expr::IsNull {
            expr: Box::new(convert(expr, placeholders)?),
            negated: true,
        },
        sql_ast::Expr::Nested(expr) => convert(expr, placeholders)?,
        expr => return Err(Error::msg(format!("Unsupported expression `{expr}`"))),
    })
}

fn binary_operator(op: &sql_ast::BinaryOperator) -> Result<BinaryOp> {
    Ok(match op {
        sql_ast::BinaryOperator::Eq => BinaryOp::Eq,
        sql_ast::BinaryOperator::NotEq => BinaryOp::NotEq,
        sql_ast::BinaryOperator::Lt => BinaryOp::Lt,
        sql_ast::BinaryOperator::LtEq => BinaryOp::LtEq,
        sql_ast::BinaryOperator::Gt => BinaryOp::Gt,
        sql_ast::BinaryOperator::GtEq => BinaryOp::GtEq,
        sql_ast::BinaryOperator::And => BinaryOp::And,
        sql_ast::BinaryOperator::Or => BinaryOp::Or,
        op => return Err(Error::msg(format!("Unsupported operator `{op}`"))),
    })
}

fn literal(value: &sql_ast::Value) -> Result<Value> {
    Ok(match value {
        sql_ast::Value::Number(number, _) => {
            let error = || Error::msg(format!("Cannot parse the number `{number}`"));
            if number.contains(['.', 'e', 'E']) {
                Value::Float(number.parse().map_err(|_| error())?)
            } else {
                Value::Integer(number.parse().map_err(|_| error())?)
            }
        }
        sql_ast::Value::SingleQuotedString(text) | sql_ast::Value::DoubleQuotedString(text) => {
            Value::Text(text.clone())
        }
        sql_ast::Value::Boolean(value) => Value::Boolean(*value),
        sql_ast::Value::Null => Value::Null,
        value => return Err(Error::msg(format!("Unsupported literal `{value}`"))),
    })
}

/// Evaluates an expression against an optional row context. Column
/// references resolve to `Null` when the row lacks the column and fail when
/// there is no row at all (as in a VALUES list).
pub(crate) fn evaluate(
    expr: &Expr,
    row: Option<&HashMap<String, Value>>,
    params: &[Value],
) -> Result<Value> {
    Ok(match expr {
        Expr::Literal(value) => value.clone(),
        Expr::Column(name) => {
            let Some(row) = row else {
                return Err(Error::msg(format!(
                    "Column `{name}` cannot be referenced here"
                )));
            };
            row.get(name).cloned().unwrap_or(Value::Null)
        }
        Expr::Placeholder(index) => params.get(*index).cloned().ok_or_else(|| {
            Error::msg(format!(
                "Statement expects at least {} parameters, {} were bound",
                index + 1,
                params.len()
            ))
        })?,
        Expr::Unary {
            op: UnaryOp::Neg,
            expr,
        } => match evaluate(expr, row, params)? {
            Value::Integer(value) => Value::Integer(-value),
            Value::Float(value) => Value::Float(-value),
            value => return Err(Error::msg(format!("Cannot negate {value:?}"))),
        },
        Expr::Unary {
            op: UnaryOp::Not,
            expr,
        } => Value::Boolean(!truthy(&evaluate(expr, row, params)?)),
        Expr::Binary {
            op: BinaryOp::And,
            lhs,
            rhs,
        } => {
            if truthy(&evaluate(lhs, row, params)?) {
                Value::Boolean(truthy(&evaluate(rhs, row, params)?))
            } else {
                Value::Boolean(false)
            }
        }
        Expr::Binary {
            op: BinaryOp::Or,
            lhs,
            rhs,
        } => {
            if truthy(&evaluate(lhs, row, params)?) {
                Value::Boolean(true)
            } else {
                Value::Boolean(truthy(&evaluate(rhs, row, params)?))
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = evaluate(lhs, row, params)?;
            let rhs = evaluate(rhs, row, params)?;
            // SQL comparisons against NULL never hold.
            if lhs.is_null() || rhs.is_null() {
                return Ok(Value::Boolean(false));
            }
            Value::Boolean(match op {
                BinaryOp::Eq => value_eq(&lhs, &rhs),
                BinaryOp::NotEq => !value_eq(&lhs, &rhs),
                BinaryOp::Lt => compare(&lhs, &rhs).is_lt(),
                BinaryOp::LtEq => compare(&lhs, &rhs).is_le(),
                BinaryOp::Gt => compare(&lhs, &rhs).is_gt(),
                BinaryOp::GtEq => compare(&lhs, &rhs).is_ge(),
                _ => unreachable!(),
            })
        }
        Expr::IsNull { expr, negated } => {
            Value::Boolean(evaluate(expr, row, params)?.is_null() != *negated)
        }
    })
}

pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Text(_) => false,
        Value::Boolean(value) => *value,
        Value::Integer(value) => *value != 0,
        Value::Float(value) => *value != 0.0,
    }
}

/// Equality with numeric affinity: integers, floats and booleans compare by
/// numeric value, matching how engines without a boolean type store `1`/`0`.
/// Two integers compare exactly; the f64 lane is only for mixed operands,
/// so keys beyond 2^53 never collapse onto each other.
pub(crate) fn value_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Null, Value::Null) => true,
        (Value::Text(lhs), Value::Text(rhs)) => lhs == rhs,
        (Value::Integer(lhs), Value::Integer(rhs)) => lhs == rhs,
        (lhs, rhs) => match (numeric(lhs), numeric(rhs)) {
            (Some(lhs), Some(rhs)) => lhs == rhs,
            _ => false,
        },
    }
}

/// Total order used by ORDER BY: NULL first, then numerics, then text.
pub(crate) fn compare(lhs: &Value, rhs: &Value) -> Ordering {
    match (lhs, rhs) {
        (Value::Text(lhs), Value::Text(rhs)) => lhs.cmp(rhs),
        (Value::Integer(lhs), Value::Integer(rhs)) => lhs.cmp(rhs),
        (lhs, rhs) => match (numeric(lhs), numeric(rhs)) {
            (Some(lhs), Some(rhs)) => lhs.total_cmp(&rhs),
            _ => rank(lhs).cmp(&rank(rhs)),
        },
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Boolean(value) => Some(*value as u8 as f64),
        Value::Integer(value) => Some(*value as f64),
        Value::Float(value) => Some(*value),
        _ => None,
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Boolean(_) | Value::Integer(_) | Value::Float(_) => 1,
        Value::Text(_) => 2,
    }
}
