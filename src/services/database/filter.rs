// Row filter for tabular sources
//
// The WHERE text is parsed with sqlparser and lowered to a predicate tree
// whose identifiers are already bound to column positions, so an unknown
// column is reported before any row is looked at.
//
// Supported: comparisons (= == != <> < <= > >=), AND, OR, NOT, parentheses,
// [NOT] BETWEEN, [NOT] LIKE / ILIKE and IS [NOT] NULL.

use crate::services::database::adapter::ExecutionError;
use regex::Regex;
use serde_json::Value;
use sqlparser::ast::{self, BinaryOperator, Expr, UnaryOperator};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn from_sql(op: &BinaryOperator) -> Option<Self> {
        match op {
            BinaryOperator::Eq => Some(CmpOp::Eq),
            BinaryOperator::NotEq => Some(CmpOp::Ne),
            BinaryOperator::Lt => Some(CmpOp::Lt),
            BinaryOperator::LtEq => Some(CmpOp::Le),
            BinaryOperator::Gt => Some(CmpOp::Gt),
            BinaryOperator::GtEq => Some(CmpOp::Ge),
            _ => None,
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            CmpOp::Eq => ordering == Ordering::Equal,
            CmpOp::Ne => ordering != Ordering::Equal,
            CmpOp::Lt => ordering == Ordering::Less,
            CmpOp::Le => ordering != Ordering::Greater,
            CmpOp::Gt => ordering == Ordering::Greater,
            CmpOp::Ge => ordering != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Column(usize),
    Literal(Value),
}

impl Operand {
    fn value<'r>(&'r self, row: &'r [Value]) -> &'r Value {
        match self {
            Operand::Column(idx) => row.get(*idx).unwrap_or(&Value::Null),
            Operand::Literal(v) => v,
        }
    }
}

#[derive(Debug)]
enum Predicate {
    Compare(Operand, CmpOp, Operand),
    Between {
        operand: Operand,
        low: Operand,
        high: Operand,
        negated: bool,
    },
    Like {
        operand: Operand,
        pattern: Regex,
        negated: bool,
    },
    IsNull {
        operand: Operand,
        negated: bool,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    fn eval(&self, row: &[Value]) -> bool {
        match self {
            Predicate::Compare(left, op, right) => {
                let (l, r) = (left.value(row), right.value(row));
                match compare(l, r) {
                    Some(ordering) => op.holds(ordering),
                    // Values of unrelated types are never equal
                    None => *op == CmpOp::Ne && !l.is_null() && !r.is_null(),
                }
            }
            Predicate::Between {
                operand,
                low,
                high,
                negated,
            } => {
                let v = operand.value(row);
                match (compare(v, low.value(row)), compare(v, high.value(row))) {
                    (Some(lo), Some(hi)) => {
                        let inside = lo != Ordering::Less && hi != Ordering::Greater;
                        inside != *negated
                    }
                    _ => false,
                }
            }
            Predicate::Like {
                operand,
                pattern,
                negated,
            } => match text_of(operand.value(row)) {
                Some(text) => pattern.is_match(&text) != *negated,
                None => false,
            },
            Predicate::IsNull { operand, negated } => operand.value(row).is_null() != *negated,
            Predicate::And(a, b) => a.eval(row) && b.eval(row),
            Predicate::Or(a, b) => a.eval(row) || b.eval(row),
            Predicate::Not(inner) => !inner.eval(row),
        }
    }
}

/// Compiled WHERE predicate bound to a column layout
#[derive(Debug)]
pub struct RowFilter {
    predicate: Predicate,
}

impl RowFilter {
    /// Parse `expression` against `columns`.
    ///
    /// Column names match exactly first, then case-insensitively.
    pub fn compile<S: AsRef<str>>(expression: &str, columns: &[S]) -> Result<Self, ExecutionError> {
        let expr = parse_expression(expression)?;
        let binder = Binder { columns };
        Ok(Self {
            predicate: binder.predicate(&expr)?,
        })
    }

    pub fn matches(&self, row: &[Value]) -> bool {
        self.predicate.eval(row)
    }
}

fn filter_error(err: impl std::fmt::Display) -> ExecutionError {
    ExecutionError::Filter(err.to_string())
}

/// Parse a single SQL expression, rejecting trailing input
fn parse_expression(text: &str) -> Result<Expr, ExecutionError> {
    let dialect = SQLiteDialect {};
    let mut parser = Parser::new(&dialect).try_with_sql(text).map_err(filter_error)?;
    let expr = parser.parse_expr().map_err(filter_error)?;

    let next = parser.peek_token();
    if next.token != Token::EOF {
        return Err(ExecutionError::Filter(format!(
            "unexpected '{}' in filter expression",
            next.token
        )));
    }

    Ok(expr)
}

/// Order two cell values. `None` when either is null or the types are unrelated.
///
/// Numeric strings compare numerically against numbers.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::Number(a), Value::String(b)) => a.as_f64()?.partial_cmp(&b.trim().parse::<f64>().ok()?),
        (Value::String(a), Value::Number(b)) => a.trim().parse::<f64>().ok()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// SQL LIKE pattern as an anchored, case-insensitive regex
fn like_regex(pattern: &str) -> Result<Regex, ExecutionError> {
    let mut re = String::from("(?is)^");
    for ch in pattern.chars() {
        match ch {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|e| ExecutionError::Filter(format!("invalid LIKE pattern: {}", e)))
}

fn number(literal: &str) -> Result<Value, ExecutionError> {
    if let Ok(v) = literal.parse::<i64>() {
        return Ok(Value::from(v));
    }
    literal
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| ExecutionError::Filter(format!("invalid number '{}'", literal)))
}

/// Lowers a parsed expression onto one column layout
struct Binder<'c, S> {
    columns: &'c [S],
}

impl<S: AsRef<str>> Binder<'_, S> {
    fn predicate(&self, expr: &Expr) -> Result<Predicate, ExecutionError> {
        match expr {
            Expr::Nested(inner) => self.predicate(inner),
            Expr::BinaryOp { left, op, right } => match op {
                BinaryOperator::And => Ok(Predicate::And(
                    Box::new(self.predicate(left)?),
                    Box::new(self.predicate(right)?),
                )),
                BinaryOperator::Or => Ok(Predicate::Or(
                    Box::new(self.predicate(left)?),
                    Box::new(self.predicate(right)?),
                )),
                other => {
                    let cmp = CmpOp::from_sql(other).ok_or_else(|| {
                        ExecutionError::Filter(format!("unsupported operator '{}'", other))
                    })?;
                    Ok(Predicate::Compare(self.operand(left)?, cmp, self.operand(right)?))
                }
            },
            Expr::UnaryOp {
                op: UnaryOperator::Not,
                expr,
            } => Ok(Predicate::Not(Box::new(self.predicate(expr)?))),
            Expr::Between {
                expr,
                negated,
                low,
                high,
            } => Ok(Predicate::Between {
                operand: self.operand(expr)?,
                low: self.operand(low)?,
                high: self.operand(high)?,
                negated: *negated,
            }),
            Expr::Like {
                negated,
                expr,
                pattern,
                ..
            }
            | Expr::ILike {
                negated,
                expr,
                pattern,
                ..
            } => Ok(Predicate::Like {
                operand: self.operand(expr)?,
                pattern: self.like_pattern(pattern)?,
                negated: *negated,
            }),
            Expr::IsNull(expr) => Ok(Predicate::IsNull {
                operand: self.operand(expr)?,
                negated: false,
            }),
            Expr::IsNotNull(expr) => Ok(Predicate::IsNull {
                operand: self.operand(expr)?,
                negated: true,
            }),
            other => Err(ExecutionError::Filter(format!(
                "'{}' is not a condition",
                other
            ))),
        }
    }

    fn like_pattern(&self, pattern: &Expr) -> Result<Regex, ExecutionError> {
        match pattern {
            Expr::Value(v) => match &v.value {
                ast::Value::SingleQuotedString(s) | ast::Value::DoubleQuotedString(s) => like_regex(s),
                _ => Err(ExecutionError::Filter("LIKE requires a string pattern".to_string())),
            },
            Expr::Identifier(ident) if ident.quote_style == Some('"') => like_regex(&ident.value),
            _ => Err(ExecutionError::Filter("LIKE requires a string pattern".to_string())),
        }
    }

    fn operand(&self, expr: &Expr) -> Result<Operand, ExecutionError> {
        match expr {
            Expr::Nested(inner) => self.operand(inner),
            Expr::Identifier(ident) => match self.bind(&ident.value) {
                Ok(idx) => Ok(Operand::Column(idx)),
                // SQLite reads a double-quoted name that is no column as a string
                Err(_) if ident.quote_style == Some('"') => {
                    Ok(Operand::Literal(Value::String(ident.value.clone())))
                }
                Err(e) => Err(e),
            },
            Expr::CompoundIdentifier(parts) => match parts.last() {
                Some(ident) => self.bind(&ident.value).map(Operand::Column),
                None => Err(ExecutionError::Filter("empty identifier".to_string())),
            },
            Expr::Value(v) => literal(&v.value).map(Operand::Literal),
            Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr,
            } => match expr.as_ref() {
                Expr::Value(v) => match &v.value {
                    ast::Value::Number(n, _) => number(&format!("-{}", n)).map(Operand::Literal),
                    _ => Err(ExecutionError::Filter(format!("cannot negate '{}'", v))),
                },
                other => Err(ExecutionError::Filter(format!("cannot negate '{}'", other))),
            },
            other => Err(ExecutionError::Filter(format!(
                "expected a column or literal, found '{}'",
                other
            ))),
        }
    }

    fn bind(&self, name: &str) -> Result<usize, ExecutionError> {
        let names = || self.columns.iter().map(AsRef::as_ref);
        names()
            .position(|col| col == name)
            .or_else(|| names().position(|col| col.eq_ignore_ascii_case(name)))
            .ok_or_else(|| ExecutionError::Filter(format!("unknown column '{}'", name)))
    }
}

fn literal(value: &ast::Value) -> Result<Value, ExecutionError> {
    match value {
        ast::Value::Number(n, _) => number(n),
        ast::Value::SingleQuotedString(s) | ast::Value::DoubleQuotedString(s) => {
            Ok(Value::String(s.clone()))
        }
        ast::Value::Boolean(b) => Ok(Value::Bool(*b)),
        ast::Value::Null => Ok(Value::Null),
        other => Err(ExecutionError::Filter(format!("unsupported literal {}", other))),
    }
}
