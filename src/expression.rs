// src/expression.rs
use serde::Serialize;
use std::fmt;

use crate::errors::{Result, RuleError};
use crate::parser::Scanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
}

/// Operator tokens in match order: two-char tokens come before their
/// one-char prefixes.
const OPERATORS: [(&str, OperatorKind); 6] = [
    ("!=", OperatorKind::NotEqual),
    (">=", OperatorKind::GreaterOrEqual),
    ("<=", OperatorKind::LessOrEqual),
    ("=", OperatorKind::Equal),
    (">", OperatorKind::GreaterThan),
    ("<", OperatorKind::LessThan),
];

impl OperatorKind {
    pub fn token(self) -> &'static str {
        match self {
            OperatorKind::Equal => "=",
            OperatorKind::NotEqual => "!=",
            OperatorKind::GreaterThan => ">",
            OperatorKind::GreaterOrEqual => ">=",
            OperatorKind::LessThan => "<",
            OperatorKind::LessOrEqual => "<=",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        OPERATORS
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, op)| *op)
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A compiled mandatory condition.
///
/// * no target: the field is always mandatory
/// * target, no operator: mandatory while the target is empty
/// * target and operator: mandatory while `target <op> literal` holds
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Expression {
    target: Option<String>,
    operator: Option<OperatorKind>,
    literal: Option<String>,
}

impl Expression {
    pub fn unconditional() -> Self {
        Self::default()
    }

    pub fn presence(target: &str) -> Self {
        Self {
            target: Some(target.to_string()),
            ..Self::default()
        }
    }

    pub fn comparison(target: &str, operator: OperatorKind, literal: Option<&str>) -> Self {
        Self {
            target: Some(target.to_string()),
            operator: Some(operator),
            literal: literal.map(str::to_string),
        }
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn operator(&self) -> Option<OperatorKind> {
        self.operator
    }

    pub fn literal(&self) -> Option<&str> {
        self.literal.as_deref()
    }

    pub fn is_unconditional(&self) -> bool {
        self.target.is_none()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(target) = &self.target {
            f.write_str(target)?;
        }
        if let Some(op) = self.operator {
            f.write_str(op.token())?;
        }
        if let Some(literal) = &self.literal {
            f.write_str(literal)?;
        }
        Ok(())
    }
}

/// Parses a keyword argument such as `User Type = User` or `Distance>10`.
///
/// The input is scanned once, left to right; the first position where any
/// operator token starts splits it into target and literal. Blank input, or
/// an operator with nothing before it, is the unconditional expression.
pub fn parse_expression(raw: &str) -> Result<Expression> {
    if raw.trim().is_empty() {
        return Ok(Expression::unconditional());
    }

    let tokens: Vec<&str> = OPERATORS.iter().map(|(t, _)| *t).collect();
    let mut sc = Scanner::new(raw);
    while !sc.eof() {
        let at = sc.pos();
        if let Some(token) = sc.peek_any(&tokens) {
            sc.consume_str(token);
            let target = sc.slice(0, at).trim();
            if target.is_empty() {
                // nothing to compare against: plain mandatory
                return Ok(Expression::unconditional());
            }
            let Some(op) = OperatorKind::from_token(token) else {
                return Err(RuleError::malformed(raw, format!("unknown operator `{token}`")));
            };
            let literal = sc.rest().trim();
            let literal = (!literal.is_empty()).then_some(literal);
            return Ok(Expression::comparison(target, op, literal));
        }
        sc.bump();
    }

    Ok(Expression::presence(raw.trim()))
}

/// Absent arguments compile like blank ones.
pub fn parse_optional(raw: Option<&str>) -> Result<Expression> {
    parse_expression(raw.unwrap_or_default())
}
