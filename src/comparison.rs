use std::cmp::Ordering;

use crate::expression::{Expression, OperatorKind};

/// Decides whether `expr` holds for the current value of its target field.
///
/// `target_value` is `None` when the target field is empty (or when the
/// expression has no target at all).
pub fn is_satisfied(expr: &Expression, target_value: Option<&str>) -> bool {
    let Some(op) = expr.operator() else {
        // Unconditional, or the bare-name shorthand: mandatory while the
        // target is empty.
        return expr.target().is_none() || target_value.is_none();
    };
    let literal = expr.literal();

    match op {
        OperatorKind::Equal => literal_matches(literal, target_value),
        OperatorKind::NotEqual => !literal_matches(literal, target_value),
        OperatorKind::GreaterThan => cmp_values(target_value, literal, |o| o.is_gt()),
        OperatorKind::GreaterOrEqual => cmp_values(target_value, literal, |o| o.is_ge()),
        OperatorKind::LessThan => cmp_values(target_value, literal, |o| o.is_lt()),
        OperatorKind::LessOrEqual => cmp_values(target_value, literal, |o| o.is_le()),
    }
}

fn literal_matches(literal: Option<&str>, value: Option<&str>) -> bool {
    match (literal, value) {
        (None, None) => true,
        (Some(l), Some(v)) => l == v,
        _ => false,
    }
}

/// Orders `value` against `literal` and feeds the result to `pred_on_ord`.
///
/// Both sides are compared as numbers when both parse as `f64`, otherwise
/// by code point. A missing side, or a NaN, is never satisfied.
pub fn cmp_values<F>(value: Option<&str>, literal: Option<&str>, pred_on_ord: F) -> bool
where
    F: Fn(Ordering) -> bool,
{
    let (Some(value), Some(literal)) = (value, literal) else {
        return false;
    };
    let ord = match (value.trim().parse::<f64>(), literal.trim().parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b),
        _ => Some(value.cmp(literal)),
    };
    ord.map(pred_on_ord).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::parse_expression;

    fn holds(raw: &str, value: Option<&str>) -> bool {
        is_satisfied(&parse_expression(raw).unwrap(), value)
    }

    #[test]
    fn unconditional_always_holds() {
        assert!(holds("", None));
        assert!(holds("", Some("x")));
    }

    #[test]
    fn presence_shorthand_holds_while_target_empty() {
        assert!(holds("Other", None));
        assert!(!holds("Other", Some("filled")));
    }

    #[test]
    fn equal_and_not_equal() {
        assert!(holds("T=User", Some("User")));
        assert!(!holds("T=User", Some("Robot")));
        assert!(!holds("T=User", None));
        assert!(holds("T=", None));
        assert!(!holds("T=", Some("Robot")));

        assert!(holds("T!=User", Some("Robot")));
        assert!(holds("T!=User", None));
        assert!(!holds("T!=User", Some("User")));
        assert!(holds("T!=", Some("User")));
        assert!(!holds("T!=", None));
    }

    #[test]
    fn numeric_ordering() {
        assert!(!holds("D > 10", Some("0")));
        assert!(holds("D < 10", Some("0")));
        assert!(holds("D >= 10", Some("10.0")));
        assert!(holds("D <= -1", Some("-2")));
        // numerically 9 < 10 even though "9" > "10" by code point
        assert!(holds("D < 10", Some("9")));
    }

    #[test]
    fn lexical_fallback_when_either_side_is_not_numeric() {
        assert!(holds("D > apple", Some("banana")));
        assert!(!holds("D < apple", Some("banana")));
        assert!(holds("D > 10", Some("abc")));
    }

    #[test]
    fn ordering_needs_both_sides() {
        assert!(!holds("D > 10", None));
        assert!(!holds("D >", Some("3")));
        assert!(!holds("D <=", None));
    }

    #[test]
    fn nan_is_not_ordered() {
        assert!(!holds("D > 1", Some("NaN")));
        assert!(!holds("D <= 1", Some("NaN")));
    }
}
