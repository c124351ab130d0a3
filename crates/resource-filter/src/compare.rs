//! Comparison predicates and the coercion rules they share.
//!
//! Every comparison is total: operands that are missing, unparseable or of
//! incompatible types make the comparison `false` instead of failing. The
//! one exception is equality, where a missing value equals the `null`
//! literal.

use crate::compile::{Predicate, ValueProvider};
use crate::resource::Resource;
use crate::types::ComparisonOperator;
use crate::value::{self, Value};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::cmp::Ordering;
use tracing::{debug, trace};

/// Builds the predicate for `lhs <operator> rhs`.
///
/// Two constant operands are folded into a constant predicate, a constant
/// `like` pattern is compiled once and negated operators wrap their positive
/// form.
pub fn comparison(operator: ComparisonOperator, lhs: ValueProvider, rhs: ValueProvider) -> Predicate {
    if let (Some(left), Some(right)) = (lhs.as_constant(), rhs.as_constant()) {
        let result = test(operator, left, right);
        trace!(operator = operator.as_str(), result, "folded constant comparison");
        return Predicate::always(result);
    }

    if let Some(positive) = operator.negated_of() {
        return comparison(positive, lhs, rhs).negate();
    }

    if let (ComparisonOperator::Like, Some(pattern)) = (operator, rhs.as_constant()) {
        let Some(regex) = full_match_regex(pattern) else {
            return Predicate::always(false);
        };
        return Predicate::new(move |resource: &dyn Resource| {
            let left = lhs.apply(resource);
            left.to_text().is_some_and(|text| regex.is_match(&text))
        });
    }

    Predicate::new(move |resource: &dyn Resource| {
        test(operator, &lhs.apply(resource), &rhs.apply(resource))
    })
}

/// Applies `operator` to two evaluated operands.
pub fn test(operator: ComparisonOperator, left: &Value, right: &Value) -> bool {
    match operator {
        ComparisonOperator::Equal => is_equal(left, right),
        ComparisonOperator::NotEqual => is_not_equal(left, right),
        ComparisonOperator::Less => compare_ordinal(left, right) == Some(Ordering::Less),
        ComparisonOperator::LessEqual => matches!(
            compare_ordinal(left, right),
            Some(Ordering::Less | Ordering::Equal)
        ),
        ComparisonOperator::Greater => compare_ordinal(left, right) == Some(Ordering::Greater),
        ComparisonOperator::GreaterEqual => matches!(
            compare_ordinal(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        ComparisonOperator::Like => like(left, right),
        ComparisonOperator::Contains => contains(left, right),
        ComparisonOperator::ContainsAny => contains_any(left, right),
        // Every left value appears on the right.
        ComparisonOperator::In => contains(right, left),
        ComparisonOperator::NotLike
        | ComparisonOperator::NotContains
        | ComparisonOperator::NotContainsAny
        | ComparisonOperator::NotIn => match operator.negated_of() {
            Some(positive) => !test(positive, left, right),
            None => false,
        },
    }
}

// ----------------------------------------------------------------- Equality

/// `==`: a missing value equals the `null` literal but never another missing
/// value; otherwise numbers compare numerically, instants by time and
/// everything else by string form.
pub fn is_equal(left: &Value, right: &Value) -> bool {
    if left.is_nullish() || right.is_nullish() {
        return left.is_nullish()
            && right.is_nullish()
            && (matches!(left, Value::Null) || matches!(right, Value::Null));
    }
    values_equal(left, right)
}

/// `!=`: false when a side is missing, true when exactly one side is the
/// `null` literal.
pub fn is_not_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Absent, _) | (_, Value::Absent) => false,
        (Value::Null, Value::Null) => false,
        (Value::Null, _) | (_, Value::Null) => true,
        _ => !values_equal(left, right),
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| is_equal(x, y))
        }
        (Value::List(_), _) | (_, Value::List(_)) => false,
        _ => {
            if let (Some(a), Some(b)) = (left.as_decimal(), right.as_decimal()) {
                return a == b;
            }
            if let (Some(a), Some(b)) = (left.as_instant(), right.as_instant()) {
                return a == b;
            }
            match (left.to_text(), right.to_text()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
    }
}

// ----------------------------------------------------------------- Ordering

/// A value normalized for ordering comparisons.
#[derive(Debug, Clone, PartialEq)]
enum Ordinal {
    Integer(i64),
    Number(BigDecimal),
    Instant(DateTime<Utc>),
}

fn ordinal(value: &Value) -> Option<Ordinal> {
    match value {
        Value::Integer(n) => Some(Ordinal::Integer(*n)),
        Value::Decimal(d) => Some(Ordinal::Number(d.clone())),
        Value::Instant(_) | Value::Calendar(_) => value.as_instant().map(Ordinal::Instant),
        Value::Text(text) => match value::parse_number(text) {
            Some(Value::Integer(n)) => Some(Ordinal::Integer(n)),
            Some(Value::Decimal(d)) => Some(Ordinal::Number(d)),
            _ => value::parse_instant(text).map(Ordinal::Instant),
        },
        _ => None,
    }
}

/// Orders two values of the same category (numbers or instants).
///
/// Text that parses as a number or an ISO date takes part as such. Any other
/// pairing has no order.
pub fn compare_ordinal(left: &Value, right: &Value) -> Option<Ordering> {
    match (ordinal(left)?, ordinal(right)?) {
        (Ordinal::Integer(a), Ordinal::Integer(b)) => Some(a.cmp(&b)),
        (Ordinal::Integer(a), Ordinal::Number(b)) => Some(BigDecimal::from(a).cmp(&b)),
        (Ordinal::Number(a), Ordinal::Integer(b)) => Some(a.cmp(&BigDecimal::from(b))),
        (Ordinal::Number(a), Ordinal::Number(b)) => Some(a.cmp(&b)),
        (Ordinal::Instant(a), Ordinal::Instant(b)) => Some(a.cmp(&b)),
        _ => None,
    }
}

// ----------------------------------------------------------------- Patterns

fn full_match_regex(pattern: &Value) -> Option<Regex> {
    let pattern = pattern.to_text()?;
    match Regex::new(&format!("^(?:{})$", pattern)) {
        Ok(regex) => Some(regex),
        Err(err) => {
            debug!(%pattern, error = %err, "invalid like pattern");
            None
        }
    }
}

/// `like`: the right side is a regular expression matching the whole left
/// side.
pub fn like(left: &Value, right: &Value) -> bool {
    let Some(text) = left.to_text() else {
        return false;
    };
    full_match_regex(right).is_some_and(|regex| regex.is_match(&text))
}

// ----------------------------------------------------------------- List operators

/// Adapts a value to a list of strings: lists element-wise, scalars as a
/// single element.
fn string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Absent | Value::Null => None,
        Value::List(items) => Some(
            items
                .iter()
                .filter_map(|item| item.to_text().map(|t| t.into_owned()))
                .collect(),
        ),
        other => other.to_text().map(|t| vec![t.into_owned()]),
    }
}

/// `contains`: every right value appears among the left values, and the
/// right side has no more values than the left.
pub fn contains(left: &Value, right: &Value) -> bool {
    match (string_list(left), string_list(right)) {
        (Some(haystack), Some(needles)) => {
            needles.len() <= haystack.len() && needles.iter().all(|n| haystack.contains(n))
        }
        _ => false,
    }
}

/// `contains any`: at least one right value appears among the left values.
pub fn contains_any(left: &Value, right: &Value) -> bool {
    match (string_list(left), string_list(right)) {
        (Some(haystack), Some(needles)) => needles.iter().any(|n| haystack.contains(n)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MemoryResource;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn decimal(text: &str) -> Value {
        Value::Decimal(BigDecimal::from_str(text).unwrap())
    }

    #[test]
    fn test_null_equivalence() {
        assert!(is_equal(&Value::Absent, &Value::Null));
        assert!(is_equal(&Value::Null, &Value::Absent));
        assert!(is_equal(&Value::Null, &Value::Null));
        assert!(!is_equal(&Value::Absent, &Value::Absent));
        assert!(!is_equal(&Value::Absent, &Value::from("x")));
        assert!(!is_equal(&Value::Null, &Value::from("null")));
    }

    #[test]
    fn test_not_equal_with_missing_values() {
        assert!(!is_not_equal(&Value::Absent, &Value::from("x")));
        assert!(!is_not_equal(&Value::Absent, &Value::Null));
        assert!(!is_not_equal(&Value::Null, &Value::Null));
        assert!(is_not_equal(&Value::from("x"), &Value::Null));
        assert!(is_not_equal(&Value::from("x"), &Value::from("y")));
        assert!(!is_not_equal(&Value::from("x"), &Value::from("x")));
    }

    #[test]
    fn test_numeric_equality_ignores_representation() {
        assert!(is_equal(&Value::Integer(5), &decimal("5")));
        assert!(is_equal(&Value::Integer(5), &decimal("5.00")));
        assert!(is_equal(&Value::Integer(5), &Value::from("5")));
        assert!(!is_equal(&Value::Integer(5), &decimal("5.1")));
    }

    #[test]
    fn test_instant_equality() {
        let utc = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let local = chrono::DateTime::parse_from_rfc3339("2020-01-01T02:00:00+02:00").unwrap();
        assert!(is_equal(&Value::Instant(utc), &Value::Calendar(local)));
        assert!(is_equal(&Value::Instant(utc), &Value::from("2020-01-01T00:00:00Z")));
    }

    #[test]
    fn test_ordering() {
        assert_eq!(compare_ordinal(&Value::Integer(30), &Value::Integer(18)), Some(Ordering::Greater));
        assert_eq!(compare_ordinal(&decimal("1.5"), &Value::Integer(2)), Some(Ordering::Less));
        assert_eq!(compare_ordinal(&Value::from("7"), &Value::Integer(7)), Some(Ordering::Equal));
        assert_eq!(compare_ordinal(&Value::from("abc"), &Value::Integer(5)), None);
        assert_eq!(compare_ordinal(&Value::Absent, &Value::Integer(5)), None);
        assert_eq!(compare_ordinal(&Value::Null, &Value::Null), None);
        let instant = Value::Instant(Utc.with_ymd_and_hms(2013, 8, 8, 0, 0, 0).unwrap());
        assert_eq!(compare_ordinal(&Value::from("2013-08-07T16:32"), &instant), Some(Ordering::Less));
        assert_eq!(compare_ordinal(&instant, &Value::Integer(5)), None);
    }

    #[test]
    fn test_like() {
        assert!(like(&Value::from("testpage1"), &Value::from("testpage.*")));
        assert!(!like(&Value::from("testpage10"), &Value::from("testpage[1-2]")));
        assert!(!like(&Value::from("xtestpage1"), &Value::from("testpage1")));
        assert!(!like(&Value::from("a"), &Value::from("(")));
        assert!(!like(&Value::Absent, &Value::from(".*")));
    }

    #[test]
    fn test_list_operators() {
        let tags = Value::from(vec!["fish", "bird"]);
        assert!(contains(&tags, &Value::from("fish")));
        assert!(contains(&tags, &Value::from(vec!["bird", "fish"])));
        assert!(!contains(&tags, &Value::from(vec!["fish", "cat"])));
        assert!(contains_any(&tags, &Value::from(vec!["fish", "cat"])));
        assert!(!contains_any(&tags, &Value::from("cat")));
        assert!(test(ComparisonOperator::In, &Value::from("fish"), &tags));
        assert!(!test(ComparisonOperator::In, &Value::from("cat"), &tags));
        assert!(test(ComparisonOperator::NotIn, &Value::from("fish"), &Value::Absent));
        assert!(!contains(&Value::Absent, &Value::from("fish")));
        assert!(!contains(&Value::from(vec!["a"]), &Value::from(vec!["a", "a"])));
        assert!(!test(ComparisonOperator::In, &Value::from(vec!["a", "a"]), &Value::from("a")));
        assert!(contains(&Value::from(vec!["a", "a"]), &Value::from("a")));
    }

    #[test]
    fn test_constant_folding_and_dynamic_operands() {
        let resource = MemoryResource::new("/r").with_property("title", "English");
        let folded = comparison(
            ComparisonOperator::Equal,
            ValueProvider::constant(1),
            ValueProvider::constant(decimal("1.0")),
        );
        assert!(folded.test(&resource));

        let title = ValueProvider::new(|r: &dyn Resource| crate::resource::property(r, "title"));
        let like = comparison(
            ComparisonOperator::Like,
            title.clone(),
            ValueProvider::constant("Eng.*"),
        );
        assert!(like.test(&resource));
        let not_like = comparison(ComparisonOperator::NotLike, title, ValueProvider::constant("("));
        assert!(not_like.test(&resource));
    }

    #[test]
    fn test_negated_operators_wrap_the_positive_form() {
        assert!(!Predicate::always(true).negate().test(&MemoryResource::new("/r")));

        let tagged = MemoryResource::new("/a").with_property("tags", vec!["fish", "bird"]);
        let untagged = MemoryResource::new("/b");
        let tags = ValueProvider::new(|r: &dyn Resource| crate::resource::property(r, "tags"));
        let lacks_fish = comparison(
            ComparisonOperator::NotContains,
            tags.clone(),
            ValueProvider::constant("fish"),
        );
        assert!(!lacks_fish.test(&tagged));
        assert!(lacks_fish.test(&untagged));

        let not_like = comparison(ComparisonOperator::NotLike, tags, ValueProvider::constant("("));
        assert!(not_like.test(&tagged));
        assert!(not_like.test(&untagged));
    }
}
