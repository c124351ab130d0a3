use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use std::borrow::Cow;
use std::str::FromStr;

/// A dynamically typed value, either stored on a resource or produced by a
/// compiled value provider.
///
/// `Absent` and `Null` are separate: `Absent` means "no value"
/// (missing property, unparseable literal, unknown function) while `Null` is
/// the `null` literal written in a filter. They only meet in equality
/// comparisons.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value.
    Absent,
    /// The `null` literal.
    Null,
    Integer(i64),
    Decimal(BigDecimal),
    Text(String),
    Boolean(bool),
    /// A point in time, normalized to UTC.
    Instant(DateTime<Utc>),
    /// A calendar value as stored on a resource, keeping its offset.
    Calendar(DateTime<FixedOffset>),
    /// Multi-valued property.
    List(Vec<Value>),
}

impl Value {
    /// True for `Absent` and `Null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Absent | Value::Null)
    }

    /// The string form used by equality, `like` and the list operators.
    ///
    /// Returns `None` for `Absent`, `Null` and lists.
    pub fn to_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Absent | Value::Null | Value::List(_) => None,
            Value::Text(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Integer(n) => Some(Cow::Owned(n.to_string())),
            Value::Decimal(d) => Some(Cow::Owned(d.to_string())),
            Value::Boolean(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Value::Instant(instant) => Some(Cow::Owned(format_instant(instant))),
            Value::Calendar(calendar) => {
                Some(Cow::Owned(format_instant(&calendar.with_timezone(&Utc))))
            }
        }
    }

    /// Numeric view of integer and decimal values.
    pub fn as_decimal(&self) -> Option<BigDecimal> {
        match self {
            Value::Integer(n) => Some(BigDecimal::from(*n)),
            Value::Decimal(d) => Some(d.clone()),
            _ => None,
        }
    }

    /// Instant view of instant and calendar values.
    pub fn as_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Instant(instant) => Some(*instant),
            Value::Calendar(calendar) => Some(calendar.with_timezone(&Utc)),
            _ => None,
        }
    }

    /// Normalizes a stored property value for comparison: booleans become
    /// their string form, calendars become instants. Applied element-wise to
    /// lists.
    pub fn normalized(self) -> Value {
        match self {
            Value::Boolean(b) => Value::Text(b.to_string()),
            Value::Calendar(calendar) => Value::Instant(calendar.with_timezone(&Utc)),
            Value::List(items) => Value::List(items.into_iter().map(Value::normalized).collect()),
            other => other,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        // NaN and the infinities have no decimal representation.
        BigDecimal::from_str(&n.to_string())
            .map(Value::Decimal)
            .unwrap_or(Value::Absent)
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(instant: DateTime<Utc>) -> Self {
        Value::Instant(instant)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(calendar: DateTime<FixedOffset>) -> Self {
        Value::Calendar(calendar)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Absent)
    }
}

/// JSON conversion: `null` maps to [`Value::Null`], arrays to lists and
/// objects (which are never property values) to [`Value::Absent`].
impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => BigDecimal::from_str(&n.to_string())
                    .map(Value::Decimal)
                    .unwrap_or(Value::Absent),
            },
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from).collect()),
            serde_json::Value::Object(_) => Value::Absent,
        }
    }
}

// ----------------------------------------------------------------- Parsing helpers

/// Parses a numeric lexeme: 64-bit integer first, arbitrary-precision
/// decimal second.
pub fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::Integer(n));
    }
    BigDecimal::from_str(text).ok().map(Value::Decimal)
}

/// Parses an ISO-8601 date-time with offset (`2013-08-08T16:32:59.000+02:00`).
pub fn parse_offset_date_time(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    // Minutes precision, `Z` or `±hh:mm`.
    let text = match text.strip_suffix(['Z', 'z']) {
        Some(local) => format!("{}+00:00", local),
        None => text.to_string(),
    };
    DateTime::<FixedOffset>::parse_from_str(&text, "%Y-%m-%dT%H:%M%:z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parses an ISO-8601 local date-time, interpreted as UTC.
pub fn parse_local_date_time(text: &str) -> Option<DateTime<Utc>> {
    text.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parses an ISO-8601 date as the start of that day in UTC.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let date = text.parse::<NaiveDate>().ok()?;
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Tries offset date-time, local date-time and date, in that order.
pub fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    parse_offset_date_time(text)
        .or_else(|| parse_local_date_time(text))
        .or_else(|| parse_date(text))
}

/// RFC 3339 in UTC with a `Z` suffix; fractional seconds only when present.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_number_prefers_integer() {
        assert_eq!(parse_number("42"), Some(Value::Integer(42)));
        assert_eq!(parse_number("-7"), Some(Value::Integer(-7)));
        assert_eq!(
            parse_number("1.50"),
            Some(Value::Decimal(BigDecimal::from_str("1.50").unwrap()))
        );
        assert_eq!(
            parse_number("99999999999999999999"),
            Some(Value::Decimal(BigDecimal::from_str("99999999999999999999").unwrap()))
        );
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_parse_instant_variants() {
        let day = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2020-01-01"), Some(day));
        assert_eq!(parse_local_date_time("2020-01-01T00:00:00"), Some(day));
        assert_eq!(parse_local_date_time("2020-01-01T00:00"), Some(day));
        assert_eq!(parse_offset_date_time("2020-01-01T02:00:00+02:00"), Some(day));
        assert_eq!(parse_offset_date_time("2020-01-01T00:00:00Z"), Some(day));
        assert_eq!(parse_offset_date_time("2020-01-01T01:00+01:00"), Some(day));
        assert_eq!(parse_offset_date_time("2020-01-01T00:00Z"), Some(day));
        assert_eq!(parse_instant("2020-01-01"), Some(day));
        assert_eq!(parse_instant("2020-13-01"), None);
        assert_eq!(parse_instant("yesterday"), None);
    }

    #[test]
    fn test_text_forms() {
        assert_eq!(Value::Boolean(true).to_text().as_deref(), Some("true"));
        assert_eq!(Value::Integer(5).to_text().as_deref(), Some("5"));
        let instant = Utc.with_ymd_and_hms(2013, 8, 8, 14, 32, 59).unwrap();
        assert_eq!(
            Value::Instant(instant).to_text().as_deref(),
            Some("2013-08-08T14:32:59Z")
        );
        assert_eq!(Value::Null.to_text(), None);
        assert_eq!(Value::Absent.to_text(), None);
    }

    #[test]
    fn test_normalized() {
        let calendar = DateTime::parse_from_rfc3339("2013-08-08T16:32:59+02:00").unwrap();
        assert_eq!(Value::Boolean(false).normalized(), Value::Text("false".into()));
        assert_eq!(
            Value::Calendar(calendar).normalized(),
            Value::Instant(calendar.with_timezone(&Utc))
        );
        assert_eq!(
            Value::from(vec![true, false]).normalized(),
            Value::List(vec![Value::from("true"), Value::from("false")])
        );
    }

    #[test]
    fn test_from_json() {
        assert_eq!(Value::from(&json!(3)), Value::Integer(3));
        assert_eq!(Value::from(&json!(true)), Value::Boolean(true));
        assert_eq!(Value::from(&json!(null)), Value::Null);
        assert_eq!(Value::from(&json!({"a": 1})), Value::Absent);
        assert_eq!(
            Value::from(&json!(["a", "b"])),
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
        assert!(matches!(Value::from(&json!(2.5)), Value::Decimal(_)));
    }
}
