//! Named functions callable from filter expressions.

use crate::compile::ValueProvider;
use crate::resource::Resource;
use crate::value::{self, Value};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::sync::Arc;
use tracing::debug;

/// A function resolved by name while compiling a filter.
///
/// It receives its compiled arguments and returns the provider for its
/// result. Registered functions hold no per-call state; a function whose
/// arguments are all constant may fold itself into a constant provider.
pub trait FilterFunction: Send + Sync {
    fn compile(&self, args: Vec<ValueProvider>) -> ValueProvider;
}

impl<F> FilterFunction for F
where
    F: Fn(Vec<ValueProvider>) -> ValueProvider + Send + Sync,
{
    fn compile(&self, args: Vec<ValueProvider>) -> ValueProvider {
        self(args)
    }
}

/// Wraps a function of evaluated arguments into a [`FilterFunction`] that is
/// re-evaluated for every resource.
pub fn per_resource<F>(f: F) -> impl FilterFunction
where
    F: Fn(&[Value], &dyn Resource) -> Value + Send + Sync + 'static,
{
    let f = Arc::new(f);
    move |args: Vec<ValueProvider>| {
        let f = Arc::clone(&f);
        ValueProvider::new(move |resource: &dyn Resource| {
            let values: Vec<Value> = args.iter().map(|arg| arg.apply(resource)).collect();
            f(&values, resource)
        })
    }
}

/// Functions every default registry starts with.
pub fn builtin_functions() -> Vec<(&'static str, Arc<dyn FilterFunction>)> {
    vec![("date", Arc::new(DateFunction) as Arc<dyn FilterFunction>)]
}

// ----------------------------------------------------------------- date()

/// `date()`, `date(text)`, `date(text, pattern)`.
///
/// Without arguments it is the current instant, evaluated per test. With one
/// argument the text is read as an ISO-8601 date-time with offset, a local
/// date-time or a date. The optional second argument is a
/// `SimpleDateFormat`-style pattern such as `yyyy-MM-dd`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateFunction;

impl FilterFunction for DateFunction {
    fn compile(&self, args: Vec<ValueProvider>) -> ValueProvider {
        if args.is_empty() {
            return ValueProvider::new(|_: &dyn Resource| Value::Instant(Utc::now()));
        }
        let constants: Option<Vec<Value>> =
            args.iter().map(|arg| arg.as_constant().cloned()).collect();
        match constants {
            Some(values) => ValueProvider::constant(date(&values)),
            None => ValueProvider::new(move |resource: &dyn Resource| {
                let values: Vec<Value> = args.iter().map(|arg| arg.apply(resource)).collect();
                date(&values)
            }),
        }
    }
}

fn date(args: &[Value]) -> Value {
    let first = match args.first() {
        Some(first) => first,
        None => return Value::Instant(Utc::now()),
    };
    if let Some(instant) = first.as_instant() {
        return Value::Instant(instant);
    }
    let Some(text) = first.to_text() else {
        return Value::Absent;
    };
    let parsed = match args.get(1).and_then(Value::to_text) {
        Some(pattern) => parse_with_pattern(&text, &pattern),
        None => value::parse_instant(&text),
    };
    match parsed {
        Some(instant) => Value::Instant(instant),
        None => {
            debug!(%text, "date() could not parse its argument");
            Value::Absent
        }
    }
}

/// Parses `text` with a `SimpleDateFormat` pattern. Patterns without an
/// offset are read as UTC; patterns without a time as midnight.
pub fn parse_with_pattern(text: &str, pattern: &str) -> Option<DateTime<Utc>> {
    let format = strftime_pattern(pattern)?;
    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(text, &format) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, &format) {
        return Some(Utc.from_utc_datetime(&naive));
    }
    let date = NaiveDate::parse_from_str(text, &format).ok()?;
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Translates a `SimpleDateFormat` pattern into a chrono format string.
///
/// Returns `None` for pattern letters that have no chrono counterpart.
pub fn strftime_pattern(pattern: &str) -> Option<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '\'' {
            // '' is a literal quote, otherwise quoted text runs to the next quote.
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    break;
                }
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }
        if !ch.is_ascii_alphabetic() {
            push_literal(&mut out, ch);
            i += 1;
            continue;
        }
        let mut run = 1;
        while chars.get(i + run) == Some(&ch) {
            run += 1;
        }
        out.push_str(field(ch, run)?);
        i += run;
    }
    Some(out)
}

fn field(letter: char, run: usize) -> Option<&'static str> {
    let spec = match (letter, run) {
        ('y', 2) => "%y",
        ('y', _) => "%Y",
        ('M', 1 | 2) => "%m",
        ('M', 3) => "%b",
        ('M', _) => "%B",
        ('d', _) => "%d",
        ('D', _) => "%j",
        ('E', 1..=3) => "%a",
        ('E', _) => "%A",
        ('u', _) => "%u",
        ('a', _) => "%p",
        ('H' | 'k', _) => "%H",
        ('h' | 'K', _) => "%I",
        ('m', _) => "%M",
        ('s', _) => "%S",
        ('S', 3) => "%3f",
        ('S', 6) => "%6f",
        ('S', 9) => "%9f",
        ('S', _) => "%f",
        ('Z', _) => "%z",
        ('X', 1) => "%#z",
        ('X', 2) => "%z",
        ('X', _) => "%:z",
        _ => {
            debug!(%letter, "unsupported date pattern letter");
            return None;
        }
    };
    Some(spec)
}

fn push_literal(out: &mut String, ch: char) {
    if ch == '%' {
        out.push_str("%%");
    } else {
        out.push(ch);
    }
}
