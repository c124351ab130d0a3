use super::{Arguments, ValueProvider};
use crate::registry::FunctionRegistry;
use crate::resource::Resource;
use crate::types::Node;
use crate::value::{self, Value};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Compiles value expressions: literals, properties, `$arguments` and
/// function calls.
pub struct ValueCompiler<'a> {
    registry: &'a FunctionRegistry,
    arguments: &'a Arguments,
}

impl<'a> ValueCompiler<'a> {
    pub fn new(registry: &'a FunctionRegistry, arguments: &'a Arguments) -> Self {
        ValueCompiler {
            registry,
            arguments,
        }
    }

    pub fn compile(&self, node: &Node) -> ValueProvider {
        match node {
            Node::Property(name) => property(name.clone()),
            Node::Number(text) => match value::parse_number(text) {
                Some(number) => ValueProvider::constant(number),
                None => {
                    debug!(literal = %text, "unparseable number literal");
                    ValueProvider::absent()
                }
            },
            Node::Null => ValueProvider::constant(Value::Null),
            Node::Date(text) => temporal(text, value::parse_date),
            Node::DateTime(text) => temporal(text, value::parse_local_date_time),
            Node::OffsetDateTime(text) => temporal(text, value::parse_offset_date_time),
            Node::Function { name, args } => self.function(name, args),
            // Unbound arguments behave like the `null` literal.
            Node::DynamicArg(name) => ValueProvider::constant(
                self.arguments
                    .get(name)
                    .cloned()
                    .map(Value::normalized)
                    .unwrap_or(Value::Null),
            ),
            Node::Text(text) => ValueProvider::constant(Value::Text(text.clone())),
            Node::And(_) | Node::Or(_) | Node::Comparison { .. } => {
                warn!(?node, "predicate in value position");
                ValueProvider::absent()
            }
        }
    }

    fn function(&self, name: &str, args: &[Node]) -> ValueProvider {
        match name {
            "name" => ValueProvider::new(|resource: &dyn Resource| {
                Value::Text(resource.name().to_string())
            }),
            "path" => ValueProvider::new(|resource: &dyn Resource| {
                Value::Text(resource.path().to_string())
            }),
            _ => match self.registry.get(name) {
                Some(function) => {
                    let args = args.iter().map(|arg| self.compile(arg)).collect();
                    function.compile(args)
                }
                None => {
                    debug!(function = name, "unknown filter function");
                    ValueProvider::absent()
                }
            },
        }
    }
}

fn property(name: String) -> ValueProvider {
    ValueProvider::new(move |resource: &dyn Resource| {
        crate::resource::property(resource, &name).normalized()
    })
}

fn temporal(text: &str, parse: fn(&str) -> Option<DateTime<Utc>>) -> ValueProvider {
    match parse(text) {
        Some(instant) => ValueProvider::constant(Value::Instant(instant)),
        None => {
            debug!(literal = %text, "unparseable date literal");
            ValueProvider::absent()
        }
    }
}
