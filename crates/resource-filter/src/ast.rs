//! AST construction helpers.

use crate::types::*;

/// Helper functions for building filter trees without going through text.
pub struct Ast;

impl Ast {
    /// Create a conjunction.
    pub fn and(operands: Vec<Node>) -> Node {
        Node::And(operands)
    }

    /// Create a disjunction.
    pub fn or(operands: Vec<Node>) -> Node {
        Node::Or(operands)
    }

    /// Create a comparison.
    pub fn comparison(operator: ComparisonOperator, left: Node, right: Node) -> Node {
        Node::Comparison {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Shorthand for an `==` comparison.
    pub fn eq(left: Node, right: Node) -> Node {
        Self::comparison(ComparisonOperator::Equal, left, right)
    }

    /// Create a function call.
    pub fn function(name: impl Into<String>, args: Vec<Node>) -> Node {
        Node::Function { name: name.into(), args }
    }

    /// Create a property reference.
    pub fn property(name: impl Into<String>) -> Node {
        Node::Property(name.into())
    }

    /// Create a numeric literal.
    pub fn number(text: impl Into<String>) -> Node {
        Node::Number(text.into())
    }

    /// Create a string literal.
    pub fn text(text: impl Into<String>) -> Node {
        Node::Text(text.into())
    }

    /// Create the `null` literal.
    pub fn null() -> Node {
        Node::Null
    }

    /// Create a date literal (`YYYY-MM-DD`).
    pub fn date(text: impl Into<String>) -> Node {
        Node::Date(text.into())
    }

    /// Create a local date-time literal.
    pub fn date_time(text: impl Into<String>) -> Node {
        Node::DateTime(text.into())
    }

    /// Create an offset date-time literal.
    pub fn offset_date_time(text: impl Into<String>) -> Node {
        Node::OffsetDateTime(text.into())
    }

    /// Create a `$name` argument reference.
    pub fn argument(name: impl Into<String>) -> Node {
        Node::DynamicArg(name.into())
    }
}
