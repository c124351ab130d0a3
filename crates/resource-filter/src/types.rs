//! Filter expression tree.

/// A parsed filter expression.
///
/// Logical and comparison variants produce predicates; every other variant
/// produces a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `a and b and ...`
    And(Vec<Node>),
    /// `a or b or ...`
    Or(Vec<Node>),
    /// `left <operator> right`
    Comparison {
        operator: ComparisonOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Function call: `name()`, `date('2020-01-01', 'yyyy-MM-dd')`
    Function { name: String, args: Vec<Node> },
    /// Property reference: `title`, `[jcr:content/jcr:title]`
    Property(String),
    /// Numeric literal, kept as written.
    Number(String),
    /// `null`
    Null,
    /// `2020-01-01`
    Date(String),
    /// `2020-01-01T10:15:30`
    DateTime(String),
    /// `2020-01-01T10:15:30+02:00`
    OffsetDateTime(String),
    /// Named argument supplied by the filter context: `$name`
    DynamicArg(String),
    /// String literal.
    Text(String),
}

impl Node {
    /// The literal lexeme of a leaf node.
    pub fn text(&self) -> Option<&str> {
        match self {
            Node::Function { name, .. } => Some(name),
            Node::Property(text)
            | Node::Number(text)
            | Node::Date(text)
            | Node::DateTime(text)
            | Node::OffsetDateTime(text)
            | Node::DynamicArg(text)
            | Node::Text(text) => Some(text),
            Node::Null => Some("null"),
            Node::And(_) | Node::Or(_) | Node::Comparison { .. } => None,
        }
    }

    /// Child nodes: operands of logical nodes, arguments of function calls.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::And(children) | Node::Or(children) => children,
            Node::Function { args, .. } => args,
            _ => &[],
        }
    }

    /// True for nodes that compile to a predicate rather than a value.
    pub fn is_predicate(&self) -> bool {
        matches!(self, Node::And(_) | Node::Or(_) | Node::Comparison { .. })
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Equal,          // == = is
    NotEqual,       // != <> is not
    Less,           // < less than
    LessEqual,      // <=
    Greater,        // > greater than
    GreaterEqual,   // >=
    Like,           // like
    NotLike,        // like not, not like
    Contains,       // contains
    NotContains,    // contains not
    ContainsAny,    // contains any
    NotContainsAny, // contains not any
    In,             // in
    NotIn,          // not in
}

impl ComparisonOperator {
    /// Canonical spelling in the filter language.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "==",
            ComparisonOperator::NotEqual => "!=",
            ComparisonOperator::Less => "<",
            ComparisonOperator::LessEqual => "<=",
            ComparisonOperator::Greater => ">",
            ComparisonOperator::GreaterEqual => ">=",
            ComparisonOperator::Like => "like",
            ComparisonOperator::NotLike => "like not",
            ComparisonOperator::Contains => "contains",
            ComparisonOperator::NotContains => "contains not",
            ComparisonOperator::ContainsAny => "contains any",
            ComparisonOperator::NotContainsAny => "contains not any",
            ComparisonOperator::In => "in",
            ComparisonOperator::NotIn => "not in",
        }
    }

    /// The positive operator a negated operator is built from.
    pub fn negated_of(&self) -> Option<ComparisonOperator> {
        match self {
            ComparisonOperator::NotLike => Some(ComparisonOperator::Like),
            ComparisonOperator::NotContains => Some(ComparisonOperator::Contains),
            ComparisonOperator::NotContainsAny => Some(ComparisonOperator::ContainsAny),
            ComparisonOperator::NotIn => Some(ComparisonOperator::In),
            _ => None,
        }
    }
}
