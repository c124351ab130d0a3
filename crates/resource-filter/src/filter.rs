use crate::compile::Predicate;
use crate::context::FilterContext;
use crate::error::ParseError;
use crate::parser::FilterParser;
use crate::resource::Resource;
use std::fmt;

/// A parsed and compiled filter expression.
///
/// ```
/// use resource_filter::{MemoryResource, ResourceFilter};
///
/// let filter = ResourceFilter::new("name = 'joe' and age > 18").unwrap();
/// let joe = MemoryResource::new("/people/joe")
///     .with_property("name", "joe")
///     .with_property("age", 30);
/// assert!(filter.test(&joe));
/// ```
#[derive(Clone)]
pub struct ResourceFilter {
    expression: String,
    predicate: Predicate,
}

impl ResourceFilter {
    /// Compiles `expression` with a default context.
    pub fn new(expression: &str) -> Result<Self, ParseError> {
        Self::with_context(expression, &FilterContext::new())
    }

    /// Compiles `expression` with the functions and arguments of `context`.
    pub fn with_context(expression: &str, context: &FilterContext) -> Result<Self, ParseError> {
        let node = FilterParser::parse(expression)?;
        Ok(ResourceFilter {
            expression: expression.to_string(),
            predicate: context.compile(&node),
        })
    }

    pub fn test(&self, resource: &dyn Resource) -> bool {
        self.predicate.test(resource)
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl From<ResourceFilter> for Predicate {
    fn from(filter: ResourceFilter) -> Self {
        filter.predicate
    }
}

impl fmt::Debug for ResourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResourceFilter")
            .field(&self.expression)
            .finish()
    }
}
