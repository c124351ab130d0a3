//! Depth-first traversal of resource trees, optionally driven by filter
//! expressions.

use crate::compile::Predicate;
use crate::context::FilterContext;
use crate::error::ParseError;
use crate::parser::FilterParser;
use crate::resource::Resource;
use crate::types::Node;
use crate::value::Value;
use tracing::trace;

/// Walks the tree below a start resource.
#[derive(Clone, Copy)]
pub struct ResourceStream<'a> {
    root: &'a dyn Resource,
}

impl<'a> ResourceStream<'a> {
    pub fn new(root: &'a dyn Resource) -> Self {
        ResourceStream { root }
    }

    /// Pre-order traversal starting with the root.
    ///
    /// `branch_selector` is tested on every child reached: accepted children
    /// are yielded and descended into, rejected ones are skipped together
    /// with their subtree.
    pub fn stream<F>(&self, branch_selector: F) -> Descendants<'a, F>
    where
        F: Fn(&dyn Resource) -> bool,
    {
        Descendants {
            pending: vec![self.root],
            branch_selector,
        }
    }

    /// The direct children of the root accepted by `child_selector`.
    pub fn list_children<F>(&self, child_selector: F) -> impl Iterator<Item = &'a dyn Resource>
    where
        F: Fn(&dyn Resource) -> bool + 'a,
    {
        self.root
            .children()
            .filter(move |child| child_selector(*child))
    }
}

/// Iterator returned by [`ResourceStream::stream`].
pub struct Descendants<'a, F> {
    pending: Vec<&'a dyn Resource>,
    branch_selector: F,
}

impl<'a, F> Iterator for Descendants<'a, F>
where
    F: Fn(&dyn Resource) -> bool,
{
    type Item = &'a dyn Resource;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.pending.pop()?;
        let selected: Vec<&'a dyn Resource> = current
            .children()
            .filter(|child| (self.branch_selector)(*child))
            .collect();
        trace!(path = current.path(), children = selected.len(), "visiting resource");
        // Reversed so the first child is visited next.
        self.pending.extend(selected.into_iter().rev());
        Some(current)
    }
}

/// Combines a [`ResourceStream`] with filter expressions for the branches to
/// descend into and the resources to yield.
///
/// ```
/// use resource_filter::{MemoryResource, ResourceFilterStream};
///
/// let root = MemoryResource::new("/content")
///     .with_child("a", |c| c.with_property("kind", "page"))
///     .with_child("b", |c| c.with_property("kind", "asset"));
/// let pages: Vec<String> = ResourceFilterStream::new(&root)
///     .set_child_selector("[kind] = $kind")
///     .unwrap()
///     .add_argument("kind", "page")
///     .stream()
///     .map(|r| r.path().to_string())
///     .collect();
/// assert_eq!(pages, vec!["/content/a"]);
/// ```
pub struct ResourceFilterStream<'a> {
    resources: ResourceStream<'a>,
    context: FilterContext,
    branch_selector: Option<Node>,
    child_selector: Option<Node>,
}

impl<'a> ResourceFilterStream<'a> {
    pub fn new(root: &'a dyn Resource) -> Self {
        Self::with_context(root, FilterContext::new())
    }

    pub fn with_context(root: &'a dyn Resource, context: FilterContext) -> Self {
        ResourceFilterStream {
            resources: ResourceStream::new(root),
            context,
            branch_selector: None,
            child_selector: None,
        }
    }

    /// Limits traversal to branches matching `filter`. Defaults to all.
    pub fn set_branch_selector(mut self, filter: &str) -> Result<Self, ParseError> {
        self.branch_selector = Some(FilterParser::parse(filter)?);
        Ok(self)
    }

    /// Limits the yielded resources to those matching `filter`. Defaults to
    /// all.
    pub fn set_child_selector(mut self, filter: &str) -> Result<Self, ParseError> {
        self.child_selector = Some(FilterParser::parse(filter)?);
        Ok(self)
    }

    /// Binds `$name` for both selectors.
    pub fn add_argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.set_argument(name, value);
        self
    }

    pub fn add_arguments<I, K, V>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in arguments {
            self.context.set_argument(name, value);
        }
        self
    }

    pub fn context(&self) -> &FilterContext {
        &self.context
    }

    /// Compiles the selectors and streams the matching resources.
    pub fn stream(&self) -> impl Iterator<Item = &'a dyn Resource> {
        let branch = self.compile(self.branch_selector.as_ref());
        let child = self.compile(self.child_selector.as_ref());
        self.resources
            .stream(move |resource: &dyn Resource| branch.test(resource))
            .filter(move |resource| child.test(*resource))
    }

    /// Children of the root matching the child selector.
    pub fn list_children(&self) -> impl Iterator<Item = &'a dyn Resource> {
        let child = self.compile(self.child_selector.as_ref());
        self.resources
            .list_children(move |resource: &dyn Resource| child.test(resource))
    }

    fn compile(&self, node: Option<&Node>) -> Predicate {
        match node {
            Some(node) => self.context.compile(node),
            None => Predicate::always(true),
        }
    }
}
