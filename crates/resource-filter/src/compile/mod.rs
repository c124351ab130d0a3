//! Compilation of filter trees into closures.
//!
//! A tree is compiled once and the result is reused for every resource it
//! is tested against. Two passes cooperate: [`ValueCompiler`] turns leaf and
//! function nodes into [`ValueProvider`]s, [`PredicateCompiler`] turns
//! logical and comparison nodes into [`Predicate`]s. Neither pass can fail;
//! anything it cannot make sense of degrades to [`Value::Absent`] or `false`.

mod predicate;
mod value;

pub use predicate::PredicateCompiler;
pub use value::ValueCompiler;

use crate::registry::FunctionRegistry;
use crate::resource::Resource;
use crate::types::Node;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Named `$arguments` available while compiling.
pub type Arguments = HashMap<String, Value>;

type ValueFn = dyn Fn(&dyn Resource) -> Value + Send + Sync;
type PredicateFn = dyn Fn(&dyn Resource) -> bool + Send + Sync;

/// Produces a value for a resource.
///
/// Constants are kept as plain values so that later stages can fold them at
/// compile time.
#[derive(Clone)]
pub struct ValueProvider {
    kind: ProviderKind,
}

#[derive(Clone)]
enum ProviderKind {
    Constant(Value),
    Dynamic(Arc<ValueFn>),
}

impl ValueProvider {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&dyn Resource) -> Value + Send + Sync + 'static,
    {
        ValueProvider {
            kind: ProviderKind::Dynamic(Arc::new(f)),
        }
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        ValueProvider {
            kind: ProviderKind::Constant(value.into()),
        }
    }

    /// Always yields [`Value::Absent`].
    pub fn absent() -> Self {
        Self::constant(Value::Absent)
    }

    pub fn apply(&self, resource: &dyn Resource) -> Value {
        match &self.kind {
            ProviderKind::Constant(value) => value.clone(),
            ProviderKind::Dynamic(f) => f(resource),
        }
    }

    /// The value, when it does not depend on the resource.
    pub fn as_constant(&self) -> Option<&Value> {
        match &self.kind {
            ProviderKind::Constant(value) => Some(value),
            ProviderKind::Dynamic(_) => None,
        }
    }
}

impl fmt::Debug for ValueProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ProviderKind::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            ProviderKind::Dynamic(_) => f.write_str("Dynamic"),
        }
    }
}

/// A compiled filter: a pure test over resources.
#[derive(Clone)]
pub struct Predicate(Arc<PredicateFn>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&dyn Resource) -> bool + Send + Sync + 'static,
    {
        Predicate(Arc::new(f))
    }

    /// A predicate with a fixed answer.
    pub fn always(result: bool) -> Self {
        Predicate::new(move |_: &dyn Resource| result)
    }

    pub fn test(&self, resource: &dyn Resource) -> bool {
        (self.0)(resource)
    }

    /// True when every predicate is; stops at the first `false`.
    pub fn all(predicates: Vec<Predicate>) -> Self {
        Predicate::new(move |resource: &dyn Resource| predicates.iter().all(|p| p.test(resource)))
    }

    /// True when any predicate is; stops at the first `true`.
    pub fn any(predicates: Vec<Predicate>) -> Self {
        Predicate::new(move |resource: &dyn Resource| predicates.iter().any(|p| p.test(resource)))
    }

    pub fn negate(self) -> Self {
        Predicate::new(move |resource: &dyn Resource| !self.test(resource))
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate")
    }
}

/// Compiles `node` against `registry` without any `$arguments`.
pub fn compile(node: &Node, registry: &FunctionRegistry) -> Predicate {
    let arguments = Arguments::new();
    PredicateCompiler::new(ValueCompiler::new(registry, &arguments)).compile(node)
}
