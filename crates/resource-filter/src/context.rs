use crate::compile::{Arguments, Predicate, PredicateCompiler, ValueCompiler, ValueProvider};
use crate::functions::FilterFunction;
use crate::registry::FunctionRegistry;
use crate::types::Node;
use crate::value::Value;
use std::sync::Arc;
use tracing::instrument;

/// Everything a compilation needs besides the tree: the function registry
/// and the values of `$arguments`.
///
/// Contexts are cheap to clone and share their registry.
#[derive(Debug, Clone)]
pub struct FilterContext {
    registry: Arc<FunctionRegistry>,
    arguments: Arguments,
}

impl FilterContext {
    /// A context with its own default registry.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(FunctionRegistry::new()))
    }

    pub fn with_registry(registry: Arc<FunctionRegistry>) -> Self {
        FilterContext {
            registry,
            arguments: Arguments::new(),
        }
    }

    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    pub fn register_function<F>(
        &self,
        name: impl Into<String>,
        function: F,
    ) -> Option<Arc<dyn FilterFunction>>
    where
        F: FilterFunction + 'static,
    {
        self.registry.register(name, Arc::new(function))
    }

    pub fn remove_function(&self, name: &str) -> Option<Arc<dyn FilterFunction>> {
        self.registry.remove(name)
    }

    pub fn set_argument(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.arguments.insert(name.into(), value.into());
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_argument(name, value);
        self
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Compiles a predicate tree. Never fails.
    #[instrument(level = "debug", skip_all)]
    pub fn compile(&self, node: &Node) -> Predicate {
        PredicateCompiler::new(self.value_compiler()).compile(node)
    }

    /// Compiles a value expression.
    pub fn compile_value(&self, node: &Node) -> ValueProvider {
        self.value_compiler().compile(node)
    }

    fn value_compiler(&self) -> ValueCompiler<'_> {
        ValueCompiler::new(&self.registry, &self.arguments)
    }
}

impl Default for FilterContext {
    fn default() -> Self {
        Self::new()
    }
}
