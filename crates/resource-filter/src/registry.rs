use crate::functions::{builtin_functions, FilterFunction};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Name → function table consulted while compiling function calls.
///
/// The table may change at any time; compiled filters keep the functions
/// they were compiled against.
pub struct FunctionRegistry {
    functions: RwLock<HashMap<String, Arc<dyn FilterFunction>>>,
}

impl FunctionRegistry {
    /// A registry with the built-in functions (`date`).
    pub fn new() -> Self {
        let registry = Self::empty();
        for (name, function) in builtin_functions() {
            registry.register(name, function);
        }
        registry
    }

    /// A registry without any functions.
    pub fn empty() -> Self {
        FunctionRegistry {
            functions: RwLock::new(HashMap::new()),
        }
    }

    /// Adds or replaces `name`, returning the previous registration.
    pub fn register(
        &self,
        name: impl Into<String>,
        function: Arc<dyn FilterFunction>,
    ) -> Option<Arc<dyn FilterFunction>> {
        let name = name.into();
        debug!(function = %name, "registering filter function");
        self.functions.write().insert(name, function)
    }

    pub fn remove(&self, name: &str) -> Option<Arc<dyn FilterFunction>> {
        self.functions.write().remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn FilterFunction>> {
        self.functions.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.read().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}
