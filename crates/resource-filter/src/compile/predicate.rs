use super::{Predicate, ValueCompiler};
use crate::compare;
use crate::types::Node;
use tracing::warn;

/// Compiles logical and comparison nodes, delegating operands to a
/// [`ValueCompiler`].
pub struct PredicateCompiler<'a> {
    values: ValueCompiler<'a>,
}

impl<'a> PredicateCompiler<'a> {
    pub fn new(values: ValueCompiler<'a>) -> Self {
        PredicateCompiler { values }
    }

    pub fn compile(&self, node: &Node) -> Predicate {
        match node {
            // An empty conjunction is vacuously true.
            Node::And(children) => self.combine(children, true, Predicate::all),
            // An empty disjunction is false.
            Node::Or(children) => self.combine(children, false, Predicate::any),
            Node::Comparison {
                operator,
                left,
                right,
            } => compare::comparison(
                *operator,
                self.values.compile(left),
                self.values.compile(right),
            ),
            _ => {
                warn!(?node, "value in predicate position");
                Predicate::always(false)
            }
        }
    }

    fn combine(
        &self,
        children: &[Node],
        empty: bool,
        join: fn(Vec<Predicate>) -> Predicate,
    ) -> Predicate {
        let mut predicates: Vec<Predicate> = children.iter().map(|c| self.compile(c)).collect();
        match predicates.len() {
            0 => Predicate::always(empty),
            1 => predicates.remove(0),
            _ => join(predicates),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Ast;
    use crate::compile::Arguments;
    use crate::registry::FunctionRegistry;
    use crate::resource::MemoryResource;
    use crate::types::ComparisonOperator;

    fn compile(node: &Node) -> Predicate {
        let registry = FunctionRegistry::new();
        let arguments = Arguments::new();
        PredicateCompiler::new(ValueCompiler::new(&registry, &arguments)).compile(node)
    }

    fn flag(name: &str) -> Node {
        Ast::eq(Ast::property(name), Ast::text("true"))
    }

    #[test]
    fn test_and_or_truth_tables() {
        for a in [false, true] {
            for b in [false, true] {
                let resource = MemoryResource::new("/r")
                    .with_property("a", a)
                    .with_property("b", b);
                let and = compile(&Ast::and(vec![flag("a"), flag("b")]));
                let or = compile(&Ast::or(vec![flag("a"), flag("b")]));
                assert_eq!(and.test(&resource), a && b, "a={} b={}", a, b);
                assert_eq!(or.test(&resource), a || b, "a={} b={}", a, b);
            }
        }
    }

    #[test]
    fn test_degenerate_logical_nodes() {
        let resource = MemoryResource::new("/r").with_property("a", true);
        assert!(compile(&Ast::and(vec![flag("a")])).test(&resource));
        assert!(!compile(&Ast::or(vec![flag("b")])).test(&resource));
        assert!(compile(&Ast::and(vec![])).test(&resource));
        assert!(!compile(&Ast::or(vec![])).test(&resource));
    }

    #[test]
    fn test_nested_logic() {
        let resource = MemoryResource::new("/r")
            .with_property("a", true)
            .with_property("b", false)
            .with_property("c", true);
        let node = Ast::or(vec![
            Ast::and(vec![flag("a"), flag("b")]),
            Ast::and(vec![flag("a"), flag("c")]),
        ]);
        assert!(compile(&node).test(&resource));
    }

    #[test]
    fn test_value_in_predicate_position_is_false() {
        let resource = MemoryResource::new("/r").with_property("a", true);
        assert!(!compile(&Ast::property("a")).test(&resource));
        let node = Ast::comparison(
            ComparisonOperator::Equal,
            Ast::property("a"),
            Ast::text("true"),
        );
        assert!(compile(&node).test(&resource));
    }
}
