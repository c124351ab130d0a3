//! Property tests for the logical and null semantics of compiled filters.

use proptest::prelude::*;
use resource_filter::{Ast, FilterContext, FilterParser, MemoryResource, Node, ResourceFilter, Value};

fn flag(index: usize) -> Node {
    Ast::eq(Ast::property(format!("p{}", index)), Ast::text("true"))
}

fn flags_resource(values: &[bool]) -> MemoryResource {
    values
        .iter()
        .enumerate()
        .fold(MemoryResource::new("/flags"), |r, (i, v)| {
            r.with_property(format!("p{}", i), *v)
        })
}

proptest! {
    #[test]
    fn and_or_follow_classical_logic(values in prop::collection::vec(any::<bool>(), 0..6)) {
        let context = FilterContext::new();
        let resource = flags_resource(&values);
        let operands: Vec<Node> = (0..values.len()).map(flag).collect();

        let and = context.compile(&Ast::and(operands.clone()));
        let or = context.compile(&Ast::or(operands));

        prop_assert_eq!(and.test(&resource), values.iter().all(|v| *v));
        prop_assert_eq!(or.test(&resource), values.iter().any(|v| *v));
    }

    #[test]
    fn null_matches_only_missing_properties(value in proptest::option::of("[a-z0-9 ]{0,12}")) {
        let mut resource = MemoryResource::new("/r");
        if let Some(value) = &value {
            resource = resource.with_property("p", value.as_str());
        }
        let is_null = ResourceFilter::new("p = null").unwrap();
        let is_not_null = ResourceFilter::new("p != null").unwrap();
        prop_assert_eq!(is_null.test(&resource), value.is_none());
        prop_assert_eq!(is_not_null.test(&resource), value.is_some());
    }

    #[test]
    fn missing_properties_never_equal_each_other(a in "[a-z]{1,6}", b in "[a-z]{1,6}") {
        let resource = MemoryResource::new("/r").with_property("present", 1);
        let filter = ResourceFilter::new(&format!("[{}_] = [{}_]", a, b)).unwrap();
        prop_assert!(!filter.test(&resource));
        prop_assert!(!resource_filter::compare::is_equal(&Value::Absent, &Value::Absent));
    }

    #[test]
    fn integers_equal_their_decimal_literals(n in any::<i32>()) {
        let resource = MemoryResource::new("/r").with_property("n", n);
        for literal in [format!("{}", n), format!("{}.0", n), format!("'{}'", n)] {
            let filter = ResourceFilter::new(&format!("n = {}", literal)).unwrap();
            prop_assert!(filter.test(&resource), "n = {}", literal);
        }
    }

    #[test]
    fn non_numeric_text_has_no_order(text in "[g-z]{1,8}", n in any::<i32>()) {
        let resource = MemoryResource::new("/r").with_property("s", text.as_str());
        for operator in ["<", "<=", ">", ">="] {
            let filter = ResourceFilter::new(&format!("s {} {}", operator, n)).unwrap();
            prop_assert!(!filter.test(&resource));
        }
    }

    #[test]
    fn arbitrary_input_never_panics(input in "[a-dT \\[\\]()'\"=<>!&|$:/,.0-9-]{0,40}") {
        let resource = MemoryResource::new("/r").with_property("a", 1);
        if let Ok(node) = FilterParser::parse(&input) {
            let _ = FilterContext::new().compile(&node).test(&resource);
        }
    }
}
