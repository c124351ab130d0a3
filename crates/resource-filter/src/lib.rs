//! Filter expressions over hierarchical resources.
//!
//! # Overview
//!
//! A filter such as `[jcr:content/jcr:title] == 'English' and created >
//! date('2020-01-01')` is parsed into a [`Node`] tree, compiled once into a
//! [`Predicate`] and then tested against any number of [`Resource`]s.
//! Compilation never fails: unknown functions and malformed literals yield no
//! value, and comparisons against no value are false. A missing property and
//! `null` compare equal.
//!
//! # Example
//!
//! ```
//! use resource_filter::{FilterContext, FilterParser, MemoryResource, ResourceStream};
//! use serde_json::json;
//!
//! let content = MemoryResource::from_json(
//!     "/content",
//!     &json!({
//!         "joe": { "name": "joe", "age": 30, "active": true },
//!         "ann": { "name": "ann", "age": 12 }
//!     }),
//! );
//!
//! let node = FilterParser::parse("age > 18 and active = 'true'").unwrap();
//! let predicate = FilterContext::new().compile(&node);
//!
//! let found: Vec<&str> = ResourceStream::new(&content)
//!     .stream(|_| true)
//!     .filter(|r| predicate.test(*r))
//!     .map(|r| r.path())
//!     .collect();
//! assert_eq!(found, vec!["/content/joe"]);
//! ```

mod types;
pub use types::*;

mod ast;
pub use ast::Ast;

mod error;
pub use error::ParseError;

mod parser;
pub use parser::FilterParser;

pub mod value;
pub use value::Value;

pub mod resource;
pub use resource::{MemoryResource, Resource, ValueMap};

pub mod compile;
pub use compile::{compile, Arguments, Predicate, ValueProvider};

pub mod compare;

pub mod functions;
pub use functions::{DateFunction, FilterFunction};

mod registry;
pub use registry::FunctionRegistry;

mod context;
pub use context::FilterContext;

mod filter;
pub use filter::ResourceFilter;

mod stream;
pub use stream::{Descendants, ResourceFilterStream, ResourceStream};
