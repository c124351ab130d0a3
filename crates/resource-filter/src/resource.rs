//! The resource model filters are evaluated against.

use crate::value::Value;
use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;

/// A node in a content tree.
///
/// Filters only read from resources: the name, the path, the property map
/// and, for relative property paths and traversal, the children.
pub trait Resource {
    fn name(&self) -> &str;

    fn path(&self) -> &str;

    /// Placeholder resources for paths with nothing behind them answer
    /// `true`; their property map is treated as empty.
    fn is_non_existing(&self) -> bool {
        false
    }

    /// Adapts the resource to its property map. `None` when the resource
    /// cannot be adapted.
    fn value_map(&self) -> Option<&ValueMap>;

    fn child(&self, name: &str) -> Option<&dyn Resource>;

    fn children(&self) -> Box<dyn Iterator<Item = &dyn Resource> + '_>;
}

/// String-keyed property map of a resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
    entries: BTreeMap<String, Value>,
}

static EMPTY: ValueMap = ValueMap::new();

impl ValueMap {
    pub const fn new() -> Self {
        ValueMap {
            entries: BTreeMap::new(),
        }
    }

    /// The shared empty map.
    pub fn empty() -> &'static ValueMap {
        &EMPTY
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(name.into(), value.into())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ValueMap {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The property map of a resource, empty for non-existing resources and
/// resources that do not adapt.
pub fn value_map_of(resource: &dyn Resource) -> &ValueMap {
    if resource.is_non_existing() {
        return ValueMap::empty();
    }
    resource.value_map().unwrap_or(ValueMap::empty())
}

/// Looks up a property, returning [`Value::Absent`] when it is missing.
///
/// A name containing `/` is a relative path: everything before the last `/`
/// addresses a descendant (`jcr:content/created`), the last segment names
/// the property on it.
pub fn property(resource: &dyn Resource, name: &str) -> Value {
    let (target, key) = match name.rsplit_once('/') {
        Some((path, key)) => match resolve(resource, path) {
            Some(target) => (target, key),
            None => return Value::Absent,
        },
        None => (resource, name),
    };
    value_map_of(target).get(key).cloned().unwrap_or(Value::Absent)
}

/// Resolves a relative path (`a/b`, `./a`) against `resource`.
pub fn resolve<'a>(resource: &'a dyn Resource, path: &str) -> Option<&'a dyn Resource> {
    let mut current = resource;
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            // Parents are not reachable through the trait.
            ".." => return None,
            name => current = current.child(name)?,
        }
    }
    Some(current)
}

// ----------------------------------------------------------------- In-memory tree

/// An owned, in-memory resource tree.
///
/// Can be built programmatically or loaded from the JSON content format,
/// where nested objects are child resources and every other member is a
/// property.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryResource {
    path: String,
    name: String,
    properties: ValueMap,
    children: Vec<MemoryResource>,
    non_existing: bool,
}

impl MemoryResource {
    pub fn new(path: impl Into<String>) -> Self {
        let path = normalize_path(&path.into());
        MemoryResource {
            name: name_of(&path).to_string(),
            path,
            properties: ValueMap::new(),
            children: Vec::new(),
            non_existing: false,
        }
    }

    /// A placeholder for a path without a resource.
    pub fn non_existing(path: impl Into<String>) -> Self {
        MemoryResource {
            non_existing: true,
            ..MemoryResource::new(path)
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name, value);
        self
    }

    /// Adds a child named `name`, configured by `build`.
    pub fn with_child(
        mut self,
        name: &str,
        build: impl FnOnce(MemoryResource) -> MemoryResource,
    ) -> Self {
        let child = MemoryResource::new(join_path(&self.path, name));
        self.children.push(build(child));
        self
    }

    /// Loads a tree rooted at `path` from JSON content.
    ///
    /// Strings in RFC 3339 or ECMAScript date format
    /// (`Thu Aug 07 2013 16:32:59 GMT+0200`) become calendar values.
    pub fn from_json(path: &str, json: &serde_json::Value) -> Self {
        let mut resource = MemoryResource::new(path);
        if let serde_json::Value::Object(members) = json {
            for (key, member) in members {
                match member {
                    serde_json::Value::Object(_) => {
                        let child_path = join_path(&resource.path, key);
                        resource
                            .children
                            .push(MemoryResource::from_json(&child_path, member));
                    }
                    other => {
                        resource.properties.insert(key.as_str(), property_value(other));
                    }
                }
            }
        }
        resource
    }

    pub fn properties(&self) -> &ValueMap {
        &self.properties
    }

    /// Finds a resource in this tree by absolute path, or by a path relative
    /// to this resource.
    pub fn get_resource(&self, path: &str) -> Option<&MemoryResource> {
        let relative = if path.starts_with('/') {
            let path = normalize_path(path);
            if path == self.path {
                return Some(self);
            }
            let prefix = if self.path == "/" {
                "/".to_string()
            } else {
                format!("{}/", self.path)
            };
            path.strip_prefix(&prefix)?.to_string()
        } else {
            path.to_string()
        };
        let mut current = self;
        for segment in relative.split('/').filter(|s| !s.is_empty() && *s != ".") {
            current = current.children.iter().find(|c| c.name == segment)?;
        }
        Some(current)
    }
}

impl Resource for MemoryResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn is_non_existing(&self) -> bool {
        self.non_existing
    }

    fn value_map(&self) -> Option<&ValueMap> {
        Some(&self.properties)
    }

    fn child(&self, name: &str) -> Option<&dyn Resource> {
        self.children
            .iter()
            .find(|c| c.name == name)
            .map(|c| c as &dyn Resource)
    }

    fn children(&self) -> Box<dyn Iterator<Item = &dyn Resource> + '_> {
        Box::new(self.children.iter().map(|c| c as &dyn Resource))
    }
}

fn property_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::String(s) => parse_calendar(s)
            .map(Value::Calendar)
            .unwrap_or_else(|| Value::Text(s.clone())),
        serde_json::Value::Array(items) => Value::List(items.iter().map(property_value).collect()),
        other => Value::from(other),
    }
}

fn parse_calendar(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_rfc3339(s) {
        return Some(dt);
    }
    // Weekday names are not checked against the date.
    let (_, rest) = s.split_once(' ')?;
    DateTime::<FixedOffset>::parse_from_str(rest, "%b %d %Y %H:%M:%S GMT%z").ok()
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

fn join_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent, name)
    }
}
