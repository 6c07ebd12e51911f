use std::collections::BTreeMap;

use crate::codec::{to_camel, to_kebab};

const ROOT: &str = "root";
const CLICKABLE: &str = "clickable";
const PARAMS: &str = "params";
const IDENTIFY: &str = "identify";

/// A key this crate manages inside a node's dataset, relative to one prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeRole {
    Root,
    Clickable,
    Params,
    Param(String),
    Identify,
}

impl AttributeRole {
    /// Stored (camel) dataset key, e.g. `logParamsItem` for `Param("item")`.
    pub fn key(&self, prefix: &str) -> String {
        let kebab = match self {
            Self::Root => format!("{prefix}-{ROOT}"),
            Self::Clickable => format!("{prefix}-{CLICKABLE}"),
            Self::Params => format!("{prefix}-{PARAMS}"),
            Self::Param(name) => format!("{prefix}-{PARAMS}-{}", to_kebab(name)),
            Self::Identify => format!("{prefix}-{IDENTIFY}"),
        };
        to_camel(&kebab)
    }

    /// Recovers the role of a stored key. Keys that do not belong to `prefix`,
    /// or whose kebab form does not have the exact role shape, yield `None`.
    pub fn parse(prefix: &str, key: &str) -> Option<Self> {
        let kebab = to_kebab(key);
        let segments: Vec<&str> = kebab.split('-').collect();
        match segments.as_slice() {
            [head, role] if *head == prefix => match *role {
                ROOT => Some(Self::Root),
                CLICKABLE => Some(Self::Clickable),
                PARAMS => Some(Self::Params),
                IDENTIFY => Some(Self::Identify),
                _ => None,
            },
            [head, PARAMS, name] if *head == prefix => Some(Self::Param(to_camel(name))),
            _ => None,
        }
    }
}

/// Flag roles are set when their value is `"true"` or empty.
pub fn is_truthy_flag(value: &str) -> bool {
    value == "true" || value.is_empty()
}

/// String-valued dataset of a node, keyed by camel-cased names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    entries: BTreeMap<String, String>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn role(&self, prefix: &str, role: &AttributeRole) -> Option<&str> {
        self.get(&role.key(prefix))
    }

    pub fn set_role(
        &mut self,
        prefix: &str,
        role: &AttributeRole,
        value: impl Into<String>,
    ) -> Option<String> {
        self.insert(role.key(prefix), value)
    }

    pub fn has_flag(&self, prefix: &str, role: &AttributeRole) -> bool {
        self.role(prefix, role).is_some_and(is_truthy_flag)
    }

    /// Entries that carry a role under `prefix`, in key order.
    pub fn roles<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (AttributeRole, &'a str)> + 'a {
        self.iter().filter_map(move |(key, value)| {
            AttributeRole::parse(prefix, key).map(|role| (role, value))
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
