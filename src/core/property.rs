//! Structured property values carried by log events
//!
//! This module provides:
//! - `ScalarValue`: a single primitive value
//! - `PropertyValue`: scalar, sequence or structure
//! - `Properties`: the per-event property bag with unique, case-sensitive names

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Primitive property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "null"),
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Int(i) => write!(f, "{}", i),
            ScalarValue::UInt(u) => write!(f, "{}", u),
            ScalarValue::Float(fl) => write!(f, "{}", fl),
            ScalarValue::String(s) => write!(f, "{}", s),
        }
    }
}

/// Value of a log event property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(ScalarValue),
    Sequence(Vec<PropertyValue>),
    Structure {
        type_tag: Option<String>,
        properties: Vec<(String, PropertyValue)>,
    },
}

impl PropertyValue {
    /// Build a structure value from name/value pairs
    pub fn structure<I, K, V>(type_tag: Option<&str>, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        PropertyValue::Structure {
            type_tag: type_tag.map(str::to_string),
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The string content, only when this is a string scalar
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Scalar(ScalarValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Render the value as text
    ///
    /// String scalars are double-quoted unless `format` contains `l`
    /// (literal); nested strings are always quoted.
    pub fn render(&self, format: Option<&str>, output: &mut String) {
        let literal = format.is_some_and(|f| f.contains('l'));
        match self {
            PropertyValue::Scalar(ScalarValue::String(s)) if literal => output.push_str(s),
            PropertyValue::Scalar(ScalarValue::String(s)) => {
                output.push('"');
                output.push_str(&s.replace('"', "\\\""));
                output.push('"');
            }
            PropertyValue::Scalar(scalar) => output.push_str(&scalar.to_string()),
            PropertyValue::Sequence(items) => {
                output.push('[');
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        output.push_str(", ");
                    }
                    item.render(None, output);
                }
                output.push(']');
            }
            PropertyValue::Structure {
                type_tag,
                properties,
            } => {
                if let Some(tag) = type_tag {
                    output.push_str(tag);
                    output.push(' ');
                }
                output.push_str("{ ");
                for (idx, (name, value)) in properties.iter().enumerate() {
                    if idx > 0 {
                        output.push_str(", ");
                    }
                    output.push_str(name);
                    output.push_str(": ");
                    value.render(None, output);
                }
                output.push_str(" }");
            }
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rendered = String::new();
        self.render(None, &mut rendered);
        f.write_str(&rendered)
    }
}

impl From<ScalarValue> for PropertyValue {
    fn from(s: ScalarValue) -> Self {
        PropertyValue::Scalar(s)
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Scalar(ScalarValue::String(s))
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Scalar(ScalarValue::String(s.to_string()))
    }
}

impl From<&String> for PropertyValue {
    fn from(s: &String) -> Self {
        PropertyValue::Scalar(ScalarValue::String(s.clone()))
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Scalar(ScalarValue::Bool(b))
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for PropertyValue {
            fn from(i: $t) -> Self {
                PropertyValue::Scalar(ScalarValue::Int(i64::from(i)))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for PropertyValue {
            fn from(u: $t) -> Self {
                PropertyValue::Scalar(ScalarValue::UInt(u64::from(u)))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<usize> for PropertyValue {
    fn from(u: usize) -> Self {
        PropertyValue::Scalar(ScalarValue::UInt(u as u64))
    }
}

impl From<f32> for PropertyValue {
    fn from(f: f32) -> Self {
        PropertyValue::Scalar(ScalarValue::Float(f64::from(f)))
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Scalar(ScalarValue::Float(f))
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => PropertyValue::Scalar(ScalarValue::Null),
        }
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(items: Vec<T>) -> Self {
        PropertyValue::Sequence(items.into_iter().map(Into::into).collect())
    }
}

/// Property bag of a log event
///
/// Names are case-sensitive and unique. Iteration is ordered by name so
/// formatted output is reproducible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    values: BTreeMap<String, PropertyValue>,
}

impl Properties {
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Add the property unless one with the same name already exists
    ///
    /// Returns `true` when the property was inserted.
    pub fn add_if_absent(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> bool {
        let name = name.into();
        if self.values.contains_key(&name) {
            return false;
        }
        self.values.insert(name, value.into());
        true
    }

    /// Add the property, replacing any existing value
    pub fn add_or_update(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Properties::new();
        for (k, v) in iter {
            properties.add_or_update(k, v);
        }
        properties
    }
}
