//! Predicate sets: the externally supplied facts attached to every entity.

use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Value of a single predicate.
///
/// On the wire a predicate is a bare JSON scalar, so the variants are
/// untagged and tried in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredicateValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl PredicateValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            PredicateValue::Bool(_) => "BOOLEAN",
            PredicateValue::Int(_) => "INTEGER",
            PredicateValue::Float(_) => "FLOAT",
            PredicateValue::String(_) => "STRING",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PredicateValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PredicateValue::Float(f) => Some(*f),
            PredicateValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Ordering between two values. `None` for incompatible types, which
    /// callers treat as "comparison does not hold".
    pub fn compare(&self, other: &PredicateValue) -> Option<std::cmp::Ordering> {
        use PredicateValue::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a.partial_cmp(b),
            (Int(a), Int(b)) => a.partial_cmp(b),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (String(a), String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl From<bool> for PredicateValue { fn from(v: bool) -> Self { PredicateValue::Bool(v) } }
impl From<i32> for PredicateValue { fn from(v: i32) -> Self { PredicateValue::Int(v as i64) } }
impl From<i64> for PredicateValue { fn from(v: i64) -> Self { PredicateValue::Int(v) } }
impl From<f64> for PredicateValue { fn from(v: f64) -> Self { PredicateValue::Float(v) } }
impl From<String> for PredicateValue { fn from(v: String) -> Self { PredicateValue::String(v) } }
impl From<&str> for PredicateValue { fn from(v: &str) -> Self { PredicateValue::String(v.to_owned()) } }

impl fmt::Display for PredicateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateValue::Bool(b) => write!(f, "{b}"),
            PredicateValue::Int(i) => write!(f, "{i}"),
            PredicateValue::Float(v) => write!(f, "{v}"),
            PredicateValue::String(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
        }
    }
}

/// Immutable mapping from predicate name to value.
///
/// Built once when an entity is constructed; entities derived from it (shadows,
/// anti-shadows) share clones of the same facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredicateSet(HashMap<String, PredicateValue>);

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<PredicateValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&PredicateValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PredicateValue)> {
        self.0.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for PredicateSet
where
    K: Into<String>,
    V: Into<PredicateValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
