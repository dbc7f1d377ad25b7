//! Route parameters and generation arguments passed through the filter chain.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use axum::http::{HeaderMap, Method};

/// Key the language filter reads and writes
pub const LANGUAGE_PARAM: &str = "language";

/// A single route parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{}", n),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Key/value route parameters, kept in key order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    /// Recognized language, if the language filter found one
    pub fn language(&self) -> Option<&str> {
        self.get_str(LANGUAGE_PARAM)
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Arguments of a URL generation call: positional values followed by an
/// optional trailing options map, as in `product_path(7, language: "de")`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateArgs {
    positional: Vec<ParamValue>,
    options: Option<Params>,
}

impl GenerateArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_positional(mut self, value: impl Into<ParamValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn with_options(mut self, options: Params) -> Self {
        self.options = Some(options);
        self
    }

    /// Take the trailing options map, or an empty one when the call had none
    pub fn extract_options(&mut self) -> Params {
        self.options.take().unwrap_or_default()
    }

    /// Re-append an options map as the trailing argument
    pub fn push_options(&mut self, options: Params) {
        self.options = Some(options);
    }

    pub fn positional(&self) -> &[ParamValue] {
        &self.positional
    }

    pub fn options(&self) -> Option<&Params> {
        self.options.as_ref()
    }
}

/// Recognition environment handed through the chain untouched
#[derive(Debug, Clone, Default)]
pub struct RequestEnv {
    pub method: Method,
    pub headers: HeaderMap,
}

impl RequestEnv {
    pub fn new(method: Method, headers: HeaderMap) -> Self {
        Self { method, headers }
    }
}
