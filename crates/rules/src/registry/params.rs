//! Rule parameters: the declared shape of each parameter and typed accessors
//! used by condition and action implementations after rendering.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParamError;

/// Parameter map of a condition or action, as written in the rule source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn require(&self, name: &str) -> Result<&Value, ParamError> {
        self.0
            .get(name)
            .ok_or_else(|| ParamError::Missing(name.to_string()))
    }

    pub fn str(&self, name: &str) -> Result<&str, ParamError> {
        self.require(name)?
            .as_str()
            .ok_or_else(|| ParamError::shape(name, ParamKind::Str))
    }

    pub fn opt_str(&self, name: &str) -> Result<Option<&str>, ParamError> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v
                .as_str()
                .map(Some)
                .ok_or_else(|| ParamError::shape(name, ParamKind::Str)),
        }
    }

    pub fn integer(&self, name: &str) -> Result<i64, ParamError> {
        self.require(name)?
            .as_i64()
            .ok_or_else(|| ParamError::shape(name, ParamKind::Integer))
    }

    pub fn number(&self, name: &str) -> Result<f64, ParamError> {
        self.require(name)?
            .as_f64()
            .ok_or_else(|| ParamError::shape(name, ParamKind::Number))
    }

    pub fn bool_or(&self, name: &str, default: bool) -> Result<bool, ParamError> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(v) => v
                .as_bool()
                .ok_or_else(|| ParamError::shape(name, ParamKind::Bool)),
        }
    }

    /// A string or a number, compared as text.
    pub fn scalar(&self, name: &str) -> Result<String, ParamError> {
        scalar_text(self.require(name)?).ok_or_else(|| ParamError::shape(name, ParamKind::Scalar))
    }

    pub fn scalar_list(&self, name: &str) -> Result<Vec<String>, ParamError> {
        let items = self
            .require(name)?
            .as_array()
            .ok_or_else(|| ParamError::shape(name, ParamKind::ScalarList))?;
        items
            .iter()
            .map(|v| scalar_text(v).ok_or_else(|| ParamError::shape(name, ParamKind::ScalarList)))
            .collect()
    }

    pub fn str_list(&self, name: &str) -> Result<Vec<String>, ParamError> {
        let items = self
            .require(name)?
            .as_array()
            .ok_or_else(|| ParamError::shape(name, ParamKind::StrList))?;
        items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ParamError::shape(name, ParamKind::StrList))
            })
            .collect()
    }

    pub fn date(&self, name: &str) -> Result<NaiveDate, ParamError> {
        let raw = self.require(name)?;
        raw.as_str()
            .and_then(parse_date)
            .ok_or_else(|| ParamError::shape(name, ParamKind::Date))
    }
}

impl FromIterator<(String, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Expected shape of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Str,
    Integer,
    Number,
    Bool,
    /// String or number, compared as text.
    Scalar,
    StrList,
    ScalarList,
    /// `YYYY-MM-DD`.
    Date,
}

impl ParamKind {
    pub fn describe(&self) -> &'static str {
        match self {
            ParamKind::Str => "a string",
            ParamKind::Integer => "an integer",
            ParamKind::Number => "a number",
            ParamKind::Bool => "a boolean",
            ParamKind::Scalar => "a string or number",
            ParamKind::StrList => "a list of strings",
            ParamKind::ScalarList => "a list of strings or numbers",
            ParamKind::Date => "a date (YYYY-MM-DD)",
        }
    }

    /// Whether a literal value has this shape.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::Str => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Bool => value.is_boolean(),
            ParamKind::Scalar => value.is_string() || value.is_number(),
            ParamKind::StrList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            ParamKind::ScalarList => value
                .as_array()
                .is_some_and(|items| items.iter().all(|v| v.is_string() || v.is_number())),
            ParamKind::Date => value.as_str().and_then(parse_date).is_some(),
        }
    }
}

/// Declaration of one parameter a condition or action understands.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind) -> Self {
        Self { name, kind, required: true }
    }

    pub const fn optional(name: &'static str, kind: ParamKind) -> Self {
        Self { name, kind, required: false }
    }
}
