//! Template parameters.
//!
//! Parameters form part of the render cache key, so they are kept in a
//! canonical (sorted) map and every value is hashable.

use std::collections::BTreeMap;

use frx_dtype::ScalarDType;
use snafu::OptionExt;

use crate::error::{InvalidParamSnafu, MissingParamSnafu, Result};

/// Name of the parameter carrying the backend floating-point type.
pub const FPDTYPE: &str = "fpdtype";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamValue {
    Int(i64),
    Bool(bool),
    Str(String),
    DType(ScalarDType),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::DType(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<ScalarDType> for ParamValue {
    fn from(value: ScalarDType) -> Self {
        Self::DType(value)
    }
}

/// Canonical set of template parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateParams(BTreeMap<String, ParamValue>);

impl TemplateParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
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

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn require(&self, name: &str) -> Result<&ParamValue> {
        self.0.get(name).context(MissingParamSnafu { name })
    }

    pub fn int(&self, name: &str) -> Result<i64> {
        match self.require(name)? {
            ParamValue::Int(v) => Ok(*v),
            other => InvalidParamSnafu { name, reason: format!("expected an integer, got {other}") }.fail(),
        }
    }

    /// Integer parameter that must be non-negative.
    pub fn count(&self, name: &str) -> Result<usize> {
        let value = self.int(name)?;
        usize::try_from(value)
            .map_err(|_| InvalidParamSnafu { name, reason: format!("expected a non-negative count, got {value}") }.build())
    }

    pub fn bool(&self, name: &str) -> Result<bool> {
        match self.require(name)? {
            ParamValue::Bool(v) => Ok(*v),
            other => InvalidParamSnafu { name, reason: format!("expected a boolean, got {other}") }.fail(),
        }
    }

    pub fn str(&self, name: &str) -> Result<&str> {
        match self.require(name)? {
            ParamValue::Str(v) => Ok(v),
            other => InvalidParamSnafu { name, reason: format!("expected a string, got {other}") }.fail(),
        }
    }

    pub fn dtype(&self, name: &str) -> Result<ScalarDType> {
        match self.require(name)? {
            ParamValue::DType(v) => Ok(*v),
            other => InvalidParamSnafu { name, reason: format!("expected a dtype, got {other}") }.fail(),
        }
    }

    /// The floating-point element type of the rendered source.
    pub fn fpdtype(&self) -> Result<ScalarDType> {
        let dtype = self.dtype(FPDTYPE)?;
        snafu::ensure!(
            dtype.is_float(),
            InvalidParamSnafu { name: FPDTYPE, reason: format!("{dtype} is not a floating-point type") }
        );
        Ok(dtype)
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for TemplateParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
