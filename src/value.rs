//! Generic value tree (single-file).
//!
//! The decoders consume an already-parsed, untyped tree rather than raw text.
//! This is `serde_json::Value` plus one extra leaf: a distinct
//! arbitrary-precision integer, so "number" and "bigint" stay separate kinds
//! all the way through decoding instead of collapsing into `f64`.
//!
//! Design goals:
//! - Exhaustive matches everywhere; adding a kind is a compile error downstream.
//! - Object entries keep insertion order (mirrors `preserve_order`).
//! - `Display` renders compact JSON, so failure messages can quote the
//!   offending value verbatim (bigints render as bare digits).

use std::fmt;

use indexmap::IndexMap;
use num_bigint::BigInt;
use serde_json::Number;

// ------------------------------- Kinds ------------------------------------ //

/// Coarse tag of a [`Value`], mostly for mismatch reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Kind {
    Null,
    Bool,
    Number,
    String,
    BigInt,
    Array,
    Object,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "boolean",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::BigInt => "bigint",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ------------------------------- Value ------------------------------------ //

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    BigInt(BigInt),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::BigInt(_) => Kind::BigInt,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Parse a JSON document into a value tree. Plain JSON has no bigint
    /// literal, so parsed trees never contain [`Value::BigInt`]; that variant
    /// enters via [`Value::from`] conversions or hand-built trees.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<serde_json::Value>(source).map(Value::from)
    }
}

// ----------------------------- Conversions -------------------------------- //

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(inner) => Value::Bool(inner),
            serde_json::Value::Number(inner) => Value::Number(inner),
            serde_json::Value::String(inner) => Value::String(inner),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Object(
                entries.into_iter().map(|(key, inner)| (key, Value::from(inner))).collect(),
            ),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        Value::from(value.clone())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self { Value::Bool(value) }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self { Value::Number(Number::from(value)) }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self { Value::Number(Number::from(value)) }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self { Value::Number(Number::from(value)) }
}

impl From<f64> for Value {
    /// Non-finite floats have no JSON spelling; they map to `Null`
    /// (same rule as `serde_json`).
    fn from(value: f64) -> Self {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self { Value::String(value.to_string()) }
}

impl From<String> for Value {
    fn from(value: String) -> Self { Value::String(value) }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self { Value::BigInt(value) }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self { Value::Array(items) }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self { Value::Object(entries) }
}

// ------------------------------- Display ----------------------------------- //

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(inner) => write!(f, "{inner}"),
            Value::Number(inner) => write!(f, "{inner}"),
            Value::String(inner) => write_json_string(f, inner),
            Value::BigInt(inner) => write!(f, "{inner}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(entries) => {
                f.write_str("{")?;
                for (i, (key, inner)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write_json_string(f, key)?;
                    write!(f, ":{inner}")?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_json_string(f: &mut fmt::Formatter<'_>, raw: &str) -> fmt::Result {
    // serde_json handles quoting and escapes; serializing a bare string
    // cannot actually fail.
    let quoted = serde_json::to_string(raw).map_err(|_| fmt::Error)?;
    f.write_str(&quoted)
}

// -------------------------------- Tests ------------------------------------ //
