//! Decoder combinators (single-file).
//!
//! A decoder is a plain function from a value tree to a typed result, and
//! combinators assemble bigger decoders out of smaller ones. Stream a
//! document in, get either the typed value or a [`DecodeError`] whose trace
//! names the exact node that refused.
//!
//! Design goals:
//! - Failure is an explicit `Result`; nothing unwinds. `optional` is the one
//!   combinator that converts a failure into a success.
//! - Fail fast: the first mismatch wins, later siblings are never visited.
//! - Errors re-wrap on the way out (one `at field`/`at index` annotation per
//!   enclosing frame), never mutate in place.
//! - Every decoder is `Send + Sync`, so one composed decoder can be shared
//!   across threads (the CLI fans out with rayon on exactly that basis).

use num_bigint::BigInt;
use ordered_float::OrderedFloat;
use serde_json::Number;

use crate::error::{DecodeError, DecodeResult};
use crate::value::Value;

// ------------------------------- Decoder ---------------------------------- //

/// Anything callable as `&Value -> DecodeResult<T>` and shareable across
/// threads. Closures and fn items qualify automatically via the blanket impl.
pub trait Decoder<T>: Fn(&Value) -> DecodeResult<T> + Send + Sync {}

impl<T, F> Decoder<T> for F where F: Fn(&Value) -> DecodeResult<T> + Send + Sync {}

/// Type-erased decoder, for pipelines assembled at runtime (the shape
/// compiler builds trees of these).
pub type BoxDecoder<T> = Box<dyn Fn(&Value) -> DecodeResult<T> + Send + Sync>;

pub fn boxed<T>(decoder: impl Decoder<T> + 'static) -> BoxDecoder<T> {
    Box::new(decoder)
}

// ------------------------------ Primitives -------------------------------- //

pub fn boolean(value: &Value) -> DecodeResult<bool> {
    match value {
        Value::Bool(inner) => Ok(*inner),
        other => Err(DecodeError::expected("boolean", other)),
    }
}

pub fn string(value: &Value) -> DecodeResult<String> {
    match value {
        Value::String(inner) => Ok(inner.clone()),
        other => Err(DecodeError::expected("string", other)),
    }
}

/// Shared numeric-kind gate. `integer` and `float` refine on top of this, so
/// a non-numeric input reports "expected number" no matter which of the three
/// numeric decoders rejected it.
fn numeric(value: &Value) -> DecodeResult<&Number> {
    match value {
        Value::Number(inner) => Ok(inner),
        other => Err(DecodeError::expected("number", other)),
    }
}

/// Any JSON number, integral or not, as `f64`.
pub fn number(value: &Value) -> DecodeResult<f64> {
    numeric(value).map(number_as_f64)
}

/// A number with no fractional part, as `i64`. `2.0` counts as integral;
/// integral values outside the `i64` range are rejected.
pub fn integer(value: &Value) -> DecodeResult<i64> {
    let inner = numeric(value)?;
    if let Some(exact) = inner.as_i64() {
        return Ok(exact);
    }
    // u64 overflow and float representations land here. Integral f64 below
    // 2^63 convert exactly, so the bound doubles as the range check.
    let wide = number_as_f64(inner);
    if wide.fract() == 0.0 && wide >= i64::MIN as f64 && wide < i64::MAX as f64 {
        return Ok(wide as i64);
    }
    Err(DecodeError::expected("integer", value))
}

/// A number with a fractional part, as `f64`. The fractional side of the
/// [`integer`]/[`float`] split: `12` and `2.0` are integral, so both are
/// rejected here.
pub fn float(value: &Value) -> DecodeResult<f64> {
    let inner = numeric(value)?;
    let wide = number_as_f64(inner);
    let integral = inner.as_i64().is_some() || inner.as_u64().is_some() || wide.fract() == 0.0;
    if integral {
        return Err(DecodeError::expected("float", value));
    }
    Ok(wide)
}

/// An arbitrary-precision integer. Only matches [`Value::BigInt`]; ordinary
/// numbers are a different kind and never coerce.
pub fn bigint(value: &Value) -> DecodeResult<BigInt> {
    match value {
        Value::BigInt(inner) => Ok(inner.clone()),
        other => Err(DecodeError::expected("bigint", other)),
    }
}

// serde_json numbers always view as f64; huge u64/i64 round but stay finite.
fn number_as_f64(inner: &Number) -> f64 {
    inner.as_f64().unwrap_or(f64::NAN)
}

// ------------------------------ Combinators ------------------------------- //

/// Decode every element with `item`, preserving order. Stops at the first
/// failing element and annotates the error with its index.
pub fn array<T>(item: impl Decoder<T>) -> impl Decoder<Vec<T>> {
    move |value: &Value| match value {
        Value::Array(elements) => {
            let mut out = Vec::with_capacity(elements.len());
            for (index, element) in elements.iter().enumerate() {
                match item(element) {
                    Ok(decoded) => out.push(decoded),
                    Err(err) => return Err(err.at_index(index)),
                }
            }
            Ok(out)
        }
        other => Err(DecodeError::expected("array", other)),
    }
}

/// Project a key out of an object, then decode the mapped value with `inner`.
/// Presence is structural: a key mapped to null is present (and handed to
/// `inner`), a missing key is "expected field". Arrays and null are not
/// objects here, even though both could be squinted at as key-value shaped.
pub fn field<T>(key: impl Into<String>, inner: impl Decoder<T>) -> impl Decoder<T> {
    let key = key.into();
    move |value: &Value| match value {
        Value::Object(entries) => match entries.get(key.as_str()) {
            Some(mapped) => inner(mapped).map_err(|err| err.at_field(&key)),
            None => Err(DecodeError::missing_field(&key)),
        },
        other => Err(DecodeError::expected("object", other)),
    }
}

/// Absorb failure: any `inner` error becomes `None`, losing the reason.
/// "Absent" and "present but mistyped" are deliberately indistinguishable.
pub fn optional<T>(inner: impl Decoder<T>) -> impl Decoder<Option<T>> {
    move |value: &Value| match inner(value) {
        Ok(decoded) => Ok(Some(decoded)),
        Err(_) => Ok(None),
    }
}

/// Null passes through as `None` without consulting `inner`; everything else
/// is delegated, and a delegated failure propagates unmodified.
pub fn nullable<T>(inner: impl Decoder<T>) -> impl Decoder<Option<T>> {
    move |value: &Value| match value {
        Value::Null => Ok(None),
        other => inner(other).map(Some),
    }
}

// ----------------------------- Enumerations -------------------------------- //

/// A comparison token in an enum mapping: enum-like values are always
/// identified by a string or a number on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Str(String),
    Num(OrderedFloat<f64>),
}

impl From<&str> for Token {
    fn from(value: &str) -> Self { Token::Str(value.to_string()) }
}

impl From<String> for Token {
    fn from(value: String) -> Self { Token::Str(value) }
}

impl From<i64> for Token {
    fn from(value: i64) -> Self { Token::Num(OrderedFloat(value as f64)) }
}

impl From<i32> for Token {
    fn from(value: i32) -> Self { Token::Num(OrderedFloat(value as f64)) }
}

impl From<f64> for Token {
    fn from(value: f64) -> Self { Token::Num(OrderedFloat(value)) }
}

/// An explicit token -> variant table for [`enumerator`]. Entries keep
/// insertion order; nothing is inferred from the variant type itself, so a
/// numeric table carries no reverse entries to trip over.
#[derive(Debug, Clone, Default)]
pub struct EnumMapping<T> {
    entries: Vec<(Token, T)>,
}

impl<T> EnumMapping<T> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Add a variant identified by an explicit token.
    pub fn variant(mut self, token: impl Into<Token>, value: T) -> Self {
        self.entries.push((token.into(), value));
        self
    }

    /// Add a variant identified by the next implicit ordinal: one past the
    /// most recent numeric token, starting at 0. The usual auto-increment
    /// rule for valueless enum declarations.
    pub fn ordinal(mut self, value: T) -> Self {
        let next = self
            .entries
            .iter()
            .rev()
            .find_map(|(token, _)| match token {
                Token::Num(ordinal) => Some(ordinal.0 + 1.0),
                Token::Str(_) => None,
            })
            .unwrap_or(0.0);
        self.entries.push((Token::Num(OrderedFloat(next)), value));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reverse-lookup decoder over an [`EnumMapping`]: scan entries in insertion
/// order, first token that equals the input wins. An empty mapping rejects
/// everything, matching nothing rather than inventing a default.
pub fn enumerator<T>(mapping: EnumMapping<T>) -> impl Decoder<T>
where
    T: Clone + Send + Sync,
{
    move |value: &Value| {
        for (token, variant) in &mapping.entries {
            if token_matches(token, value) {
                return Ok(variant.clone());
            }
        }
        Err(DecodeError::expected_enum(value))
    }
}

// Value equality, not representation equality: token 1 matches input 1.0.
// Bigints never match numeric tokens; they are a different kind entirely.
fn token_matches(token: &Token, value: &Value) -> bool {
    match (token, value) {
        (Token::Str(expected), Value::String(found)) => expected == found,
        (Token::Num(expected), Value::Number(found)) => expected.0 == number_as_f64(found),
        _ => false,
    }
}

// -------------------------------- Tests ------------------------------------ //
