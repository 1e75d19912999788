//! Declarative shapes: a JSON-schema-ish description, compiled to a decoder.
//!
//! A [`Shape`] is the data form of a decoder: load one from a schema file,
//! compile it once with [`to_decoder`], then run the resulting decoder over
//! any number of documents. Compilation only composes the primitives and
//! combinators from [`crate::decode`]; there is no second decoding engine
//! hiding in here.
//!
//! Shape-level mistakes (bad regex, empty enum, `required` naming an unknown
//! property) are [`ShapeError`]s at compile time. Document-level mismatches
//! stay [`DecodeError`]s at run time.

use indexmap::IndexMap;
use num_bigint::BigInt;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::decode::{
    array, bigint, boolean, boxed, enumerator, field, float, integer, nullable, number, optional,
    string, BoxDecoder, EnumMapping,
};
use crate::error::DecodeError;
use crate::value::Value;

// -------------------------------- Shape ------------------------------------ //

/// The wire format follows JSON Schema conventions loosely: a `type` tag,
/// `enum`/`pattern` refinements on scalars, `items` for arrays,
/// `properties` + `required` for objects, and a `nullable: true` escape hatch
/// on anything that can also be null. Unknown keys are ignored, as schema
/// tools conventionally do.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    /// Accept anything, reproducing the input as output.
    Any {},
    /// Accept exactly null.
    Null {},
    Boolean {
        #[serde(default)]
        nullable: bool,
    },
    String {
        #[serde(default)]
        nullable: bool,
        /// Anchored-as-written regex; the string must merely contain a match.
        #[serde(default)]
        pattern: Option<String>,
        #[serde(default, rename = "enum")]
        values: Option<Vec<String>>,
    },
    Number {
        #[serde(default)]
        nullable: bool,
        #[serde(default, rename = "enum")]
        values: Option<Vec<f64>>,
    },
    Integer {
        #[serde(default)]
        nullable: bool,
    },
    Float {
        #[serde(default)]
        nullable: bool,
    },
    Bigint {
        #[serde(default)]
        nullable: bool,
    },
    Array {
        #[serde(default)]
        nullable: bool,
        items: Box<Shape>,
    },
    Object {
        #[serde(default)]
        nullable: bool,
        properties: IndexMap<String, Shape>,
        /// Properties listed here must decode; the rest are optional and
        /// silently dropped when absent or mismatched.
        #[serde(default)]
        required: Vec<String>,
    },
}

#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("invalid pattern /{pattern}/: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("enum lists no values")]
    EmptyEnum,
    #[error("string shape cannot carry both enum and pattern")]
    EnumAndPattern,
    #[error("required names unknown property '{0}'")]
    UnknownRequired(String),
}

// ------------------------------- Decoded ----------------------------------- //

/// Output tree of a compiled shape. Structurally close to [`Value`], but
/// integers and floats are already split and optional absences are gone.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    BigInt(BigInt),
    List(Vec<Decoded>),
    Record(IndexMap<String, Decoded>),
}

impl Decoded {
    /// Render back to plain JSON, e.g. for `--emit`. Bigints become
    /// digits-as-string since JSON has no literal for them.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Decoded::Null => serde_json::Value::Null,
            Decoded::Bool(inner) => serde_json::Value::Bool(*inner),
            Decoded::Int(inner) => serde_json::Value::Number((*inner).into()),
            Decoded::Float(inner) => serde_json::Number::from_f64(*inner)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Decoded::Str(inner) => serde_json::Value::String(inner.clone()),
            Decoded::BigInt(inner) => serde_json::Value::String(inner.to_string()),
            Decoded::List(items) => {
                serde_json::Value::Array(items.iter().map(Decoded::to_json).collect())
            }
            Decoded::Record(entries) => serde_json::Value::Object(
                entries.iter().map(|(key, inner)| (key.clone(), inner.to_json())).collect(),
            ),
        }
    }
}

// ------------------------------- Compile ----------------------------------- //

/// Compile a shape into a runnable decoder. All shape validation happens
/// here, once; the returned decoder is pure and shareable across threads.
pub fn to_decoder(shape: &Shape) -> Result<BoxDecoder<Decoded>, ShapeError> {
    let base: BoxDecoder<Decoded> = match shape {
        Shape::Any {} => boxed(|value: &Value| Ok(reflect(value))),
        Shape::Null {} => boxed(|value: &Value| match value {
            Value::Null => Ok(Decoded::Null),
            other => Err(DecodeError::expected("null", other)),
        }),
        Shape::Boolean { .. } => boxed(|value: &Value| boolean(value).map(Decoded::Bool)),
        Shape::Integer { .. } => boxed(|value: &Value| integer(value).map(Decoded::Int)),
        Shape::Float { .. } => boxed(|value: &Value| float(value).map(Decoded::Float)),
        Shape::Bigint { .. } => boxed(|value: &Value| bigint(value).map(Decoded::BigInt)),
        Shape::Number { values, .. } => match values {
            Some(values) => boxed(enumerator(number_mapping(values)?)),
            None => boxed(|value: &Value| number(value).map(Decoded::Float)),
        },
        Shape::String { values, pattern, .. } => match (values, pattern) {
            (Some(_), Some(_)) => return Err(ShapeError::EnumAndPattern),
            (Some(values), None) => boxed(enumerator(string_mapping(values)?)),
            (None, Some(pattern)) => {
                let matcher = Regex::new(pattern).map_err(|source| ShapeError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })?;
                let pattern = pattern.clone();
                boxed(move |value: &Value| {
                    let decoded = string(value)?;
                    if matcher.is_match(&decoded) {
                        Ok(Decoded::Str(decoded))
                    } else {
                        Err(DecodeError::expected(
                            &format!("string matching /{pattern}/"),
                            value,
                        ))
                    }
                })
            }
            (None, None) => boxed(|value: &Value| string(value).map(Decoded::Str)),
        },
        Shape::Array { items, .. } => {
            let elements = array(to_decoder(items)?);
            boxed(move |value: &Value| elements(value).map(Decoded::List))
        }
        Shape::Object { properties, required, .. } => {
            for key in required {
                if !properties.contains_key(key) {
                    return Err(ShapeError::UnknownRequired(key.clone()));
                }
            }
            let mut props: Vec<(String, BoxDecoder<Option<Decoded>>)> =
                Vec::with_capacity(properties.len());
            for (key, prop) in properties {
                let projected = field(key.clone(), to_decoder(prop)?);
                let prop_decoder: BoxDecoder<Option<Decoded>> =
                    if required.iter().any(|name| name == key) {
                        boxed(move |value: &Value| projected(value).map(Some))
                    } else {
                        boxed(optional(projected))
                    };
                props.push((key.clone(), prop_decoder));
            }
            boxed(move |value: &Value| {
                // `field` would also reject non-objects, but a shape with no
                // properties still has to insist on an object here.
                if !matches!(value, Value::Object(_)) {
                    return Err(DecodeError::expected("object", value));
                }
                let mut record = IndexMap::with_capacity(props.len());
                for (key, prop) in &props {
                    if let Some(decoded) = prop(value)? {
                        record.insert(key.clone(), decoded);
                    }
                }
                Ok(Decoded::Record(record))
            })
        }
    };

    if !is_nullable(shape) {
        return Ok(base);
    }
    let inner = nullable(base);
    Ok(boxed(move |value: &Value| {
        inner(value).map(|decoded| decoded.unwrap_or(Decoded::Null))
    }))
}

fn is_nullable(shape: &Shape) -> bool {
    match shape {
        Shape::Any {} | Shape::Null {} => false,
        Shape::Boolean { nullable }
        | Shape::Integer { nullable }
        | Shape::Float { nullable }
        | Shape::Bigint { nullable } => *nullable,
        Shape::String { nullable, .. } => *nullable,
        Shape::Number { nullable, .. } => *nullable,
        Shape::Array { nullable, .. } => *nullable,
        Shape::Object { nullable, .. } => *nullable,
    }
}

fn string_mapping(values: &[String]) -> Result<EnumMapping<Decoded>, ShapeError> {
    if values.is_empty() {
        return Err(ShapeError::EmptyEnum);
    }
    let mut mapping = EnumMapping::new();
    for value in values {
        mapping = mapping.variant(value.clone(), Decoded::Str(value.clone()));
    }
    Ok(mapping)
}

fn number_mapping(values: &[f64]) -> Result<EnumMapping<Decoded>, ShapeError> {
    if values.is_empty() {
        return Err(ShapeError::EmptyEnum);
    }
    let mut mapping = EnumMapping::new();
    for value in values {
        mapping = mapping.variant(*value, Decoded::Float(*value));
    }
    Ok(mapping)
}

// Identity pass for `any`: mirror the input into the output tree.
fn reflect(value: &Value) -> Decoded {
    match value {
        Value::Null => Decoded::Null,
        Value::Bool(inner) => Decoded::Bool(*inner),
        Value::Number(inner) => match inner.as_i64() {
            Some(exact) => Decoded::Int(exact),
            None => Decoded::Float(inner.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(inner) => Decoded::Str(inner.clone()),
        Value::BigInt(inner) => Decoded::BigInt(inner.clone()),
        Value::Array(items) => Decoded::List(items.iter().map(reflect).collect()),
        Value::Object(entries) => Decoded::Record(
            entries.iter().map(|(key, inner)| (key.clone(), reflect(inner))).collect(),
        ),
    }
}

// -------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PERSON_SCHEMA: &str = r#"{
        "type": "object",
        "properties": {
            "name": { "type": "string" },
            "age": { "type": "integer" },
            "favouriteNumbers": { "type": "array", "items": { "type": "integer" } },
            "favouriteColour": { "type": "string", "nullable": true },
            "nickname": { "type": "string" }
        },
        "required": ["name", "age", "favouriteNumbers", "favouriteColour"]
    }"#;

    fn compile(schema: &str) -> BoxDecoder<Decoded> {
        let shape: Shape = serde_json::from_str(schema).unwrap();
        to_decoder(&shape).unwrap()
    }

    #[test]
    fn person_schema_decodes_a_conforming_document() {
        let decoder = compile(PERSON_SCHEMA);
        let doc = Value::from(json!({
            "name": "Bob",
            "age": 42,
            "favouriteNumbers": [1, 2, 3],
            "favouriteColour": null,
        }));
        let decoded = decoder(&doc).unwrap();
        assert_eq!(
            decoded.to_json(),
            json!({
                "name": "Bob",
                "age": 42,
                "favouriteNumbers": [1, 2, 3],
                "favouriteColour": null,
            }),
        );
    }

    #[test]
    fn missing_required_property_fails() {
        let decoder = compile(PERSON_SCHEMA);
        let doc = Value::from(json!({
            "age": 42,
            "favouriteNumbers": [],
            "favouriteColour": "red",
        }));
        let err = decoder(&doc).unwrap_err();
        assert_eq!(err.to_string(), "expected field 'name'");
    }

    #[test]
    fn optional_property_is_dropped_when_absent_or_mismatched() {
        let decoder = compile(PERSON_SCHEMA);
        let absent = Value::from(json!({
            "name": "Bob", "age": 1, "favouriteNumbers": [], "favouriteColour": null,
        }));
        let mistyped = Value::from(json!({
            "name": "Bob", "age": 1, "favouriteNumbers": [], "favouriteColour": null,
            "nickname": 99,
        }));
        for doc in [absent, mistyped] {
            let Decoded::Record(record) = decoder(&doc).unwrap() else {
                panic!("expected a record");
            };
            assert!(!record.contains_key("nickname"));
        }
    }

    #[test]
    fn required_failure_names_the_nested_node() {
        let decoder = compile(PERSON_SCHEMA);
        let doc = Value::from(json!({
            "name": "Bob",
            "age": 42,
            "favouriteNumbers": [1, 2, "3"],
            "favouriteColour": null,
        }));
        let err = decoder(&doc).unwrap_err();
        assert_eq!(err.path(), "favouriteNumbers[2]");
    }

    #[test]
    fn nested_object_paths_compose() {
        let decoder = compile(
            r#"{
                "type": "object",
                "properties": {
                    "pet": {
                        "type": "object",
                        "properties": { "age": { "type": "integer" } },
                        "required": ["age"]
                    }
                },
                "required": ["pet"]
            }"#,
        );
        let err = decoder(&Value::from(json!({"pet": {"age": "old"}}))).unwrap_err();
        assert_eq!(err.path(), "pet.age");
    }

    #[test]
    fn empty_object_shape_still_requires_an_object() {
        let decoder = compile(r#"{"type": "object", "properties": {}}"#);
        assert!(decoder(&Value::from(json!({}))).is_ok());
        let err = decoder(&Value::from(json!([]))).unwrap_err();
        assert_eq!(err.to_string(), "expected object, got []");
    }

    #[test]
    fn record_preserves_property_order() {
        let decoder = compile(
            r#"{
                "type": "object",
                "properties": {
                    "zeta": { "type": "integer" },
                    "alpha": { "type": "integer" }
                },
                "required": ["zeta", "alpha"]
            }"#,
        );
        let Decoded::Record(record) = decoder(&Value::from(json!({"alpha": 1, "zeta": 2}))).unwrap()
        else {
            panic!("expected a record");
        };
        let keys = record.keys().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn nullable_scalar_accepts_null() {
        let decoder = compile(r#"{"type": "integer", "nullable": true}"#);
        assert_eq!(decoder(&Value::Null), Ok(Decoded::Null));
        assert_eq!(decoder(&Value::from(json!(7))), Ok(Decoded::Int(7)));
        assert!(decoder(&Value::from(json!("7"))).is_err());
    }

    #[test]
    fn null_shape_accepts_exactly_null() {
        let decoder = compile(r#"{"type": "null"}"#);
        assert_eq!(decoder(&Value::Null), Ok(Decoded::Null));
        let err = decoder(&Value::from(json!(0))).unwrap_err();
        assert_eq!(err.to_string(), "expected null, got 0");
    }

    #[test]
    fn any_shape_reflects_the_input() {
        let decoder = compile(r#"{"type": "any"}"#);
        let raw = json!({"mixed": [1, "two", null, {"deep": true}], "n": 2.5});
        let decoded = decoder(&Value::from(raw.clone())).unwrap();
        assert_eq!(decoded.to_json(), raw);
    }

    #[test]
    fn pattern_refines_strings() {
        let decoder = compile(r#"{"type": "string", "pattern": "^a+$"}"#);
        assert_eq!(decoder(&Value::from(json!("aaa"))), Ok(Decoded::Str("aaa".to_string())));
        let err = decoder(&Value::from(json!("bbb"))).unwrap_err();
        assert_eq!(err.to_string(), "expected string matching /^a+$/, got \"bbb\"");
        // Non-strings fail the kind gate first.
        let err = decoder(&Value::from(json!(5))).unwrap_err();
        assert_eq!(err.to_string(), "expected string, got 5");
    }

    #[test]
    fn string_enum_refines_strings() {
        let decoder = compile(r#"{"type": "string", "enum": ["red", "green"]}"#);
        assert_eq!(decoder(&Value::from(json!("red"))), Ok(Decoded::Str("red".to_string())));
        let err = decoder(&Value::from(json!("blue"))).unwrap_err();
        assert_eq!(err.to_string(), "expected enum value, got \"blue\"");
    }

    #[test]
    fn number_enum_compares_by_value() {
        let decoder = compile(r#"{"type": "number", "enum": [1, 2.5]}"#);
        assert_eq!(decoder(&Value::from(json!(1.0))), Ok(Decoded::Float(1.0)));
        assert_eq!(decoder(&Value::from(json!(2.5))), Ok(Decoded::Float(2.5)));
        assert!(decoder(&Value::from(json!(3))).is_err());
    }

    #[test]
    fn shape_mistakes_fail_at_compile_time() {
        let empty: Shape = serde_json::from_str(r#"{"type": "string", "enum": []}"#).unwrap();
        assert!(matches!(to_decoder(&empty), Err(ShapeError::EmptyEnum)));

        let both: Shape =
            serde_json::from_str(r#"{"type": "string", "enum": ["a"], "pattern": "a"}"#).unwrap();
        assert!(matches!(to_decoder(&both), Err(ShapeError::EnumAndPattern)));

        let bad_pattern: Shape =
            serde_json::from_str(r#"{"type": "string", "pattern": "("}"#).unwrap();
        assert!(matches!(to_decoder(&bad_pattern), Err(ShapeError::Pattern { .. })));

        let unknown: Shape = serde_json::from_str(
            r#"{"type": "object", "properties": {}, "required": ["ghost"]}"#,
        )
        .unwrap();
        match to_decoder(&unknown) {
            Err(ShapeError::UnknownRequired(name)) => assert_eq!(name, "ghost"),
            Err(other) => panic!("expected UnknownRequired, got {other:?}"),
            Ok(_) => panic!("expected UnknownRequired, got a decoder"),
        }
    }

    #[test]
    fn unknown_type_tag_is_a_parse_error() {
        let err = serde_json::from_str::<Shape>(r#"{"type": "uuid"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown variant"));
    }
}
