//! Decode dynamically-shaped JSON into typed Rust values.
//!
//! The core is a small combinator calculus over an untyped [`Value`] tree:
//! primitives for each scalar kind, and `array`/`field`/`optional`/
//! `nullable`/`enumerator` to compose them. A failed decode is an explicit
//! [`DecodeError`] whose trace names the exact node that refused,
//! innermost-first.
//!
//! Layers on top of the core:
//! - [`shape`]: a JSON-schema-ish description compiled to a decoder.
//! - [`codegen`]: emit strict Rust model types plus decode functions.
//! - [`cli`]: check documents in parallel, or write the generated model.
//!
//! ```
//! use json_shape::{array, field, integer, string, Value};
//!
//! let doc = Value::from_json(r#"{"name": "Bob", "scores": [7, 9]}"#).unwrap();
//! let name = field("name", string)(&doc).unwrap();
//! let scores = field("scores", array(integer))(&doc).unwrap();
//! assert_eq!((name.as_str(), scores), ("Bob", vec![7, 9]));
//! ```

pub mod cli;
pub mod codegen;
pub mod decode;
pub mod error;
pub mod jq_exec;
pub mod path_de;
pub mod shape;
pub mod value;

pub use decode::{
    array, bigint, boolean, boxed, enumerator, field, float, integer, nullable, number, optional,
    string, BoxDecoder, Decoder, EnumMapping, Token,
};
pub use error::{DecodeError, DecodeResult};
pub use shape::{to_decoder, Decoded, Shape, ShapeError};
pub use value::{Kind, Value};

// Generated models name bigints without a direct num-bigint dependency.
pub use num_bigint::BigInt;
