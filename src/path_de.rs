//! Deserialize with JSON-path context in error messages.
//!
//! Schema files are hand-written, so "missing field `items` at
//! properties.tags" beats a bare line/column pair.

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("at JSON path {path}: {source}")]
pub struct PathError {
    path: String,
    #[source]
    source: serde_json::Error,
}

pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, PathError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| PathError {
        path: err.path().to_string(),
        source: err.into_inner(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;

    #[test]
    fn valid_input_deserializes() {
        let shape: Shape = from_str_with_path(r#"{"type": "integer"}"#).unwrap();
        assert!(matches!(shape, Shape::Integer { nullable: false }));
    }

    #[test]
    fn errors_carry_the_json_path() {
        let err = from_str_with_path::<Shape>(
            r#"{"type": "object", "properties": {"age": {"type": 5}}}"#,
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("at JSON path "), "got: {message}");
        assert!(message.contains("properties.age"), "got: {message}");
    }
}
