//! Decode failures, with the path to the offending node.
//!
//! There is exactly one failure type. Decoders differ only in the message
//! they produce, and enclosing combinators annotate rather than rebuild:
//! each `field`/`array` frame appends one path segment on the way out, so
//! the rendered trace reads innermost-first.

use std::fmt::Write as _;

use thiserror::Error;

use crate::value::Value;

pub type DecodeResult<T> = Result<T, DecodeError>;

// ----------------------------- DecodeError --------------------------------- //

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{description}{}", trace_suffix(.trace))]
pub struct DecodeError {
    description: String,
    /// Innermost segment first; pushed as the error bubbles outward.
    trace: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq)]
enum PathSegment {
    Field(String),
    Index(usize),
}

impl DecodeError {
    /// Kind or refinement mismatch. The offending value is quoted in full;
    /// that is usually the fastest way to see what the producer actually sent.
    pub fn expected(what: &str, found: &Value) -> Self {
        Self {
            description: format!("expected {what}, got {found}"),
            trace: Vec::new(),
        }
    }

    /// A required key is absent from an object.
    pub fn missing_field(key: &str) -> Self {
        Self {
            description: format!("expected field '{key}'"),
            trace: Vec::new(),
        }
    }

    /// No entry of an enum mapping matched the value.
    pub fn expected_enum(found: &Value) -> Self {
        Self {
            description: format!("expected enum value, got {found}"),
            trace: Vec::new(),
        }
    }

    pub fn at_index(mut self, index: usize) -> Self {
        self.trace.push(PathSegment::Index(index));
        self
    }

    pub fn at_field(mut self, key: &str) -> Self {
        self.trace.push(PathSegment::Field(key.to_string()));
        self
    }

    /// The failure message without any path trace.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The trace as a JSON-ish path, outermost-first: `favouriteNumbers[2]`.
    /// Empty when the failure happened at the root.
    pub fn path(&self) -> String {
        let mut out = String::new();
        for segment in self.trace.iter().rev() {
            match segment {
                PathSegment::Field(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
                PathSegment::Index(index) => {
                    let _ = write!(out, "[{index}]");
                }
            }
        }
        out
    }
}

fn trace_suffix(trace: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in trace {
        match segment {
            PathSegment::Field(key) => {
                let _ = write!(out, "\n\tat field '{key}'");
            }
            PathSegment::Index(index) => {
                let _ = write!(out, "\n\tat index {index}");
            }
        }
    }
    out
}

// -------------------------------- Tests ------------------------------------ //
