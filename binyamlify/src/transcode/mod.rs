//! Transcoding of the intermediate tree into other data formats.
//!
//! Documents carry no types, so every scalar is text. With inference enabled
//! scalars that read as booleans, integers, or floats are typed before they
//! are encoded.

pub mod cbor;
pub mod toml;
pub mod yaml;

use libyamlify::Node;
use num_bigint::BigInt;

/// A `Node` with its scalars typed.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Integer(BigInt),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    /// Entries in source order.
    Object(Vec<(String, Value)>),
}

impl Value {
    pub fn from_node(node: &Node, infer: bool) -> Value {
        match node {
            Node::Scalar(text) if infer => infer_scalar(text),
            Node::Scalar(text) => Value::String(text.clone()),
            Node::Mapping(mapping) => Value::Object(
                mapping
                    .iter()
                    .map(|(key, value)| (key.to_string(), Value::from_node(value, infer)))
                    .collect(),
            ),
            Node::Sequence(items) => Value::Array(
                items
                    .iter()
                    .map(|item| Value::from_node(item, infer))
                    .collect(),
            ),
        }
    }
}

fn infer_scalar(text: &str) -> Value {
    match text {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(n) = text.parse::<BigInt>() {
                return Value::Integer(n);
            }
            if is_decimal(text) {
                if let Ok(f) = text.parse::<f64>() {
                    return Value::Float(f);
                }
            }
            Value::String(text.to_string())
        }
    }
}

// Rules out the named values (inf, NaN) the float parser also accepts.
fn is_decimal(text: &str) -> bool {
    text.bytes().any(|b| b.is_ascii_digit())
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
}
