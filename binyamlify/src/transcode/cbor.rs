//! CBOR transcoding: render typed values as CBOR binary data.
//!
//! Mapping to CBOR:
//!   - Value::Bool    -> CBOR bool
//!   - Value::Integer -> CBOR integer (error beyond -2^64 to 2^64-1)
//!   - Value::Float   -> CBOR float
//!   - Value::String  -> CBOR text string
//!   - Value::Array   -> CBOR array
//!   - Value::Object  -> CBOR map with text string keys, source order kept

use ciborium::value::{Integer, Value as CborValue};
use num_traits::ToPrimitive;

use super::Value;

/// Encode a Value as CBOR bytes.
pub fn encode(value: &Value) -> Result<Vec<u8>, String> {
    let cbor = value_to_cbor(value)?;
    let mut buf = Vec::new();
    ciborium::ser::into_writer(&cbor, &mut buf).map_err(|e| format!("CBOR encode error: {}", e))?;
    Ok(buf)
}

fn value_to_cbor(value: &Value) -> Result<CborValue, String> {
    match value {
        Value::Bool(b) => Ok(CborValue::Bool(*b)),
        Value::Integer(n) => n
            .to_i128()
            .and_then(|i| Integer::try_from(i).ok())
            .map(CborValue::Integer)
            .ok_or_else(|| format!("Integer {} out of CBOR range", n)),
        Value::Float(f) => Ok(CborValue::Float(*f)),
        Value::String(s) => Ok(CborValue::Text(s.clone())),
        Value::Array(items) => items
            .iter()
            .map(value_to_cbor)
            .collect::<Result<_, _>>()
            .map(CborValue::Array),
        Value::Object(entries) => entries
            .iter()
            .map(|(k, v)| Ok((CborValue::Text(k.clone()), value_to_cbor(v)?)))
            .collect::<Result<_, String>>()
            .map(CborValue::Map),
    }
}
