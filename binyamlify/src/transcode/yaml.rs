//! YAML transcoding: render typed values as full YAML text.
//!
//! Mapping to YAML:
//!   - Value::Bool      -> YAML bool
//!   - Value::Integer   -> YAML integer (as string if beyond i64/u64)
//!   - Value::Float     -> YAML float
//!   - Value::String    -> YAML string, quoted where YAML would retype it
//!   - Value::Array     -> YAML sequence
//!   - Value::Object    -> YAML mapping, source order kept

use num_traits::ToPrimitive;

use super::Value;

/// Encode a Value as a YAML string.
pub fn encode(value: &Value) -> Result<String, String> {
    serde_yaml::to_string(&value_to_yaml(value)).map_err(|e| format!("YAML encode error: {}", e))
}

fn value_to_yaml(value: &Value) -> serde_yaml::Value {
    match value {
        Value::Bool(b) => serde_yaml::Value::Bool(*b),
        Value::Integer(n) => {
            if let Some(i) = n.to_i64() {
                serde_yaml::Value::Number(serde_yaml::Number::from(i))
            } else if let Some(u) = n.to_u64() {
                serde_yaml::Value::Number(serde_yaml::Number::from(u))
            } else {
                // YAML has no arbitrary-precision integers
                serde_yaml::Value::String(n.to_string())
            }
        }
        Value::Float(f) => serde_yaml::Value::Number(serde_yaml::Number::from(*f)),
        Value::String(s) => serde_yaml::Value::String(s.clone()),
        Value::Array(items) => serde_yaml::Value::Sequence(items.iter().map(value_to_yaml).collect()),
        Value::Object(entries) => {
            let mut map = serde_yaml::Mapping::new();
            for (k, v) in entries {
                map.insert(serde_yaml::Value::String(k.clone()), value_to_yaml(v));
            }
            serde_yaml::Value::Mapping(map)
        }
    }
}
