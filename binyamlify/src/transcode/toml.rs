//! TOML transcoding: render typed values as TOML text.
//!
//! Mapping to TOML:
//!   - Value::Bool      -> TOML boolean
//!   - Value::Integer   -> TOML integer (if fits in i64, otherwise error)
//!   - Value::Float     -> TOML float
//!   - Value::String    -> TOML string
//!   - Value::Array     -> TOML array (objects inside become inline tables)
//!   - Value::Object    -> TOML table
//!
//! TOML requires the top-level value to be a table, so documents that read
//! as a sequence cannot be encoded.

use num_traits::ToPrimitive;
use toml_edit::{Array, DocumentMut, Formatted, InlineTable, Item, Table};

use super::Value;

/// Encode a Value as a TOML string.
pub fn encode(value: &Value) -> Result<String, String> {
    match value {
        Value::Object(entries) => {
            let mut doc = DocumentMut::new();
            for (key, value) in entries {
                doc[key.as_str()] = value_to_item(value)?;
            }
            Ok(doc.to_string())
        }
        _ => Err("TOML requires the top-level value to be a table/object".to_string()),
    }
}

fn value_to_item(value: &Value) -> Result<Item, String> {
    match value {
        Value::Object(entries) => {
            let mut table = Table::new();
            for (key, value) in entries {
                table.insert(key, value_to_item(value)?);
            }
            Ok(Item::Table(table))
        }
        _ => Ok(Item::Value(value_to_toml(value)?)),
    }
}

fn value_to_toml(value: &Value) -> Result<toml_edit::Value, String> {
    match value {
        Value::Bool(b) => Ok(toml_edit::Value::Boolean(Formatted::new(*b))),
        Value::Integer(n) => {
            let i = n
                .to_i64()
                .ok_or_else(|| format!("Integer {} too large for TOML (i64)", n))?;
            Ok(toml_edit::Value::Integer(Formatted::new(i)))
        }
        Value::Float(f) => Ok(toml_edit::Value::Float(Formatted::new(*f))),
        Value::String(s) => Ok(toml_edit::Value::String(Formatted::new(s.clone()))),
        Value::Array(items) => {
            let mut array = Array::new();
            for item in items {
                array.push(value_to_toml(item)?);
            }
            Ok(toml_edit::Value::Array(array))
        }
        Value::Object(entries) => {
            let mut inline = InlineTable::new();
            for (key, value) in entries {
                inline.insert(key, value_to_toml(value)?);
            }
            Ok(toml_edit::Value::InlineTable(inline))
        }
    }
}
