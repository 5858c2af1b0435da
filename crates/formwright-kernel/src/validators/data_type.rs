//! Runtime type checks for `dataType`.

use formwright_types::{DataType, FieldError, Validator};
use serde_json::Value;

/// A validator failing with `Field value has to be {kind}` when a present
/// value has the wrong runtime type. Absent and null values pass.
pub fn data_type_validator(kind: DataType) -> Validator {
    Validator::new(move |value, _| match value {
        None | Some(Value::Null) => None,
        Some(v) if matches_type(kind, v) => None,
        Some(_) => Some(FieldError::message(format!("Field value has to be {kind}"))),
    })
}

fn matches_type(kind: DataType, value: &Value) -> bool {
    match (kind, value) {
        (DataType::String, Value::String(_)) => true,
        (DataType::Boolean, Value::Bool(_)) => true,
        (DataType::Number, Value::Number(_)) => true,
        (DataType::Integer, Value::Number(n)) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        _ => false,
    }
}
