//! Validator composition.

use formwright_types::{FieldError, Validator};
use serde_json::Value;

/// Run `validators` in order and report the first non-empty error. Later
/// validators do not run once one fails. An empty list yields the shared
/// no-op validator.
pub fn compose(validators: Vec<Validator>) -> Validator {
    if validators.is_empty() {
        return Validator::noop();
    }
    Validator::new(move |value, all_values| {
        validators
            .iter()
            .filter_map(|v| v.call(value, all_values))
            .find(|err| !err.is_empty())
    })
}

/// Wrap a field's composed validator so it judges the whole collection.
///
/// An absent, null or empty array is presented to `inner` as absent, so
/// "required" and "min items" apply to the collection. A
/// [`FieldError::Deferred`] result is invoked once more with the raw array.
pub fn array_validator(inner: Validator) -> Validator {
    Validator::new(move |value, all_values| {
        let presented = match value {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) if items.is_empty() => None,
            Some(v) => Some(v),
        };
        match inner.call(presented, all_values)? {
            FieldError::Deferred(next) => next.call(value, all_values),
            err => Some(err),
        }
    })
}
