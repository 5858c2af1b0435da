//! Visibility conditions.
//!
//! A condition makes a field's presence depend on the value of one other
//! field, named by `when`. Exactly one predicate mode is active when it is
//! evaluated, picked in this order:
//!
//! 1. `isNotEmpty`
//! 2. `isEmpty`
//! 3. `pattern` (inverted by `notMatch`)
//! 4. equality / membership against `is` (inverted by `notMatch`)

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A declarative visibility rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Path of the watched field.
    pub when: String,
    /// Expected value, or list of accepted values.
    ///
    /// `Some(Value::Null)` means the schema said `is: null`; `None` means the
    /// key was absent.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub is: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_empty: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_not_empty: Option<bool>,
    /// Regular expression tested against the watched value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Inverts the pattern and equality modes.
    #[serde(default)]
    pub not_match: bool,
}

/// Keeps an explicit `null` distinguishable from a missing key.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Condition {
    /// Start a condition watching the field at `path`.
    pub fn when(path: impl Into<String>) -> Self {
        Self {
            when: path.into(),
            is: None,
            is_empty: None,
            is_not_empty: None,
            pattern: None,
            not_match: false,
        }
    }

    /// Match when the watched value equals `value` (or is contained in it,
    /// when `value` is an array).
    pub fn is(mut self, value: impl Into<Value>) -> Self {
        self.is = Some(value.into());
        self
    }

    pub fn is_empty(mut self, flag: bool) -> Self {
        self.is_empty = Some(flag);
        self
    }

    pub fn is_not_empty(mut self, flag: bool) -> Self {
        self.is_not_empty = Some(flag);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Invert the outcome of the pattern or equality mode.
    pub fn not_match(mut self) -> Self {
        self.not_match = true;
        self
    }

    /// True when at least one predicate key is present.
    pub fn has_predicate(&self) -> bool {
        self.is.is_some()
            || self.is_empty.is_some()
            || self.is_not_empty.is_some()
            || self.pattern.is_some()
    }
}
