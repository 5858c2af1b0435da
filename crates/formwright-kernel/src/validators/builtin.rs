//! The fixed table of built-in validators.
//!
//! Each [`ValidatorType`] maps to a pure factory that reads its options and
//! returns a [`Validator`]. Options:
//!
//! - `threshold` (also accepted as `treshold`): length and item counts
//! - `pattern`: regular expression for `pattern-validator`
//! - `value`: bound for the numeric validators
//! - `message`: string, or `{ id, defaultMessage }`, replacing the default
//! - `allowBlank`: let blank values through

use formwright_types::{
    DeclaredValidator, FieldError, MessageDescriptor, Validator, ValidatorType,
};
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::SchemaError;

pub const REQUIRED: &str = "Required";
pub const MIN_LENGTH: &str = "Must have at least {count} characters.";
pub const MAX_LENGTH: &str = "Can have maximum of {count} characters.";
pub const EXACT_LENGTH: &str = "Should be {count} characters long.";
pub const MIN_ITEMS: &str = "Must have at least {count} items.";
pub const PATTERN: &str = "Value does not match pattern.";
pub const NOT_A_NUMBER: &str = "Value is not a number.";
pub const LESS_THAN: &str = "Must be less than {count}.";
pub const GREATER_THAN: &str = "Must be greater than {count}.";

/// Build the validator a declared descriptor names.
pub fn build(declared: &DeclaredValidator) -> Result<Validator, SchemaError> {
    let kind = declared.kind;
    let opts = Options::parse(kind, &declared.options)?;

    let validator = match kind {
        ValidatorType::Required => Validator::new(move |value, _| {
            is_blank(value).then(|| opts.error(REQUIRED, None))
        }),
        ValidatorType::MinLength => {
            let min = opts.threshold()?;
            Validator::new(move |value, _| {
                if opts.skips(value) || length(value) >= min {
                    None
                } else {
                    Some(opts.error(MIN_LENGTH, Some(min)))
                }
            })
        }
        ValidatorType::MaxLength => {
            let max = opts.threshold()?;
            Validator::new(move |value, _| {
                if opts.skips(value) || length(value) <= max {
                    None
                } else {
                    Some(opts.error(MAX_LENGTH, Some(max)))
                }
            })
        }
        ValidatorType::ExactLength => {
            let exact = opts.threshold()?;
            Validator::new(move |value, _| {
                if opts.skips(value) || length(value) == exact {
                    None
                } else {
                    Some(opts.error(EXACT_LENGTH, Some(exact)))
                }
            })
        }
        ValidatorType::MinItems => {
            let min = opts.threshold()?;
            Validator::new(move |value, _| {
                if opts.skips(value) || length(value) >= min {
                    None
                } else {
                    Some(opts.error(MIN_ITEMS, Some(min)))
                }
            })
        }
        ValidatorType::Pattern => {
            let regex = opts.pattern()?;
            Validator::new(move |value, _| {
                if opts.skips(value) || regex.is_match(&stringify(value)) {
                    None
                } else {
                    Some(opts.error(PATTERN, None))
                }
            })
        }
        ValidatorType::MaxNumberValue => {
            let bound = opts.number()?;
            Validator::new(move |value, _| {
                if opts.skips(value) {
                    return None;
                }
                match as_number(value) {
                    None => Some(opts.error(NOT_A_NUMBER, None)),
                    Some(n) if n < bound => None,
                    Some(_) => Some(opts.error_with(LESS_THAN, number_value(bound))),
                }
            })
        }
        ValidatorType::MinNumberValue => {
            let bound = opts.number()?;
            Validator::new(move |value, _| {
                if opts.skips(value) {
                    return None;
                }
                match as_number(value) {
                    None => Some(opts.error(NOT_A_NUMBER, None)),
                    Some(n) if n > bound => None,
                    Some(_) => Some(opts.error_with(GREATER_THAN, number_value(bound))),
                }
            })
        }
    };
    Ok(validator)
}

/// Absent, null, whitespace-only text, or an empty list.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn length(value: Option<&Value>) -> u64 {
    let len = match value {
        None | Some(Value::Null) => 0,
        Some(Value::String(s)) => s.chars().count(),
        Some(Value::Array(items)) => items.len(),
        Some(Value::Object(map)) => map.len(),
        Some(other) => other.to_string().chars().count(),
    };
    len as u64
}

fn stringify(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn as_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Render whole bounds without a trailing `.0`.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

/// How the `message` option overrides the default text.
#[derive(Debug, Clone)]
enum MessageOverride {
    Default,
    Text(String),
    Descriptor {
        id: Option<String>,
        default_message: Option<String>,
    },
}

#[derive(Debug, Clone)]
struct Options {
    kind: ValidatorType,
    raw: Map<String, Value>,
    message: MessageOverride,
    allow_blank: bool,
}

impl Options {
    fn parse(kind: ValidatorType, raw: &Map<String, Value>) -> Result<Self, SchemaError> {
        let message = match raw.get("message") {
            None | Some(Value::Null) => MessageOverride::Default,
            Some(Value::String(text)) => MessageOverride::Text(text.clone()),
            Some(Value::Object(obj)) => {
                let id = obj.get("id").and_then(Value::as_str).map(str::to_string);
                let default_message = obj
                    .get("defaultMessage")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                if id.is_none() && default_message.is_none() {
                    MessageOverride::Default
                } else {
                    MessageOverride::Descriptor {
                        id,
                        default_message,
                    }
                }
            }
            Some(other) => {
                return Err(invalid(
                    kind,
                    format!("\"message\" must be a string or an object, received {other}"),
                ))
            }
        };
        let allow_blank = raw
            .get("allowBlank")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(Self {
            kind,
            raw: raw.clone(),
            message,
            allow_blank,
        })
    }

    fn threshold(&self) -> Result<u64, SchemaError> {
        let value = self.raw.get("threshold").or_else(|| self.raw.get("treshold"));
        let parsed = match value {
            Some(Value::Number(n)) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            }),
            Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| {
            invalid(
                self.kind,
                "requires a non-negative integer \"threshold\"".to_string(),
            )
        })
    }

    fn pattern(&self) -> Result<Regex, SchemaError> {
        let source = self
            .raw
            .get("pattern")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(self.kind, "requires a string \"pattern\"".to_string()))?;
        Regex::new(source).map_err(|e| invalid(self.kind, format!("pattern {source:?}: {e}")))
    }

    fn number(&self) -> Result<f64, SchemaError> {
        as_number(self.raw.get("value"))
            .ok_or_else(|| invalid(self.kind, "requires a numeric \"value\"".to_string()))
    }

    fn skips(&self, value: Option<&Value>) -> bool {
        self.allow_blank && is_blank(value)
    }

    fn error(&self, default: &str, count: Option<u64>) -> FieldError {
        self.error_with(default, count.map(Value::from).unwrap_or(Value::Null))
    }

    fn error_with(&self, default: &str, count: Value) -> FieldError {
        let mut values = Map::new();
        if !count.is_null() {
            values.insert("count".into(), count);
        }
        match &self.message {
            MessageOverride::Default => FieldError::Message(
                MessageDescriptor {
                    id: None,
                    default_message: default.to_string(),
                    values,
                }
                .render(),
            ),
            MessageOverride::Text(text) => FieldError::Message(text.clone()),
            MessageOverride::Descriptor {
                id,
                default_message,
            } => FieldError::Structured(MessageDescriptor {
                id: id.clone(),
                default_message: default_message
                    .clone()
                    .unwrap_or_else(|| default.to_string()),
                values,
            }),
        }
    }
}

fn invalid(kind: ValidatorType, reason: String) -> SchemaError {
    SchemaError::InvalidValidatorOptions {
        kind: kind.to_string(),
        reason,
    }
}
