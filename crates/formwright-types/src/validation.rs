//! Validator descriptors, data types and field errors.
//!
//! A field's `validate` list holds [`ValidatorDescriptor`]s. Schemas loaded
//! from JSON only produce the declared form `{ "type": ..., ...options }`;
//! callables and callable factories are attached in code.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors parsing the string tags used in schemas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown validator type \"{0}\"")]
    UnknownValidatorType(String),
    #[error("unknown data type \"{0}\"")]
    UnknownDataType(String),
}

/// The recognized validator types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidatorType {
    #[serde(rename = "required-validator")]
    Required,
    #[serde(rename = "min-length-validator")]
    MinLength,
    #[serde(rename = "max-length-validator")]
    MaxLength,
    #[serde(rename = "exact-length-validator")]
    ExactLength,
    #[serde(rename = "min-items-validator")]
    MinItems,
    #[serde(rename = "pattern-validator")]
    Pattern,
    #[serde(rename = "max-number-value")]
    MaxNumberValue,
    #[serde(rename = "min-number-value")]
    MinNumberValue,
}

impl ValidatorType {
    pub const ALL: [ValidatorType; 8] = [
        ValidatorType::Required,
        ValidatorType::MinLength,
        ValidatorType::MaxLength,
        ValidatorType::ExactLength,
        ValidatorType::MinItems,
        ValidatorType::Pattern,
        ValidatorType::MaxNumberValue,
        ValidatorType::MinNumberValue,
    ];

    /// The schema tag for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            ValidatorType::Required => "required-validator",
            ValidatorType::MinLength => "min-length-validator",
            ValidatorType::MaxLength => "max-length-validator",
            ValidatorType::ExactLength => "exact-length-validator",
            ValidatorType::MinItems => "min-items-validator",
            ValidatorType::Pattern => "pattern-validator",
            ValidatorType::MaxNumberValue => "max-number-value",
            ValidatorType::MinNumberValue => "min-number-value",
        }
    }

    /// Comma separated list of every tag, for error messages.
    pub fn expected_tags() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ValidatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidatorType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseError::UnknownValidatorType(s.to_string()))
    }
}

/// Runtime type a field's value must have when `dataType` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Integer,
    Number,
    String,
    Boolean,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Integer => "integer",
            DataType::Number => "number",
            DataType::String => "string",
            DataType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "integer" => Ok(DataType::Integer),
            "number" => Ok(DataType::Number),
            "string" => Ok(DataType::String),
            "boolean" => Ok(DataType::Boolean),
            other => Err(ParseError::UnknownDataType(other.to_string())),
        }
    }
}

/// A structured, translatable message.
///
/// `default_message` may contain `{key}` placeholders filled from `values`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageDescriptor {
    pub id: Option<String>,
    pub default_message: String,
    pub values: Map<String, Value>,
}

impl MessageDescriptor {
    /// Interpolate `values` into `default_message`.
    pub fn render(&self) -> String {
        let mut out = self.default_message.clone();
        for (key, value) in &self.values {
            let placeholder = format!("{{{key}}}");
            if out.contains(&placeholder) {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                out = out.replace(&placeholder, &text);
            }
        }
        out
    }
}

/// What a failing validator reports.
#[derive(Clone)]
pub enum FieldError {
    /// A plain message.
    Message(String),
    /// A structured message with interpolation values.
    Structured(MessageDescriptor),
    /// A validator still waiting for the whole array value. Only the
    /// array-level validator resolves these.
    Deferred(Validator),
}

impl FieldError {
    pub fn message(text: impl Into<String>) -> Self {
        FieldError::Message(text.into())
    }

    /// Human-readable text, if this error has any.
    pub fn text(&self) -> Option<String> {
        match self {
            FieldError::Message(msg) => Some(msg.clone()),
            FieldError::Structured(desc) => Some(desc.render()),
            FieldError::Deferred(_) => None,
        }
    }

    /// An empty message counts as "no error" when composing.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldError::Message(msg) => msg.is_empty(),
            FieldError::Structured(desc) => desc.default_message.is_empty() && desc.id.is_none(),
            FieldError::Deferred(_) => false,
        }
    }
}

impl PartialEq for FieldError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldError::Message(a), FieldError::Message(b)) => a == b,
            (FieldError::Structured(a), FieldError::Structured(b)) => a == b,
            (FieldError::Deferred(a), FieldError::Deferred(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::Message(msg) => f.debug_tuple("Message").field(msg).finish(),
            FieldError::Structured(desc) => f.debug_tuple("Structured").field(desc).finish(),
            FieldError::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("invalid"),
        }
    }
}

/// `None` means the value is valid.
pub type ValidationResult = Option<FieldError>;

type ValidateFn = dyn Fn(Option<&Value>, &Value) -> ValidationResult + Send + Sync;

/// An executable validator: `(value, all_values) -> error`.
///
/// `value` is `None` when the field is absent from the form values. Cloning
/// shares the underlying function, and the form store keys registrations by
/// that identity, so [`Validator::ptr_eq`] is meaningful.
#[derive(Clone)]
pub struct Validator(Arc<ValidateFn>);

impl Validator {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>, &Value) -> ValidationResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// The shared validator that never reports an error.
    pub fn noop() -> Self {
        static NOOP: OnceLock<Validator> = OnceLock::new();
        NOOP.get_or_init(|| Validator::new(|_, _| None)).clone()
    }

    pub fn call(&self, value: Option<&Value>, all_values: &Value) -> ValidationResult {
        (self.0)(value, all_values)
    }

    /// True when both handles point at the same function.
    pub fn ptr_eq(&self, other: &Validator) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the shared function, stable for as long as a clone lives.
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validator({:#x})", self.addr())
    }
}

type BuildFn = dyn Fn(&Map<String, Value>) -> Validator + Send + Sync;

/// A named function building a validator from a configuration object.
///
/// The engine caches what it builds by `name` plus the configuration's
/// content, so two equal configurations yield the same [`Validator`].
#[derive(Clone)]
pub struct ValidatorFactory {
    name: String,
    build: Arc<BuildFn>,
}

impl ValidatorFactory {
    pub fn new<F>(name: impl Into<String>, build: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> Validator + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            build: Arc::new(build),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn build(&self, options: &Map<String, Value>) -> Validator {
        (self.build)(options)
    }
}

impl fmt::Debug for ValidatorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorFactory")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The `{ "type": ..., ...options }` form of a validator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeclaredValidator {
    #[serde(rename = "type")]
    pub kind: ValidatorType,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl DeclaredValidator {
    pub fn new(kind: ValidatorType) -> Self {
        Self {
            kind,
            options: Map::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// One entry of a field's `validate` list.
#[derive(Debug, Clone)]
pub enum ValidatorDescriptor {
    /// A built-in validator looked up by type.
    Declared(DeclaredValidator),
    /// A ready validator, used as is.
    Callable(Validator),
    /// A factory invoked with `options`, memoized by content.
    Factory {
        factory: ValidatorFactory,
        options: Map<String, Value>,
    },
}

impl ValidatorDescriptor {
    pub fn declared(kind: ValidatorType) -> Self {
        ValidatorDescriptor::Declared(DeclaredValidator::new(kind))
    }
}

impl From<DeclaredValidator> for ValidatorDescriptor {
    fn from(declared: DeclaredValidator) -> Self {
        ValidatorDescriptor::Declared(declared)
    }
}

impl From<Validator> for ValidatorDescriptor {
    fn from(validator: Validator) -> Self {
        ValidatorDescriptor::Callable(validator)
    }
}

impl<'de> Deserialize<'de> for ValidatorDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        DeclaredValidator::deserialize(deserializer).map(ValidatorDescriptor::Declared)
    }
}
