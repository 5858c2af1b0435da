//! Schema structural errors.
//!
//! These are fatal: any of them aborts the whole render before a single field
//! mounts. Field validation failures are not errors in this sense; they are
//! [`FieldError`](formwright_types::FieldError) values held by the store.

use thiserror::Error;

use crate::components::LayoutKey;

/// A schema the engine refuses to render.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("form schema must be an object, received {0}")]
    NotAnObject(&'static str),

    #[error("component of type {owner} must contain \"fields\" property of type array, received undefined")]
    MissingFields { owner: String },

    #[error("component of type {owner} must contain \"fields\" property of type array, received type: {found}")]
    FieldsNotArray { owner: String, found: &'static str },

    #[error("each fields item must be an object or an array, received {0}")]
    NotADescriptor(&'static str),

    #[error("each fields item must have \"component\" property")]
    MissingComponent,

    #[error("field of component \"{component}\" must have \"name\", \"key\" or \"title\" property")]
    MissingIdentity { component: String },

    #[error("component of type \"{component}\" is not present in the component registry, registered: [{registered}]")]
    UnknownComponent {
        component: String,
        registered: String,
    },

    #[error("component \"{component}\" is declared in the registry but has no renderer")]
    InvalidRenderer { component: String },

    #[error("field \"{field}\": {reason}")]
    InvalidCondition { field: String, reason: String },

    #[error("field \"{field}\": pattern {pattern:?} does not compile: {reason}")]
    InvalidPattern {
        field: String,
        pattern: String,
        reason: String,
    },

    #[error("field \"{field}\": validate property must be an array, {found} received")]
    InvalidValidate { field: String, found: &'static str },

    #[error("field \"{field}\": validator at index {index} {reason}")]
    InvalidValidator {
        field: String,
        index: usize,
        reason: String,
    },

    #[error("field \"{field}\": validator at index {index} has unknown type \"{kind}\", expected one of: [{expected}]")]
    UnknownValidatorType {
        field: String,
        index: usize,
        kind: String,
        expected: String,
    },

    #[error("validator \"{kind}\": {reason}")]
    InvalidValidatorOptions { kind: String, reason: String },

    #[error("field \"{field}\": unknown data type {found}")]
    InvalidDataType { field: String, found: String },

    #[error("fixed array \"{field}\" must have an \"additionalItems\" descriptor")]
    MissingAdditionalItems { field: String },

    #[error("layout component {0} is not registered")]
    MissingLayout(LayoutKey),

    #[error("malformed schema: {0}")]
    Malformed(String),
}

impl SchemaError {
    /// Attach the owning field's name to an error raised while building one
    /// of its validators.
    pub(crate) fn for_validator(field: &str, index: usize, err: SchemaError) -> SchemaError {
        match err {
            SchemaError::InvalidValidatorOptions { kind, reason } => SchemaError::InvalidValidator {
                field: field.to_string(),
                index,
                reason: format!("({kind}) {reason}"),
            },
            other => other,
        }
    }
}

/// Name used in error messages for fields without an identity.
pub(crate) fn display_name(name: Option<&str>) -> String {
    name.unwrap_or("<unnamed>").to_string()
}
