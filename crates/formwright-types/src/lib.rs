//! formwright-types: the data a form schema is made of.
//!
//! This crate holds no engine logic. It provides:
//!
//! - **Schema**: the normalized schema and its field descriptors
//! - **Condition**: declarative visibility rules
//! - **Validation**: validator descriptors, data types, field errors and the
//!   `Validator` callable handle shared by the engine and the form store
//!
//! Everything here deserializes from the JSON shape schema adapters produce.
//! Callable validators cannot come from JSON; they are attached in code.

pub mod condition;
pub mod schema;
pub mod validation;

pub use condition::Condition;
pub use schema::{FieldDescriptor, FieldEntry, Schema, FIELD_ARRAY, FIXED_LIST};
pub use validation::{
    DataType, DeclaredValidator, FieldError, MessageDescriptor, ParseError, ValidationResult,
    Validator, ValidatorDescriptor, ValidatorFactory, ValidatorType,
};
