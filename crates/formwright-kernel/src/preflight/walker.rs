//! Pre-flight walker over raw schema JSON.

use formwright_types::{DataType, ValidatorType, FIELD_ARRAY};
use regex::Regex;
use serde_json::{Map, Value};

use crate::components::ComponentRegistry;
use crate::error::{display_name, SchemaError};

/// JSON type name used in error messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Checks a schema document against a component registry.
pub struct Preflight<'a> {
    components: &'a ComponentRegistry,
}

impl<'a> Preflight<'a> {
    pub fn new(components: &'a ComponentRegistry) -> Self {
        Self { components }
    }

    /// Check the whole document. The first problem found is returned.
    pub fn check(&self, schema: &Value) -> Result<(), SchemaError> {
        let Value::Object(root) = schema else {
            return Err(SchemaError::NotAnObject(type_name(schema)));
        };
        let fields = fields_of(root, "schema")?.ok_or_else(|| SchemaError::MissingFields {
            owner: "schema".to_string(),
        })?;
        self.entries(fields, false)
    }

    fn entries(&self, entries: &[Value], array_items: bool) -> Result<(), SchemaError> {
        for entry in entries {
            match entry {
                Value::Array(group) => self.entries(group, array_items)?,
                Value::Object(field) => self.field(field, array_items)?,
                other => return Err(SchemaError::NotADescriptor(type_name(other))),
            }
        }
        Ok(())
    }

    fn field(&self, field: &Map<String, Value>, array_item: bool) -> Result<(), SchemaError> {
        let component = field
            .get("component")
            .and_then(Value::as_str)
            .ok_or(SchemaError::MissingComponent)?;
        self.components.check(component)?;

        let has_identity = ["name", "key", "title"]
            .iter()
            .any(|key| field.contains_key(*key));
        if !has_identity && !array_item {
            return Err(SchemaError::MissingIdentity {
                component: component.to_string(),
            });
        }
        let name = display_name(field.get("name").and_then(Value::as_str));

        if let Some(condition) = field.get("condition") {
            check_condition(condition, &name)?;
        }
        if let Some(validate) = field.get("validate") {
            check_validators(validate, &name)?;
        }
        if let Some(data_type) = field.get("dataType") {
            let known = data_type
                .as_str()
                .is_some_and(|s| s.parse::<DataType>().is_ok());
            if !known {
                return Err(SchemaError::InvalidDataType {
                    field: name,
                    found: data_type.to_string(),
                });
            }
        }

        if let Some(nested) = fields_of(field, component)? {
            self.entries(nested, component == FIELD_ARRAY)?;
        }
        match field.get("additionalItems") {
            None => {}
            Some(Value::Object(template)) => self.field(template, false)?,
            Some(other) => return Err(SchemaError::NotADescriptor(type_name(other))),
        }
        Ok(())
    }
}

/// The `fields` list of `obj`, `None` when absent.
fn fields_of<'v>(
    obj: &'v Map<String, Value>,
    owner: &str,
) -> Result<Option<&'v Vec<Value>>, SchemaError> {
    match obj.get("fields") {
        None => Ok(None),
        Some(Value::Array(fields)) => Ok(Some(fields)),
        Some(other) => Err(SchemaError::FieldsNotArray {
            owner: owner.to_string(),
            found: type_name(other),
        }),
    }
}

fn check_condition(condition: &Value, field: &str) -> Result<(), SchemaError> {
    let invalid = |reason: String| SchemaError::InvalidCondition {
        field: field.to_string(),
        reason,
    };

    let Value::Object(condition) = condition else {
        return Err(invalid(format!(
            "condition must be an object, received {}",
            type_name(condition)
        )));
    };
    let received = || condition.keys().cloned().collect::<Vec<_>>().join(",");

    match condition.get("when") {
        None => {
            return Err(invalid(format!(
                "condition must have \"when\" property, properties received: [{}]",
                received()
            )))
        }
        Some(Value::String(_)) => {}
        Some(other) => {
            return Err(invalid(format!(
                "condition property \"when\" must be of type string, {} received",
                type_name(other)
            )))
        }
    }

    let has_predicate = ["is", "isEmpty", "isNotEmpty", "pattern"]
        .iter()
        .any(|key| condition.contains_key(*key));
    if !has_predicate {
        return Err(invalid(format!(
            "condition must have \"is\" property, properties received: [{}]",
            received()
        )));
    }

    if let Some(pattern) = condition.get("pattern") {
        let Some(source) = pattern.as_str() else {
            return Err(invalid(format!(
                "condition property \"pattern\" must be of type string, {} received",
                type_name(pattern)
            )));
        };
        if let Err(e) = Regex::new(source) {
            return Err(SchemaError::InvalidPattern {
                field: field.to_string(),
                pattern: source.to_string(),
                reason: e.to_string(),
            });
        }
    }
    Ok(())
}

fn check_validators(validate: &Value, field: &str) -> Result<(), SchemaError> {
    let Value::Array(list) = validate else {
        return Err(SchemaError::InvalidValidate {
            field: field.to_string(),
            found: type_name(validate),
        });
    };

    for (index, validator) in list.iter().enumerate() {
        let invalid = |reason: String| SchemaError::InvalidValidator {
            field: field.to_string(),
            index,
            reason,
        };
        let Value::Object(validator) = validator else {
            return Err(invalid(format!(
                "must be an object, {} received",
                type_name(validator)
            )));
        };
        let Some(kind) = validator.get("type") else {
            let keys = validator.keys().cloned().collect::<Vec<_>>().join(",");
            return Err(invalid(format!(
                "does not have \"type\" property, properties received: [{keys}]"
            )));
        };
        let known = kind
            .as_str()
            .is_some_and(|s| s.parse::<ValidatorType>().is_ok());
        if !known {
            return Err(SchemaError::UnknownValidatorType {
                field: field.to_string(),
                index,
                kind: kind.as_str().map_or_else(|| kind.to_string(), str::to_string),
                expected: ValidatorType::expected_tags(),
            });
        }
    }
    Ok(())
}
