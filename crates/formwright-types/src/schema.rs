//! The normalized schema and its field descriptors.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::condition::Condition;
use crate::validation::{DataType, ValidatorDescriptor};

/// Component tag of the dynamic (add/remove) array field.
pub const FIELD_ARRAY: &str = "field-array";
/// Component tag of the fixed array field.
pub const FIXED_LIST: &str = "fixed-list";

/// The engine's canonical input.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub fields: Vec<FieldEntry>,
    /// Initial values keyed by field name.
    #[serde(default)]
    pub default_values: Map<String, Value>,
}

impl Schema {
    pub fn new(fields: Vec<FieldEntry>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }
}

/// One item of a `fields` list: a descriptor, or a bare group of items.
///
/// Groups exist so schemas can bundle fields without a layout wrapper; the
/// walker flattens them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldEntry {
    Group(Vec<FieldEntry>),
    Field(Box<FieldDescriptor>),
}

impl From<FieldDescriptor> for FieldEntry {
    fn from(field: FieldDescriptor) -> Self {
        FieldEntry::Field(Box::new(field))
    }
}

impl From<Vec<FieldEntry>> for FieldEntry {
    fn from(group: Vec<FieldEntry>) -> Self {
        FieldEntry::Group(group)
    }
}

/// A declarative description of one field or field group.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Unique value path, in dot/bracket notation.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub key: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Component type tag.
    pub component: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub initial_value: Option<Value>,
    #[serde(default)]
    pub validate: Vec<ValidatorDescriptor>,
    #[serde(default)]
    pub data_type: Option<DataType>,
    #[serde(default)]
    pub condition: Option<Condition>,
    /// Nested descriptors, for array and container components.
    #[serde(default)]
    pub fields: Vec<FieldEntry>,
    /// Value pushed when a dynamic array gains an item.
    #[serde(default)]
    pub item_default: Option<Value>,
    /// Trailing template slot of a fixed array.
    #[serde(default)]
    pub additional_items: Option<Box<FieldDescriptor>>,
    #[serde(default)]
    pub clear_on_unmount: Option<bool>,
    /// Per-field override of the render-time `hasFixedItems` option.
    #[serde(default)]
    pub has_fixed_items: Option<bool>,
    /// Everything else, handed to the renderer untouched.
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

/// `key` shows up as a number in some schemas.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}

impl FieldDescriptor {
    pub fn new(component: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// The identity key: `name`, else `key`, else `title`.
    pub fn identity(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.key.as_deref())
            .or(self.title.as_deref())
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_validator(mut self, validator: impl Into<ValidatorDescriptor>) -> Self {
        self.validate.push(validator.into());
        self
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_fields(mut self, fields: Vec<FieldEntry>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_initial_value(mut self, value: impl Into<Value>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    pub fn with_item_default(mut self, value: impl Into<Value>) -> Self {
        self.item_default = Some(value.into());
        self
    }

    pub fn with_additional_items(mut self, template: FieldDescriptor) -> Self {
        self.additional_items = Some(Box::new(template));
        self
    }

    pub fn with_clear_on_unmount(mut self, clear: bool) -> Self {
        self.clear_on_unmount = Some(clear);
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidatorType;
    use serde_json::json;

    #[test]
    fn nested_groups_deserialize() {
        let schema: Schema = serde_json::from_value(json!({
            "fields": [
                { "component": "text-field", "name": "a" },
                [
                    { "component": "text-field", "name": "b" },
                    [ { "component": "text-field", "name": "c" } ]
                ]
            ]
        }))
        .unwrap();

        assert_eq!(schema.fields.len(), 2);
        match &schema.fields[1] {
            FieldEntry::Group(group) => {
                assert_eq!(group.len(), 2);
                assert!(matches!(group[1], FieldEntry::Group(_)));
            }
            FieldEntry::Field(_) => panic!("expected a group"),
        }
    }

    #[test]
    fn descriptor_splits_known_keys_from_props() {
        let field: FieldDescriptor = serde_json::from_value(json!({
            "component": "text-field",
            "name": "age",
            "label": "Age",
            "dataType": "integer",
            "isRequired": true,
            "validate": [ { "type": "required-validator" } ],
            "condition": { "when": "show", "is": true },
        }))
        .unwrap();

        assert_eq!(field.data_type, Some(DataType::Integer));
        assert_eq!(field.label.as_deref(), Some("Age"));
        assert_eq!(field.validate.len(), 1);
        assert!(field.condition.is_some());
        assert_eq!(field.props.get("isRequired"), Some(&json!(true)));
        assert!(!field.props.contains_key("dataType"));
        assert!(!field.props.contains_key("label"));
    }

    #[test]
    fn numeric_key_becomes_string() {
        let field: FieldDescriptor =
            serde_json::from_value(json!({ "component": "text-field", "key": 1 })).unwrap();
        assert_eq!(field.key.as_deref(), Some("1"));
        assert_eq!(field.identity(), Some("1"));
    }

    #[test]
    fn identity_prefers_name() {
        let field = FieldDescriptor::new("text-field", "foo")
            .with_key("bar")
            .with_title("Baz");
        assert_eq!(field.identity(), Some("foo"));

        let keyed = FieldDescriptor {
            component: "x".into(),
            title: Some("T".into()),
            ..FieldDescriptor::default()
        };
        assert_eq!(keyed.identity(), Some("T"));
    }

    #[test]
    fn default_values_and_additional_items() {
        let schema: Schema = serde_json::from_value(json!({
            "fields": [{
                "component": "fixed-list",
                "name": "slots",
                "fields": [ { "component": "text-field", "name": "slots[0]" } ],
                "additionalItems": { "component": "text-field", "name": "slots[1]" },
            }],
            "defaultValues": { "slots": ["a"] },
        }))
        .unwrap();

        assert_eq!(schema.default_values.get("slots"), Some(&json!(["a"])));
        let FieldEntry::Field(field) = &schema.fields[0] else {
            panic!("expected a field");
        };
        assert_eq!(field.component, FIXED_LIST);
        assert!(field.additional_items.is_some());
    }

    #[test]
    fn builder_attaches_declared_validator() {
        let field = FieldDescriptor::new("text-field", "foo")
            .with_validator(crate::DeclaredValidator::new(ValidatorType::Required));
        assert!(matches!(field.validate[0], ValidatorDescriptor::Declared(_)));
    }
}
