//! In-memory form-state store.
//!
//! Values live in one nested `serde_json::Value` tree. All data is lost when
//! dropped.

use std::collections::BTreeMap;

use formwright_types::{FieldError, Validator};
use serde_json::{Map, Value};

use super::path::{get_in, set_in};
use super::{FieldId, FormState, FormStore, SubscriptionId};

#[derive(Debug, Clone)]
struct RegisteredField {
    name: String,
    validator: Validator,
}

/// In-memory store.
#[derive(Debug)]
pub struct MemoryStore {
    values: Value,
    initial: Value,
    subscriptions: BTreeMap<SubscriptionId, String>,
    fields: BTreeMap<FieldId, RegisteredField>,
    errors: BTreeMap<String, FieldError>,
    submit_failed: bool,
    next_id: u64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_initial_values(Map::new())
    }

    /// Create a store seeded from `initial`, keyed by field name. Dotted
    /// and bracketed names are expanded into nested values.
    pub fn with_initial_values(initial: Map<String, Value>) -> Self {
        let mut root = Value::Object(Map::new());
        for (name, value) in initial {
            set_in(&mut root, &name, Some(value));
        }
        Self::with_initial_tree(root)
    }

    /// Create a store whose values and initial values start as the nested
    /// value tree `initial`.
    pub fn with_initial_tree(initial: Value) -> Self {
        let initial = match initial {
            Value::Object(_) => initial,
            _ => Value::Object(Map::new()),
        };
        Self {
            values: initial.clone(),
            initial,
            subscriptions: BTreeMap::new(),
            fields: BTreeMap::new(),
            errors: BTreeMap::new(),
            submit_failed: false,
            next_id: 0,
        }
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Number of registered fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Run `mutate` against the values, re-validate, and report the
    /// subscriptions whose value changed.
    fn commit(&mut self, mutate: impl FnOnce(&mut Value)) -> Vec<SubscriptionId> {
        let before: Vec<(SubscriptionId, Option<Value>)> = self
            .subscriptions
            .iter()
            .map(|(id, path)| (*id, get_in(&self.values, path).cloned()))
            .collect();

        mutate(&mut self.values);
        self.validate();

        let fired: Vec<SubscriptionId> = before
            .into_iter()
            .filter(|(id, old)| {
                self.subscriptions
                    .get(id)
                    .is_some_and(|path| get_in(&self.values, path) != old.as_ref())
            })
            .map(|(id, _)| id)
            .collect();
        if !fired.is_empty() {
            tracing::trace!(count = fired.len(), "store commit notifies subscribers");
        }
        fired
    }

    /// Recompute every registered field's error. When several registrations
    /// share a name, the first error wins.
    fn validate(&mut self) {
        let mut errors = BTreeMap::new();
        for field in self.fields.values() {
            if errors.contains_key(&field.name) {
                continue;
            }
            let value = get_in(&self.values, &field.name);
            if let Some(err) = field.validator.call(value, &self.values) {
                errors.insert(field.name.clone(), err);
            }
        }
        self.errors = errors;
    }
}

impl FormStore for MemoryStore {
    fn value(&self, path: &str) -> Option<Value> {
        get_in(&self.values, path).cloned()
    }

    fn values(&self) -> &Value {
        &self.values
    }

    fn change(&mut self, path: &str, value: Option<Value>) -> Vec<SubscriptionId> {
        self.commit(|values| set_in(values, path, value))
    }

    fn change_many(&mut self, changes: &[(String, Option<Value>)]) -> Vec<SubscriptionId> {
        self.commit(|values| {
            for (path, value) in changes {
                set_in(values, path, value.clone());
            }
        })
    }

    fn subscribe(&mut self, path: &str) -> SubscriptionId {
        let id = SubscriptionId(self.next());
        self.subscriptions.insert(id, path.to_string());
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscriptions.remove(&id);
    }

    fn register_field(
        &mut self,
        name: &str,
        validator: Validator,
        initial_value: Option<Value>,
    ) -> (FieldId, Vec<SubscriptionId>) {
        let id = FieldId(self.next());
        self.fields.insert(
            id,
            RegisteredField {
                name: name.to_string(),
                validator,
            },
        );

        let seed = initial_value.filter(|_| get_in(&self.values, name).is_none());
        let fired = match seed {
            Some(value) => {
                set_in(&mut self.initial, name, Some(value.clone()));
                self.commit(|values| set_in(values, name, Some(value)))
            }
            None => {
                self.validate();
                Vec::new()
            }
        };
        (id, fired)
    }

    fn unregister_field(&mut self, id: FieldId) {
        if self.fields.remove(&id).is_some() {
            self.validate();
        }
    }

    fn is_registered(&self, name: &str) -> bool {
        self.fields.values().any(|f| f.name == name)
    }

    fn push(&mut self, name: &str, item: Option<Value>) -> Vec<SubscriptionId> {
        let mut items = match get_in(&self.values, name) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        items.push(item.unwrap_or(Value::Null));
        self.commit(|values| set_in(values, name, Some(Value::Array(items))))
    }

    fn remove(&mut self, name: &str, index: usize) -> (Option<Value>, Vec<SubscriptionId>) {
        let mut items = match get_in(&self.values, name) {
            Some(Value::Array(items)) if index < items.len() => items.clone(),
            _ => return (None, Vec::new()),
        };
        let removed = items.remove(index);
        let fired = self.commit(|values| set_in(values, name, Some(Value::Array(items))));
        (Some(removed), fired)
    }

    fn items(&self, name: &str) -> Vec<String> {
        match get_in(&self.values, name) {
            Some(Value::Array(items)) => (0..items.len()).map(|i| format!("{name}[{i}]")).collect(),
            _ => Vec::new(),
        }
    }

    fn error(&self, name: &str) -> Option<FieldError> {
        self.errors.get(name).cloned()
    }

    fn is_dirty(&self, path: &str) -> bool {
        get_in(&self.values, path) != get_in(&self.initial, path)
    }

    fn state(&self) -> FormState {
        FormState {
            pristine: self.values == self.initial,
            valid: self.errors.is_empty(),
            submit_failed: self.submit_failed,
            errors: self.errors.clone(),
        }
    }

    fn submit(&mut self) -> Result<Value, BTreeMap<String, FieldError>> {
        self.validate();
        if self.errors.is_empty() {
            self.submit_failed = false;
            Ok(self.values.clone())
        } else {
            self.submit_failed = true;
            Err(self.errors.clone())
        }
    }

    fn reset(&mut self) -> Vec<SubscriptionId> {
        self.submit_failed = false;
        let initial = self.initial.clone();
        self.commit(|values| *values = initial)
    }
}
