//! The form-state store seam.
//!
//! The engine does not own form values. It talks to a [`FormStore`] that
//! provides value reads and writes, per-path subscriptions, field validator
//! registration and array splice primitives. [`MemoryStore`] is the
//! in-process implementation used by default and in tests.
//!
//! Notification is push-based but synchronous: every mutating call returns
//! the subscriptions whose watched value differs after the commit, and the
//! caller dispatches them. Nothing fires behind the caller's back.

mod memory;
pub mod path;

use std::collections::BTreeMap;

use formwright_types::{FieldError, Validator};
use serde_json::Value;

pub use memory::MemoryStore;

/// Handle of a value subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle of a registered field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(pub u64);

/// Aggregate form state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormState {
    /// Values equal the initial values.
    pub pristine: bool,
    /// No registered field reports an error.
    pub valid: bool,
    /// A submit was attempted while invalid.
    pub submit_failed: bool,
    /// Current error per field name.
    pub errors: BTreeMap<String, FieldError>,
}

/// Everything the engine needs from a reactive form-state store.
///
/// Mutators return the subscriptions to notify. Validators of registered
/// fields run after every commit, so reads of [`FormStore::error`] always
/// reflect committed values.
pub trait FormStore {
    /// Value at `path`, `None` when absent.
    fn value(&self, path: &str) -> Option<Value>;

    /// All form values.
    fn values(&self) -> &Value;

    /// Set (or with `None`, clear) the value at `path`.
    fn change(&mut self, path: &str, value: Option<Value>) -> Vec<SubscriptionId>;

    /// Apply several changes as one batch: subscribers only ever observe the
    /// values after the last change.
    fn change_many(&mut self, changes: &[(String, Option<Value>)]) -> Vec<SubscriptionId>;

    /// Watch the value at `path`.
    fn subscribe(&mut self, path: &str) -> SubscriptionId;

    /// Stop watching. Unknown ids are ignored.
    fn unsubscribe(&mut self, id: SubscriptionId);

    /// Register a field and its validator. When the store holds no value at
    /// `name` yet, `initial_value` becomes both its value and its initial
    /// value.
    fn register_field(
        &mut self,
        name: &str,
        validator: Validator,
        initial_value: Option<Value>,
    ) -> (FieldId, Vec<SubscriptionId>);

    /// Remove a registration. Unknown ids are ignored.
    fn unregister_field(&mut self, id: FieldId);

    /// True while at least one field is registered under `name`.
    fn is_registered(&self, name: &str) -> bool;

    /// Append `item` to the array at `name` (`None` appends `null`).
    fn push(&mut self, name: &str, item: Option<Value>) -> Vec<SubscriptionId>;

    /// Remove the item at `index` from the array at `name`.
    fn remove(&mut self, name: &str, index: usize) -> (Option<Value>, Vec<SubscriptionId>);

    /// Paths of the current items of the array at `name`: `name[0]`, `name[1]`, ...
    fn items(&self, name: &str) -> Vec<String>;

    /// Current error of the field registered under `name`.
    fn error(&self, name: &str) -> Option<FieldError>;

    /// Value at `path` differs from its initial value.
    fn is_dirty(&self, path: &str) -> bool;

    fn state(&self) -> FormState;

    /// Return the values when valid; otherwise mark the submit as failed and
    /// return the errors.
    fn submit(&mut self) -> Result<Value, BTreeMap<String, FieldError>>;

    /// Restore the initial values.
    fn reset(&mut self) -> Vec<SubscriptionId>;
}
