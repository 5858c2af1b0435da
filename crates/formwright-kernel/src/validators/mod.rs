//! Validator composition engine.
//!
//! Turns a field's validator descriptors into one executable [`Validator`].
//! Everything the engine builds is cached for the life of the engine,
//! keyed by content: two descriptors with structurally equal options yield
//! the same validator handle. The form store keys registrations by that
//! handle, so a re-walk of the same schema does not churn registrations.
//!
//! One engine belongs to one loaded schema. A new schema gets a new engine.
//!
//! Cache keys:
//!
//! - declared validators: `"{type}:{options}"`
//! - factories: `"fn:{name}:{options}"`
//! - data types: `"dataType:{kind}"`
//! - compositions: the addresses of their constituents, which the cache
//!   keeps alive, so an address is never reused for a different function

mod builtin;
mod compose;
mod data_type;
mod stable_key;

use std::collections::HashMap;

use formwright_types::{DataType, FieldDescriptor, Validator, ValidatorDescriptor};

use crate::error::{display_name, SchemaError};

pub use compose::{array_validator, compose};
pub use data_type::data_type_validator;
pub use stable_key::stable_key;

/// Builds and memoizes validators.
#[derive(Debug, Default)]
pub struct ValidatorEngine {
    cache: HashMap<String, Validator>,
}

impl ValidatorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map one descriptor to its validator.
    ///
    /// Callables are used as they are; declared validators and factories are
    /// built once per distinct configuration.
    pub fn resolve(&mut self, descriptor: &ValidatorDescriptor) -> Result<Validator, SchemaError> {
        match descriptor {
            ValidatorDescriptor::Callable(validator) => Ok(validator.clone()),
            ValidatorDescriptor::Declared(declared) => {
                let key = format!("{}:{}", declared.kind, stable_key(&declared.options));
                self.cached(key, || builtin::build(declared))
            }
            ValidatorDescriptor::Factory { factory, options } => {
                let key = format!("fn:{}:{}", factory.name(), stable_key(options));
                self.cached(key, || Ok(factory.build(options)))
            }
        }
    }

    /// The type-check validator for `kind`.
    pub fn data_type(&mut self, kind: DataType) -> Validator {
        let key = format!("dataType:{kind}");
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }
        let built = data_type_validator(kind);
        self.cache.insert(key, built.clone());
        built
    }

    /// Compose `validators`, reusing an earlier composition of the same
    /// handles.
    pub fn compose(&mut self, validators: Vec<Validator>) -> Validator {
        if validators.is_empty() {
            return Validator::noop();
        }
        let key = composite_key("compose", &validators);
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }
        for v in &validators {
            self.keep_alive(v);
        }
        let built = compose(validators);
        self.cache.insert(key, built.clone());
        built
    }

    /// The collection-level wrapper of `inner`, see [`array_validator`].
    pub fn array(&mut self, inner: Validator) -> Validator {
        let key = composite_key("array", std::slice::from_ref(&inner));
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }
        self.keep_alive(&inner);
        let built = array_validator(inner);
        self.cache.insert(key, built.clone());
        built
    }

    /// Build the composed validator of a field: its `validate` entries in
    /// order, then the `dataType` check when one is declared.
    pub fn field_validator(&mut self, field: &FieldDescriptor) -> Result<Validator, SchemaError> {
        let mut list = Vec::with_capacity(field.validate.len() + 1);
        for (index, descriptor) in field.validate.iter().enumerate() {
            let validator = self.resolve(descriptor).map_err(|err| {
                SchemaError::for_validator(&display_name(field.identity()), index, err)
            })?;
            list.push(validator);
        }
        if let Some(kind) = field.data_type {
            list.push(self.data_type(kind));
        }
        Ok(self.compose(list))
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drop every cached validator.
    pub fn clear(&mut self) {
        tracing::debug!(entries = self.cache.len(), "validator cache cleared");
        self.cache.clear();
    }

    fn cached(
        &mut self,
        key: String,
        build: impl FnOnce() -> Result<Validator, SchemaError>,
    ) -> Result<Validator, SchemaError> {
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(key = %key, "validator cache hit");
            return Ok(hit.clone());
        }
        tracing::debug!(key = %key, "validator cache miss");
        let built = build()?;
        self.cache.insert(key, built.clone());
        Ok(built)
    }

    /// Pin a caller-supplied handle so its address stays unique while
    /// compositions keyed by it live.
    fn keep_alive(&mut self, validator: &Validator) {
        self.cache
            .entry(format!("pin:{:#x}", validator.addr()))
            .or_insert_with(|| validator.clone());
    }
}

fn composite_key(prefix: &str, validators: &[Validator]) -> String {
    let addrs: Vec<String> = validators.iter().map(|v| format!("{:#x}", v.addr())).collect();
    format!("{prefix}:{}", addrs.join(","))
}
