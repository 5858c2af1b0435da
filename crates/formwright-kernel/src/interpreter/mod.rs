//! Schema interpreter for formwright.
//!
//! The interpreter turns field descriptors into a tree of mounted [`Node`]s.
//! Mounting registers fields and subscriptions with the form store;
//! disposing a node tears them down again. Nodes react to store
//! notifications and produce the render tree on demand.
//!
//! # Architecture
//!
//! - **walker**: the recursive descriptor walk and the typed pre-flight check
//! - **condition**: predicate evaluation and the visibility gate
//! - **binding**: leaf fields bound to the store
//! - **array**: dynamic and fixed array controllers
//! - **node**: the mounted tree and its dispatch

mod array;
mod binding;
mod condition;
mod node;
mod walker;

use formwright_types::FieldDescriptor;

use crate::components::{ComponentRegistry, LayoutRegistry};
use crate::store::{FormStore, SubscriptionId};
use crate::validators::ValidatorEngine;

pub use array::{rewrite_item_name, DynamicArray, FixedArray};
pub use binding::{ContainerNode, FieldBinding};
pub use condition::{evaluate, is_empty_value, ConditionGate};
pub use node::Node;
pub use walker::{check, walk};

/// Render-time options every node sees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormOptions {
    /// Clear a field's value when it unmounts, unless the field opts out.
    pub clear_on_unmount: bool,
    /// Render `field-array` fields as fixed arrays.
    pub has_fixed_items: bool,
}

impl FormOptions {
    /// Effective clear-on-unmount policy of one field.
    pub fn clears(&self, field: &FieldDescriptor) -> bool {
        (self.clear_on_unmount || field.clear_on_unmount == Some(true))
            && field.clear_on_unmount != Some(false)
    }
}

/// Everything mounting and disposing needs.
pub struct WalkContext<'a> {
    pub store: &'a mut dyn FormStore,
    pub components: &'a ComponentRegistry,
    pub layouts: &'a LayoutRegistry,
    pub validators: &'a mut ValidatorEngine,
    pub options: &'a FormOptions,
    /// Subscriptions fired by store writes made while mounting or disposing.
    pub pending: Vec<SubscriptionId>,
}

impl WalkContext<'_> {
    /// Record subscriptions a store write fired.
    pub fn fired(&mut self, ids: Vec<SubscriptionId>) {
        self.pending.extend(ids);
    }
}

/// What producing the render tree needs.
#[derive(Clone, Copy)]
pub struct ViewContext<'a> {
    pub store: &'a dyn FormStore,
    pub submit_failed: bool,
}
