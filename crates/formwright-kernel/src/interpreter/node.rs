//! The mounted tree.

use std::collections::HashSet;

use super::array::{DynamicArray, FixedArray};
use super::binding::{ContainerNode, FieldBinding};
use super::condition::ConditionGate;
use super::{ViewContext, WalkContext};
use crate::components::Element;
use crate::error::SchemaError;
use crate::store::SubscriptionId;

/// One mounted descriptor.
pub enum Node {
    Field(FieldBinding),
    Container(ContainerNode),
    Conditional(ConditionGate),
    DynamicArray(DynamicArray),
    FixedArray(FixedArray),
}

impl Node {
    /// React to fired subscriptions. Only gates and arrays that own one of
    /// `fired` re-evaluate; everything else just passes the call down.
    pub fn notify(
        &mut self,
        fired: &HashSet<SubscriptionId>,
        ctx: &mut WalkContext<'_>,
    ) -> Result<(), SchemaError> {
        match self {
            Node::Field(_) => Ok(()),
            Node::Container(container) => container.notify(fired, ctx),
            Node::Conditional(gate) => gate.notify(fired, ctx),
            Node::DynamicArray(array) => array.notify(fired, ctx),
            Node::FixedArray(array) => array.notify(fired, ctx),
        }
    }

    /// Tear the subtree down: subscriptions first, then registrations, then
    /// any clear-on-unmount writes.
    pub fn dispose(&mut self, ctx: &mut WalkContext<'_>) {
        match self {
            Node::Field(field) => field.dispose(ctx),
            Node::Container(container) => container.dispose(ctx),
            Node::Conditional(gate) => gate.dispose(ctx),
            Node::DynamicArray(array) => array.dispose(ctx),
            Node::FixedArray(array) => array.dispose(ctx),
        }
    }

    /// Rendered elements. A hidden conditional renders nothing.
    pub fn view(&self, view: ViewContext<'_>) -> Vec<Element> {
        match self {
            Node::Field(field) => vec![field.view(view)],
            Node::Container(container) => vec![container.view(view)],
            Node::Conditional(gate) => gate.view(view),
            Node::DynamicArray(array) => vec![array.view(view)],
            Node::FixedArray(array) => vec![array.view(view)],
        }
    }

    /// Mounted children, across every node kind.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Field(_) => Vec::new(),
            Node::Container(container) => container.children().iter().collect(),
            Node::Conditional(gate) => gate.children().iter().collect(),
            Node::DynamicArray(array) => array.items().iter().flatten().collect(),
            Node::FixedArray(array) => array.children().iter().collect(),
        }
    }

    /// Find the mounted dynamic array named `name` in this subtree.
    pub fn find_array(&self, name: &str) -> Option<&DynamicArray> {
        if let Node::DynamicArray(array) = self {
            if array.name() == name {
                return Some(array);
            }
        }
        self.children()
            .into_iter()
            .find_map(|child| child.find_array(name))
    }

    /// Names of every mounted leaf field in this subtree, in tree order.
    pub fn field_names(&self) -> Vec<String> {
        match self {
            Node::Field(field) => vec![field.name().to_string()],
            other => other
                .children()
                .into_iter()
                .flat_map(Node::field_names)
                .collect(),
        }
    }
}
