//! Field tree walker.
//!
//! `walk` mounts a descriptor list. Groups are flattened one level per
//! recursive call, so deep nesting costs recursion depth rather than an
//! eager flatten pass. `check` walks the same tree without touching the
//! store, so structural errors anywhere in the schema surface before the
//! first field mounts, including inside hidden conditionals and array item
//! templates.

use formwright_types::{FieldDescriptor, FieldEntry, FIELD_ARRAY, FIXED_LIST};

use super::array::{DynamicArray, FixedArray};
use super::binding::{ContainerNode, FieldBinding};
use super::condition::{compile_pattern, ConditionGate};
use super::node::Node;
use super::{FormOptions, WalkContext};
use crate::components::{ComponentKind, ComponentRegistry, LayoutKey, LayoutRegistry};
use crate::error::{display_name, SchemaError};
use crate::validators::ValidatorEngine;

/// Mount every entry of `entries`, in order.
///
/// On error, whatever this call already mounted is disposed again.
pub fn walk(entries: &[FieldEntry], ctx: &mut WalkContext<'_>) -> Result<Vec<Node>, SchemaError> {
    let mut nodes = Vec::with_capacity(entries.len());
    for entry in entries {
        let mounted = match entry {
            FieldEntry::Group(group) => walk(group, ctx),
            FieldEntry::Field(field) => mount_field(field, ctx).map(|node| vec![node]),
        };
        match mounted {
            Ok(mounted) => nodes.extend(mounted),
            Err(err) => {
                for mut node in nodes {
                    node.dispose(ctx);
                }
                return Err(err);
            }
        }
    }
    Ok(nodes)
}

/// Mount one descriptor, behind a visibility gate when it has a condition.
pub fn mount_field(field: &FieldDescriptor, ctx: &mut WalkContext<'_>) -> Result<Node, SchemaError> {
    if field.condition.is_some() {
        return ConditionGate::mount(field, ctx).map(Node::Conditional);
    }
    mount_unconditioned(field, ctx)
}

/// Mount one descriptor, ignoring its condition.
pub(crate) fn mount_unconditioned(
    field: &FieldDescriptor,
    ctx: &mut WalkContext<'_>,
) -> Result<Node, SchemaError> {
    let name = field
        .identity()
        .ok_or_else(|| SchemaError::MissingIdentity {
            component: field.component.clone(),
        })?
        .to_string();

    if is_fixed_array(field, ctx.options) {
        return FixedArray::mount(field, name, ctx).map(Node::FixedArray);
    }
    if field.component == FIELD_ARRAY {
        return DynamicArray::mount(field, name, ctx).map(Node::DynamicArray);
    }

    let resolved = ctx.components.resolve(&field.component)?;
    match resolved.kind {
        ComponentKind::Field => {
            FieldBinding::mount(field, name, resolved.renderer, ctx).map(Node::Field)
        }
        ComponentKind::Container => {
            ContainerNode::mount(field, name, resolved.renderer, ctx).map(Node::Container)
        }
    }
}

fn is_fixed_array(field: &FieldDescriptor, options: &FormOptions) -> bool {
    match field.component.as_str() {
        FIXED_LIST => true,
        FIELD_ARRAY => field.has_fixed_items.unwrap_or(options.has_fixed_items),
        _ => false,
    }
}

/// Structurally check `entries` without mounting anything.
///
/// Validators are built along the way, so the engine's cache is warm when
/// the walk mounts.
pub fn check(
    entries: &[FieldEntry],
    components: &ComponentRegistry,
    layouts: &LayoutRegistry,
    validators: &mut ValidatorEngine,
    options: &FormOptions,
) -> Result<(), SchemaError> {
    let mut checker = Checker {
        components,
        layouts,
        validators,
        options,
    };
    checker.entries(entries, false)
}

struct Checker<'a> {
    components: &'a ComponentRegistry,
    layouts: &'a LayoutRegistry,
    validators: &'a mut ValidatorEngine,
    options: &'a FormOptions,
}

impl Checker<'_> {
    /// `array_items` marks the direct item descriptors of a dynamic array,
    /// which get their identity from the item path.
    fn entries(&mut self, entries: &[FieldEntry], array_items: bool) -> Result<(), SchemaError> {
        for entry in entries {
            match entry {
                FieldEntry::Group(group) => self.entries(group, array_items)?,
                FieldEntry::Field(field) => self.field(field, array_items)?,
            }
        }
        Ok(())
    }

    fn field(&mut self, field: &FieldDescriptor, array_item: bool) -> Result<(), SchemaError> {
        if !array_item && field.identity().is_none() {
            return Err(SchemaError::MissingIdentity {
                component: field.component.clone(),
            });
        }
        if let Some(condition) = &field.condition {
            if condition.when.is_empty() {
                return Err(SchemaError::InvalidCondition {
                    field: display_name(field.identity()),
                    reason: "condition must have \"when\" property".to_string(),
                });
            }
            if !condition.has_predicate() {
                return Err(SchemaError::InvalidCondition {
                    field: display_name(field.identity()),
                    reason: "condition must have \"is\", \"isEmpty\", \"isNotEmpty\" or \"pattern\" property"
                        .to_string(),
                });
            }
            compile_pattern(condition, field.identity())?;
        }
        let composed = self.validators.field_validator(field)?;

        if is_fixed_array(field, self.options) {
            let template =
                field
                    .additional_items
                    .as_deref()
                    .ok_or_else(|| SchemaError::MissingAdditionalItems {
                        field: display_name(field.identity()),
                    })?;
            self.layouts.get(LayoutKey::Col)?;
            self.layouts.get(LayoutKey::ArrayFieldWrapper)?;
            self.entries(&field.fields, false)?;
            return self.field(template, false);
        }
        if field.component == FIELD_ARRAY {
            self.validators.array(composed);
            for key in [
                LayoutKey::Col,
                LayoutKey::FormGroup,
                LayoutKey::Button,
                LayoutKey::ButtonGroup,
                LayoutKey::Icon,
                LayoutKey::HelpBlock,
                LayoutKey::ArrayFieldWrapper,
            ] {
                self.layouts.get(key)?;
            }
            return self.entries(&field.fields, true);
        }

        let resolved = self.components.resolve(&field.component)?;
        if resolved.kind == ComponentKind::Container {
            self.entries(&field.fields, false)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Element, RenderProps};
    use crate::store::{FormStore, MemoryStore};
    use formwright_types::{Condition, DeclaredValidator};

    fn echo(props: &RenderProps, children: Vec<Element>) -> Element {
        Element::new(props.component.clone())
            .with_prop("name", props.name.clone())
            .with_children(children)
    }

    fn registries() -> (ComponentRegistry, LayoutRegistry) {
        let mut components = ComponentRegistry::new();
        components.register_field("text-field", echo);
        components.register_container("sub-form", echo);
        let mut layouts = LayoutRegistry::new();
        for key in LayoutKey::ALL {
            layouts.register(key, echo);
        }
        (components, layouts)
    }

    fn field(name: &str) -> FieldEntry {
        FieldDescriptor::new("text-field", name).into()
    }

    fn names(nodes: &[Node]) -> Vec<String> {
        nodes.iter().flat_map(Node::field_names).collect()
    }

    #[test]
    fn nested_groups_flatten_in_order() {
        let (components, layouts) = registries();
        let mut store = MemoryStore::new();
        let mut validators = ValidatorEngine::new();
        let options = FormOptions::default();
        let mut ctx = WalkContext {
            store: &mut store,
            components: &components,
            layouts: &layouts,
            validators: &mut validators,
            options: &options,
            pending: Vec::new(),
        };

        let entries = vec![
            field("a"),
            FieldEntry::Group(vec![field("b"), FieldEntry::Group(vec![field("c")])]),
            field("d"),
        ];
        let nodes = walk(&entries, &mut ctx).unwrap();
        assert_eq!(nodes.len(), 4);
        assert_eq!(names(&nodes), vec!["a", "b", "c", "d"]);
        assert!(store.is_registered("c"));
    }

    #[test]
    fn failed_walk_releases_what_it_mounted() {
        let (components, layouts) = registries();
        let mut store = MemoryStore::new();
        let mut validators = ValidatorEngine::new();
        let options = FormOptions::default();
        let mut ctx = WalkContext {
            store: &mut store,
            components: &components,
            layouts: &layouts,
            validators: &mut validators,
            options: &options,
            pending: Vec::new(),
        };

        let entries = vec![
            field("a"),
            FieldDescriptor::new("blarghs", "b").into(),
        ];
        let err = walk(&entries, &mut ctx).err();
        assert!(matches!(err, Some(SchemaError::UnknownComponent { .. })));
        assert_eq!(store.field_count(), 0);
    }

    #[test]
    fn container_children_are_walked() {
        let (components, layouts) = registries();
        let mut store = MemoryStore::new();
        let mut validators = ValidatorEngine::new();
        let options = FormOptions::default();
        let mut ctx = WalkContext {
            store: &mut store,
            components: &components,
            layouts: &layouts,
            validators: &mut validators,
            options: &options,
            pending: Vec::new(),
        };

        let entries = vec![FieldDescriptor::new("sub-form", "group")
            .with_fields(vec![field("inner")])
            .into()];
        let nodes = walk(&entries, &mut ctx).unwrap();
        assert_eq!(names(&nodes), vec!["inner"]);
    }

    #[test]
    fn check_reaches_into_hidden_subtrees() {
        let (components, layouts) = registries();
        let mut validators = ValidatorEngine::new();
        let hidden = FieldDescriptor::new("text-field", "x")
            .with_condition(Condition::when("nope").is(true))
            .with_validator(DeclaredValidator::new(
                formwright_types::ValidatorType::MinLength,
            ));

        let err = check(
            &[hidden.into()],
            &components,
            &layouts,
            &mut validators,
            &FormOptions::default(),
        );
        assert!(matches!(err, Err(SchemaError::InvalidValidator { .. })));
    }

    #[test]
    fn check_rejects_condition_without_predicate() {
        let (components, layouts) = registries();
        let mut validators = ValidatorEngine::new();
        let bare = FieldDescriptor::new("text-field", "foo").with_condition(Condition::when("bar"));

        let err = check(
            &[field("bar"), bare.into()],
            &components,
            &layouts,
            &mut validators,
            &FormOptions::default(),
        );
        assert!(matches!(
            err,
            Err(SchemaError::InvalidCondition { ref field, .. }) if field == "foo"
        ));
    }

    #[test]
    fn check_lets_array_items_go_unnamed() {
        let (components, layouts) = registries();
        let mut validators = ValidatorEngine::new();
        let array = FieldDescriptor::new(FIELD_ARRAY, "list").with_fields(vec![FieldEntry::from(
            FieldDescriptor {
                component: "text-field".into(),
                ..FieldDescriptor::default()
            },
        )]);

        let result = check(
            &[array.into()],
            &components,
            &layouts,
            &mut validators,
            &FormOptions::default(),
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn check_requires_additional_items_for_fixed_arrays() {
        let (components, layouts) = registries();
        let mut validators = ValidatorEngine::new();
        let fixed = FieldDescriptor::new(FIXED_LIST, "slots").with_fields(vec![field("slots[0]")]);

        let result = check(
            &[fixed.into()],
            &components,
            &layouts,
            &mut validators,
            &FormOptions::default(),
        );
        assert!(matches!(
            result,
            Err(SchemaError::MissingAdditionalItems { .. })
        ));
    }

    #[test]
    fn has_fixed_items_switches_field_arrays() {
        let array = FieldDescriptor::new(FIELD_ARRAY, "list");
        let fixed = FormOptions {
            has_fixed_items: true,
            ..FormOptions::default()
        };
        assert!(is_fixed_array(&array, &fixed));
        assert!(!is_fixed_array(&array, &FormOptions::default()));

        let mut dynamic = array.clone();
        dynamic.has_fixed_items = Some(false);
        assert!(!is_fixed_array(&dynamic, &fixed));
    }
}
