//! Tests for dynamic and fixed array fields.
//!
//! Dynamic arrays are driven through the actions their controls carry, the
//! same way a host would wire button clicks back into the kernel.

use formwright_kernel::types::FieldError;
use formwright_kernel::{FormAction, FormConfig, FormKernel, SchemaError};
use formwright_testutil::{
    collect_names, component_registry, count_kind, find_actions, form, layout_registry, texts,
};
use serde_json::{json, Value};

fn array_schema(item_name: &str) -> Value {
    json!({
        "fields": [{
            "component": "field-array",
            "name": "foo",
            "fields": [{ "component": "text-field", "name": item_name }]
        }]
    })
}

fn push_action(form: &FormKernel) -> FormAction {
    find_actions(&form.view())
        .into_iter()
        .find(|action| matches!(action, FormAction::Push { .. }))
        .expect("array renders an add control")
}

// ============================================================================
// Dynamic arrays
// ============================================================================

#[test]
fn add_control_pushes_an_item() {
    let mut form = form(array_schema("name.nested-component"), FormConfig::default());
    assert_eq!(form.find_array("foo").map(|a| a.len()), Some(0));

    let push = push_action(&form);
    assert_eq!(push, FormAction::Push { name: "foo".into() });
    form.dispatch(&push).unwrap();

    assert_eq!(form.value("foo"), Some(json!([null])));
    assert_eq!(form.find_array("foo").map(|a| a.len()), Some(1));
    assert_eq!(
        collect_names(&form.view(), "text-field"),
        vec!["foo[0]nested-component"]
    );
}

#[test]
fn items_prefix_is_dropped_from_item_names() {
    let mut form = form(array_schema("items.nested-component"), FormConfig::default());
    form.push_item("foo").unwrap();
    form.push_item("foo").unwrap();
    assert_eq!(
        form.mounted_fields(),
        vec!["foo[0]nested-component", "foo[1]nested-component"]
    );
}

#[test]
fn item_default_is_pushed() {
    let mut schema = array_schema("items.label");
    schema["fields"][0]["itemDefault"] = json!({ "label": "new" });
    let mut form = form(schema, FormConfig::default());
    form.push_item("foo").unwrap();
    assert_eq!(form.value("foo"), Some(json!([{ "label": "new" }])));
    assert_eq!(form.value("foo[0]label"), Some(json!("new")));
}

#[test]
fn remove_control_leaves_an_empty_array() {
    let mut form = form(array_schema("items.nested-component"), FormConfig::default());
    form.push_item("foo").unwrap();

    let remove = find_actions(&form.view())
        .into_iter()
        .find(|action| matches!(action, FormAction::Remove { .. }))
        .unwrap();
    assert_eq!(
        remove,
        FormAction::Remove {
            name: "foo".into(),
            index: 0
        }
    );
    form.dispatch(&remove).unwrap();

    assert_eq!(form.value("foo"), Some(json!([])));
    assert_eq!(form.find_array("foo").map(|a| a.len()), Some(0));
    assert!(form.mounted_fields().is_empty());
}

#[test]
fn every_item_gets_its_own_remove_control() {
    let mut form = form(array_schema("items.nested-component"), FormConfig::default());
    for _ in 0..3 {
        form.push_item("foo").unwrap();
    }
    let removes: Vec<usize> = find_actions(&form.view())
        .into_iter()
        .filter_map(|action| match action {
            FormAction::Remove { index, .. } => Some(index),
            FormAction::Push { .. } => None,
        })
        .collect();
    assert_eq!(removes, vec![0, 1, 2]);
    assert_eq!(count_kind(&form.view(), "ArrayFieldWrapper"), 3);

    form.remove_item("foo", 1).unwrap();
    assert_eq!(
        form.mounted_fields(),
        vec!["foo[0]nested-component", "foo[1]nested-component"]
    );
}

#[test]
fn store_writes_reconcile_items() {
    let mut form = form(array_schema("items.nested-component"), FormConfig::default());
    form.change("foo", Some(json!(["a", "b"]))).unwrap();
    assert_eq!(form.find_array("foo").map(|a| a.len()), Some(2));

    form.change("foo", None).unwrap();
    assert_eq!(form.find_array("foo").map(|a| a.len()), Some(0));
}

#[test]
fn array_validators_see_the_whole_list() {
    let mut schema = array_schema("items.nested-component");
    schema["fields"][0]["validate"] = json!([
        { "type": "required-validator" },
        { "type": "min-items-validator", "threshold": 3 }
    ]);
    let mut form = form(schema, FormConfig::default());

    assert_eq!(form.error("foo"), Some(FieldError::message("Required")));
    // Pristine: the message is not shown yet.
    assert!(texts(&form.view()).is_empty());

    form.push_item("foo").unwrap();
    assert_eq!(
        form.error("foo"),
        Some(FieldError::message("Must have at least 3 items."))
    );
    assert!(texts(&form.view()).contains(&"Must have at least 3 items.".to_string()));
    assert_eq!(count_kind(&form.view(), "HelpBlock"), 1);

    form.push_item("foo").unwrap();
    form.push_item("foo").unwrap();
    assert_eq!(form.error("foo"), None);
    assert_eq!(count_kind(&form.view(), "HelpBlock"), 0);
}

#[test]
fn emptied_array_is_required_again() {
    let mut schema = array_schema("items.nested-component");
    schema["fields"][0]["validate"] = json!([{ "type": "required-validator" }]);
    let mut form = form(schema, FormConfig::default());
    form.push_item("foo").unwrap();
    assert_eq!(form.error("foo"), None);

    form.remove_item("foo", 0).unwrap();
    assert_eq!(form.error("foo"), Some(FieldError::message("Required")));
}

#[test]
fn array_title_and_description_render_as_headings() {
    let mut schema = array_schema("items.nested-component");
    schema["fields"][0]["title"] = json!("Friends");
    schema["fields"][0]["description"] = json!("Add as many as you like");
    let form = form(schema, FormConfig::default());
    assert_eq!(
        texts(&form.view()),
        vec!["Friends", "Add as many as you like"]
    );
}

#[test]
fn push_to_unknown_array_is_ignored() {
    let mut form = form(array_schema("items.nested-component"), FormConfig::default());
    form.push_item("nope").unwrap();
    assert_eq!(form.value("nope"), None);
    form.remove_item("foo", 4).unwrap();
    assert_eq!(form.value("foo"), None);
}

#[test]
fn array_without_item_fields_renders_controls_only() {
    let schema = json!({
        "fields": [{ "component": "field-array", "name": "tags", "itemDefault": "new" }]
    });
    let mut form = form(schema, FormConfig::default());
    form.push_item("tags").unwrap();

    assert_eq!(form.value("tags"), Some(json!(["new"])));
    assert_eq!(form.find_array("tags").map(|a| a.len()), Some(1));
    assert!(form.mounted_fields().is_empty());
    assert!(find_actions(&form.view()).contains(&FormAction::Remove {
        name: "tags".into(),
        index: 0
    }));
}

#[test]
fn hidden_array_is_cleared_on_unmount() {
    let schema = json!({
        "fields": [
            { "component": "text-field", "name": "bar" },
            {
                "component": "field-array",
                "name": "foo",
                "condition": { "when": "bar", "is": "on" },
                "fields": [{ "component": "text-field", "name": "items.x" }]
            }
        ]
    });
    let mut form = form(schema, FormConfig::clearing());
    form.change("bar", Some(json!("on"))).unwrap();
    form.push_item("foo").unwrap();
    form.change("foo[0]x", Some(json!("hi"))).unwrap();
    assert_eq!(form.value("foo"), Some(json!([{ "x": "hi" }])));

    form.change("bar", Some(json!("off"))).unwrap();
    assert_eq!(form.mounted_fields(), vec!["bar"]);
    assert_eq!(form.value("foo"), None);
    assert_eq!(form.submit(), Ok(json!({ "bar": "off" })));
}

#[test]
fn hidden_array_keeps_its_items_without_clearing() {
    let schema = json!({
        "fields": [
            { "component": "text-field", "name": "bar" },
            {
                "component": "field-array",
                "name": "foo",
                "condition": { "when": "bar", "is": "on" },
                "fields": [{ "component": "text-field", "name": "items.x" }]
            }
        ]
    });
    let mut form = form(schema, FormConfig::default());
    form.change("bar", Some(json!("on"))).unwrap();
    form.push_item("foo").unwrap();
    form.change("foo[0]x", Some(json!("hi"))).unwrap();

    form.change("bar", Some(json!("off"))).unwrap();
    assert_eq!(form.value("foo"), Some(json!([{ "x": "hi" }])));
}

// ============================================================================
// Fixed arrays
// ============================================================================

fn fixed_schema(component: &str) -> Value {
    json!({
        "fields": [{
            "component": component,
            "name": "slots",
            "fields": [
                { "component": "text-field", "name": "slots[0]" },
                { "component": "text-field", "name": "slots[1]" }
            ],
            "additionalItems": { "component": "text-field", "name": "slots[2]" }
        }]
    })
}

#[test]
fn fixed_list_renders_fields_and_one_template() {
    let form = form(fixed_schema("fixed-list"), FormConfig::default());
    let rendered = form.view();

    assert_eq!(rendered.len(), 1);
    assert_eq!(rendered[0].kind, "ArrayFieldWrapper");
    assert_eq!(
        collect_names(&rendered, "text-field"),
        vec!["slots[0]", "slots[1]", "slots[2]"]
    );
    assert!(find_actions(&rendered).is_empty());
    assert_eq!(count_kind(&rendered, "Button"), 0);
}

#[test]
fn fixed_items_option_turns_field_arrays_fixed() {
    let form = form(fixed_schema("field-array"), FormConfig::fixed_items());
    assert!(form.find_array("slots").is_none());
    assert_eq!(form.mounted_fields(), vec!["slots[0]", "slots[1]", "slots[2]"]);

    let dynamic = formwright_testutil::form(fixed_schema("field-array"), FormConfig::default());
    assert!(dynamic.find_array("slots").is_some());
}

#[test]
fn fixed_array_without_template_is_rejected() {
    let schema = json!({
        "fields": [{
            "component": "fixed-list",
            "name": "slots",
            "fields": [{ "component": "text-field", "name": "slots[0]" }]
        }]
    });
    let err = FormKernel::from_json_str(
        &schema.to_string(),
        component_registry(),
        layout_registry(),
        FormConfig::default(),
    )
    .err()
    .unwrap();
    assert_eq!(
        err.downcast_ref::<SchemaError>(),
        Some(&SchemaError::MissingAdditionalItems {
            field: "slots".into()
        })
    );
}

#[test]
fn hidden_fixed_list_is_cleared_on_unmount() {
    let mut schema = fixed_schema("fixed-list");
    schema["fields"][0]["condition"] = json!({ "when": "bar", "is": "on" });
    schema["fields"]
        .as_array_mut()
        .unwrap()
        .insert(0, json!({ "component": "text-field", "name": "bar" }));
    let mut form = form(schema, FormConfig::clearing());
    form.change("bar", Some(json!("on"))).unwrap();
    form.change("slots[1]", Some(json!("b"))).unwrap();
    assert_eq!(form.value("slots"), Some(json!([null, "b"])));

    form.change("bar", Some(json!("off"))).unwrap();
    assert_eq!(form.value("slots"), None);
}
