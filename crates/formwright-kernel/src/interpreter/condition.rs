//! Conditional visibility.

use std::collections::HashSet;

use formwright_types::{Condition, FieldDescriptor};
use regex::Regex;
use serde_json::Value;

use super::node::Node;
use super::walker::mount_unconditioned;
use super::{ViewContext, WalkContext};
use crate::components::Element;
use crate::error::{display_name, SchemaError};
use crate::store::SubscriptionId;

/// Empty means absent, null, `""`, `[]` or `{}`. Numbers and booleans never
/// are.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Bool(_)) | Some(Value::Number(_)) => false,
    }
}

/// Evaluate `condition` against the watched field's value.
///
/// `regex` is the compiled `condition.pattern`, when there is one.
pub fn evaluate(condition: &Condition, regex: Option<&Regex>, value: Option<&Value>) -> bool {
    if let Some(flag) = condition.is_not_empty {
        return !is_empty_value(value) == flag;
    }
    if let Some(flag) = condition.is_empty {
        return is_empty_value(value) == flag;
    }
    if let Some(regex) = regex {
        let text = match value {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        return regex.is_match(&text) != condition.not_match;
    }
    let matched = match (&condition.is, value) {
        (Some(Value::Array(accepted)), Some(v)) => accepted.contains(v),
        (Some(Value::Array(_)), None) => false,
        (Some(expected), Some(v)) => expected == v,
        (Some(_), None) => false,
        (None, _) => false,
    };
    matched != condition.not_match
}

/// Compile a condition's pattern, naming `field` on failure.
pub(crate) fn compile_pattern(
    condition: &Condition,
    field: Option<&str>,
) -> Result<Option<Regex>, SchemaError> {
    condition
        .pattern
        .as_deref()
        .map(|pattern| {
            Regex::new(pattern).map_err(|e| SchemaError::InvalidPattern {
                field: display_name(field),
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

/// A subtree mounted only while its condition holds.
///
/// The gate watches exactly one path. Flipping to false disposes the
/// subtree; flipping back mounts it afresh.
pub struct ConditionGate {
    condition: Condition,
    regex: Option<Regex>,
    subscription: SubscriptionId,
    /// The gated descriptor, without its condition.
    field: FieldDescriptor,
    children: Vec<Node>,
}

impl ConditionGate {
    pub fn mount(field: &FieldDescriptor, ctx: &mut WalkContext<'_>) -> Result<Self, SchemaError> {
        let mut inner = field.clone();
        let condition = inner.condition.take().ok_or_else(|| SchemaError::InvalidCondition {
            field: display_name(field.identity()),
            reason: "condition must be an object".to_string(),
        })?;
        let regex = compile_pattern(&condition, field.identity())?;

        let subscription = ctx.store.subscribe(&condition.when);
        let mut gate = Self {
            condition,
            regex,
            subscription,
            field: inner,
            children: Vec::new(),
        };

        let value = ctx.store.value(&gate.condition.when);
        if value.is_none() && !ctx.store.is_registered(&gate.condition.when) {
            tracing::warn!(
                when = %gate.condition.when,
                field = %display_name(gate.field.identity()),
                "condition watches a field that is neither registered nor valued"
            );
        }
        if gate.holds(value.as_ref()) {
            if let Err(err) = gate.show(ctx) {
                ctx.store.unsubscribe(gate.subscription);
                return Err(err);
            }
        }
        Ok(gate)
    }

    pub fn is_visible(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    fn holds(&self, value: Option<&Value>) -> bool {
        evaluate(&self.condition, self.regex.as_ref(), value)
    }

    fn show(&mut self, ctx: &mut WalkContext<'_>) -> Result<(), SchemaError> {
        let node = mount_unconditioned(&self.field, ctx)?;
        tracing::debug!(
            when = %self.condition.when,
            field = %display_name(self.field.identity()),
            "condition met, subtree mounted"
        );
        self.children = vec![node];
        Ok(())
    }

    fn hide(&mut self, ctx: &mut WalkContext<'_>) {
        for mut node in self.children.drain(..) {
            node.dispose(ctx);
        }
        tracing::debug!(
            when = %self.condition.when,
            field = %display_name(self.field.identity()),
            "condition failed, subtree unmounted"
        );
    }

    pub fn notify(
        &mut self,
        fired: &HashSet<SubscriptionId>,
        ctx: &mut WalkContext<'_>,
    ) -> Result<(), SchemaError> {
        if fired.contains(&self.subscription) {
            let value = ctx.store.value(&self.condition.when);
            let holds = self.holds(value.as_ref());
            if holds && !self.is_visible() {
                self.show(ctx)?;
                return Ok(());
            }
            if !holds && self.is_visible() {
                self.hide(ctx);
                return Ok(());
            }
        }
        for child in &mut self.children {
            child.notify(fired, ctx)?;
        }
        Ok(())
    }

    pub fn dispose(&mut self, ctx: &mut WalkContext<'_>) {
        ctx.store.unsubscribe(self.subscription);
        for mut node in self.children.drain(..) {
            node.dispose(ctx);
        }
    }

    pub fn view(&self, view: ViewContext<'_>) -> Vec<Element> {
        self.children.iter().flat_map(|c| c.view(view)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn eval(condition: &Condition, value: Option<Value>) -> bool {
        let regex = compile_pattern(condition, None).unwrap();
        evaluate(condition, regex.as_ref(), value.as_ref())
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some(json!(null)), true)]
    #[case(Some(json!("")), true)]
    #[case(Some(json!([])), true)]
    #[case(Some(json!({})), true)]
    #[case(Some(json!(0)), false)]
    #[case(Some(json!(false)), false)]
    #[case(Some(json!(" ")), false)]
    fn emptiness(#[case] value: Option<Value>, #[case] empty: bool) {
        assert_eq!(is_empty_value(value.as_ref()), empty);
    }

    #[test]
    fn equality_and_not_match() {
        let is_fuzz = Condition::when("bar").is("fuzz");
        assert!(eval(&is_fuzz, Some(json!("fuzz"))));
        assert!(!eval(&is_fuzz, Some(json!("buzz"))));
        assert!(!eval(&is_fuzz, None));

        let not_fuzz = Condition::when("bar").is("fuzz").not_match();
        assert!(!eval(&not_fuzz, Some(json!("fuzz"))));
        assert!(eval(&not_fuzz, Some(json!("buzz"))));
        assert!(eval(&not_fuzz, None));
    }

    #[test]
    fn equality_is_strict() {
        let c = Condition::when("n").is(1);
        assert!(eval(&c, Some(json!(1))));
        assert!(!eval(&c, Some(json!("1"))));
    }

    #[test]
    fn array_is_means_membership() {
        let c = Condition::when("x").is(json!(["a", "b"]));
        assert!(eval(&c, Some(json!("b"))));
        assert!(!eval(&c, Some(json!("c"))));
        assert!(eval(&c.clone().not_match(), Some(json!("c"))));
    }

    #[test]
    fn is_not_empty_beats_everything() {
        let c = Condition::when("x").is_not_empty(true).is("nope").pattern("^z");
        assert!(eval(&c, Some(json!("a"))));
        assert!(!eval(&c, Some(json!(""))));
        // notMatch never inverts emptiness checks.
        assert!(eval(&c.not_match(), Some(json!("a"))));
    }

    #[test]
    fn is_empty_beats_pattern() {
        let c = Condition::when("x").is_empty(true).pattern("^a");
        assert!(eval(&c, None));
        assert!(!eval(&c, Some(json!("abc"))));
    }

    #[test]
    fn pattern_beats_equality() {
        let c = Condition::when("x").pattern("^fo+$").is("nope");
        assert!(eval(&c, Some(json!("fooo"))));
        assert!(!eval(&c, Some(json!("bar"))));
        assert!(eval(&c.not_match(), Some(json!("bar"))));
    }

    #[test]
    fn pattern_tests_stringified_values() {
        let c = Condition::when("x").pattern("^\\d+$");
        assert!(eval(&c, Some(json!(42))));
        assert!(!eval(&c, None));
    }

    #[test]
    fn bad_pattern_is_a_schema_error() {
        let c = Condition::when("x").pattern("(");
        assert!(matches!(
            compile_pattern(&c, Some("f")),
            Err(SchemaError::InvalidPattern { .. })
        ));
    }
}
