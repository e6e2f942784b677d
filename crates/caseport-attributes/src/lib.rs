//! Attribute aggregation.
//!
//! Custom fields are discovered item by item. The aggregator collapses them
//! by name into one [`Attribute`] each, binds every item's value to the
//! aggregated id, and keeps `isRequired` honest: once any item lacks a field,
//! the attribute is optional for the rest of the run.

mod options;

use caseport_error::{ExportError, Result};
use caseport_ids::CanonicalId;
use caseport_ports::{FieldDefinition, FieldValue, SourceField};
use caseport_schema::{Attribute, AttributeType, AttributeValue, CaseAttribute};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

pub use options::select_options;

/// How option sets combine when one attribute name is defined more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionMergePolicy {
    /// Keep the first non-empty option set.
    FirstSeen,
    /// Append options not seen before, keeping first-seen order.
    #[default]
    Union,
}

impl OptionMergePolicy {
    pub fn merge(&self, existing: &mut Vec<String>, incoming: &[String]) {
        match self {
            Self::FirstSeen => {
                if existing.is_empty() {
                    existing.extend(incoming.iter().cloned());
                }
            }
            Self::Union => {
                for option in incoming {
                    if !existing.contains(option) {
                        existing.push(option.clone());
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AttributeAggregator {
    attributes: Vec<Attribute>,
    by_name: HashMap<String, usize>,
    policy: OptionMergePolicy,
    fill_all: bool,
    items_finished: usize,
    /// Attributes whose kind so far comes only from null values.
    provisional: HashSet<usize>,
    /// Attributes bound on at least one item.
    carried: HashSet<usize>,
}

impl AttributeAggregator {
    pub fn new(policy: OptionMergePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Bind every known attribute on every item, not just checkboxes.
    pub fn with_fill_all(mut self, fill_all: bool) -> Self {
        self.fill_all = fill_all;
        self
    }

    /// Register a definition known before any item is read.
    pub fn declare(&mut self, def: &FieldDefinition) -> Result<CanonicalId> {
        let idx = self.upsert(&def.name, def.kind, &def.options, def.required)?;
        Ok(self.attributes[idx].id)
    }

    /// Bind one item field, creating or extending its attribute.
    ///
    /// A null value never decides the kind of an existing attribute. An
    /// attribute first seen with a null value takes its kind from the first
    /// concrete value that follows.
    pub fn register_field(&mut self, field: &SourceField) -> Result<CaseAttribute> {
        self.check_field(field)?;
        let idx = match self.by_name.get(&field.name).copied() {
            Some(idx) => {
                self.settle_kind(idx, field);
                let attr = &mut self.attributes[idx];
                self.policy.merge(&mut attr.options, &field.options);
                idx
            }
            None => {
                let idx = self.insert(&field.name, infer_kind(field), &field.options, field.required);
                if field.value.is_none() {
                    self.provisional.insert(idx);
                }
                idx
            }
        };
        self.carried.insert(idx);
        let attr = &mut self.attributes[idx];
        let value = bind_value(attr, field.value.as_ref());
        if attr.kind.has_options() {
            remember_observed(attr, &value);
        }
        Ok(CaseAttribute::new(attr.id, value))
    }

    /// Bind every field of one item and close it out, or change nothing.
    ///
    /// Fields are checked for type conflicts before any of them is applied.
    pub fn register_item(&mut self, fields: &[SourceField]) -> Result<Vec<CaseAttribute>> {
        for field in fields {
            self.check_field(field)?;
        }
        let mut bindings = Vec::with_capacity(fields.len());
        for field in fields {
            bindings.push(self.register_field(field)?);
        }
        let names: HashSet<String> = fields.iter().map(|f| f.name.clone()).collect();
        self.finish_item(&names);
        Ok(bindings)
    }

    fn check_field(&self, field: &SourceField) -> Result<()> {
        let Some(&idx) = self.by_name.get(&field.name) else {
            return Ok(());
        };
        if field.value.is_none() || self.provisional.contains(&idx) {
            return Ok(());
        }
        let existing = self.attributes[idx].kind;
        let incoming = infer_kind(field);
        if compatible(existing, incoming) {
            return Ok(());
        }
        Err(ExportError::AttributeTypeConflict {
            name: field.name.clone(),
            existing: existing.to_string(),
            incoming: incoming.to_string(),
        })
    }

    /// The first concrete value fixes a provisional kind.
    fn settle_kind(&mut self, idx: usize, field: &SourceField) {
        if field.value.is_none() || !self.provisional.remove(&idx) {
            return;
        }
        let attr = &mut self.attributes[idx];
        let incoming = infer_kind(field);
        if !compatible(attr.kind, incoming) {
            debug!(attribute = %attr.name, from = %attr.kind, to = %incoming, "kind settled by first value");
            attr.kind = incoming;
        }
    }

    fn upsert(
        &mut self,
        name: &str,
        kind: AttributeType,
        options: &[String],
        required: bool,
    ) -> Result<usize> {
        let Some(&idx) = self.by_name.get(name) else {
            return Ok(self.insert(name, kind, options, required));
        };
        let attr = &mut self.attributes[idx];
        if self.provisional.remove(&idx) {
            attr.kind = kind;
        } else if !compatible(attr.kind, kind) {
            return Err(ExportError::AttributeTypeConflict {
                name: name.to_string(),
                existing: attr.kind.to_string(),
                incoming: kind.to_string(),
            });
        }
        self.policy.merge(&mut attr.options, options);
        Ok(idx)
    }

    fn insert(&mut self, name: &str, kind: AttributeType, options: &[String], required: bool) -> usize {
        let mut attr = Attribute::new(name, kind);
        // Items finished before this attribute existed did not have it.
        attr.is_required = required && self.items_finished == 0;
        attr.options = options.to_vec();
        debug!(attribute = name, kind = %kind, required = attr.is_required, "new attribute");
        self.by_name.insert(name.to_string(), self.attributes.len());
        self.attributes.push(attr);
        self.attributes.len() - 1
    }

    /// Close out one item: every required attribute it lacks becomes optional.
    ///
    /// The flip is permanent; a later item carrying the field does not
    /// restore it.
    pub fn finish_item(&mut self, item_field_names: &HashSet<String>) {
        self.items_finished += 1;
        for attr in &mut self.attributes {
            if attr.is_required && !item_field_names.contains(&attr.name) {
                debug!(attribute = %attr.name, "attribute missing on an item; no longer required");
                attr.is_required = false;
            }
        }
    }

    /// Add bindings an item must carry even though its source had no value.
    ///
    /// Unset checkboxes get an explicit `"False"`. Any other attribute that
    /// some item carried gets an empty value; with fill-all enabled, so does
    /// every declared attribute no item carried. Empty values bound before
    /// an attribute's kind was known are rewritten for the final kind.
    pub fn backfill(&self, bindings: &mut Vec<CaseAttribute>) {
        let kinds: HashMap<CanonicalId, AttributeType> =
            self.attributes.iter().map(|a| (a.id, a.kind)).collect();
        for binding in bindings.iter_mut() {
            if binding.value.is_empty() {
                if let Some(&kind) = kinds.get(&binding.id) {
                    binding.value = unset_value(kind);
                }
            }
        }

        let present: HashSet<CanonicalId> = bindings.iter().map(|b| b.id).collect();
        for (idx, attr) in self.attributes.iter().enumerate() {
            if present.contains(&attr.id) {
                continue;
            }
            let fill = attr.kind == AttributeType::Checkbox || self.fill_all || self.carried.contains(&idx);
            if fill {
                bindings.push(CaseAttribute::new(attr.id, unset_value(attr.kind)));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.by_name.get(name).map(|&i| &self.attributes[i])
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn into_attributes(self) -> Vec<Attribute> {
        self.attributes
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Fold a duplicate definition into the kept one (cross-batch merge).
///
/// The kept id, name and type win. Required only survives if both agree.
pub fn absorb(kept: &mut Attribute, duplicate: &Attribute, policy: OptionMergePolicy) {
    if kept.kind != duplicate.kind {
        warn!(
            attribute = %kept.name,
            kept = %kept.kind,
            duplicate = %duplicate.kind,
            "attribute type differs between batches; keeping the first"
        );
    }
    policy.merge(&mut kept.options, &duplicate.options);
    kept.is_required = kept.is_required && duplicate.is_required;
    kept.is_active = kept.is_active || duplicate.is_active;
}

/// Type a field implies on its own.
fn infer_kind(field: &SourceField) -> AttributeType {
    match &field.value {
        Some(FieldValue::Bool(_)) => AttributeType::Checkbox,
        Some(FieldValue::StringList(_)) => AttributeType::MultipleOptions,
        Some(FieldValue::String(_)) | None if !field.options.is_empty() => AttributeType::Options,
        Some(FieldValue::String(_)) | None => AttributeType::String,
    }
}

/// Whether a field implying `incoming` may bind to an attribute of `existing`.
fn compatible(existing: AttributeType, incoming: AttributeType) -> bool {
    use AttributeType as T;
    existing == incoming
        || matches!(
            (existing, incoming),
            (T::MultipleOptions, T::Options)
                | (T::Options | T::MultipleOptions, T::String)
                | (T::Datetime | T::User, T::String)
        )
}

/// Value an attribute takes on an item that does not set it.
fn unset_value(kind: AttributeType) -> AttributeValue {
    match kind {
        AttributeType::Checkbox => AttributeValue::checkbox(false),
        AttributeType::MultipleOptions => AttributeValue::List(Vec::new()),
        _ => AttributeValue::empty(),
    }
}

fn bind_value(attr: &Attribute, value: Option<&FieldValue>) -> AttributeValue {
    match (attr.kind, value) {
        (AttributeType::Checkbox, Some(FieldValue::Bool(b))) => AttributeValue::checkbox(*b),
        (AttributeType::Checkbox, Some(FieldValue::String(s))) => {
            AttributeValue::checkbox(matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"))
        }
        (AttributeType::Checkbox, _) => AttributeValue::checkbox(false),
        (AttributeType::MultipleOptions, Some(FieldValue::StringList(v))) => {
            AttributeValue::List(v.clone())
        }
        (AttributeType::MultipleOptions, Some(FieldValue::String(raw))) => {
            AttributeValue::List(select_options(&attr.options, raw))
        }
        (AttributeType::MultipleOptions, _) => AttributeValue::List(Vec::new()),
        (_, Some(FieldValue::String(s))) => AttributeValue::Text(s.clone()),
        (_, Some(FieldValue::StringList(v))) => AttributeValue::Text(v.join(", ")),
        (_, Some(FieldValue::Bool(b))) => AttributeValue::checkbox(*b),
        (_, None) => AttributeValue::empty(),
    }
}

/// Option-typed values must exist in the option set for the import to accept them.
fn remember_observed(attr: &mut Attribute, value: &AttributeValue) {
    let observed: Vec<&String> = match value {
        AttributeValue::Text(s) if !s.is_empty() => vec![s],
        AttributeValue::Text(_) => Vec::new(),
        AttributeValue::List(v) => v.iter().collect(),
    };
    for option in observed {
        if !attr.options.contains(option) {
            attr.options.push(option.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, value: Option<FieldValue>) -> SourceField {
        SourceField {
            name: name.into(),
            value,
            options: Vec::new(),
            required: false,
        }
    }

    fn text(s: &str) -> Option<FieldValue> {
        Some(FieldValue::String(s.into()))
    }

    fn names(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn same_name_collapses_to_one_id() {
        let mut agg = AttributeAggregator::new(OptionMergePolicy::Union);
        let a = agg.register_field(&field("Owner", text("ann"))).unwrap();
        let b = agg.register_field(&field("Owner", text("bob"))).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(agg.len(), 1);
        assert_eq!(b.value, AttributeValue::from("bob"));
    }

    #[test]
    fn kinds_are_inferred_from_values() {
        let mut agg = AttributeAggregator::new(OptionMergePolicy::Union);
        agg.register_field(&field("Automated", Some(FieldValue::Bool(true))))
            .unwrap();
        agg.register_field(&field(
            "Labels",
            Some(FieldValue::StringList(vec!["a".into()])),
        ))
        .unwrap();
        let mut component = field("Component", text("UI"));
        component.options = vec!["UI".into(), "API".into()];
        agg.register_field(&component).unwrap();
        agg.register_field(&field("Notes", text("n"))).unwrap();

        assert_eq!(agg.get("Automated").unwrap().kind, AttributeType::Checkbox);
        assert_eq!(agg.get("Labels").unwrap().kind, AttributeType::MultipleOptions);
        assert_eq!(agg.get("Component").unwrap().kind, AttributeType::Options);
        assert_eq!(agg.get("Notes").unwrap().kind, AttributeType::String);
    }

    #[test]
    fn null_values_bind_as_empty() {
        let mut agg = AttributeAggregator::new(OptionMergePolicy::Union);
        let bound = agg.register_field(&field("Notes", None)).unwrap();
        assert_eq!(bound.value, AttributeValue::empty());
    }

    #[test]
    fn conflicting_types_are_rejected() {
        let mut agg = AttributeAggregator::new(OptionMergePolicy::Union);
        agg.register_field(&field("Flag", Some(FieldValue::Bool(true))))
            .unwrap();
        let err = agg.register_field(&field("Flag", text("yes"))).unwrap_err();
        assert!(matches!(err, ExportError::AttributeTypeConflict { .. }));
    }

    #[test]
    fn declared_options_accept_plain_strings() {
        let mut agg = AttributeAggregator::new(OptionMergePolicy::Union);
        agg.declare(&FieldDefinition {
            name: "Component".into(),
            kind: AttributeType::Options,
            options: vec!["UI".into()],
            required: false,
        })
        .unwrap();
        let bound = agg.register_field(&field("Component", text("API"))).unwrap();
        assert_eq!(bound.value, AttributeValue::from("API"));
        assert_eq!(agg.get("Component").unwrap().options, vec!["UI", "API"]);
    }

    #[test]
    fn multiple_options_select_whole_tokens() {
        let mut agg = AttributeAggregator::new(OptionMergePolicy::Union);
        agg.declare(&FieldDefinition {
            name: "Platforms".into(),
            kind: AttributeType::MultipleOptions,
            options: vec!["Web".into(), "Web Mobile".into(), "iOS".into()],
            required: false,
        })
        .unwrap();
        let bound = agg
            .register_field(&field("Platforms", text("Web Mobile, iOS")))
            .unwrap();
        assert_eq!(
            bound.value,
            AttributeValue::List(vec!["Web Mobile".into(), "iOS".into()])
        );
    }

    #[test]
    fn missing_field_makes_attribute_optional() {
        let mut agg = AttributeAggregator::new(OptionMergePolicy::Union);
        let mut a = field("A", text("x"));
        a.required = true;
        agg.register_field(&a).unwrap();
        agg.finish_item(&names(&["A"]));
        assert!(agg.get("A").unwrap().is_required);

        agg.finish_item(&names(&[]));
        assert!(!agg.get("A").unwrap().is_required);

        // Monotonic: carrying the field again does not restore it.
        agg.register_field(&a).unwrap();
        agg.finish_item(&names(&["A"]));
        assert!(!agg.get("A").unwrap().is_required);
    }

    #[test]
    fn attribute_discovered_late_is_optional() {
        let mut agg = AttributeAggregator::new(OptionMergePolicy::Union);
        // First item had no custom fields at all.
        agg.finish_item(&names(&[]));
        let mut a = field("A", text("x"));
        a.required = true;
        agg.register_field(&a).unwrap();
        agg.finish_item(&names(&["A"]));
        assert!(!agg.get("A").unwrap().is_required);
    }

    #[test]
    fn checkboxes_backfill_false() {
        let mut agg = AttributeAggregator::new(OptionMergePolicy::Union);
        agg.register_field(&field("Automated", Some(FieldValue::Bool(true))))
            .unwrap();
        agg.register_field(&field("Notes", text("n"))).unwrap();

        let mut bindings = Vec::new();
        agg.backfill(&mut bindings);
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].id, agg.get("Automated").unwrap().id);
        assert_eq!(bindings[0].value, AttributeValue::from("False"));
        assert_eq!(bindings[1].id, agg.get("Notes").unwrap().id);
        assert_eq!(bindings[1].value, AttributeValue::empty());

        // Already-set checkboxes are left alone.
        let mut set = vec![CaseAttribute::new(
            agg.get("Automated").unwrap().id,
            AttributeValue::checkbox(true),
        )];
        agg.backfill(&mut set);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn null_after_checkbox_binds_false() {
        let mut agg = AttributeAggregator::new(OptionMergePolicy::Union);
        agg.register_field(&field("Automated", Some(FieldValue::Bool(true))))
            .unwrap();
        let bound = agg.register_field(&field("Automated", None)).unwrap();
        assert_eq!(bound.value, AttributeValue::from("False"));
        assert_eq!(agg.get("Automated").unwrap().kind, AttributeType::Checkbox);
    }

    #[test]
    fn checkbox_after_null_settles_the_kind() {
        let mut agg = AttributeAggregator::new(OptionMergePolicy::Union);
        let first = agg.register_field(&field("Automated", None)).unwrap();
        let second = agg
            .register_field(&field("Automated", Some(FieldValue::Bool(true))))
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.value, AttributeValue::from("True"));
        assert_eq!(agg.get("Automated").unwrap().kind, AttributeType::Checkbox);

        // The binding made before the kind was known reads as unchecked.
        let mut bindings = vec![first];
        agg.backfill(&mut bindings);
        assert_eq!(bindings, vec![CaseAttribute::new(second.id, AttributeValue::from("False"))]);

        // Once settled, the kind is enforced again.
        let err = agg.register_field(&field("Automated", Some(FieldValue::StringList(vec![]))));
        assert!(matches!(err, Err(ExportError::AttributeTypeConflict { .. })));
    }

    #[test]
    fn declared_checkbox_accepts_null() {
        let mut agg = AttributeAggregator::new(OptionMergePolicy::Union);
        agg.declare(&FieldDefinition {
            name: "Automated".into(),
            kind: AttributeType::Checkbox,
            options: Vec::new(),
            required: false,
        })
        .unwrap();
        let bound = agg.register_field(&field("Automated", None)).unwrap();
        assert_eq!(bound.value, AttributeValue::from("False"));
    }

    #[test]
    fn carried_attributes_backfill_empty_by_default() {
        let mut agg = AttributeAggregator::new(OptionMergePolicy::Union);
        agg.declare(&FieldDefinition {
            name: "Unused".into(),
            kind: AttributeType::String,
            options: Vec::new(),
            required: false,
        })
        .unwrap();
        agg.register_field(&field("Owner", text("ann"))).unwrap();
        agg.register_field(&field(
            "Labels",
            Some(FieldValue::StringList(vec!["a".into()])),
        ))
        .unwrap();

        let mut bindings = Vec::new();
        agg.backfill(&mut bindings);
        assert_eq!(
            bindings,
            vec![
                CaseAttribute::new(agg.get("Owner").unwrap().id, AttributeValue::empty()),
                CaseAttribute::new(agg.get("Labels").unwrap().id, AttributeValue::List(vec![])),
            ]
        );
    }

    #[test]
    fn register_item_changes_nothing_on_conflict() {
        let mut agg = AttributeAggregator::new(OptionMergePolicy::Union);
        let mut flag = field("Flag", Some(FieldValue::Bool(true)));
        flag.required = true;
        agg.register_item(&[flag]).unwrap();
        let before = agg.attributes().to_vec();

        let err = agg
            .register_item(&[field("Fresh", text("x")), field("Flag", text("yes"))])
            .unwrap_err();

        assert!(matches!(err, ExportError::AttributeTypeConflict { .. }));
        assert_eq!(agg.attributes(), before.as_slice());
        assert!(agg.get("Fresh").is_none());
        assert_eq!(agg.items_finished, 1);
        assert!(agg.get("Flag").unwrap().is_required);
    }

    #[test]
    fn register_item_finishes_the_item() {
        let mut agg = AttributeAggregator::new(OptionMergePolicy::Union);
        let mut a = field("A", text("x"));
        a.required = true;
        let bound = agg.register_item(&[a]).unwrap();
        assert_eq!(bound.len(), 1);
        assert!(agg.get("A").unwrap().is_required);

        agg.register_item(&[]).unwrap();
        assert!(!agg.get("A").unwrap().is_required);
        assert_eq!(agg.items_finished, 2);
    }

    #[test]
    fn fill_all_binds_every_attribute() {
        let mut agg = AttributeAggregator::new(OptionMergePolicy::Union).with_fill_all(true);
        agg.register_field(&field("Notes", text("n"))).unwrap();
        agg.register_field(&field(
            "Labels",
            Some(FieldValue::StringList(vec!["a".into()])),
        ))
        .unwrap();
        let mut bindings = Vec::new();
        agg.backfill(&mut bindings);
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].value, AttributeValue::empty());
        assert_eq!(bindings[1].value, AttributeValue::List(vec![]));
    }

    #[test]
    fn option_policy_first_seen_keeps_first_set() {
        let mut agg = AttributeAggregator::new(OptionMergePolicy::FirstSeen);
        let def = |opts: &[&str]| FieldDefinition {
            name: "Env".into(),
            kind: AttributeType::Options,
            options: opts.iter().map(|s| s.to_string()).collect(),
            required: false,
        };
        agg.declare(&def(&["Dev", "Prod"])).unwrap();
        agg.declare(&def(&["Prod", "Stage"])).unwrap();
        assert_eq!(agg.get("Env").unwrap().options, vec!["Dev", "Prod"]);
    }

    #[test]
    fn option_policy_union_appends_new_options() {
        let mut agg = AttributeAggregator::new(OptionMergePolicy::Union);
        let def = |opts: &[&str]| FieldDefinition {
            name: "Env".into(),
            kind: AttributeType::Options,
            options: opts.iter().map(|s| s.to_string()).collect(),
            required: false,
        };
        agg.declare(&def(&["Dev", "Prod"])).unwrap();
        agg.declare(&def(&["Prod", "Stage"])).unwrap();
        assert_eq!(agg.get("Env").unwrap().options, vec!["Dev", "Prod", "Stage"]);
    }

    #[test]
    fn absorb_merges_duplicate_definitions() {
        let mut kept = Attribute::new("Env", AttributeType::Options);
        kept.is_required = true;
        kept.options = vec!["Dev".into()];
        let mut dup = Attribute::new("Env", AttributeType::Options);
        dup.options = vec!["Prod".into()];

        let mut first = kept.clone();
        absorb(&mut first, &dup, OptionMergePolicy::FirstSeen);
        assert_eq!(first.options, vec!["Dev"]);
        assert!(!first.is_required);

        absorb(&mut kept, &dup, OptionMergePolicy::Union);
        assert_eq!(kept.options, vec!["Dev", "Prod"]);
    }

    #[test]
    fn policy_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&OptionMergePolicy::FirstSeen).unwrap(),
            "\"first_seen\""
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn option_list() -> impl Strategy<Value = Vec<String>> {
            prop::collection::btree_set("[a-e]{1,2}", 0..6).prop_map(|set| set.into_iter().collect())
        }

        proptest! {
            #[test]
            fn union_keeps_every_option_once(a in option_list(), b in option_list()) {
                let mut merged = a.clone();
                OptionMergePolicy::Union.merge(&mut merged, &b);
                for option in a.iter().chain(&b) {
                    prop_assert_eq!(merged.iter().filter(|o| *o == option).count(), 1);
                }
                let mut again = merged.clone();
                OptionMergePolicy::Union.merge(&mut again, &b);
                prop_assert_eq!(again, merged);
            }

            #[test]
            fn first_seen_only_fills_empty_sets(a in option_list(), b in option_list()) {
                let mut merged = a.clone();
                OptionMergePolicy::FirstSeen.merge(&mut merged, &b);
                if a.is_empty() {
                    prop_assert_eq!(merged, b);
                } else {
                    prop_assert_eq!(merged, a);
                }
            }
        }
    }
}
