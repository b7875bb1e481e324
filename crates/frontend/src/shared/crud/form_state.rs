//! Form draft state and the pure half of the form renderer.
//!
//! The draft is one JSON tree addressed by field paths. Hidden-by-
//! condition fields keep their values (toggling a discriminant back
//! restores prior input); they are only excluded from validation and
//! from the submitted payload. Explicitly linked dependents are the
//! exception: they are cleared whenever their trigger field changes.

use std::collections::BTreeMap;

use contracts::shared::error::FieldError;
use contracts::shared::metadata::{duplicate_path, FieldSpec};
use contracts::shared::path::FieldPath;
use serde_json::{Map, Value};

/// Ephemeral editing state for one open-form session. Discarded on
/// submit success or cancel, never shared across sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct FormDraft {
    pub values: Value,
    /// Field errors keyed by dotted path; the form-level message (remote
    /// rejection, transport) lives next to the submit button instead.
    pub errors: BTreeMap<String, String>,
}

impl FormDraft {
    /// Fresh draft for create.
    pub fn new() -> Self {
        Self {
            values: Value::Object(Map::new()),
            errors: BTreeMap::new(),
        }
    }

    /// Draft seeded from an existing record for edit.
    pub fn from_record(record: Value) -> Self {
        Self {
            values: record,
            errors: BTreeMap::new(),
        }
    }

    pub fn value_at(&self, path: &FieldPath) -> Option<&Value> {
        path.get(&self.values)
    }

    /// Current field value as input text.
    pub fn text_at(&self, path: &FieldPath) -> String {
        match self.value_at(path) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Apply a user edit through a spec: write the value, fire the
    /// spec's linked resets, drop stale error messages for everything
    /// that changed.
    pub fn apply_change(&mut self, spec: &FieldSpec, value: Value) {
        if value.is_null() {
            spec.name.remove(&mut self.values);
        } else if let Err(err) = spec.name.set(&mut self.values, value) {
            log::warn!("draft write at `{}` failed: {err}", spec.name);
            return;
        }
        self.errors.remove(&spec.name.dotted());
        for reset in &spec.resets {
            reset.remove(&mut self.values);
            self.errors.remove(&reset.dotted());
        }
    }

    /// Write an arbitrary path without reset side effects (custom
    /// renderers maintaining companion values such as file names).
    pub fn set_path(&mut self, path: &FieldPath, value: Value) {
        if value.is_null() {
            path.remove(&mut self.values);
        } else if let Err(err) = path.set(&mut self.values, value) {
            log::warn!("draft write at `{path}` failed: {err}");
        }
        self.errors.remove(&path.dotted());
    }

    pub fn error_at(&self, path: &FieldPath) -> Option<&String> {
        self.errors.get(&path.dotted())
    }

    pub fn set_error(&mut self, path: &FieldPath, message: impl Into<String>) {
        self.errors.insert(path.dotted(), message.into());
    }

    pub fn clear_error(&mut self, path: &FieldPath) {
        self.errors.remove(&path.dotted());
    }

    pub fn replace_errors(&mut self, errors: &[FieldError]) {
        self.errors = errors
            .iter()
            .map(|e| (e.path.clone(), e.message.clone()))
            .collect();
    }
}

impl Default for FormDraft {
    fn default() -> Self {
        Self::new()
    }
}

/// The active field set is a pure function of the current draft values,
/// recomputed synchronously on every relevant change.
pub fn active_fields<'a>(specs: &'a [FieldSpec], values: &Value) -> Vec<&'a FieldSpec> {
    let active: Vec<&FieldSpec> = specs.iter().filter(|s| s.is_visible(values)).collect();
    if let Some(path) = duplicate_path(&active) {
        // Two specs targeting one path is a page-declaration bug; keep
        // the first and drop later claimants so the form stays usable.
        log::error!("duplicate field path `{path}` in active field set");
        let mut seen = std::collections::HashSet::new();
        return active
            .into_iter()
            .filter(|s| seen.insert(s.name.clone()))
            .collect();
    }
    active
}

/// One full synchronous validation pass over the active set. Collects
/// every failing field instead of stopping at the first.
pub fn validate_all_sync(active: &[&FieldSpec], values: &Value) -> Vec<FieldError> {
    active
        .iter()
        .filter_map(|spec| {
            spec.validate_sync(values)
                .map(|message| FieldError::new(spec.name.dotted(), message))
        })
        .collect()
}

/// Build the submit payload: walk the active specs and copy each present
/// value into a fresh record at its path. Values parked under inactive
/// paths never leave the draft.
pub fn build_payload(active: &[&FieldSpec], values: &Value) -> Value {
    let mut payload = Value::Object(Map::new());
    for spec in active {
        if let Some(value) = spec.name.get(values) {
            if value.is_null() {
                continue;
            }
            // Paths already proved writable when the draft was edited.
            if let Err(err) = spec.name.set(&mut payload, value.clone()) {
                log::warn!("payload write at `{}` failed: {err}", spec.name);
            }
        }
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::shared::metadata::PatternRule;
    use serde_json::json;

    fn android_only(values: &Value) -> bool {
        values["category"] == json!("android")
    }

    fn spec_set() -> Vec<FieldSpec> {
        vec![
            FieldSpec::input("name").label("Name"),
            FieldSpec::select("category", [("android", "Android"), ("ios", "iOS")])
                .label("Category")
                .optional(),
            FieldSpec::input("alias")
                .label("Alias")
                .visible_when(android_only),
        ]
    }

    #[test]
    fn test_active_set_follows_discriminant() {
        let specs = spec_set();
        let hidden = active_fields(&specs, &json!({}));
        assert_eq!(hidden.len(), 2);
        let shown = active_fields(&specs, &json!({"category": "android"}));
        assert_eq!(shown.len(), 3);
    }

    #[test]
    fn test_submit_without_discriminant_skips_conditional_field() {
        // category unset: the conditional field stays out of the payload
        let specs = spec_set();
        let mut draft = FormDraft::new();
        draft.apply_change(&specs[0], json!("x"));
        let active = active_fields(&specs, &draft.values);
        assert!(validate_all_sync(&active, &draft.values).is_empty());
        assert_eq!(build_payload(&active, &draft.values), json!({"name": "x"}));
    }

    #[test]
    fn test_conditional_required_field_blocks_submit() {
        let specs = spec_set();
        let mut draft = FormDraft::new();
        draft.apply_change(&specs[0], json!("x"));
        draft.apply_change(&specs[1], json!("android"));
        let active = active_fields(&specs, &draft.values);
        let errors = validate_all_sync(&active, &draft.values);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "alias");
    }

    #[test]
    fn test_discriminant_toggle_retains_values() {
        // A -> B -> A restores what was typed under A.
        let specs = spec_set();
        let mut draft = FormDraft::new();
        draft.apply_change(&specs[1], json!("android"));
        draft.apply_change(&specs[2], json!("key0"));
        draft.apply_change(&specs[1], json!("ios"));
        // alias hidden but retained
        assert_eq!(draft.text_at(&specs[2].name), "key0");
        let active = active_fields(&specs, &draft.values);
        assert!(!active.iter().any(|s| s.name.dotted() == "alias"));
        draft.apply_change(&specs[1], json!("android"));
        let active = active_fields(&specs, &draft.values);
        assert_eq!(
            build_payload(&active, &draft.values)["alias"],
            json!("key0")
        );
    }

    #[test]
    fn test_toggle_restores_no_stale_value_when_never_filled() {
        // alias never filled: toggling ios -> android again must not
        // invent a value.
        let specs = spec_set();
        let mut draft = FormDraft::new();
        draft.apply_change(&specs[0], json!("x"));
        draft.apply_change(&specs[1], json!("android"));
        draft.apply_change(&specs[1], json!("ios"));
        draft.apply_change(&specs[1], json!("android"));
        assert_eq!(draft.value_at(&specs[2].name), None);
        let active = active_fields(&specs, &draft.values);
        let errors = validate_all_sync(&active, &draft.values);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "alias");
    }

    #[test]
    fn test_linked_reset_clears_dependents() {
        let upload = FieldSpec::custom("iosInfo.keyChainP12.uuid", "upload")
            .label("Keychain-p12 File")
            .resets([
                FieldPath::parse("iosInfo.keyChainP12.password"),
                FieldPath::parse("iosInfo.keyChainP12.fileName"),
            ]);
        let mut draft = FormDraft::new();
        draft.set_path(&FieldPath::parse("iosInfo.keyChainP12.password"), json!("s3cret"));
        draft.apply_change(&upload, json!("uuid-2"));
        assert_eq!(
            draft.value_at(&FieldPath::parse("iosInfo.keyChainP12.password")),
            None
        );
        assert_eq!(draft.text_at(&upload.name), "uuid-2");
    }

    #[test]
    fn test_validation_surfaces_all_failures_in_one_pass() {
        let specs = vec![
            FieldSpec::input("name").label("Name"),
            FieldSpec::input("version")
                .label("Version")
                .rule(PatternRule::new(r"^[A-Za-z0-9._+-]+$", "bad version")),
            FieldSpec::input("desc").label("Description"),
        ];
        let values = json!({"version": "1 0"});
        let active = active_fields(&specs, &values);
        let errors = validate_all_sync(&active, &values);
        assert_eq!(errors.len(), 3);
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["name", "version", "desc"]);
    }

    #[test]
    fn test_unedited_record_round_trips_through_payload() {
        let specs = vec![
            FieldSpec::input("name").label("Name"),
            FieldSpec::input("desc").label("Description").optional(),
            FieldSpec::hidden("id"),
        ];
        let record = json!({
            "id": "42",
            "name": "cert-a",
            "desc": "first",
            "createdAt": "2024-03-15T14:02:26Z"
        });
        let draft = FormDraft::from_record(record.clone());
        let active = active_fields(&specs, &draft.values);
        // payload equals the record restricted to the active paths
        assert_eq!(
            build_payload(&active, &draft.values),
            json!({"id": "42", "name": "cert-a", "desc": "first"})
        );
    }

    #[test]
    fn test_apply_change_clears_field_error() {
        let specs = spec_set();
        let mut draft = FormDraft::new();
        draft.set_error(&specs[0].name, "Name is required");
        draft.apply_change(&specs[0], json!("x"));
        assert_eq!(draft.error_at(&specs[0].name), None);
    }
}
