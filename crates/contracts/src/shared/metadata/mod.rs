//! Declarative descriptions of form fields and table columns.
//!
//! A page declares its whole CRUD surface as data: `FieldSpec`s for the
//! form and filter widgets, `ColumnSpec`s for the list. The engine owns
//! all behavior; these types carry no I/O.

mod kind;
mod validation;

pub use kind::FieldKind;
pub use validation::{AsyncRule, AsyncRuleFuture, PatternRule};

use std::sync::Arc;

use serde_json::Value;

use crate::shared::path::FieldPath;

/// Predicate over current draft values; drives conditional field sets.
pub type VisibleWhen = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Projects a cell to display text: `(cell value, whole record) -> text`.
pub type CellRender = Arc<dyn Fn(Option<&Value>, &Value) -> String + Send + Sync>;

/// One declared form/filter field.
#[derive(Clone)]
pub struct FieldSpec {
    pub name: FieldPath,
    pub label: String,
    pub kind: FieldKind,
    /// Default true; `optional()` clears it.
    pub required: bool,
    pub rules: Vec<PatternRule>,
    pub async_rule: Option<AsyncRule>,
    /// Conditional inclusion; absent means always visible.
    pub visible_when: Option<VisibleWhen>,
    /// Paths cleared whenever this field's value changes (a password
    /// scoped to an upload is meaningless once the file changes).
    pub resets: Vec<FieldPath>,
    /// Renderer id for `FieldKind::Custom`, resolved by the host page.
    pub render: Option<String>,
    /// `(value, label)` pairs for Select/RadioGroup.
    pub options: Vec<(String, String)>,
    pub placeholder: Option<String>,
    pub max_length: Option<usize>,
    /// Identity fields the original forms lock while editing.
    pub disabled_on_edit: bool,
}

impl FieldSpec {
    fn with_kind(name: impl Into<FieldPath>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            kind,
            required: true,
            rules: Vec::new(),
            async_rule: None,
            visible_when: None,
            resets: Vec::new(),
            render: None,
            options: Vec::new(),
            placeholder: None,
            max_length: None,
            disabled_on_edit: false,
        }
    }

    pub fn input(name: impl Into<FieldPath>) -> Self {
        Self::with_kind(name, FieldKind::Input)
    }

    pub fn password(name: impl Into<FieldPath>) -> Self {
        Self::with_kind(name, FieldKind::Password)
    }

    pub fn select(
        name: impl Into<FieldPath>,
        options: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let mut spec = Self::with_kind(name, FieldKind::Select);
        spec.options = options
            .into_iter()
            .map(|(v, l)| (v.into(), l.into()))
            .collect();
        spec
    }

    pub fn radio_group(
        name: impl Into<FieldPath>,
        options: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let mut spec = Self::with_kind(name, FieldKind::RadioGroup);
        spec.options = options
            .into_iter()
            .map(|(v, l)| (v.into(), l.into()))
            .collect();
        spec
    }

    pub fn custom(name: impl Into<FieldPath>, render: impl Into<String>) -> Self {
        let mut spec = Self::with_kind(name, FieldKind::Custom);
        spec.render = Some(render.into());
        spec
    }

    /// Hidden fields are optional by default: they carry derived values
    /// (ids, file names) rather than user input.
    pub fn hidden(name: impl Into<FieldPath>) -> Self {
        let mut spec = Self::with_kind(name, FieldKind::Hidden);
        spec.required = false;
        spec
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn rule(mut self, rule: PatternRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn async_rule(
        mut self,
        rule: impl Fn(Value, Value) -> AsyncRuleFuture + Send + Sync + 'static,
    ) -> Self {
        self.async_rule = Some(Arc::new(rule));
        self
    }

    pub fn visible_when(mut self, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.visible_when = Some(Arc::new(predicate));
        self
    }

    pub fn resets(mut self, paths: impl IntoIterator<Item = impl Into<FieldPath>>) -> Self {
        self.resets = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn disabled_on_edit(mut self) -> Self {
        self.disabled_on_edit = true;
        self
    }

    /// Whether the field belongs to the active set for these draft values.
    pub fn is_visible(&self, values: &Value) -> bool {
        self.visible_when.as_ref().map_or(true, |p| p(values))
    }

    /// Run required + pattern checks against the draft. Returns the first
    /// failing message for this field; async rules are the renderer's job.
    pub fn validate_sync(&self, values: &Value) -> Option<String> {
        let value = self.name.get(values);
        if self.required && is_blank(value) {
            let label = if self.label.is_empty() {
                self.name.dotted()
            } else {
                self.label.clone()
            };
            return Some(format!("{} is required", label));
        }
        if let Some(value) = value {
            if let Some(max) = self.max_length {
                if value.as_str().map_or(false, |s| s.chars().count() > max) {
                    return Some(format!("no more than {} characters", max));
                }
            }
            for rule in &self.rules {
                if let Err(message) = rule.check(value) {
                    return Some(message);
                }
            }
        }
        None
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

impl std::fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name.dotted())
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// One declared table column.
#[derive(Clone)]
pub struct ColumnSpec {
    pub title: String,
    pub data_path: FieldPath,
    pub width: Option<u32>,
    pub render: Option<CellRender>,
}

impl ColumnSpec {
    pub fn new(title: impl Into<String>, data_path: impl Into<FieldPath>) -> Self {
        Self {
            title: title.into(),
            data_path: data_path.into(),
            width: None,
            render: None,
        }
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn render(
        mut self,
        render: impl Fn(Option<&Value>, &Value) -> String + Send + Sync + 'static,
    ) -> Self {
        self.render = Some(Arc::new(render));
        self
    }

    /// Display text for one record's cell.
    pub fn cell_text(&self, record: &Value) -> String {
        let value = self.data_path.get(record);
        match &self.render {
            Some(render) => render(value, record),
            None => match value {
                None | Some(Value::Null) => "-".to_string(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            },
        }
    }
}

impl std::fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("title", &self.title)
            .field("data_path", &self.data_path.dotted())
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

/// Two FieldSpecs must never target the same path simultaneously.
/// Returns the first duplicated path among the given (active) specs.
pub fn duplicate_path(specs: &[&FieldSpec]) -> Option<FieldPath> {
    let mut seen = std::collections::HashSet::new();
    for spec in specs {
        if !seen.insert(&spec.name) {
            return Some(spec.name.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_by_default() {
        let spec = FieldSpec::input("name").label("Name");
        assert_eq!(
            spec.validate_sync(&json!({})),
            Some("Name is required".to_string())
        );
        assert_eq!(spec.validate_sync(&json!({"name": "x"})), None);
    }

    #[test]
    fn test_optional_field_passes_when_blank() {
        let spec = FieldSpec::input("desc").label("Description").optional();
        assert_eq!(spec.validate_sync(&json!({})), None);
        assert_eq!(spec.validate_sync(&json!({"desc": "  "})), None);
    }

    #[test]
    fn test_pattern_rules_run_after_required() {
        let spec = FieldSpec::password("iosInfo.keyChainP12.password")
            .label("Keychain-p12 Password")
            .optional()
            .rule(PatternRule::new(
                r"^[\S]{6,30}$",
                "Cannot contain spaces, length is 6~30",
            ));
        let draft = json!({"iosInfo": {"keyChainP12": {"password": "abc"}}});
        assert_eq!(
            spec.validate_sync(&draft),
            Some("Cannot contain spaces, length is 6~30".to_string())
        );
    }

    #[test]
    fn test_max_length() {
        let spec = FieldSpec::input("version").label("Version").max_length(3);
        assert_eq!(
            spec.validate_sync(&json!({"version": "1.0.0"})),
            Some("no more than 3 characters".to_string())
        );
    }

    #[test]
    fn test_visible_when() {
        let spec = FieldSpec::input("alias")
            .visible_when(|values| values["type"] == json!("Android"));
        assert!(spec.is_visible(&json!({"type": "Android"})));
        assert!(!spec.is_visible(&json!({"type": "IOS"})));
        assert!(!spec.is_visible(&json!({})));
    }

    #[test]
    fn test_duplicate_path_detection() {
        let a = FieldSpec::input("name");
        let b = FieldSpec::input("desc");
        let c = FieldSpec::hidden("name");
        assert_eq!(duplicate_path(&[&a, &b]), None);
        assert_eq!(
            duplicate_path(&[&a, &b, &c]),
            Some(FieldPath::parse("name"))
        );
    }

    #[test]
    fn test_cell_text_uses_render_hook() {
        let column = ColumnSpec::new("Type", "type").render(|value, _record| {
            match value.and_then(Value::as_str) {
                Some("IOS") => "iOS".to_string(),
                Some(other) => other.to_string(),
                None => "-".to_string(),
            }
        });
        assert_eq!(column.cell_text(&json!({"type": "IOS"})), "iOS");
        assert_eq!(column.cell_text(&json!({})), "-");
    }

    #[test]
    fn test_cell_text_default_projection() {
        let column = ColumnSpec::new("Name", "name");
        assert_eq!(column.cell_text(&json!({"name": "cert-a"})), "cert-a");
        assert_eq!(column.cell_text(&json!({"name": 7})), "7");
        assert_eq!(column.cell_text(&json!({})), "-");
    }
}
