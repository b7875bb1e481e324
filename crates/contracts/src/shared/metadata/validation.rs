//! Field validation rules.
//!
//! Synchronous pattern rules run first; a field's async rule (remote
//! uniqueness checks and the like) only runs once every pattern rule
//! passed. Async rules are debounced and sequence-guarded by the form
//! renderer, not here.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

/// A synchronous regex rule with its rejection message.
#[derive(Debug, Clone)]
pub struct PatternRule {
    regex: Regex,
    message: String,
}

impl PatternRule {
    /// Compile a rule. Patterns are developer-declared constants, so a
    /// failure to compile is a programming error.
    pub fn new(pattern: &str, message: impl Into<String>) -> Self {
        Self {
            regex: Regex::new(pattern).expect("invalid pattern rule regex"),
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check a field value. Non-string values are matched against their
    /// JSON rendering (numbers, booleans); absent values always pass —
    /// presence is the `required` flag's concern.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        let text = match value {
            Value::Null => return Ok(()),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if self.regex.is_match(&text) {
            Ok(())
        } else {
            Err(self.message.clone())
        }
    }
}

/// Future returned by an async rule. Deliberately not `Send`: it is
/// created and awaited on the single UI thread.
pub type AsyncRuleFuture = Pin<Box<dyn Future<Output = Result<(), String>>>>;

/// An async validator: receives the current field value and the whole
/// draft, resolves to `Ok` or a rejection message.
pub type AsyncRule = Arc<dyn Fn(Value, Value) -> AsyncRuleFuture + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pattern_rule_matches_strings() {
        let rule = PatternRule::new(r"^[\S]+$", "Cannot contain spaces");
        assert_eq!(rule.check(&json!("release-key")), Ok(()));
        assert_eq!(
            rule.check(&json!("release key")),
            Err("Cannot contain spaces".to_string())
        );
    }

    #[test]
    fn test_pattern_rule_skips_absent_values() {
        let rule = PatternRule::new(r"^[\S]{6,30}$", "bad password");
        assert_eq!(rule.check(&Value::Null), Ok(()));
    }

    #[test]
    fn test_pattern_rule_matches_non_strings() {
        let rule = PatternRule::new(r"^\d+$", "digits only");
        assert_eq!(rule.check(&json!(42)), Ok(()));
    }
}
