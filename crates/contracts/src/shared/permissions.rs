//! Role/permission reference data.
//!
//! Immutable, process-wide tables loaded once and exposed read-only
//! through `can_perform`. Exported from the access-control console —
//! do not edit entries by hand.

use std::collections::HashMap;

use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionSpec {
    pub action: &'static str,
    pub roles: &'static [&'static str],
}

pub static PERMISSIONS: &[PermissionSpec] = &[
    PermissionSpec {
        action: "certificate.create",
        roles: &["Owner", "Lead", "PM"],
    },
    PermissionSpec {
        action: "certificate.delete",
        roles: &["Owner", "Lead"],
    },
    PermissionSpec {
        action: "certificate.download",
        roles: &["Owner", "Lead", "PM", "PD", "Dev", "QA"],
    },
    PermissionSpec {
        action: "release.create",
        roles: &["Owner", "Lead", "PM", "Dev"],
    },
    PermissionSpec {
        action: "release.edit",
        roles: &["Owner", "Lead", "PM", "Dev"],
    },
    PermissionSpec {
        action: "release.delete",
        roles: &["Owner", "Lead"],
    },
];

static BY_ACTION: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    PERMISSIONS
        .iter()
        .map(|spec| (spec.action, spec.roles))
        .collect()
});

/// Capability lookup. Unknown actions are denied.
pub fn can_perform(action: &str, role: &str) -> bool {
    BY_ACTION
        .get(action)
        .map_or(false, |roles| roles.contains(&role))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_action_and_role() {
        assert!(can_perform("certificate.create", "Owner"));
        assert!(can_perform("certificate.delete", "Lead"));
        assert!(!can_perform("certificate.delete", "QA"));
    }

    #[test]
    fn test_unknown_action_is_denied() {
        assert!(!can_perform("certificate.publish", "Owner"));
    }
}
