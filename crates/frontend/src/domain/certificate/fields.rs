//! Certificate form declaration.
//!
//! The `type` select is the first discriminant; Android adds a second
//! one (`manualCreate`). Values typed under a branch survive toggling
//! away and back; only upload companions are reset explicitly.

use contracts::domain::certificate::CertificateType;
use contracts::shared::metadata::{FieldSpec, PatternRule};
use contracts::shared::path::FieldPath;
use serde_json::{json, Value};

const NO_SPACES: &str = r"^[\S]+$";
const NO_SPACES_MSG: &str = "Cannot contain spaces";
const KEY_PASSWORD: &str = r"^[\S]{6,30}$";
const KEY_PASSWORD_MSG: &str = "Cannot contain spaces, length is 6~30";

fn is_ios(values: &Value) -> bool {
    values["type"] == json!(CertificateType::Ios.as_str())
}

fn is_android(values: &Value) -> bool {
    values["type"] == json!(CertificateType::Android.as_str())
}

fn is_android_manual(values: &Value) -> bool {
    is_android(values) && values["androidInfo"]["manualCreate"] == json!("true")
}

fn is_android_auto(values: &Value) -> bool {
    is_android(values) && values["androidInfo"]["manualCreate"] == json!("false")
}

/// An upload slot plus its companions: the hidden file name next to the
/// uuid, and any secret fields that die with the file.
fn upload_group(
    prefix: &str,
    label: &str,
    visible: fn(&Value) -> bool,
    secrets: &[&str],
) -> Vec<FieldSpec> {
    let base = FieldPath::parse(prefix);
    let mut resets: Vec<FieldPath> = vec![base.join("fileName")];
    resets.extend(secrets.iter().map(|s| base.join(*s)));

    let mut group = vec![
        FieldSpec::custom(base.join("uuid"), "upload")
            .label(label)
            .visible_when(visible)
            .resets(resets),
        FieldSpec::hidden(base.join("fileName")).visible_when(visible),
    ];
    for secret in secrets {
        let label = match *secret {
            "password" => format!("{label} Password"),
            "keyPassword" => "Key Password".to_string(),
            "storePassword" => "Store Password".to_string(),
            "alias" => "Alias".to_string(),
            other => other.to_string(),
        };
        let mut spec = FieldSpec::password(base.join(*secret))
            .label(label)
            .visible_when(visible)
            .rule(PatternRule::new(KEY_PASSWORD, KEY_PASSWORD_MSG));
        if *secret == "alias" {
            spec = FieldSpec::input(base.join(*secret))
                .label("Alias")
                .visible_when(visible)
                .rule(PatternRule::new(NO_SPACES, NO_SPACES_MSG));
        }
        group.push(spec);
    }
    group
}

/// Distinguished-name input for auto-created keystores.
fn dn_field(segment: &str, label: &str) -> FieldSpec {
    FieldSpec::input(FieldPath::parse("androidInfo.autoInfo").join(segment))
        .label(label)
        .visible_when(is_android_auto)
        .rule(PatternRule::new(NO_SPACES, NO_SPACES_MSG))
}

pub fn certificate_fields() -> Vec<FieldSpec> {
    let mut fields = vec![
        FieldSpec::hidden("id"),
        FieldSpec::input("name")
            .label("Name")
            .max_length(100)
            .disabled_on_edit(),
        FieldSpec::input("desc")
            .label("Description")
            .optional()
            .max_length(1000),
        FieldSpec::select(
            "type",
            CertificateType::ALL.map(|t| (t.as_str(), t.label())),
        )
        .label("Type")
        .disabled_on_edit(),
    ];

    // iOS branch
    fields.extend(upload_group(
        "iosInfo.keyChainP12",
        "Keychain-p12",
        is_ios,
        &["password"],
    ));
    fields.extend(upload_group(
        "iosInfo.debugProvision",
        "Debug-mobileprovision",
        is_ios,
        &[],
    ));
    fields.extend(upload_group(
        "iosInfo.releaseProvision",
        "Release-mobileprovision",
        is_ios,
        &[],
    ));

    // Android branch: second discriminant
    fields.push(
        FieldSpec::radio_group(
            "androidInfo.manualCreate",
            [("true", "Upload keystore"), ("false", "Auto create")],
        )
        .label("Keystore Source")
        .visible_when(is_android),
    );

    // manual keystores
    fields.extend(upload_group(
        "androidInfo.manualInfo.debugKeyStore",
        "Debug-keystore",
        is_android_manual,
        &["alias", "keyPassword", "storePassword"],
    ));
    fields.extend(upload_group(
        "androidInfo.manualInfo.releaseKeyStore",
        "Release-keystore",
        is_android_manual,
        &["alias", "keyPassword", "storePassword"],
    ));

    // auto-created keystores
    for (prefix, label) in [
        ("androidInfo.autoInfo.debugKeyStore", "Debug-keystore"),
        ("androidInfo.autoInfo.releaseKeyStore", "Release-keystore"),
    ] {
        let base = FieldPath::parse(prefix);
        fields.push(
            FieldSpec::input(base.join("alias"))
                .label(format!("{label} Alias"))
                .visible_when(is_android_auto)
                .rule(PatternRule::new(NO_SPACES, NO_SPACES_MSG)),
        );
        fields.push(
            FieldSpec::password(base.join("keyPassword"))
                .label(format!("{label} Key Password"))
                .visible_when(is_android_auto)
                .rule(PatternRule::new(KEY_PASSWORD, KEY_PASSWORD_MSG)),
        );
        fields.push(
            FieldSpec::password(base.join("storePassword"))
                .label(format!("{label} Store Password"))
                .visible_when(is_android_auto)
                .rule(PatternRule::new(KEY_PASSWORD, KEY_PASSWORD_MSG)),
        );
    }
    fields.push(dn_field("name", "Name (CN)"));
    fields.push(dn_field("ou", "Organization Unit (OU)"));
    fields.push(dn_field("org", "Organization (O)"));
    fields.push(dn_field("city", "City (L)"));
    fields.push(dn_field("province", "Province (ST)"));
    fields.push(dn_field("state", "Country (C)"));

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::crud::form_state::{active_fields, validate_all_sync};

    #[test]
    fn test_basic_fields_only_without_type() {
        let fields = certificate_fields();
        let active = active_fields(&fields, &json!({}));
        let names: Vec<String> = active.iter().map(|s| s.name.dotted()).collect();
        assert_eq!(names, vec!["id", "name", "desc", "type"]);
    }

    #[test]
    fn test_ios_branch_activates() {
        let fields = certificate_fields();
        let active = active_fields(&fields, &json!({"type": "IOS"}));
        let names: Vec<String> = active.iter().map(|s| s.name.dotted()).collect();
        assert!(names.contains(&"iosInfo.keyChainP12.uuid".to_string()));
        assert!(names.contains(&"iosInfo.keyChainP12.password".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("androidInfo")));
    }

    #[test]
    fn test_android_manual_branch() {
        let fields = certificate_fields();
        let values = json!({"type": "Android", "androidInfo": {"manualCreate": "true"}});
        let active = active_fields(&fields, &values);
        let names: Vec<String> = active.iter().map(|s| s.name.dotted()).collect();
        assert!(names.contains(&"androidInfo.manualInfo.debugKeyStore.uuid".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("androidInfo.autoInfo")));
    }

    #[test]
    fn test_android_auto_branch() {
        let fields = certificate_fields();
        let values = json!({"type": "Android", "androidInfo": {"manualCreate": "false"}});
        let active = active_fields(&fields, &values);
        let names: Vec<String> = active.iter().map(|s| s.name.dotted()).collect();
        assert!(names.contains(&"androidInfo.autoInfo.debugKeyStore.alias".to_string()));
        assert!(names.contains(&"androidInfo.autoInfo.debugKeyStore.keyPassword".to_string()));
        assert!(names.contains(&"androidInfo.autoInfo.releaseKeyStore.storePassword".to_string()));
        assert!(names.contains(&"androidInfo.autoInfo.ou".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("androidInfo.manualInfo")));
    }

    #[test]
    fn test_keychain_password_rule() {
        let fields = certificate_fields();
        let values = json!({
            "name": "c", "type": "IOS",
            "iosInfo": {
                "keyChainP12": {"uuid": "u1", "fileName": "a.p12", "password": "short"},
                "debugProvision": {"uuid": "u2"},
                "releaseProvision": {"uuid": "u3"}
            }
        });
        let active = active_fields(&fields, &values);
        let errors = validate_all_sync(&active, &values);
        assert!(errors
            .iter()
            .any(|e| e.path == "iosInfo.keyChainP12.password"
                && e.message == KEY_PASSWORD_MSG));
    }

    #[test]
    fn test_upload_resets_cover_companions() {
        let fields = certificate_fields();
        let upload = fields
            .iter()
            .find(|s| s.name.dotted() == "iosInfo.keyChainP12.uuid")
            .unwrap();
        let resets: Vec<String> = upload.resets.iter().map(|p| p.dotted()).collect();
        assert!(resets.contains(&"iosInfo.keyChainP12.fileName".to_string()));
        assert!(resets.contains(&"iosInfo.keyChainP12.password".to_string()));
    }
}
