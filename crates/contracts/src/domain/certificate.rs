//! Certificate entity vocabulary.
//!
//! Certificates are schema-less records manipulated by the engine; the
//! only typed piece is the discriminant that drives the conditional
//! field trees and the per-row download behavior.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificateType {
    #[serde(rename = "IOS")]
    Ios,
    Android,
    Message,
}

impl CertificateType {
    pub const ALL: [CertificateType; 2] = [CertificateType::Ios, CertificateType::Android];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "IOS",
            Self::Android => "Android",
            Self::Message => "Message",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ios => "iOS",
            Self::Android => "Android",
            Self::Message => "Message",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "IOS" => Some(Self::Ios),
            "Android" => Some(Self::Android),
            "Message" => Some(Self::Message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(CertificateType::Ios.as_str(), "IOS");
        assert_eq!(CertificateType::from_str("Android"), Some(CertificateType::Android));
        assert_eq!(CertificateType::from_str("Windows"), None);
        assert_eq!(
            serde_json::to_value(CertificateType::Ios).unwrap(),
            serde_json::json!("IOS")
        );
    }
}
