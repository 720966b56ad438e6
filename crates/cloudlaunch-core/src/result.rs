//! Launch result record

use crate::error::Result;
use crate::firewall::RuleWarning;
use cloudlaunch_cloud::{KeyPair, SecurityGroup};
use serde::{Deserialize, Serialize};

/// Placeholder reported when no public IP could be obtained
pub const NOT_AVAILABLE: &str = "N/A";

/// Key the result is wrapped under in [`LaunchResult::to_envelope`]
pub const ENVELOPE_KEY: &str = "cloudLaunch";

/// URL the application is expected to answer on
pub fn application_url(public_ip: Option<&str>) -> String {
    match public_ip {
        Some(ip) if ip.contains(':') => format!("http://[{}]/", ip),
        Some(ip) => format!("http://{}/", ip),
        None => NOT_AVAILABLE.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupRef {
    pub id: String,
    pub name: String,
}

impl From<&SecurityGroup> for SecurityGroupRef {
    fn from(group: &SecurityGroup) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRef {
    pub id: String,
}

/// Outcome of a successful launch
///
/// `key_pair.material` is only set when the key pair was created by this
/// launch. It is not kept anywhere else, so the caller owns it from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchResult {
    pub key_pair: KeyPair,
    /// First security group, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_group: Option<SecurityGroupRef>,
    pub security_groups: Vec<SecurityGroupRef>,
    pub instance: InstanceRef,
    #[serde(rename = "publicIP")]
    pub public_ip: Option<String>,
    #[serde(rename = "privateIP")]
    pub private_ip: Option<String>,
    pub hostname: Option<String>,
    #[serde(rename = "applicationURL")]
    pub application_url: String,
    /// `None` when the HTTP readiness wait did not run
    pub application_ready: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<RuleWarning>,
}

impl LaunchResult {
    /// `{"cloudLaunch": {...}}`, the shape stored as a deployment's launch result
    pub fn to_envelope(&self) -> Result<serde_json::Value> {
        let mut envelope = serde_json::Map::new();
        envelope.insert(ENVELOPE_KEY.to_string(), serde_json::to_value(self)?);
        Ok(serde_json::Value::Object(envelope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> LaunchResult {
        LaunchResult {
            key_pair: KeyPair {
                id: "kp-1".to_string(),
                name: "cloudlaunch_key_pair".to_string(),
                material: Some("PRIVATE".to_string()),
            },
            security_group: Some(SecurityGroupRef {
                id: "sg-1".to_string(),
                name: "App".to_string(),
            }),
            security_groups: vec![SecurityGroupRef {
                id: "sg-1".to_string(),
                name: "App".to_string(),
            }],
            instance: InstanceRef {
                id: "i-1".to_string(),
            },
            public_ip: Some("1.2.3.4".to_string()),
            private_ip: Some("10.0.0.4".to_string()),
            hostname: Some("1.2.3.4".to_string()),
            application_url: application_url(Some("1.2.3.4")),
            application_ready: Some(true),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_application_url() {
        assert_eq!(application_url(Some("1.2.3.4")), "http://1.2.3.4/");
        assert_eq!(application_url(Some("2001:db8::1")), "http://[2001:db8::1]/");
        assert_eq!(application_url(None), "N/A");
    }

    #[test]
    fn test_envelope_uses_camel_case_keys() {
        let envelope = result().to_envelope().unwrap();
        let inner = &envelope["cloudLaunch"];

        assert_eq!(inner["publicIP"], "1.2.3.4");
        assert_eq!(inner["privateIP"], "10.0.0.4");
        assert_eq!(inner["applicationURL"], "http://1.2.3.4/");
        assert_eq!(inner["keyPair"]["material"], "PRIVATE");
        assert_eq!(inner["securityGroup"]["name"], "App");
        assert_eq!(inner["instance"]["id"], "i-1");
        assert!(inner.get("warnings").is_none());
    }

    #[test]
    fn test_envelope_roundtrip() {
        let original = result();
        let envelope = original.to_envelope().unwrap();
        let parsed: LaunchResult = serde_json::from_value(envelope["cloudLaunch"].clone()).unwrap();
        assert_eq!(parsed, original);
    }
}
