//! Application launch configuration
//!
//! The caller supplies an application config object; the launch settings
//! live under the `config_cloudlaunch` key. Every field is optional and
//! falls back to a documented default.

use crate::error::Result;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Key the launch settings are nested under
pub const CONFIG_KEY: &str = "config_cloudlaunch";
pub const DEFAULT_SECURITY_GROUP: &str = "CloudLaunchDefault";
pub const DEFAULT_SECURITY_GROUP_DESCRIPTION: &str = "Created by CloudLaunch";
/// Root volume size in GB when `rootStorageSize` is absent
pub const DEFAULT_ROOT_STORAGE_SIZE: u32 = 20;

/// Application configuration as supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub config_cloudlaunch: LaunchConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_appliance: Option<ApplianceConfig>,
}

impl AppConfig {
    /// Load from a JSON or YAML file, chosen by extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

        let config = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        tracing::debug!("Loaded app config from {}", path.display());
        Ok(config)
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Launch settings for one application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LaunchConfig {
    #[serde(rename = "customImageID")]
    pub custom_image_id: Option<String>,
    pub key_pair: Option<String>,
    pub firewall: Vec<FirewallGroupSpec>,
    pub root_storage_type: RootStorageType,
    #[serde(deserialize_with = "optional_u32")]
    pub root_storage_size: Option<u32>,
    #[serde(alias = "vmType")]
    pub instance_type: Option<String>,
    pub placement_zone: Option<String>,
    pub subnet: Option<String>,
    pub network: Option<String>,
    #[serde(rename = "staticIP")]
    pub static_ip: Option<String>,
    /// User data used when the caller supplies none
    pub instance_user_data: Option<String>,
    #[serde(rename = "skipFloatingIP", alias = "skip_floating_ip")]
    pub skip_floating_ip: bool,
    pub hostname_config: Option<HostnameConfig>,
}

impl LaunchConfig {
    pub fn custom_image_id(&self) -> Option<&str> {
        non_empty(&self.custom_image_id)
    }

    pub fn key_pair_name<'a>(&'a self, default: &'a str) -> &'a str {
        non_empty(&self.key_pair).unwrap_or(default)
    }

    pub fn instance_type(&self) -> Option<&str> {
        non_empty(&self.instance_type)
    }

    pub fn placement_zone(&self) -> Option<&str> {
        non_empty(&self.placement_zone)
    }

    pub fn subnet(&self) -> Option<&str> {
        non_empty(&self.subnet)
    }

    pub fn network(&self) -> Option<&str> {
        non_empty(&self.network)
    }

    pub fn static_ip(&self) -> Option<&str> {
        non_empty(&self.static_ip)
    }

    pub fn instance_user_data(&self) -> Option<&str> {
        non_empty(&self.instance_user_data)
    }

    /// Root volume size in GB; only meaningful for `RootStorageType::Volume`
    pub fn root_storage_size(&self) -> u32 {
        self.root_storage_size.unwrap_or(DEFAULT_ROOT_STORAGE_SIZE)
    }
}

/// Where the instance's root disk lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootStorageType {
    /// Dedicated root volume created from the image
    Volume,
    /// Provider default instance-store root; also used for unrecognized values
    #[default]
    #[serde(other)]
    Instance,
}

/// A named security group and the rules it should hold
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FirewallGroupSpec {
    pub security_group: Option<String>,
    pub description: Option<String>,
    pub rules: Vec<FirewallRuleSpec>,
}

impl FirewallGroupSpec {
    pub fn name(&self) -> &str {
        non_empty(&self.security_group).unwrap_or(DEFAULT_SECURITY_GROUP)
    }

    pub fn description(&self) -> &str {
        non_empty(&self.description).unwrap_or(DEFAULT_SECURITY_GROUP_DESCRIPTION)
    }
}

/// One inbound rule
///
/// `src_group` names the group itself, or holds the ID of another group.
/// Without it the rule admits traffic from `cidr`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FirewallRuleSpec {
    #[serde(alias = "src_group")]
    pub src_group: Option<String>,
    pub protocol: Option<String>,
    #[serde(alias = "fromPort")]
    pub from: Option<PortValue>,
    #[serde(alias = "toPort")]
    pub to: Option<PortValue>,
    pub cidr: Option<String>,
}

impl FirewallRuleSpec {
    pub fn src_group(&self) -> Option<&str> {
        non_empty(&self.src_group)
    }

    pub fn protocol(&self) -> Option<&str> {
        non_empty(&self.protocol)
    }

    pub fn cidr(&self) -> Option<&str> {
        non_empty(&self.cidr)
    }
}

/// Port as written in the config: a number or a numeric string
///
/// Non-integer numbers still load so that the rule, not the whole config,
/// is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Number(i64),
    Float(f64),
    Text(String),
}

impl PortValue {
    pub fn parse(&self) -> std::result::Result<u16, String> {
        match self {
            PortValue::Number(n) => u16::try_from(*n).map_err(|_| format!("invalid port: {}", n)),
            PortValue::Float(f) => Err(format!("invalid port: {}", f)),
            PortValue::Text(s) => s
                .trim()
                .parse::<u16>()
                .map_err(|_| format!("invalid port: {:?}", s)),
        }
    }
}

impl From<u16> for PortValue {
    fn from(port: u16) -> Self {
        PortValue::Number(i64::from(port))
    }
}

/// Host access granted through cloud-init
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplianceConfig {
    pub ssh_user: Option<String>,
    pub ssh_public_key: Option<String>,
    pub run_cmd: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostnameConfig {
    pub hostname_type: Option<String>,
    pub host_name: Option<String>,
}

impl HostnameConfig {
    /// Host name to report when the type is `manual`
    pub fn manual_host_name(&self) -> Option<&str> {
        match self.hostname_type.as_deref() {
            Some("manual") => non_empty(&self.host_name),
            _ => None,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn optional_u32<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<PortValue>::deserialize(deserializer)? {
        None => Ok(None),
        Some(PortValue::Number(n)) => u32::try_from(n)
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected a positive integer, got {}", n))),
        Some(PortValue::Float(f)) => Err(de::Error::custom(format!(
            "expected an integer, got {}",
            f
        ))),
        Some(PortValue::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(PortValue::Text(s)) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected an integer, got {:?}", s))),
    }
}
