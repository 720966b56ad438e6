//! Firewall configuration
//!
//! Turns the declarative `firewall` list into security groups and rules.
//! Rule application is best effort: a rejected rule is logged, recorded as a
//! [`RuleWarning`] and skipped, and the launch carries on.

use crate::config::{FirewallGroupSpec, FirewallRuleSpec, LaunchConfig, PortValue};
use crate::resolver::resolve_security_group;
use cloudlaunch_cloud::{CloudError, CloudProvider, FirewallRule, Result, SecurityGroup};
use serde::{Deserialize, Serialize};

/// A firewall rule that could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleWarning {
    pub security_group: String,
    /// Position of the rule within its group's `rules` list
    pub rule_index: usize,
    pub message: String,
}

/// Security groups produced by [`apply_firewall`], in config order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirewallOutcome {
    pub security_groups: Vec<SecurityGroup>,
    pub warnings: Vec<RuleWarning>,
}

impl FirewallOutcome {
    pub fn group_ids(&self) -> Vec<String> {
        self.security_groups.iter().map(|g| g.id.clone()).collect()
    }
}

/// Apply every firewall group in the config
///
/// Failing to resolve a group is an error; failing to add a rule is not.
pub async fn apply_firewall(
    provider: &dyn CloudProvider,
    config: &LaunchConfig,
) -> Result<FirewallOutcome> {
    let mut outcome = FirewallOutcome::default();

    for spec in &config.firewall {
        let group = apply_security_group(provider, config, spec, &mut outcome.warnings).await?;
        outcome.security_groups.push(group);
    }

    if !outcome.warnings.is_empty() {
        tracing::warn!(
            "{} firewall rule(s) could not be applied",
            outcome.warnings.len()
        );
    }
    Ok(outcome)
}

/// Resolve one security group and add its rules
///
/// Rules the provider rejects are appended to `warnings`. A rule that is
/// already present is not a failure.
pub async fn apply_security_group(
    provider: &dyn CloudProvider,
    config: &LaunchConfig,
    spec: &FirewallGroupSpec,
    warnings: &mut Vec<RuleWarning>,
) -> Result<SecurityGroup> {
    let group = resolve_security_group(provider, config, spec.name(), spec.description()).await?;

    for (index, rule_spec) in spec.rules.iter().enumerate() {
        let rule = match to_firewall_rule(rule_spec, &group) {
            Ok(rule) => rule,
            Err(message) => {
                tracing::warn!("Skipping rule {} of {}: {}", index, group.name, message);
                warnings.push(RuleWarning {
                    security_group: group.name.clone(),
                    rule_index: index,
                    message,
                });
                continue;
            }
        };

        match provider.add_rule(&group.id, &rule).await {
            Ok(()) => {
                tracing::debug!("Added rule {} to {}", index, group.name);
            }
            Err(CloudError::ResourceAlreadyExists(_)) => {
                tracing::debug!("Rule {} already present in {}", index, group.name);
            }
            Err(e) => {
                tracing::warn!("Failed to add rule {} to {}: {}", index, group.name, e);
                warnings.push(RuleWarning {
                    security_group: group.name.clone(),
                    rule_index: index,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(group)
}

/// Translate a rule spec into a provider rule for `group`
///
/// A `srcGroup` equal to the group's own name refers to the group itself;
/// any other value is taken as the ID of the source group. Protocol and
/// port range are forwarded for both rule shapes.
pub fn to_firewall_rule(
    spec: &FirewallRuleSpec,
    group: &SecurityGroup,
) -> std::result::Result<FirewallRule, String> {
    let (from_port, to_port) = parse_ports(spec)?;
    let protocol = spec.protocol().map(str::to_string);

    let rule = match spec.src_group() {
        Some(src) if src == group.name => FirewallRule::from_group(group.id.clone()),
        Some(src) => FirewallRule::from_group(src),
        None => FirewallRule::cidr(None, None, None, spec.cidr().map(str::to_string)),
    };

    Ok(rule.with_protocol(protocol).with_ports(from_port, to_port))
}

/// Rules that would be rejected before reaching the provider
pub fn lint_firewall(config: &LaunchConfig) -> Vec<RuleWarning> {
    let mut warnings = Vec::new();

    for spec in &config.firewall {
        for (index, rule) in spec.rules.iter().enumerate() {
            let message = match parse_ports(rule) {
                Err(message) => Some(message),
                Ok((Some(from), Some(to))) if from > to => {
                    Some(format!("invalid port range {}-{}", from, to))
                }
                Ok(_) if rule.src_group().is_none() && rule.cidr().is_none() => {
                    Some("rule needs a cidr or a srcGroup".to_string())
                }
                Ok(_) => None,
            };

            if let Some(message) = message {
                warnings.push(RuleWarning {
                    security_group: spec.name().to_string(),
                    rule_index: index,
                    message,
                });
            }
        }
    }
    warnings
}

fn parse_ports(spec: &FirewallRuleSpec) -> std::result::Result<(Option<u16>, Option<u16>), String> {
    let from = spec.from.as_ref().map(PortValue::parse).transpose()?;
    let to = spec.to.as_ref().map(PortValue::parse).transpose()?;
    Ok((from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudlaunch_cloud::MemoryProvider;
    use serde_json::json;
    use tokio_test::assert_ok;

    fn config(value: serde_json::Value) -> LaunchConfig {
        serde_json::from_value(value).unwrap()
    }

    fn app_group() -> SecurityGroup {
        SecurityGroup {
            id: "sg-000001".to_string(),
            name: "App".to_string(),
            description: String::new(),
            network_id: None,
        }
    }

    #[test]
    fn test_cidr_rule_translation() {
        let spec = FirewallRuleSpec {
            protocol: Some("tcp".to_string()),
            from: Some(PortValue::Text("22".to_string())),
            to: Some(22.into()),
            cidr: Some("0.0.0.0/0".to_string()),
            ..Default::default()
        };

        let rule = to_firewall_rule(&spec, &app_group()).unwrap();
        assert_eq!(
            rule,
            FirewallRule::cidr(
                Some("tcp".to_string()),
                Some(22),
                Some(22),
                Some("0.0.0.0/0".to_string())
            )
        );
    }

    #[test]
    fn test_self_reference_keeps_ports() {
        let spec = FirewallRuleSpec {
            src_group: Some("App".to_string()),
            protocol: Some("tcp".to_string()),
            from: Some(1.into()),
            to: Some(65535.into()),
            cidr: Some("10.0.0.0/8".to_string()),
        };

        let rule = to_firewall_rule(&spec, &app_group()).unwrap();
        assert_eq!(rule.src_group_id.as_deref(), Some("sg-000001"));
        assert_eq!(rule.protocol.as_deref(), Some("tcp"));
        assert_eq!((rule.from_port, rule.to_port), (Some(1), Some(65535)));
        assert_eq!(rule.cidr, None);
    }

    #[test]
    fn test_other_group_reference_is_an_id() {
        let spec = FirewallRuleSpec {
            src_group: Some("sg-other".to_string()),
            ..Default::default()
        };
        let rule = to_firewall_rule(&spec, &app_group()).unwrap();
        assert_eq!(rule, FirewallRule::from_group("sg-other"));
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let spec = FirewallRuleSpec {
            from: Some(PortValue::Text("ssh".to_string())),
            cidr: Some("0.0.0.0/0".to_string()),
            ..Default::default()
        };
        assert!(to_firewall_rule(&spec, &app_group()).is_err());
    }

    #[tokio::test]
    async fn test_apply_group_with_self_and_cidr_rules() {
        let provider = MemoryProvider::new();
        let config = config(json!({
            "firewall": [{
                "securityGroup": "App",
                "rules": [
                    {"protocol": "tcp", "from": "22", "to": "22", "cidr": "0.0.0.0/0"},
                    {"src_group": "App"}
                ]
            }]
        }));

        let outcome = assert_ok!(apply_firewall(&provider, &config).await);
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.security_groups.len(), 1);

        let group = &outcome.security_groups[0];
        let rules = provider.rules_for(&group.id).await;
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].src_group_id.as_deref(), Some(group.id.as_str()));
    }

    #[tokio::test]
    async fn test_rule_failures_are_collected_not_raised() {
        let provider = MemoryProvider::new();
        let config = config(json!({
            "firewall": [{
                "securityGroup": "App",
                "rules": [
                    {"protocol": "tcp", "from": "80", "to": "80", "cidr": "0.0.0.0"},
                    {"protocol": "tcp", "from": "http", "cidr": "0.0.0.0/0"},
                    {"protocol": "tcp", "from": 443, "to": 443, "cidr": "0.0.0.0/0"}
                ]
            }]
        }));

        let outcome = assert_ok!(apply_firewall(&provider, &config).await);
        let indexes: Vec<usize> = outcome.warnings.iter().map(|w| w.rule_index).collect();
        assert_eq!(indexes, vec![0, 1]);
        assert!(outcome.warnings.iter().all(|w| w.security_group == "App"));

        let rules = provider.rules_for(&outcome.security_groups[0].id).await;
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].from_port, Some(443));
    }

    #[tokio::test]
    async fn test_fractional_port_skips_only_that_rule() {
        let provider = MemoryProvider::new();
        let config = config(json!({
            "firewall": [{
                "securityGroup": "App",
                "rules": [
                    {"protocol": "tcp", "from": 22.5, "to": 22, "cidr": "0.0.0.0/0"},
                    {"protocol": "tcp", "from": 80, "to": 80, "cidr": "0.0.0.0/0"}
                ]
            }]
        }));

        let outcome = assert_ok!(apply_firewall(&provider, &config).await);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].rule_index, 0);
        assert!(outcome.warnings[0].message.contains("invalid port"));

        let rules = provider.rules_for(&outcome.security_groups[0].id).await;
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].from_port, Some(80));
    }

    #[tokio::test]
    async fn test_reapplying_is_quiet() {
        let provider = MemoryProvider::new();
        let config = config(json!({
            "firewall": [{"securityGroup": "App", "rules": [
                {"protocol": "tcp", "from": 22, "to": 22, "cidr": "0.0.0.0/0"}
            ]}]
        }));

        let first = assert_ok!(apply_firewall(&provider, &config).await);
        let second = assert_ok!(apply_firewall(&provider, &config).await);

        assert!(second.warnings.is_empty());
        assert_eq!(first.security_groups, second.security_groups);
    }

    #[tokio::test]
    async fn test_every_group_is_applied() {
        let provider = MemoryProvider::new();
        let config = config(json!({
            "firewall": [
                {"securityGroup": "Web", "rules": []},
                {"securityGroup": "Db", "description": "database", "rules": []}
            ]
        }));

        let outcome = assert_ok!(apply_firewall(&provider, &config).await);
        let names: Vec<&str> = outcome
            .security_groups
            .iter()
            .map(|g| g.name.as_str())
            .collect();
        assert_eq!(names, vec!["Web", "Db"]);
        assert_eq!(outcome.security_groups[1].description, "database");
        assert_eq!(outcome.group_ids().len(), 2);
    }

    #[tokio::test]
    async fn test_group_resolution_failure_propagates() {
        let provider = MemoryProvider::new().fail_operation("create_security_group");
        let config = config(json!({"firewall": [{"securityGroup": "App"}]}));

        assert!(apply_firewall(&provider, &config).await.is_err());
    }

    #[test]
    fn test_lint_reports_unusable_rules() {
        let config = config(json!({
            "firewall": [{"rules": [
                {"protocol": "tcp", "from": 22, "to": 22, "cidr": "0.0.0.0/0"},
                {"protocol": "tcp", "from": "x", "cidr": "0.0.0.0/0"},
                {"protocol": "tcp", "from": 90, "to": 80, "cidr": "0.0.0.0/0"},
                {"protocol": "tcp", "from": 22, "to": 22}
            ]}]
        }));

        let warnings = lint_firewall(&config);
        let indexes: Vec<usize> = warnings.iter().map(|w| w.rule_index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
        assert_eq!(warnings[0].security_group, "CloudLaunchDefault");
    }
}
