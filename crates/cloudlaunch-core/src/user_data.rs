//! User data composition

use crate::config::ApplianceConfig;
use crate::error::Result;
use serde::Serialize;

/// cloud-init directives for host access
#[derive(Debug, Serialize)]
struct HostAccess<'a> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ssh_authorized_keys: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    runcmd: Vec<&'a str>,
}

/// Append a `#cloud-config` section for the appliance's SSH key and
/// commands to `base`
///
/// `base` is returned unchanged when there is nothing to add.
pub fn compose_user_data(base: &str, appliance: Option<&ApplianceConfig>) -> Result<String> {
    let Some(appliance) = appliance else {
        return Ok(base.to_string());
    };

    let access = HostAccess {
        ssh_authorized_keys: appliance
            .ssh_public_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .into_iter()
            .collect(),
        runcmd: appliance
            .run_cmd
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect(),
    };
    if access.ssh_authorized_keys.is_empty() && access.runcmd.is_empty() {
        return Ok(base.to_string());
    }

    if !access.ssh_authorized_keys.is_empty() {
        tracing::info!("Adding a cloud-init public SSH key to user data");
    }

    let mut user_data = base.to_string();
    if !user_data.is_empty() && !user_data.ends_with('\n') {
        user_data.push('\n');
    }
    user_data.push_str("#cloud-config\n");
    user_data.push_str(&serde_yaml::to_string(&access)?);
    Ok(user_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_appliance_keeps_base() {
        assert_eq!(compose_user_data("#!/bin/sh\n", None).unwrap(), "#!/bin/sh\n");

        let empty = ApplianceConfig::default();
        assert_eq!(compose_user_data("", Some(&empty)).unwrap(), "");
    }

    #[test]
    fn test_key_and_commands_are_appended() {
        let appliance = ApplianceConfig {
            ssh_user: Some("ubuntu".to_string()),
            ssh_public_key: Some("ssh-ed25519 AAAAC3Nz user@host".to_string()),
            run_cmd: vec!["apt-get update".to_string(), "reboot".to_string()],
        };

        let user_data = compose_user_data("echo base", Some(&appliance)).unwrap();
        assert!(user_data.starts_with("echo base\n#cloud-config\n"));

        let (_, document) = user_data.split_once("#cloud-config\n").unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(document).unwrap();
        assert_eq!(
            parsed["ssh_authorized_keys"][0].as_str(),
            Some("ssh-ed25519 AAAAC3Nz user@host")
        );
        assert_eq!(parsed["runcmd"][1].as_str(), Some("reboot"));
    }

    #[test]
    fn test_commands_only() {
        let appliance = ApplianceConfig {
            run_cmd: vec!["systemctl restart app".to_string()],
            ..Default::default()
        };

        let user_data = compose_user_data("", Some(&appliance)).unwrap();
        assert!(user_data.starts_with("#cloud-config\n"));
        assert!(!user_data.contains("ssh_authorized_keys"));
        assert!(user_data.contains("systemctl restart app"));
    }
}
