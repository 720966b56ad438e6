//! Get-or-create resolution of key pairs, networks and security groups
//!
//! Lookups happen first; creation only when nothing matches. A create that
//! fails with `ResourceAlreadyExists` means another launch won the race, so
//! the resource is fetched again instead of failing.

use crate::config::LaunchConfig;
use cloudlaunch_cloud::{CloudError, CloudProvider, KeyPair, Result, SecurityGroup};

/// Find the key pair called `name`, creating it if absent
///
/// Only a freshly created key pair carries `material`.
pub async fn resolve_key_pair(provider: &dyn CloudProvider, name: &str) -> Result<KeyPair> {
    if let Some(kp) = provider.find_key_pairs(name).await?.into_iter().next() {
        tracing::debug!("Using existing key pair {}", name);
        return Ok(kp);
    }

    match provider.create_key_pair(name).await {
        Ok(kp) => {
            tracing::info!("Created key pair {} ({})", kp.name, kp.id);
            Ok(kp)
        }
        Err(CloudError::ResourceAlreadyExists(_)) => {
            tracing::debug!("Key pair {} was created concurrently; fetching it", name);
            provider
                .find_key_pairs(name)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| CloudError::ResourceNotFound(format!("key pair {}", name)))
        }
        Err(e) => Err(e),
    }
}

/// Network to create security groups in
///
/// A configured `network` is returned verbatim. Otherwise the provider's
/// default network is used, created on first use. `None` when the provider
/// has no network concept.
pub async fn resolve_network_id(
    provider: &dyn CloudProvider,
    config: &LaunchConfig,
) -> Result<Option<String>> {
    if let Some(network) = config.network() {
        return Ok(Some(network.to_string()));
    }

    let network = provider.get_or_create_default_network().await?;
    if let Some(net) = &network {
        tracing::debug!("Using default network {}", net.id);
    }
    Ok(network.map(|n| n.id))
}

/// Find the security group called `name`, creating it if absent
///
/// The network is only resolved when the group has to be created.
pub async fn resolve_security_group(
    provider: &dyn CloudProvider,
    config: &LaunchConfig,
    name: &str,
    description: &str,
) -> Result<SecurityGroup> {
    let existing = provider.find_security_groups(name).await?;
    if let Some(group) = select_canonical(existing, config.network()) {
        tracing::debug!("Using existing security group {} ({})", group.name, group.id);
        return Ok(group);
    }

    let network_id = resolve_network_id(provider, config).await?;
    match provider
        .create_security_group(name, description, network_id.as_deref())
        .await
    {
        Ok(group) => {
            tracing::info!("Created security group {} ({})", group.name, group.id);
            Ok(group)
        }
        Err(CloudError::ResourceAlreadyExists(_)) => {
            tracing::debug!("Security group {} was created concurrently; fetching it", name);
            let found = provider.find_security_groups(name).await?;
            select_canonical(found, network_id.as_deref())
                .ok_or_else(|| CloudError::ResourceNotFound(format!("security group {}", name)))
        }
        Err(e) => Err(e),
    }
}

/// Pick one group out of several sharing a name
///
/// Preference: same network as configured, then unscoped, then the first.
fn select_canonical(groups: Vec<SecurityGroup>, network: Option<&str>) -> Option<SecurityGroup> {
    if groups.len() > 1 {
        tracing::warn!(
            "Found {} security groups named {}; picking one",
            groups.len(),
            groups[0].name
        );
    }

    let by_network = network.and_then(|net| {
        groups
            .iter()
            .position(|g| g.network_id.as_deref() == Some(net))
    });
    let index = by_network
        .or_else(|| groups.iter().position(|g| g.network_id.is_none()))
        .unwrap_or(0);

    groups.into_iter().nth(index)
}
