//! Public IP acquisition
//!
//! Reuse before allocate: an address the instance already has, then a
//! globally routable private address, then an idle floating IP in the
//! account, and only then a newly allocated one. Nothing here is atomic
//! against another launch in the same account; two launches may pick the
//! same idle address and one of the attachments will fail.

use cloudlaunch_cloud::{CloudProvider, Instance, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Make sure `instance` is reachable from outside
///
/// # Returns
/// * `Ok(Some(ip))` - the public address of the instance
/// * `Ok(None)` - the provider refused to allocate an address
/// * `Err(CloudError)` - any other provider failure
pub async fn ensure_public_ip(
    provider: &dyn CloudProvider,
    instance: &Instance,
) -> Result<Option<String>> {
    if let Some(ip) = instance.first_public_ip() {
        tracing::debug!("Instance {} already has public IP {}", instance.id, ip);
        return Ok(Some(ip.to_string()));
    }

    if let Some(ip) = instance.private_ips.first()
        && is_globally_routable(ip)
    {
        tracing::info!("Using globally routable private IP {} as public IP", ip);
        return Ok(Some(ip.clone()));
    }

    // Last idle address seen wins
    let idle = provider
        .list_floating_ips()
        .await?
        .into_iter()
        .rev()
        .find(|fip| !fip.in_use);

    let public_ip = match idle {
        Some(fip) => {
            tracing::info!("Reusing floating IP {}", fip.public_ip);
            fip.public_ip
        }
        None => match provider.create_floating_ip().await {
            Ok(fip) => {
                tracing::info!("Allocated floating IP {}", fip.public_ip);
                fip.public_ip
            }
            Err(e) if e.is_allocation_refused() => {
                tracing::warn!("Could not allocate a floating IP: {}", e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        },
    };

    provider.add_floating_ip(&instance.id, &public_ip).await?;
    tracing::info!("Attached {} to instance {}", public_ip, instance.id);
    Ok(Some(public_ip))
}

/// Whether `ip` is reachable from the public internet
///
/// Unparseable input is not routable.
pub fn is_globally_routable(ip: &str) -> bool {
    match ip.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => is_global_v4(v4),
        Ok(IpAddr::V6(v6)) => is_global_v6(v6),
        Err(_) => false,
    }
}

fn is_global_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    let shared = a == 100 && (b & 0xc0) == 64;
    let benchmarking = a == 198 && (b & 0xfe) == 18;
    let reserved = a >= 240;
    let protocol_assignments = a == 192 && b == 0 && ip.octets()[2] == 0;

    !(ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_documentation()
        || ip.is_multicast()
        || ip.is_broadcast()
        || a == 0
        || shared
        || benchmarking
        || reserved
        || protocol_assignments)
}

fn is_global_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    let unique_local = (first & 0xfe00) == 0xfc00;
    let link_local = (first & 0xffc0) == 0xfe80;
    let documentation = first == 0x2001 && ip.segments()[1] == 0x0db8;

    !(ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        || unique_local
        || link_local
        || documentation
        || ip.to_ipv4_mapped().is_some())
}
