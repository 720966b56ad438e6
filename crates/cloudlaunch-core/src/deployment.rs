//! Maintenance of launched instances
//!
//! Health check, restart and delete for an instance created by a previous
//! launch. The instance is identified by ID, usually taken from the stored
//! launch result with [`deployment_instance_id`].

use crate::error::{LaunchError, Result};
use crate::result::ENVELOPE_KEY;
use cloudlaunch_cloud::{CloudError, CloudProvider, InstanceState, RetryConfig, with_retry};
use serde::{Deserialize, Serialize};

/// Status reported when the instance no longer exists
pub const NOT_FOUND_STATUS: &str = "not_found";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub instance_status: String,
}

/// Instance ID recorded in a `{"cloudLaunch": {...}}` launch result
pub fn deployment_instance_id(launch_result: &serde_json::Value) -> Option<&str> {
    launch_result
        .get(ENVELOPE_KEY)?
        .get("instance")?
        .get("id")?
        .as_str()
        .filter(|id| !id.is_empty())
}

/// Current provider state of the instance, or `not_found`
pub async fn health_check(provider: &dyn CloudProvider, instance_id: &str) -> Result<HealthStatus> {
    tracing::debug!("Checking the status of instance {}", instance_id);
    let instance_status = match provider.get_instance(instance_id).await? {
        Some(instance) => instance.state.to_string(),
        None => NOT_FOUND_STATUS.to_string(),
    };
    Ok(HealthStatus { instance_status })
}

/// Reboot the instance; `false` if it does not exist
pub async fn restart(provider: &dyn CloudProvider, instance_id: &str) -> Result<bool> {
    if provider.get_instance(instance_id).await?.is_none() {
        return Ok(false);
    }

    tracing::info!("Restarting instance {}", instance_id);
    provider.reboot_instance(instance_id).await?;
    Ok(true)
}

/// Delete the instance and wait until the provider no longer reports it
///
/// Each attempt deletes the instance if it is still listed, then checks
/// again. Attempts repeat with exponential backoff per `retry`
/// ([`RetryConfig::deletion`] is the usual choice).
///
/// # Errors
/// * `LaunchError::InstanceNotDeleted` - the instance survived every attempt
/// * `LaunchError::Cloud` - a provider call failed on the last attempt
pub async fn delete(
    provider: &dyn CloudProvider,
    instance_id: &str,
    retry: &RetryConfig,
) -> Result<()> {
    tracing::debug!("Deleting instance {}", instance_id);

    let outcome = with_retry(retry, "instance deletion", || {
        delete_attempt(provider, instance_id)
    })
    .await;

    match outcome {
        Ok(()) => {
            tracing::info!("Instance {} deleted", instance_id);
            Ok(())
        }
        Err(DeleteAttemptError::StillPresent(_)) => {
            Err(LaunchError::InstanceNotDeleted(instance_id.to_string()))
        }
        Err(DeleteAttemptError::Cloud(e)) => Err(e.into()),
    }
}

#[derive(Debug, thiserror::Error)]
enum DeleteAttemptError {
    #[error("instance is still {0}")]
    StillPresent(InstanceState),
    #[error(transparent)]
    Cloud(#[from] CloudError),
}

/// Delete the instance if it is still listed, then check that it is gone
async fn delete_attempt(
    provider: &dyn CloudProvider,
    instance_id: &str,
) -> std::result::Result<(), DeleteAttemptError> {
    if provider.get_instance(instance_id).await?.is_some() {
        match provider.delete_instance(instance_id).await {
            Ok(()) | Err(CloudError::ResourceNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    match provider.get_instance(instance_id).await? {
        None => Ok(()),
        Some(instance)
            if matches!(instance.state, InstanceState::Deleted | InstanceState::Unknown) =>
        {
            Ok(())
        }
        Some(instance) => Err(DeleteAttemptError::StillPresent(instance.state)),
    }
}
