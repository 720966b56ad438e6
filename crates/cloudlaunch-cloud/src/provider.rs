//! Cloud provider trait definition

use crate::error::{CloudError, Result};
use crate::resource::{
    FirewallRule, FloatingIp, Image, Instance, InstanceRequest, InstanceState, KeyPair, Network,
    SecurityGroup,
};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Cloud provider abstraction trait
///
/// Each capability maps onto one provider API call. Lookups return empty
/// collections or `None` rather than `ResourceNotFound` so that callers can
/// implement get-or-create without matching on errors.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider name (e.g., "openstack", "memory")
    fn name(&self) -> &str;

    /// Find key pairs with exactly this name
    async fn find_key_pairs(&self, name: &str) -> Result<Vec<KeyPair>>;

    /// Create a key pair; the returned value carries the private key material.
    /// Fails with `ResourceAlreadyExists` if the name is taken.
    async fn create_key_pair(&self, name: &str) -> Result<KeyPair>;

    /// Find security groups with exactly this name
    async fn find_security_groups(&self, name: &str) -> Result<Vec<SecurityGroup>>;

    /// Create a security group. Fails with `ResourceAlreadyExists` if the
    /// provider enforces unique names and the name is taken.
    async fn create_security_group(
        &self,
        name: &str,
        description: &str,
        network_id: Option<&str>,
    ) -> Result<SecurityGroup>;

    /// Add an inbound rule to a security group
    async fn add_rule(&self, group_id: &str, rule: &FirewallRule) -> Result<()>;

    /// Get the account's default network, creating it if absent. Providers
    /// without network support return `None`.
    async fn get_or_create_default_network(&self) -> Result<Option<Network>>;

    /// List every floating IP visible in the account
    async fn list_floating_ips(&self) -> Result<Vec<FloatingIp>>;

    /// Allocate a new floating IP
    async fn create_floating_ip(&self) -> Result<FloatingIp>;

    async fn get_image(&self, image_id: &str) -> Result<Option<Image>>;

    /// Submit an instance creation request. Returns as soon as the provider
    /// accepted the request; the instance is usually still pending.
    async fn create_instance(&self, request: &InstanceRequest) -> Result<Instance>;

    /// Fetch the current state of an instance
    async fn get_instance(&self, instance_id: &str) -> Result<Option<Instance>>;

    /// Attach a floating IP to an instance
    async fn add_floating_ip(&self, instance_id: &str, public_ip: &str) -> Result<()>;

    async fn reboot_instance(&self, instance_id: &str) -> Result<()>;

    async fn delete_instance(&self, instance_id: &str) -> Result<()>;

    /// Wait until the instance reports a ready state
    ///
    /// Polls [`CloudProvider::get_instance`] with the backoff described by
    /// `retry`. `retry.max_attempts` is not consulted: the wait is bounded by
    /// `timeout` only, and is unbounded when `timeout` is `None`.
    async fn wait_till_ready(
        &self,
        instance_id: &str,
        timeout: Option<Duration>,
        retry: &RetryConfig,
    ) -> Result<Instance> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut attempt = 0u32;

        loop {
            let instance = self.get_instance(instance_id).await?.ok_or_else(|| {
                CloudError::ResourceNotFound(format!("instance {}", instance_id))
            })?;

            match instance.state {
                InstanceState::Running => return Ok(instance),
                InstanceState::Error | InstanceState::Deleted => {
                    return Err(CloudError::InstanceFailed(format!(
                        "instance {} entered state {}",
                        instance_id, instance.state
                    )));
                }
                state => {
                    tracing::debug!("Instance {} is {}, waiting", instance_id, state);
                }
            }

            let delay = retry.delay_for_attempt(attempt);
            attempt = attempt.saturating_add(1);

            match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(CloudError::Timeout(format!(
                            "instance {} not ready after {} checks",
                            instance_id, attempt
                        )));
                    }
                    sleep(delay.min(deadline - now)).await;
                }
                None => sleep(delay).await,
            }
        }
    }
}

/// Retry configuration for provider operations
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_attempts: u32,

    /// Initial delay between retries
    pub initial_delay: Duration,

    /// Maximum delay between retries
    pub max_delay: Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Polling cadence for instance readiness
    pub fn instance_ready() -> Self {
        Self {
            max_attempts: u32::MAX,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(15),
            backoff_multiplier: 1.5,
        }
    }

    /// Policy for confirming an instance deletion: 7 attempts, 4s to 256s
    pub fn deletion() -> Self {
        Self {
            max_attempts: 7,
            initial_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(256),
            backoff_multiplier: 2.0,
        }
    }

    /// Delay before retry number `attempt` (0-based), capped at `max_delay`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(64) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);

        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs.max(0.0))
        }
    }
}

/// Run `operation` until it succeeds or `config.max_attempts` is exhausted,
/// sleeping with exponential backoff in between. Returns the last error.
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    name: &str,
    mut operation: F,
) -> std::result::Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 >= attempts => return Err(e),
            Err(e) => {
                let delay = config.delay_for_attempt(attempt);
                tracing::debug!(
                    "{} failed (attempt {}/{}): {}; retrying in {:?}",
                    name,
                    attempt + 1,
                    attempts,
                    e,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
