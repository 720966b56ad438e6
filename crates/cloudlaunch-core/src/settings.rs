//! Launch tunables and cloud defaults

use crate::error::{LaunchError, Result};
use cloudlaunch_cloud::RetryConfig;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_KEY_PAIR_NAME: &str = "cloudlaunch_key_pair";
pub const DEFAULT_HTTP_MAX_ATTEMPTS: u32 = 200;
pub const DEFAULT_HTTP_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(1800);

const ENV_KEY_PAIR: &str = "CLOUDLAUNCH_KEY_PAIR";
const ENV_HTTP_MAX_ATTEMPTS: &str = "CLOUDLAUNCH_HTTP_MAX_ATTEMPTS";
const ENV_HTTP_POLL_INTERVAL: &str = "CLOUDLAUNCH_HTTP_POLL_INTERVAL_SECS";
const ENV_HTTP_TIMEOUT: &str = "CLOUDLAUNCH_HTTP_TIMEOUT_SECS";
const ENV_READY_TIMEOUT: &str = "CLOUDLAUNCH_READY_TIMEOUT_SECS";

/// Defaults that belong to the cloud version being launched on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudTarget {
    /// Image used when the config has no `customImageID`
    pub image_id: String,
    /// Instance type used when the config has no `instanceType`
    pub default_instance_type: Option<String>,
}

impl CloudTarget {
    pub fn new(image_id: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            default_instance_type: None,
        }
    }

    pub fn with_default_instance_type(mut self, instance_type: impl Into<String>) -> Self {
        self.default_instance_type = Some(instance_type.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaunchSettings {
    /// Key pair name used when the config names none
    pub default_key_pair_name: String,
    pub http_max_attempts: u32,
    pub http_poll_interval: Duration,
    /// Timeout of a single readiness probe request
    pub http_request_timeout: Duration,
    /// Upper bound on the provider-ready wait; `None` waits indefinitely
    pub instance_ready_timeout: Option<Duration>,
    /// Backoff between provider-ready checks
    pub ready_poll: RetryConfig,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            default_key_pair_name: DEFAULT_KEY_PAIR_NAME.to_string(),
            http_max_attempts: DEFAULT_HTTP_MAX_ATTEMPTS,
            http_poll_interval: DEFAULT_HTTP_POLL_INTERVAL,
            http_request_timeout: DEFAULT_HTTP_TIMEOUT,
            instance_ready_timeout: Some(DEFAULT_READY_TIMEOUT),
            ready_poll: RetryConfig::instance_ready(),
        }
    }
}

impl LaunchSettings {
    /// Defaults overridden by `CLOUDLAUNCH_*` environment variables
    ///
    /// `CLOUDLAUNCH_READY_TIMEOUT_SECS=0` removes the provider-ready bound.
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();

        if let Ok(name) = std::env::var(ENV_KEY_PAIR)
            && !name.trim().is_empty()
        {
            settings.default_key_pair_name = name.trim().to_string();
        }
        if let Some(attempts) = env_parse::<u32>(ENV_HTTP_MAX_ATTEMPTS)? {
            settings.http_max_attempts = attempts;
        }
        if let Some(secs) = env_parse::<u64>(ENV_HTTP_POLL_INTERVAL)? {
            settings.http_poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>(ENV_HTTP_TIMEOUT)? {
            settings.http_request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>(ENV_READY_TIMEOUT)? {
            settings.instance_ready_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(settings)
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            LaunchError::InvalidConfig(format!("{} must be a non-negative integer, got {:?}", key, raw))
        }),
        Err(_) => Ok(None),
    }
}
