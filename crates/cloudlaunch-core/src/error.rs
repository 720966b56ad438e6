//! Launch error types

use crate::progress::LaunchStage;
use cloudlaunch_cloud::CloudError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    /// A provider call failed; `stage` is the stage that was in progress
    #[error("Cloud provider error during {stage}: {source}")]
    Provider {
        stage: LaunchStage,
        #[source]
        source: CloudError,
    },

    /// A provider call failed outside of a launch
    #[error("Cloud provider error: {0}")]
    Cloud(#[from] CloudError),

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Instance {instance_id} did not become ready within {timeout:?}")]
    ReadinessTimeout {
        instance_id: String,
        timeout: Duration,
    },

    #[error("Instance failed to start: {0}")]
    InstanceFailed(String),

    #[error("Instance {0} should have been deleted but still exists")]
    InstanceNotDeleted(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl LaunchError {
    /// Stage the launch was in when a provider call failed
    pub fn stage(&self) -> Option<LaunchStage> {
        match self {
            LaunchError::Provider { stage, .. } => Some(*stage),
            LaunchError::ReadinessTimeout { .. } | LaunchError::InstanceFailed(_) => {
                Some(LaunchStage::AwaitingReady)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LaunchError>;

/// Attach the in-progress stage to a provider error
pub(crate) trait StageContext<T> {
    fn at_stage(self, stage: LaunchStage) -> Result<T>;
}

impl<T> StageContext<T> for cloudlaunch_cloud::Result<T> {
    fn at_stage(self, stage: LaunchStage) -> Result<T> {
        self.map_err(|source| LaunchError::Provider { stage, source })
    }
}
