//! Instance creation and provider-ready wait

use crate::error::{LaunchError, Result, StageContext};
use crate::plan::LaunchPlan;
use crate::progress::{LaunchStage, Reporter};
use crate::settings::LaunchSettings;
use cloudlaunch_cloud::{CloudError, CloudProvider, Instance};

/// Submits the creation request and waits for the provider to report the
/// instance ready
pub struct InstanceLauncher<'a> {
    provider: &'a dyn CloudProvider,
    settings: &'a LaunchSettings,
    reporter: &'a Reporter,
}

impl<'a> InstanceLauncher<'a> {
    pub fn new(
        provider: &'a dyn CloudProvider,
        settings: &'a LaunchSettings,
        reporter: &'a Reporter,
    ) -> Self {
        Self {
            provider,
            settings,
            reporter,
        }
    }

    /// Launch the planned instance
    ///
    /// When `static_ip` is given, that floating IP is attached once the
    /// instance is ready and the instance state is refreshed afterwards.
    pub async fn launch(&self, plan: &LaunchPlan, static_ip: Option<&str>) -> Result<Instance> {
        self.reporter.emit(
            LaunchStage::Launching,
            format!(
                "Launching an instance of type {} with keypair {} in zone {}",
                plan.instance_type_label(),
                plan.key_pair,
                plan.zone_label()
            ),
        );
        let created = self
            .provider
            .create_instance(&plan.to_request())
            .await
            .at_stage(LaunchStage::Launching)?;
        tracing::info!("Instance {} ({}) created", created.name, created.id);

        self.reporter.emit(
            LaunchStage::AwaitingReady,
            format!("Waiting for instance {}", created.id),
        );
        let mut instance = self.wait_ready(&created.id).await?;

        if let Some(ip) = static_ip {
            self.reporter.emit(
                LaunchStage::AssigningStaticIp,
                format!("Assigning requested floating IP: {}", ip),
            );
            self.provider
                .add_floating_ip(&instance.id, ip)
                .await
                .at_stage(LaunchStage::AssigningStaticIp)?;
            instance = self
                .provider
                .get_instance(&instance.id)
                .await
                .at_stage(LaunchStage::AssigningStaticIp)?
                .ok_or_else(|| LaunchError::Provider {
                    stage: LaunchStage::AssigningStaticIp,
                    source: CloudError::ResourceNotFound(format!("instance {}", instance.id)),
                })?;
        }

        Ok(instance)
    }

    async fn wait_ready(&self, instance_id: &str) -> Result<Instance> {
        let timeout = self.settings.instance_ready_timeout;
        let result = self
            .provider
            .wait_till_ready(instance_id, timeout, &self.settings.ready_poll)
            .await;

        match result {
            Ok(instance) => {
                tracing::info!("Instance {} is ready", instance_id);
                Ok(instance)
            }
            Err(CloudError::Timeout(_)) => Err(LaunchError::ReadinessTimeout {
                instance_id: instance_id.to_string(),
                timeout: timeout.unwrap_or_default(),
            }),
            Err(CloudError::InstanceFailed(msg)) => Err(LaunchError::InstanceFailed(msg)),
            Err(source) => Err(LaunchError::Provider {
                stage: LaunchStage::AwaitingReady,
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RecordingSink;
    use cloudlaunch_cloud::{Image, InstanceState, MemoryProvider, ProviderCall};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::assert_ok;

    fn plan() -> LaunchPlan {
        LaunchPlan {
            name: "app".to_string(),
            image: Image {
                id: "img-1".to_string(),
                name: "ubuntu".to_string(),
            },
            instance_type: Some("m1.small".to_string()),
            subnet: None,
            key_pair: "kp".to_string(),
            security_group_ids: Vec::new(),
            zone: None,
            user_data: String::new(),
            launch_config: None,
        }
    }

    fn provider() -> MemoryProvider {
        MemoryProvider::new()
            .with_image("img-1", "ubuntu")
            .with_key_pair("kp")
    }

    #[tokio::test(start_paused = true)]
    async fn test_launch_waits_until_running() {
        let provider = provider().with_boot_polls(Some(3));
        let settings = LaunchSettings::default();
        let sink = Arc::new(RecordingSink::new());
        let reporter = Reporter::new(sink.clone());

        let launcher = InstanceLauncher::new(&provider, &settings, &reporter);
        let instance = assert_ok!(launcher.launch(&plan(), None).await);

        assert_eq!(instance.state, InstanceState::Running);
        assert_eq!(
            sink.stages(),
            vec![LaunchStage::Launching, LaunchStage::AwaitingReady]
        );
        assert_eq!(
            sink.events()[0].action,
            "Launching an instance of type m1.small with keypair kp in zone any"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_static_ip_is_attached_after_ready() {
        let provider = provider().with_floating_ip("198.51.100.7", false);
        let settings = LaunchSettings::default();
        let sink = Arc::new(RecordingSink::new());
        let reporter = Reporter::new(sink.clone());

        let launcher = InstanceLauncher::new(&provider, &settings, &reporter);
        let instance = assert_ok!(launcher.launch(&plan(), Some("198.51.100.7")).await);

        assert_eq!(instance.first_public_ip(), Some("198.51.100.7"));
        assert_eq!(sink.last().unwrap().stage, LaunchStage::AssigningStaticIp);
        assert!(provider.calls().await.contains(&ProviderCall::AddFloatingIp {
            instance_id: instance.id.clone(),
            public_ip: "198.51.100.7".to_string(),
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_wait_is_bounded() {
        let provider = provider().with_boot_polls(None);
        let settings = LaunchSettings {
            instance_ready_timeout: Some(Duration::from_secs(60)),
            ..Default::default()
        };
        let reporter = Reporter::new(Arc::new(RecordingSink::new()));

        let launcher = InstanceLauncher::new(&provider, &settings, &reporter);
        let err = launcher.launch(&plan(), None).await.unwrap_err();

        match err {
            LaunchError::ReadinessTimeout { timeout, .. } => {
                assert_eq!(timeout, Duration::from_secs(60));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_create_failure_reports_launching_stage() {
        let provider = provider().fail_operation("create_instance");
        let settings = LaunchSettings::default();
        let reporter = Reporter::new(Arc::new(RecordingSink::new()));

        let launcher = InstanceLauncher::new(&provider, &settings, &reporter);
        let err = launcher.launch(&plan(), None).await.unwrap_err();
        assert_eq!(err.stage(), Some(LaunchStage::Launching));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_static_ip_fails_at_assignment() {
        let provider = provider();
        let settings = LaunchSettings::default();
        let reporter = Reporter::new(Arc::new(RecordingSink::new()));

        let launcher = InstanceLauncher::new(&provider, &settings, &reporter);
        let err = launcher.launch(&plan(), Some("192.0.2.1")).await.unwrap_err();
        assert_eq!(err.stage(), Some(LaunchStage::AssigningStaticIp));
    }
}
