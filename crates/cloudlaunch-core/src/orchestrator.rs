//! Launch orchestration
//!
//! Runs the launch stages strictly in order:
//!
//! ```text
//! STARTED → RESOLVING_KEYPAIR → APPLYING_FIREWALL → LAUNCHING → AWAITING_READY
//!   → ASSIGNING_STATIC_IP (staticIP only) → ALLOCATING_PUBLIC_IP (unless skipFloatingIP)
//!   → AWAITING_APP_READY (base applications with a public IP) → DONE
//! ```
//!
//! Every stage is reported to the caller's [`ProgressSink`] before it runs,
//! so after a failure the last event names the stage that failed. Provider
//! resources created along the way are left in place.

use crate::config::AppConfig;
use crate::error::{LaunchError, Result, StageContext};
use crate::firewall::apply_firewall;
use crate::floating_ip::ensure_public_ip;
use crate::launcher::InstanceLauncher;
use crate::plan::{LaunchPlan, build_device_config};
use crate::progress::{LaunchStage, ProgressSink, Reporter};
use crate::readiness::{HttpProbe, ReqwestProbe, wait_for_http};
use crate::resolver::resolve_key_pair;
use crate::result::{InstanceRef, LaunchResult, NOT_AVAILABLE, SecurityGroupRef, application_url};
use crate::settings::{CloudTarget, LaunchSettings};
use crate::user_data::compose_user_data;
use cloudlaunch_cloud::CloudProvider;
use std::sync::Arc;

/// Application variant being launched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppKind {
    /// Generic VM application; waits for HTTP readiness
    #[default]
    Base,
    /// Application with its own readiness handling; the HTTP wait is skipped
    Specialized,
}

/// Everything one launch needs from the caller
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// Instance name
    pub name: String,
    pub target: CloudTarget,
    pub app_config: AppConfig,
    /// User data from the caller; falls back to `instanceUserData`
    pub user_data: Option<String>,
    pub kind: AppKind,
}

impl LaunchRequest {
    pub fn new(name: impl Into<String>, target: CloudTarget, app_config: AppConfig) -> Self {
        Self {
            name: name.into(),
            target,
            app_config,
            user_data: None,
            kind: AppKind::default(),
        }
    }

    pub fn with_user_data(mut self, user_data: impl Into<String>) -> Self {
        self.user_data = Some(user_data.into());
        self
    }

    pub fn with_kind(mut self, kind: AppKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Sequences the launch stages against one provider
pub struct Orchestrator {
    provider: Arc<dyn CloudProvider>,
    reporter: Reporter,
    settings: LaunchSettings,
    probe: Arc<dyn HttpProbe>,
}

impl Orchestrator {
    /// Create an orchestrator probing application readiness over HTTP
    pub fn new(
        provider: Arc<dyn CloudProvider>,
        progress: Arc<dyn ProgressSink>,
        settings: LaunchSettings,
    ) -> Result<Self> {
        let probe = ReqwestProbe::new(settings.http_request_timeout)?;
        Ok(Self {
            provider,
            reporter: Reporter::new(progress),
            settings,
            probe: Arc::new(probe),
        })
    }

    /// Replace the HTTP readiness probe
    pub fn with_probe(mut self, probe: Arc<dyn HttpProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn settings(&self) -> &LaunchSettings {
        &self.settings
    }

    /// Launch one instance and wait for it to become reachable
    pub async fn launch(&self, request: &LaunchRequest) -> Result<LaunchResult> {
        let provider = self.provider.as_ref();
        let config = &request.app_config.config_cloudlaunch;

        self.reporter.emit(
            LaunchStage::Started,
            format!("Starting launch of {} on {}", request.name, provider.name()),
        );
        let image_id = config
            .custom_image_id()
            .unwrap_or(request.target.image_id.as_str());
        let image = provider
            .get_image(image_id)
            .await
            .at_stage(LaunchStage::Started)?
            .ok_or_else(|| LaunchError::ImageNotFound(image_id.to_string()))?;

        self.reporter.emit(
            LaunchStage::ResolvingKeyPair,
            "Retrieving or creating a keypair",
        );
        let key_pair_name = config.key_pair_name(&self.settings.default_key_pair_name);
        let key_pair = resolve_key_pair(provider, key_pair_name)
            .await
            .at_stage(LaunchStage::ResolvingKeyPair)?;

        self.reporter
            .emit(LaunchStage::ApplyingFirewall, "Applying firewall settings");
        let firewall = apply_firewall(provider, config)
            .await
            .at_stage(LaunchStage::ApplyingFirewall)?;

        let base_user_data = request
            .user_data
            .as_deref()
            .or_else(|| config.instance_user_data())
            .unwrap_or_default();
        let user_data =
            compose_user_data(base_user_data, request.app_config.config_appliance.as_ref())?;
        tracing::debug!("User data for {}: {} bytes", request.name, user_data.len());

        let plan = LaunchPlan {
            name: request.name.clone(),
            launch_config: build_device_config(&image, config),
            image,
            instance_type: config
                .instance_type()
                .map(str::to_string)
                .or_else(|| request.target.default_instance_type.clone()),
            subnet: config.subnet().map(str::to_string),
            key_pair: key_pair.name.clone(),
            security_group_ids: firewall.group_ids(),
            zone: config.placement_zone().map(str::to_string),
            user_data,
        };

        let launcher = InstanceLauncher::new(provider, &self.settings, &self.reporter);
        let instance = launcher.launch(&plan, config.static_ip()).await?;

        let public_ip = if config.skip_floating_ip {
            tracing::debug!("Floating IP allocation skipped by config");
            instance.first_public_ip().map(str::to_string)
        } else {
            self.reporter
                .emit(LaunchStage::AllocatingPublicIp, "Allocating a public IP");
            ensure_public_ip(provider, &instance)
                .await
                .at_stage(LaunchStage::AllocatingPublicIp)?
        };

        let url = application_url(public_ip.as_deref());
        let application_ready = match (request.kind, &public_ip) {
            (AppKind::Base, Some(_)) => {
                self.reporter.emit(
                    LaunchStage::AwaitingAppReady,
                    format!("Waiting for application to become ready at {}", url),
                );
                let readiness = wait_for_http(
                    self.probe.as_ref(),
                    &url,
                    self.settings.http_max_attempts,
                    self.settings.http_poll_interval,
                )
                .await;
                Some(readiness.is_ready())
            }
            _ => None,
        };

        let hostname = config
            .hostname_config
            .as_ref()
            .and_then(|h| h.manual_host_name())
            .map(str::to_string)
            .or_else(|| public_ip.clone());
        let private_ip = instance
            .private_ips
            .first()
            .cloned()
            .or_else(|| public_ip.clone());

        self.reporter.emit(
            LaunchStage::Done,
            format!(
                "Instance creation successful. Public IP (if available): {}",
                public_ip.as_deref().unwrap_or(NOT_AVAILABLE)
            ),
        );

        let security_groups: Vec<SecurityGroupRef> = firewall
            .security_groups
            .iter()
            .map(SecurityGroupRef::from)
            .collect();

        Ok(LaunchResult {
            key_pair,
            security_group: security_groups.first().cloned(),
            security_groups,
            instance: InstanceRef { id: instance.id },
            public_ip,
            private_ip,
            hostname,
            application_url: url,
            application_ready,
            warnings: firewall.warnings,
        })
    }
}
