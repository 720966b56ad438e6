//! CloudLaunch Core
//!
//! Turns an application's launch configuration into a running, reachable
//! virtual machine: key pair and security groups are resolved or created,
//! the instance is launched and awaited, a public IP is attached and the
//! application is polled over HTTP until it answers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  Orchestrator                    │
//! │        (progress events → ProgressSink)          │
//! └──┬──────────┬──────────┬──────────┬─────────────┘
//!    │          │          │          │
//! ┌──▼─────┐ ┌──▼─────┐ ┌──▼─────┐ ┌──▼──────────┐
//! │resolver│ │firewall│ │launcher│ │ floating_ip │
//! └──┬─────┘ └──┬─────┘ └──┬─────┘ └──┬──────────┘
//!    └──────────┴─────┬────┴──────────┘
//!             ┌───────▼────────┐     ┌───────────┐
//!             │ CloudProvider  │     │ readiness │──▶ HTTP HEAD
//!             └────────────────┘     └───────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use cloudlaunch_cloud::MemoryProvider;
//! use cloudlaunch_core::{
//!     AppConfig, CloudTarget, LaunchRequest, LaunchSettings, Orchestrator, TracingSink,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> cloudlaunch_core::Result<()> {
//! let provider = Arc::new(MemoryProvider::new().with_image("img-1", "ubuntu"));
//! let orchestrator = Orchestrator::new(provider, Arc::new(TracingSink), LaunchSettings::from_env()?)?;
//!
//! let config = AppConfig::from_path("app.yaml")?;
//! let request = LaunchRequest::new("galaxy", CloudTarget::new("img-1"), config);
//! let result = orchestrator.launch(&request).await?;
//! println!("{}", result.application_url);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod deployment;
pub mod error;
pub mod firewall;
pub mod floating_ip;
pub mod launcher;
pub mod orchestrator;
pub mod plan;
pub mod progress;
pub mod readiness;
pub mod resolver;
pub mod result;
pub mod settings;
pub mod user_data;

// Re-exports
pub use config::{
    AppConfig, ApplianceConfig, FirewallGroupSpec, FirewallRuleSpec, HostnameConfig,
    LaunchConfig, PortValue, RootStorageType,
};
pub use deployment::{HealthStatus, delete, deployment_instance_id, health_check, restart};
pub use error::{LaunchError, Result};
pub use firewall::{FirewallOutcome, RuleWarning, apply_firewall, apply_security_group, lint_firewall};
pub use floating_ip::{ensure_public_ip, is_globally_routable};
pub use launcher::InstanceLauncher;
pub use orchestrator::{AppKind, LaunchRequest, Orchestrator};
pub use plan::{LaunchPlan, build_device_config};
pub use progress::{
    ChannelSink, LaunchStage, ProgressEvent, ProgressSink, RecordingSink, Reporter, TaskState,
    TracingSink,
};
pub use readiness::{HttpProbe, HttpReadiness, ProbeOutcome, ReqwestProbe, wait_for_http};
pub use resolver::{resolve_key_pair, resolve_network_id, resolve_security_group};
pub use result::{LaunchResult, NOT_AVAILABLE, application_url};
pub use settings::{CloudTarget, LaunchSettings};
pub use user_data::compose_user_data;
