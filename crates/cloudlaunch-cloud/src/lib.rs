//! CloudLaunch Cloud Provider Interface
//!
//! This crate defines the capability surface the launch core needs from a
//! cloud: key pairs, security groups and their rules, the default network,
//! images, instances and floating IPs.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                cloudlaunch-core                  │
//! │        (resolve → firewall → launch → IP)        │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               cloudlaunch-cloud                  │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │      trait CloudProvider { ... }          │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │  Resources   │  │ RetryConfig  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │   SDK-backed  │ │    memory     │
//! │   providers   │ │   provider    │
//! └───────────────┘ └───────────────┘
//! ```

pub mod error;
pub mod memory;
pub mod provider;
pub mod resource;

// Re-exports
pub use error::{CloudError, Result};
pub use memory::{MemoryProvider, ProviderCall};
pub use provider::{CloudProvider, RetryConfig, with_retry};
pub use resource::{
    FirewallRule, FloatingIp, Image, Instance, InstanceRequest, InstanceState, KeyPair,
    LaunchDeviceConfig, Network, SecurityGroup, VolumeDevice,
};
