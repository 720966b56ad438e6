//! Launch plan construction

use crate::config::{LaunchConfig, RootStorageType};
use cloudlaunch_cloud::{Image, InstanceRequest, LaunchDeviceConfig};

/// Device layout for the instance
///
/// Only a `volume` root storage type produces a layout: one root volume
/// populated from `image`. Otherwise the provider's instance-store root is
/// used and `None` is returned.
pub fn build_device_config(image: &Image, config: &LaunchConfig) -> Option<LaunchDeviceConfig> {
    match config.root_storage_type {
        RootStorageType::Volume => {
            let mut devices = LaunchDeviceConfig::new();
            devices.add_volume_device(image, config.root_storage_size(), true);
            Some(devices)
        }
        RootStorageType::Instance => None,
    }
}

/// Fully resolved parameters of one instance launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub name: String,
    pub image: Image,
    pub instance_type: Option<String>,
    pub subnet: Option<String>,
    pub key_pair: String,
    pub security_group_ids: Vec<String>,
    pub zone: Option<String>,
    pub user_data: String,
    pub launch_config: Option<LaunchDeviceConfig>,
}

impl LaunchPlan {
    pub fn to_request(&self) -> InstanceRequest {
        InstanceRequest {
            name: self.name.clone(),
            image_id: self.image.id.clone(),
            instance_type: self.instance_type.clone(),
            subnet_id: self.subnet.clone(),
            key_pair_name: self.key_pair.clone(),
            security_group_ids: self.security_group_ids.clone(),
            zone: self.zone.clone(),
            user_data: self.user_data.clone(),
            launch_config: self.launch_config.clone(),
        }
    }

    /// Instance type for log messages
    pub fn instance_type_label(&self) -> &str {
        self.instance_type.as_deref().unwrap_or("default")
    }

    pub fn zone_label(&self) -> &str {
        self.zone.as_deref().unwrap_or("any")
    }
}
