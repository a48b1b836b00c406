use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::device::constants::{SPECTROMETER_DATA_CHARACTERISTIC, SPECTROMETER_SERVICE};

/// Which peripheral service/characteristic carries the readings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceConfig {
    pub service_uuid: Uuid,
    pub characteristic_uuid: Uuid,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            service_uuid: SPECTROMETER_SERVICE,
            characteristic_uuid: SPECTROMETER_DATA_CHARACTERISTIC,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub device: DeviceConfig,
    pub splash_duration_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device: DeviceConfig::default(),
            splash_duration_ms: 5000,
        }
    }
}
