use std::sync::Arc;
use log::{info, warn};

use crate::device::constants::MODERN_PERMISSION_API_LEVEL;
use crate::device::platform::{Capability, PermissionCapability, PermissionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformVersion {
    Desktop,
    Android { api_level: u32 },
}

impl PlatformVersion {
    pub fn current() -> Self {
        PlatformVersion::Desktop
    }
}

/// The capabilities that must be granted before scanning on the given platform.
pub fn required_capabilities(version: PlatformVersion) -> Vec<Capability> {
    match version {
        // before API 31, location access is the prerequisite for BLE scanning
        PlatformVersion::Android { api_level } if api_level < MODERN_PERMISSION_API_LEVEL => {
            vec![Capability::FineLocation]
        },
        _ => vec![Capability::BluetoothScan, Capability::BluetoothConnect],
    }
}

pub struct PermissionGate<P: PermissionCapability> {
    platform: Arc<P>,
    version: PlatformVersion,
}

impl<P: PermissionCapability> PermissionGate<P> {
    pub fn new(platform: Arc<P>, version: PlatformVersion) -> Self {
        PermissionGate { platform, version }
    }

    /// Returns true only if every required capability was granted.
    pub async fn request(&self) -> bool {
        let capabilities = required_capabilities(self.version);
        let statuses = self.platform.request(&capabilities).await;

        let denied: Vec<&Capability> = capabilities
            .iter()
            .filter(|capability| statuses.get(*capability) != Some(&PermissionStatus::Granted))
            .collect();

        if denied.is_empty() {
            info!("Permissions granted: {:?}", capabilities);
            true
        }
        else {
            warn!("Permissions not granted: {:?}", denied);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::FakePermissions;

    #[test]
    fn legacy_android_requests_only_location() {
        assert_eq!(
            required_capabilities(PlatformVersion::Android { api_level: 30 }),
            vec![Capability::FineLocation],
        );
    }

    #[test]
    fn modern_platforms_request_scan_and_connect() {
        let expected = vec![Capability::BluetoothScan, Capability::BluetoothConnect];
        assert_eq!(required_capabilities(PlatformVersion::Android { api_level: 31 }), expected);
        assert_eq!(required_capabilities(PlatformVersion::Android { api_level: 34 }), expected);
        assert_eq!(required_capabilities(PlatformVersion::Desktop), expected);
    }

    #[tokio::test]
    async fn granted_when_everything_is_granted() {
        let permissions = FakePermissions::granting();
        let gate = PermissionGate::new(permissions.clone(), PlatformVersion::Android { api_level: 29 });

        assert!(gate.request().await);
        assert_eq!(permissions.requests(), vec![vec![Capability::FineLocation]]);
    }

    #[tokio::test]
    async fn denied_when_one_capability_is_missing() {
        let permissions = FakePermissions::denying(&[Capability::BluetoothConnect]);
        let gate = PermissionGate::new(permissions, PlatformVersion::Desktop);

        assert!(!gate.request().await);
    }
}
