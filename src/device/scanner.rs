use std::sync::Arc;
use futures::future::pending;
use futures::StreamExt;
use indexmap::IndexMap;
use log::{debug, info, warn};
use tokio::runtime::Handle;

use crate::device::platform::{BleCentral, ScanStream};
use crate::device::types::DiscoveredDevice;
use crate::error::{DeviceError, PlatformError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanUpdate {
    Added(DiscoveredDevice),
    Renamed(DiscoveredDevice),
    Unchanged,
}

/// Owns one scan session at a time and the devices it found.
///
/// Dropping the scanner while a scan is running stops the platform scan.
pub struct DeviceScanner<C: BleCentral> {
    central: Arc<C>,
    stream: Option<ScanStream>,
    devices: IndexMap<String, DiscoveredDevice>,
    runtime: Option<Handle>,
}

impl<C: BleCentral> DeviceScanner<C> {
    pub fn new(central: Arc<C>) -> Self {
        DeviceScanner {
            central,
            stream: None,
            devices: IndexMap::new(),
            runtime: Handle::try_current().ok(),
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.stream.is_some()
    }

    /// Devices in the order they were first seen.
    pub fn devices(&self) -> Vec<DiscoveredDevice> {
        self.devices.values().cloned().collect()
    }

    pub fn device(&self, id: &str) -> Option<&DiscoveredDevice> {
        self.devices.get(id)
    }

    /// Begin a new session. Devices of a previous session are discarded.
    pub async fn start_scan(&mut self) -> Result<(), DeviceError> {
        if self.is_scanning() {
            debug!("Scan already running");
            return Ok(());
        }

        self.devices.clear();

        match self.central.start_scan().await {
            Ok(stream) => {
                self.stream = Some(stream);
                Ok(())
            },
            Err(source) if source.is_permission_denied() => Err(DeviceError::PermissionDenied),
            Err(source) => Err(DeviceError::Scan { source }),
        }
    }

    /// Halt the session. Safe to call when no scan is running.
    pub async fn stop_scan(&mut self) -> Result<(), DeviceError> {
        if self.stream.take().is_none() {
            return Ok(());
        }

        self.central.stop_scan().await.map_err(|source| DeviceError::Scan { source })
    }

    /// Wait for the next advertisement of the running session. Never resolves while idle.
    ///
    /// An error ends the session.
    pub async fn next_advertisement(&mut self) -> Result<ScanUpdate, DeviceError> {
        let item = match self.stream.as_mut() {
            Some(stream) => stream.next().await,
            None => pending().await,
        };

        match item {
            Some(Ok(advertisement)) => Ok(self.record(DiscoveredDevice {
                id: advertisement.id,
                name: advertisement.name,
            })),
            Some(Err(source)) => {
                warn!("Scanning failed {:?}", source);
                self.abort();
                Err(DeviceError::Scan { source })
            },
            None => {
                warn!("Scan stream ended");
                self.abort();
                Err(DeviceError::Scan { source: PlatformError::StreamEnded })
            },
        }
    }

    fn record(&mut self, device: DiscoveredDevice) -> ScanUpdate {
        match self.devices.get_mut(&device.id) {
            None => {
                info!("Discovered {} {}", device.id, device.display_name());
                self.devices.insert(device.id.clone(), device.clone());
                ScanUpdate::Added(device)
            },
            Some(existing) if existing.name != device.name => {
                existing.name = device.name.clone();
                ScanUpdate::Renamed(device)
            },
            Some(_) => ScanUpdate::Unchanged,
        }
    }

    // Never awaits: the error must be returned from the same poll that observed it.
    fn abort(&mut self) {
        if self.stream.take().is_some() {
            self.spawn_stop_scan();
        }
    }

    fn spawn_stop_scan(&self) {
        let central = self.central.clone();
        match self.runtime.as_ref() {
            Some(runtime) => {
                runtime.spawn(async move {
                    if let Err(err) = central.stop_scan().await {
                        warn!("Failed to stop scan: {:?}", err);
                    }
                });
            },
            None => warn!("No runtime to stop the scan on; scan left running"),
        }
    }
}

impl<C: BleCentral> Drop for DeviceScanner<C> {
    fn drop(&mut self) {
        if self.stream.take().is_some() {
            info!("Scanner dropped while scanning; stopping scan");
            self.spawn_stop_scan();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::{settle, Call, FakeCentral};

    #[tokio::test]
    async fn deduplicates_by_id_and_keeps_last_name() {
        let central = FakeCentral::new();
        let mut scanner = DeviceScanner::new(central.clone());
        scanner.start_scan().await.unwrap();

        central.advertise("A", None);
        central.advertise("B", Some("Spectrometer"));
        central.advertise("A", Some("First"));
        central.advertise("A", Some("First"));

        let mut updates = Vec::new();
        for _ in 0..4 {
            updates.push(scanner.next_advertisement().await.unwrap());
        }

        assert!(matches!(updates[0], ScanUpdate::Added(_)));
        assert!(matches!(updates[1], ScanUpdate::Added(_)));
        assert!(matches!(updates[2], ScanUpdate::Renamed(_)));
        assert_eq!(updates[3], ScanUpdate::Unchanged);

        assert_eq!(scanner.devices(), vec![
            DiscoveredDevice { id: "A".to_string(), name: Some("First".to_string()) },
            DiscoveredDevice { id: "B".to_string(), name: Some("Spectrometer".to_string()) },
        ]);
    }

    #[tokio::test]
    async fn stop_when_idle_is_a_no_op() {
        let central = FakeCentral::new();
        let mut scanner = DeviceScanner::new(central.clone());

        scanner.stop_scan().await.unwrap();
        assert!(central.calls().is_empty());

        scanner.start_scan().await.unwrap();
        scanner.stop_scan().await.unwrap();
        scanner.stop_scan().await.unwrap();
        assert_eq!(central.calls(), vec![Call::StartScan, Call::StopScan]);
        assert!(!scanner.is_scanning());
    }

    #[tokio::test]
    async fn error_ends_the_session() {
        let central = FakeCentral::new();
        let mut scanner = DeviceScanner::new(central.clone());
        scanner.start_scan().await.unwrap();

        central.advertise("A", None);
        central.fail_scan("radio off");

        scanner.next_advertisement().await.unwrap();
        let err = scanner.next_advertisement().await.unwrap_err();

        assert!(matches!(err, DeviceError::Scan { .. }));
        assert!(!scanner.is_scanning());
        settle().await;
        assert_eq!(central.calls(), vec![Call::StartScan, Call::StopScan]);
        // what was found before the error stays visible
        assert_eq!(scanner.devices().len(), 1);
    }

    #[tokio::test]
    async fn ended_stream_is_reported_in_a_single_poll() {
        let central = FakeCentral::new();
        let mut scanner = DeviceScanner::new(central.clone());
        scanner.start_scan().await.unwrap();
        central.end_scan();

        // the error must be ready without waiting on the platform to stop
        let update = futures::FutureExt::now_or_never(scanner.next_advertisement());
        assert!(matches!(update, Some(Err(DeviceError::Scan { source: PlatformError::StreamEnded }))));
        assert!(!scanner.is_scanning());

        settle().await;
        assert_eq!(central.calls(), vec![Call::StartScan, Call::StopScan]);
    }

    #[tokio::test]
    async fn permission_denied_by_platform() {
        let central = FakeCentral::new();
        central.refuse_scan(PlatformError::from(btleplug::Error::PermissionDenied));
        let mut scanner = DeviceScanner::new(central.clone());

        let err = scanner.start_scan().await.unwrap_err();
        assert!(matches!(err, DeviceError::PermissionDenied));
        assert!(!scanner.is_scanning());
    }

    #[tokio::test]
    async fn new_session_discards_previous_devices() {
        let central = FakeCentral::new();
        let mut scanner = DeviceScanner::new(central.clone());

        scanner.start_scan().await.unwrap();
        central.advertise("A", None);
        scanner.next_advertisement().await.unwrap();
        scanner.stop_scan().await.unwrap();
        assert_eq!(scanner.devices().len(), 1);

        scanner.start_scan().await.unwrap();
        assert!(scanner.devices().is_empty());
    }

    #[tokio::test]
    async fn dropping_while_scanning_stops_the_scan() {
        let central = FakeCentral::new();
        let mut scanner = DeviceScanner::new(central.clone());
        scanner.start_scan().await.unwrap();

        drop(scanner);
        settle().await;

        assert_eq!(central.calls(), vec![Call::StartScan, Call::StopScan]);
    }

    #[tokio::test]
    async fn dropping_while_idle_does_nothing() {
        let central = FakeCentral::new();
        let scanner = DeviceScanner::new(central.clone());

        drop(scanner);
        settle().await;

        assert!(central.calls().is_empty());
    }
}
