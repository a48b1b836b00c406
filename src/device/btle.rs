use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, PeripheralProperties, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::StreamExt;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::device::platform::{
    Advertisement, BleCentral, Capability, NotificationStream, PermissionCapability, PermissionStatus, ScanStream,
};
use crate::error::PlatformError;

type PeripheralMap = Arc<Mutex<HashMap<String, Peripheral>>>;

/// [`BleCentral`] and [`PermissionCapability`] backed by the first bluetooth adapter btleplug reports.
pub struct BtlePlatform {
    manager: Manager,
    adapter: tokio::sync::Mutex<Option<Adapter>>,
    // peripherals seen during scanning, by id
    peripherals: PeripheralMap,
}

impl BtlePlatform {
    pub async fn new() -> Result<Self, PlatformError> {
        let manager = Manager::new().await?;

        Ok(BtlePlatform {
            manager,
            adapter: tokio::sync::Mutex::new(None),
            peripherals: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    async fn adapter(&self) -> Result<Adapter, PlatformError> {
        let mut adapter = self.adapter.lock().await;

        if let Some(adapter) = adapter.as_ref() {
            return Ok(adapter.clone());
        }

        let first = self.manager.adapters().await?
            .into_iter()
            .next()
            .ok_or(PlatformError::NoAdapter)?;

        info!("Using adapter {}", first.adapter_info().await.unwrap_or("UNKNOWN".to_string()));
        *adapter = Some(first.clone());
        Ok(first)
    }

    async fn find_peripheral(&self, id: &str) -> Result<Peripheral, PlatformError> {
        let known = self.peripherals.lock().expect("Failed to lock peripherals").get(id).cloned();
        if let Some(peripheral) = known {
            return Ok(peripheral);
        }

        // The scan may have been stopped before the event for this peripheral was processed
        let adapter = self.adapter().await?;
        adapter.peripherals().await?
            .into_iter()
            .find(|peripheral| peripheral.id().to_string() == id)
            .ok_or_else(|| PlatformError::UnknownPeripheral { id: id.to_string() })
    }
}

async fn describe_peripheral(adapter: &Adapter, peripherals: &PeripheralMap, id: &PeripheralId) -> Option<Advertisement> {
    let peripheral = match adapter.peripheral(id).await {
        Ok(peripheral) => peripheral,
        Err(err) => {
            warn!("Could not look up peripheral {:?}: {:?}", id, err);
            return None;
        },
    };

    let properties: Option<PeripheralProperties> = match peripheral.properties().await {
        Ok(properties) => properties,
        Err(err) => {
            warn!("Could not query peripheral for properties: {:?}", err);
            return None;
        },
    };

    let advertisement = Advertisement {
        id: peripheral.id().to_string(),
        name: properties.and_then(|properties| properties.local_name),
    };

    peripherals.lock()
        .expect("Failed to lock peripherals")
        .insert(advertisement.id.clone(), peripheral);

    Some(advertisement)
}

#[async_trait]
impl BleCentral for BtlePlatform {
    type Link = Peripheral;

    async fn start_scan(&self) -> Result<ScanStream, PlatformError> {
        let adapter = self.adapter().await?;
        // subscribe before starting, so that no early advertisement is missed
        let events = adapter.events().await?;

        info!("Scanning for peripherals...");
        adapter.start_scan(ScanFilter::default()).await?;

        let peripherals = self.peripherals.clone();
        let stream = events.filter_map(move |event| {
            let adapter = adapter.clone();
            let peripherals = peripherals.clone();

            async move {
                match event {
                    CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => {
                        describe_peripheral(&adapter, &peripherals, &id).await.map(Ok)
                    },
                    _ => None,
                }
            }
        });

        Ok(stream.boxed())
    }

    async fn stop_scan(&self) -> Result<(), PlatformError> {
        let adapter = self.adapter().await?;
        info!("Stopping scan");
        adapter.stop_scan().await?;
        Ok(())
    }

    async fn connect(&self, id: &str) -> Result<Peripheral, PlatformError> {
        let peripheral = self.find_peripheral(id).await?;

        info!("Connecting to peripheral {}...", id);
        peripheral.connect().await?;
        Ok(peripheral)
    }

    async fn discover(&self, link: &Peripheral) -> Result<(), PlatformError> {
        info!("Connected; Discovering services...");
        link.discover_services().await?;
        Ok(())
    }

    async fn subscribe(&self, link: &Peripheral, service: Uuid, characteristic: Uuid) -> Result<NotificationStream, PlatformError> {
        let data_char = link.services()
            .into_iter()
            .filter(|candidate| candidate.uuid == service)
            .flat_map(|candidate| candidate.characteristics.into_iter())
            .find(|candidate| candidate.uuid == characteristic)
            .ok_or(PlatformError::MissingCharacteristic { service, characteristic })?;

        info!("Subscribing to characteristic {:?} {:?}", service, characteristic);
        let notifications = link.notifications().await?;
        link.subscribe(&data_char).await?;

        let stream = notifications.filter_map(move |notification| async move {
            if notification.uuid != characteristic {
                return None;
            }

            debug!("Notification of {} bytes", notification.value.len());
            Some(Ok(BASE64.encode(&notification.value)))
        });

        Ok(stream.boxed())
    }

    async fn disconnect(&self, link: &Peripheral) -> Result<(), PlatformError> {
        info!("Disconnecting from peripheral {}", link.id());
        link.disconnect().await?;
        Ok(())
    }
}

#[async_trait]
impl PermissionCapability for BtlePlatform {
    // Desktop platforms have no runtime permission dialog of their own; the OS decides when the
    // adapter is first accessed. Probing the adapter list surfaces that decision.
    async fn request(&self, capabilities: &[Capability]) -> HashMap<Capability, PermissionStatus> {
        let status = match self.manager.adapters().await {
            Ok(adapters) if adapters.is_empty() => PermissionStatus::Unavailable,
            Ok(_) => PermissionStatus::Granted,
            Err(btleplug::Error::PermissionDenied) => PermissionStatus::Denied,
            Err(err) => {
                warn!("Failed to query bluetooth adapters: {:?}", err);
                PermissionStatus::Unavailable
            },
        };

        capabilities.iter().map(|capability| (*capability, status)).collect()
    }
}
