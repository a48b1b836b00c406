use std::sync::Arc;
use log::{info, warn};
use tokio::runtime::Handle;

use crate::device::platform::BleCentral;
use crate::device::types::DiscoveredDevice;
use crate::error::DeviceError;

/// An established and discovered link to one device. Disconnects when closed or dropped.
pub struct ConnectionHandle<C: BleCentral> {
    central: Arc<C>,
    link: C::Link,
    device: DiscoveredDevice,
    closed: bool,
    runtime: Option<Handle>,
}

impl<C: BleCentral> ConnectionHandle<C> {
    pub fn device(&self) -> &DiscoveredDevice {
        &self.device
    }

    pub fn link(&self) -> &C::Link {
        &self.link
    }

    pub fn central(&self) -> &C {
        &self.central
    }

    pub async fn close(mut self) {
        self.closed = true;
        info!("Disconnecting from {}", self.device.id);

        if let Err(err) = self.central.disconnect(&self.link).await {
            warn!("Failed to disconnect from {}: {:?}", self.device.id, err);
        }
    }
}

impl<C: BleCentral> Drop for ConnectionHandle<C> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        let central = self.central.clone();
        let link = self.link.clone();
        let id = self.device.id.clone();

        match self.runtime.as_ref() {
            Some(runtime) => {
                info!("Connection to {} dropped; disconnecting", id);
                runtime.spawn(async move {
                    if let Err(err) = central.disconnect(&link).await {
                        warn!("Failed to disconnect from {}: {:?}", id, err);
                    }
                });
            },
            None => warn!("Connection to {} dropped outside of a runtime; link left open", id),
        }
    }
}

pub struct Connector<C: BleCentral> {
    central: Arc<C>,
}

impl<C: BleCentral> Connector<C> {
    pub fn new(central: Arc<C>) -> Self {
        Connector { central }
    }

    /// A single connection attempt followed by service discovery.
    ///
    /// The handle is only returned once discovery has completed.
    pub async fn connect(&self, device: &DiscoveredDevice) -> Result<ConnectionHandle<C>, DeviceError> {
        let connect_error = |source| DeviceError::Connect { id: device.id.clone(), source };

        let link = self.central.connect(&device.id).await.map_err(connect_error)?;

        if let Err(source) = self.central.discover(&link).await {
            warn!("Discovery on {} failed: {:?}", device.id, source);
            if let Err(err) = self.central.disconnect(&link).await {
                warn!("Failed to disconnect from {}: {:?}", device.id, err);
            }
            return Err(connect_error(source));
        }

        info!("Peripheral {} ready", device.id);
        Ok(ConnectionHandle {
            central: self.central.clone(),
            link,
            device: device.clone(),
            closed: false,
            runtime: Handle::try_current().ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::{settle, Call, FakeCentral};

    fn device(id: &str) -> DiscoveredDevice {
        DiscoveredDevice { id: id.to_string(), name: None }
    }

    #[tokio::test]
    async fn discovery_happens_before_the_handle_is_ready() {
        let central = FakeCentral::new();
        let connector = Connector::new(central.clone());

        let handle = connector.connect(&device("A")).await.unwrap();

        assert_eq!(handle.device().id, "A");
        assert_eq!(central.calls(), vec![Call::Connect("A".to_string()), Call::Discover("A".to_string())]);
        handle.close().await;
    }

    #[tokio::test]
    async fn failed_connect_skips_discovery() {
        let central = FakeCentral::new();
        central.make_unreachable("A");
        let connector = Connector::new(central.clone());

        let err = connector.connect(&device("A")).await.err().unwrap();

        assert!(matches!(err, DeviceError::Connect { ref id, .. } if id == "A"));
        assert_eq!(central.calls(), vec![Call::Connect("A".to_string())]);
    }

    #[tokio::test]
    async fn failed_discovery_releases_the_link() {
        let central = FakeCentral::new();
        central.fail_discovery();
        let connector = Connector::new(central.clone());

        assert!(connector.connect(&device("A")).await.is_err());
        assert_eq!(central.calls(), vec![
            Call::Connect("A".to_string()),
            Call::Discover("A".to_string()),
            Call::Disconnect("A".to_string()),
        ]);
    }

    #[tokio::test]
    async fn close_disconnects_once() {
        let central = FakeCentral::new();
        let connector = Connector::new(central.clone());

        let handle = connector.connect(&device("A")).await.unwrap();
        handle.close().await;
        settle().await;

        let disconnects = central.calls().into_iter().filter(|call| matches!(call, Call::Disconnect(_))).count();
        assert_eq!(disconnects, 1);
    }

    #[tokio::test]
    async fn dropping_the_handle_disconnects() {
        let central = FakeCentral::new();
        let connector = Connector::new(central.clone());

        let handle = connector.connect(&device("A")).await.unwrap();
        drop(handle);
        settle().await;

        assert_eq!(central.calls().last(), Some(&Call::Disconnect("A".to_string())));
    }
}
