//! The bluetooth capability the device flow is written against.
//!
//! Anything providing these operations can drive a [`crate::device::session::DeviceSession`]:
//! the btleplug backend in [`crate::device::btle`] and the in-memory fake used by the tests.

use std::collections::HashMap;
use async_trait::async_trait;
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::error::PlatformError;

/// One advertisement observed during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub id: String,
    pub name: Option<String>,
}

pub type ScanStream = BoxStream<'static, Result<Advertisement, PlatformError>>;

/// Characteristic values, base64 encoded.
pub type NotificationStream = BoxStream<'static, Result<String, PlatformError>>;

#[async_trait]
pub trait BleCentral: Send + Sync + 'static {
    /// An established link to a peripheral.
    type Link: Clone + Send + Sync + 'static;

    /// Start an unfiltered scan. Every advertisement seen from now on is yielded by the stream.
    async fn start_scan(&self) -> Result<ScanStream, PlatformError>;

    async fn stop_scan(&self) -> Result<(), PlatformError>;

    async fn connect(&self, id: &str) -> Result<Self::Link, PlatformError>;

    /// Discover the services and characteristics of a connected peripheral.
    async fn discover(&self, link: &Self::Link) -> Result<(), PlatformError>;

    async fn subscribe(
        &self,
        link: &Self::Link,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<NotificationStream, PlatformError>;

    async fn disconnect(&self, link: &Self::Link) -> Result<(), PlatformError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    BluetoothScan,
    BluetoothConnect,
    FineLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Unavailable,
}

#[async_trait]
pub trait PermissionCapability: Send + Sync + 'static {
    async fn request(&self, capabilities: &[Capability]) -> HashMap<Capability, PermissionStatus>;
}
