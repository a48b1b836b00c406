use futures::channel::mpsc::Sender;

use crate::error::{DeviceError, DeviceErrorKind};

/// A device seen advertising during the current scan session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub id: String,
    pub name: Option<String>,
}

impl DiscoveredDevice {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed device")
    }
}

/// A decoded notification value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub bytes: Vec<u8>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceState {
    Idle,
    Scanning,
    Connecting(DiscoveredDevice),
    Connected(DiscoveredDevice),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceNotice {
    pub kind: DeviceErrorKind,
    pub message: String,
}

impl From<&DeviceError> for DeviceNotice {
    fn from(error: &DeviceError) -> Self {
        DeviceNotice {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    StartScan,
    StopScan,
    Connect(String),
    Disconnect,
}

#[derive(Debug, Clone)]
pub enum DeviceEvent {
    // The session is running and accepts commands on this sender
    Ready(Sender<DeviceCommand>),
    StateChange(DeviceState),
    Devices(Vec<DiscoveredDevice>),
    Payload(Payload),
    MalformedPayload(String),
    Notice(DeviceNotice),
}
