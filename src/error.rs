use std::io;
use std::fmt::{Debug, Display};
use std::str::Utf8Error;
use std::string::FromUtf8Error;
use thiserror::Error;
use msgbox::IconType;
use uuid::Uuid;
use btleplug;
use iced;
use serde_json;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine path to config file")]
    NoConfigPath,

    #[error("Failed to acquire file lock on config file: {source}")]
    CanNotLock { source: io::Error },

    #[error("Failed to encode/decode config as utf-8: {source}")]
    Utf8Error { #[from] source: Utf8Error },

    #[error("Failed to read/write config file: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse/build config file: {source}")]
    JsonError { #[from] source: serde_json::Error },
}

#[derive(Error, Debug)]
pub enum AppRunError {
    #[error("Failed to start application (iced): {source}")]
    Iced { #[from] source: iced::Error },

    #[error("Failed to start application (config): {source}")]
    ConfigError { #[from] source: ConfigError },

    #[error("Failed to start async runtime: {source}")]
    Runtime { #[from] source: io::Error },

    #[error("Device session failed: {source}")]
    Device { #[from] source: DeviceError },
}

/// Failures reported by the platform bluetooth layer, before they are classified.
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Error communicating with device (btleplug): {source}")]
    Btle { #[from] source: btleplug::Error },

    #[error("No bluetooth adapter is available")]
    NoAdapter,

    #[error("Peripheral {id} has not been discovered")]
    UnknownPeripheral { id: String },

    #[error("Characteristic {characteristic} of service {service} is not available")]
    MissingCharacteristic { service: Uuid, characteristic: Uuid },

    #[error("The platform closed the stream")]
    StreamEnded,

    #[error("{0}")]
    Other(String),
}

impl PlatformError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, PlatformError::Btle { source: btleplug::Error::PermissionDenied })
    }
}

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Payload is not valid base64: {source}")]
    InvalidBase64 { #[from] source: base64::DecodeError },

    #[error("Payload is not valid utf-8 text: {source}")]
    InvalidText { #[from] source: FromUtf8Error },
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Not allowed to access Bluetooth")]
    PermissionDenied,

    #[error("Scanning for devices failed: {source}")]
    Scan { source: PlatformError },

    #[error("Connecting to {id} failed: {source}")]
    Connect { id: String, source: PlatformError },

    #[error("Receiving notifications failed: {source}")]
    Notification { source: PlatformError },

    #[error("Received a malformed payload: {source}")]
    MalformedPayload { #[from] source: PayloadError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceErrorKind {
    PermissionDenied,
    Scan,
    Connect,
    Notification,
    MalformedPayload,
}

impl DeviceError {
    pub fn kind(&self) -> DeviceErrorKind {
        match self {
            DeviceError::PermissionDenied => DeviceErrorKind::PermissionDenied,
            DeviceError::Scan { .. } => DeviceErrorKind::Scan,
            DeviceError::Connect { .. } => DeviceErrorKind::Connect,
            DeviceError::Notification { .. } => DeviceErrorKind::Notification,
            DeviceError::MalformedPayload { .. } => DeviceErrorKind::MalformedPayload,
        }
    }
}

pub fn error_msgbox<T: Display>(message: &'static str, error: &T) {
    let message = format!("{}: {}", message, error);
    eprintln!("{}", &message);
    if let Err(err) = msgbox::create(concat!("TanoSpectra ", env!("CARGO_PKG_VERSION")), &message, IconType::Error) {
        eprintln!("Failed to create msgbox: {:?}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn btleplug_permission_denied_is_recognized() {
        let err = PlatformError::from(btleplug::Error::PermissionDenied);
        assert!(err.is_permission_denied());
        assert!(!PlatformError::NoAdapter.is_permission_denied());
    }

    #[test]
    fn device_error_kinds() {
        assert_eq!(DeviceError::PermissionDenied.kind(), DeviceErrorKind::PermissionDenied);

        let err = DeviceError::Connect { id: "AA:BB".to_string(), source: PlatformError::NoAdapter };
        assert_eq!(err.kind(), DeviceErrorKind::Connect);
        assert_eq!(err.to_string(), "Connecting to AA:BB failed: No bluetooth adapter is available");
    }
}
