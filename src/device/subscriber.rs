use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures::StreamExt;
use log::{debug, info};
use uuid::Uuid;

use crate::device::connector::ConnectionHandle;
use crate::device::platform::{BleCentral, NotificationStream};
use crate::device::types::Payload;
use crate::error::{DeviceError, PayloadError, PlatformError};

/// Decode one notification value. No framing is applied; the payload is expected to be text.
pub fn decode_payload(encoded: &str) -> Result<Payload, PayloadError> {
    let bytes = BASE64.decode(encoded.trim())?;
    let text = String::from_utf8(bytes.clone())?;

    Ok(Payload { bytes, text })
}

pub struct NotificationSubscription {
    stream: NotificationStream,
}

impl NotificationSubscription {
    /// The next notification, decoded. `None` once the platform closed the stream.
    pub async fn next(&mut self) -> Option<Result<Payload, DeviceError>> {
        let item = self.stream.next().await?;

        Some(match item {
            Ok(encoded) => {
                debug!("Notification {}", encoded);
                decode_payload(&encoded).map_err(DeviceError::from)
            },
            Err(source) => Err(DeviceError::Notification { source }),
        })
    }

    pub fn closed_error() -> DeviceError {
        DeviceError::Notification { source: PlatformError::StreamEnded }
    }
}

pub async fn subscribe<C: BleCentral>(
    handle: &ConnectionHandle<C>,
    service: Uuid,
    characteristic: Uuid,
) -> Result<NotificationSubscription, DeviceError> {
    let stream = handle.central()
        .subscribe(handle.link(), service, characteristic)
        .await
        .map_err(|source| DeviceError::Notification { source })?;

    info!("Subscribed to notifications of {}", handle.device().id);
    Ok(NotificationSubscription { stream })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::connector::Connector;
    use crate::device::constants::{SPECTROMETER_DATA_CHARACTERISTIC, SPECTROMETER_SERVICE};
    use crate::device::testing::{Call, FakeCentral};
    use crate::device::types::DiscoveredDevice;

    #[test]
    fn decodes_text_payloads() {
        let payload = decode_payload("NDU2Ljcgbm0=").unwrap();

        assert_eq!(payload.text, "456.7 nm");
        assert_eq!(payload.bytes, b"456.7 nm".to_vec());
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(matches!(decode_payload("not base64!"), Err(PayloadError::InvalidBase64 { .. })));
    }

    #[test]
    fn rejects_binary_payloads() {
        // 0xff 0xfe is not utf-8
        assert!(matches!(decode_payload("//4="), Err(PayloadError::InvalidText { .. })));
    }

    #[tokio::test]
    async fn delivers_decoded_notifications() {
        let central = FakeCentral::new();
        let device = DiscoveredDevice { id: "A".to_string(), name: None };
        let handle = Connector::new(central.clone()).connect(&device).await.unwrap();

        let mut subscription = subscribe(&handle, SPECTROMETER_SERVICE, SPECTROMETER_DATA_CHARACTERISTIC)
            .await
            .unwrap();
        assert!(central.calls().contains(&Call::Subscribe(
            "A".to_string(),
            SPECTROMETER_SERVICE,
            SPECTROMETER_DATA_CHARACTERISTIC,
        )));

        central.notify("b2s=");
        central.notify("%%%");
        central.end_notifications();

        assert_eq!(subscription.next().await.unwrap().unwrap().text, "ok");
        assert!(matches!(subscription.next().await, Some(Err(DeviceError::MalformedPayload { .. }))));
        assert!(subscription.next().await.is_none());

        handle.close().await;
    }
}
