use std::convert::Infallible;
use std::sync::Arc;
use futures::channel::mpsc::{channel, Receiver, Sender};
use futures::future::pending;
use futures::SinkExt;
use iced::subscription::{self, Subscription};
use log::{error, info};

use crate::config::types::DeviceConfig;
use crate::device::btle::BtlePlatform;
use crate::device::constants::{COMMAND_CHANNEL_SIZE, EVENT_CHANNEL_SIZE};
use crate::device::permission::PlatformVersion;
use crate::device::session::DeviceSession;
use crate::device::types::{DeviceCommand, DeviceEvent, DeviceNotice};
use crate::error::DeviceError;

/// A device session on the platform bluetooth stack, not yet running.
pub struct PlatformSession {
    session: DeviceSession<BtlePlatform, BtlePlatform>,
    receiver: Receiver<DeviceCommand>,
}

impl PlatformSession {
    /// Returns the session together with the sender of its commands.
    pub async fn open(config: DeviceConfig, events: Sender<DeviceEvent>) -> Result<(Sender<DeviceCommand>, Self), DeviceError> {
        let platform = BtlePlatform::new()
            .await
            .map_err(|source| DeviceError::Scan { source })?;
        let platform = Arc::new(platform);

        let (commands, receiver) = channel::<DeviceCommand>(COMMAND_CHANNEL_SIZE);
        let session = DeviceSession::new(
            platform.clone(),
            platform,
            PlatformVersion::current(),
            config,
            events,
        );

        Ok((commands, PlatformSession { session, receiver }))
    }

    /// Runs until every command sender is dropped.
    pub async fn run(self) {
        self.session.run(self.receiver).await
    }
}

async fn device_session(config: DeviceConfig, mut events: Sender<DeviceEvent>) -> Infallible {
    match PlatformSession::open(config, events.clone()).await {
        Ok((commands, session)) => {
            // the GUI holds the only command sender, dropping it ends the session
            if events.send(DeviceEvent::Ready(commands)).await.is_ok() {
                session.run().await;
            }
        },
        Err(err) => {
            error!("Failed to open bluetooth: {}", err);
            let _ = events.send(DeviceEvent::Notice(DeviceNotice::from(&err))).await;
        },
    }

    info!("Device subscription idle");
    // note: subscription::channel expects the future to never resolve (Infallible).
    // The session (and with it the scan and connection) is released when iced drops this future.
    pending().await
}

/// The device session of the request-reading screen. It lives as long as iced keeps this
/// subscription, which is as long as that screen is shown.
pub fn device_session_subscription(config: DeviceConfig) -> Subscription<DeviceEvent> {
    struct DeviceSessionSubscription;

    subscription::channel(
        std::any::TypeId::of::<DeviceSessionSubscription>(),
        EVENT_CHANNEL_SIZE,
        move |events| device_session(config, events),
    )
}
