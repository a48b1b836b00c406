use std::sync::Arc;
use futures::channel::mpsc::{Receiver, Sender};
use futures::future::pending;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};

use crate::config::types::DeviceConfig;
use crate::device::connector::{ConnectionHandle, Connector};
use crate::device::permission::{PermissionGate, PlatformVersion};
use crate::device::platform::{BleCentral, PermissionCapability};
use crate::device::scanner::{DeviceScanner, ScanUpdate};
use crate::device::subscriber::{subscribe, NotificationSubscription};
use crate::device::types::{DeviceCommand, DeviceEvent, DeviceNotice, DeviceState, Payload};
use crate::error::DeviceError;

/// The device flow of one screen: permissions, scanning, one connection and its notifications.
///
/// Everything the session acquires is released by [`DeviceSession::teardown`], which
/// [`DeviceSession::run`] calls once the command channel closes. Should the session be dropped
/// instead, the scanner and connection release themselves.
pub struct DeviceSession<C: BleCentral, P: PermissionCapability> {
    config: DeviceConfig,
    gate: PermissionGate<P>,
    scanner: DeviceScanner<C>,
    connector: Connector<C>,
    connection: Option<ConnectionHandle<C>>,
    subscription: Option<NotificationSubscription>,
    state: DeviceState,
    events: Sender<DeviceEvent>,
}

async fn next_notification(subscription: &mut Option<NotificationSubscription>) -> Option<Result<Payload, DeviceError>> {
    match subscription.as_mut() {
        Some(subscription) => subscription.next().await,
        None => pending().await,
    }
}

impl<C: BleCentral, P: PermissionCapability> DeviceSession<C, P> {
    pub fn new(
        central: Arc<C>,
        permissions: Arc<P>,
        version: PlatformVersion,
        config: DeviceConfig,
        events: Sender<DeviceEvent>,
    ) -> Self {
        DeviceSession {
            config,
            gate: PermissionGate::new(permissions, version),
            scanner: DeviceScanner::new(central.clone()),
            connector: Connector::new(central),
            connection: None,
            subscription: None,
            state: DeviceState::Idle,
            events,
        }
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub async fn run(mut self, mut commands: Receiver<DeviceCommand>) {
        info!("Device session started");

        loop {
            tokio::select! {
                command = commands.next() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                update = self.scanner.next_advertisement() => self.on_advertisement(update).await,
                notification = next_notification(&mut self.subscription) => self.on_notification(notification).await,
            }
        }

        self.teardown().await;
        info!("Device session ended");
    }

    pub async fn handle_command(&mut self, command: DeviceCommand) {
        debug!("Device command {:?}", command);

        match command {
            DeviceCommand::StartScan => self.start_scan().await,
            DeviceCommand::StopScan => {
                if let Err(err) = self.scanner.stop_scan().await {
                    self.notice(&err).await;
                }
                if self.state == DeviceState::Scanning {
                    self.set_state(DeviceState::Idle).await;
                }
            },
            DeviceCommand::Connect(id) => self.connect(&id).await,
            DeviceCommand::Disconnect => {
                self.disconnect().await;
                self.set_state(DeviceState::Idle).await;
            },
        }
    }

    /// Stop scanning and release the connection.
    pub async fn teardown(&mut self) {
        if let Err(err) = self.scanner.stop_scan().await {
            warn!("Failed to stop scan during teardown: {:?}", err);
        }
        self.disconnect().await;
        self.state = DeviceState::Idle;
    }

    async fn start_scan(&mut self) {
        if self.scanner.is_scanning() {
            return;
        }
        // a single link at a time; the user disconnects before looking for another device
        if let Some(handle) = self.connection.as_ref() {
            warn!("Not scanning while connected to {}", handle.device().id);
            return;
        }

        if !self.gate.request().await {
            self.notice(&DeviceError::PermissionDenied).await;
            return;
        }

        match self.scanner.start_scan().await {
            Ok(()) => {
                self.emit(DeviceEvent::Devices(Vec::new())).await;
                self.set_state(DeviceState::Scanning).await;
            },
            Err(err) => self.notice(&err).await,
        }
    }

    async fn connect(&mut self, id: &str) {
        let device = match self.scanner.device(id) {
            Some(device) => device.clone(),
            None => {
                warn!("Refusing to connect to {}: not discovered in this session", id);
                return;
            },
        };

        self.disconnect().await;
        if let Err(err) = self.scanner.stop_scan().await {
            warn!("Failed to stop scan before connecting: {:?}", err);
        }

        self.set_state(DeviceState::Connecting(device.clone())).await;

        let handle = match self.connector.connect(&device).await {
            Ok(handle) => handle,
            Err(err) => {
                self.notice(&err).await;
                self.set_state(DeviceState::Idle).await;
                return;
            },
        };

        match subscribe(&handle, self.config.service_uuid, self.config.characteristic_uuid).await {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                self.connection = Some(handle);
                self.set_state(DeviceState::Connected(device)).await;
            },
            Err(err) => {
                handle.close().await;
                self.notice(&err).await;
                self.set_state(DeviceState::Idle).await;
            },
        }
    }

    async fn disconnect(&mut self) {
        self.subscription = None;
        if let Some(handle) = self.connection.take() {
            handle.close().await;
        }
    }

    async fn on_advertisement(&mut self, update: Result<ScanUpdate, DeviceError>) {
        match update {
            Ok(ScanUpdate::Unchanged) => {},
            Ok(_) => {
                let devices = self.scanner.devices();
                self.emit(DeviceEvent::Devices(devices)).await;
            },
            Err(err) => {
                self.notice(&err).await;
                if self.state == DeviceState::Scanning {
                    self.set_state(DeviceState::Idle).await;
                }
            },
        }
    }

    async fn on_notification(&mut self, notification: Option<Result<Payload, DeviceError>>) {
        match notification {
            Some(Ok(payload)) => {
                info!("Payload: {}", payload.text);
                self.emit(DeviceEvent::Payload(payload)).await;
            },
            Some(Err(err @ DeviceError::MalformedPayload { .. })) => {
                warn!("{}", err);
                self.emit(DeviceEvent::MalformedPayload(err.to_string())).await;
            },
            Some(Err(err)) => {
                self.disconnect().await;
                self.notice(&err).await;
                self.set_state(DeviceState::Idle).await;
            },
            None => {
                warn!("Notification stream closed; connection lost");
                self.disconnect().await;
                self.notice(&NotificationSubscription::closed_error()).await;
                self.set_state(DeviceState::Idle).await;
            },
        }
    }

    async fn set_state(&mut self, state: DeviceState) {
        if self.state != state {
            self.state = state.clone();
            self.emit(DeviceEvent::StateChange(state)).await;
        }
    }

    async fn notice(&mut self, error: &DeviceError) {
        warn!("{}", error);
        self.emit(DeviceEvent::Notice(DeviceNotice::from(error))).await;
    }

    async fn emit(&mut self, event: DeviceEvent) {
        if let Err(err) = self.events.send(event).await {
            debug!("Device event dropped: {:?}", err);
        }
    }
}
