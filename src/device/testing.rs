//! In-memory doubles for the bluetooth and permission capabilities.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::StreamExt;
use uuid::Uuid;

use crate::device::platform::{
    Advertisement, BleCentral, Capability, NotificationStream, PermissionCapability, PermissionStatus, ScanStream,
};
use crate::error::PlatformError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    StartScan,
    StopScan,
    Connect(String),
    Discover(String),
    Subscribe(String, Uuid, Uuid),
    Disconnect(String),
}

#[derive(Default)]
struct FakeState {
    calls: Vec<Call>,
    scan_sender: Option<UnboundedSender<Result<Advertisement, PlatformError>>>,
    notification_sender: Option<UnboundedSender<Result<String, PlatformError>>>,
    refuse_scan: Option<PlatformError>,
    unreachable: HashSet<String>,
    fail_discovery: bool,
}

#[derive(Default)]
pub struct FakeCentral {
    state: Mutex<FakeState>,
}

impl FakeCentral {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeCentral::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn advertise(&self, id: &str, name: Option<&str>) {
        let state = self.state.lock().unwrap();
        let sender = state.scan_sender.as_ref().expect("advertise() without an active scan");
        sender.unbounded_send(Ok(Advertisement { id: id.to_string(), name: name.map(str::to_string) })).unwrap();
    }

    pub fn fail_scan(&self, message: &str) {
        let state = self.state.lock().unwrap();
        let sender = state.scan_sender.as_ref().expect("fail_scan() without an active scan");
        sender.unbounded_send(Err(PlatformError::Other(message.to_string()))).unwrap();
    }

    pub fn end_scan(&self) {
        self.state.lock().unwrap().scan_sender = None;
    }

    pub fn refuse_scan(&self, error: PlatformError) {
        self.state.lock().unwrap().refuse_scan = Some(error);
    }

    pub fn notify(&self, encoded: &str) {
        let state = self.state.lock().unwrap();
        let sender = state.notification_sender.as_ref().expect("notify() without a subscription");
        sender.unbounded_send(Ok(encoded.to_string())).unwrap();
    }

    pub fn end_notifications(&self) {
        self.state.lock().unwrap().notification_sender = None;
    }

    pub fn make_unreachable(&self, id: &str) {
        self.state.lock().unwrap().unreachable.insert(id.to_string());
    }

    pub fn fail_discovery(&self) {
        self.state.lock().unwrap().fail_discovery = true;
    }
}

#[async_trait]
impl BleCentral for FakeCentral {
    type Link = String;

    async fn start_scan(&self) -> Result<ScanStream, PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::StartScan);

        if let Some(error) = state.refuse_scan.take() {
            return Err(error);
        }

        let (sender, receiver) = unbounded();
        state.scan_sender = Some(sender);
        Ok(receiver.boxed())
    }

    async fn stop_scan(&self) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::StopScan);
        state.scan_sender = None;
        Ok(())
    }

    async fn connect(&self, id: &str) -> Result<String, PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Connect(id.to_string()));

        if state.unreachable.contains(id) {
            return Err(PlatformError::Other(format!("{} is out of range", id)));
        }
        Ok(id.to_string())
    }

    async fn discover(&self, link: &String) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Discover(link.clone()));

        if state.fail_discovery {
            return Err(PlatformError::Other("discovery failed".to_string()));
        }
        Ok(())
    }

    async fn subscribe(&self, link: &String, service: Uuid, characteristic: Uuid) -> Result<NotificationStream, PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Subscribe(link.clone(), service, characteristic));

        let (sender, receiver) = unbounded();
        state.notification_sender = Some(sender);
        Ok(receiver.boxed())
    }

    async fn disconnect(&self, link: &String) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Disconnect(link.clone()));
        state.notification_sender = None;
        Ok(())
    }
}

pub struct FakePermissions {
    denied: HashSet<Capability>,
    requests: Mutex<Vec<Vec<Capability>>>,
}

impl FakePermissions {
    pub fn granting() -> Arc<Self> {
        FakePermissions::denying(&[])
    }

    pub fn denying(denied: &[Capability]) -> Arc<Self> {
        Arc::new(FakePermissions {
            denied: denied.iter().copied().collect(),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<Vec<Capability>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PermissionCapability for FakePermissions {
    async fn request(&self, capabilities: &[Capability]) -> HashMap<Capability, PermissionStatus> {
        self.requests.lock().unwrap().push(capabilities.to_vec());

        capabilities
            .iter()
            .map(|capability| {
                let status = if self.denied.contains(capability) { PermissionStatus::Denied } else { PermissionStatus::Granted };
                (*capability, status)
            })
            .collect()
    }
}

/// Wait for tasks spawned on the current-thread test runtime to make progress.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
