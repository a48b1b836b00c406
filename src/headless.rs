use std::time::Duration;
use clap::Subcommand;
use futures::channel::mpsc::{channel, Receiver, Sender};
use futures::{SinkExt, StreamExt};
use log::{info, warn};
use tokio::time::{sleep_until, Instant};

use crate::config::io::ConfigIO;
use crate::device::connection::PlatformSession;
use crate::device::constants::EVENT_CHANNEL_SIZE;
use crate::device::types::{DeviceCommand, DeviceEvent, DeviceState, DiscoveredDevice};
use crate::error::{AppRunError, DeviceError, DeviceErrorKind};

#[derive(Debug, Subcommand)]
pub enum HeadlessCommand {
    /// Scan for advertising devices and list them
    Scan {
        /// Stop after this many seconds
        #[arg(long, default_value_t = 10)]
        seconds: u64,
    },
    /// Connect to a device and print every payload it sends
    Monitor {
        /// Identifier of the device, as printed by `scan`
        id: String,

        /// Stop after this many seconds instead of running until interrupted
        #[arg(long)]
        seconds: Option<u64>,
    },
}

/// Run a headless command on its own runtime, without the GUI.
pub fn run_headless(config_io: ConfigIO, command: HeadlessCommand) -> Result<(), AppRunError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(headless(config_io, command))
}

async fn headless(config_io: ConfigIO, command: HeadlessCommand) -> Result<(), AppRunError> {
    let config = config_io.read().await?;
    let (event_sender, events) = channel::<DeviceEvent>(EVENT_CHANNEL_SIZE);
    let (commands, session) = PlatformSession::open(config.device, event_sender).await?;
    let session = tokio::spawn(session.run());

    let result = match command {
        HeadlessCommand::Scan { seconds } => scan(commands, events, Duration::from_secs(seconds)).await,
        HeadlessCommand::Monitor { id, seconds } => monitor(commands, events, id, seconds.map(Duration::from_secs)).await,
    };

    // the command sender is gone at this point, so the session tears down and ends
    if let Err(err) = session.await {
        warn!("Device session task failed: {:?}", err);
    }
    result
}

// Resolves when the deadline passes or the user interrupts, whichever comes first.
async fn stopped(deadline: Option<Instant>) {
    let interrupted = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {:?}", err);
            futures::future::pending::<()>().await;
        }
    };

    match deadline {
        Some(deadline) => tokio::select! {
            _ = sleep_until(deadline) => {},
            _ = interrupted => info!("Interrupted"),
        },
        None => {
            interrupted.await;
            info!("Interrupted");
        },
    }
}

async fn send_command(commands: &mut Sender<DeviceCommand>, command: DeviceCommand) {
    if let Err(err) = commands.send(command).await {
        warn!("Failed to send device command: {:?}", err);
    }
}

fn print_devices(devices: &[DiscoveredDevice]) {
    println!("{} device(s):", devices.len());
    for device in devices {
        println!("  {}  {}", device.id, device.display_name());
    }
}

async fn scan(mut commands: Sender<DeviceCommand>, mut events: Receiver<DeviceEvent>, duration: Duration) -> Result<(), AppRunError> {
    send_command(&mut commands, DeviceCommand::StartScan).await;

    let stop = stopped(Some(Instant::now() + duration));
    tokio::pin!(stop);
    let mut devices = Vec::new();

    loop {
        tokio::select! {
            _ = &mut stop => break,
            event = events.next() => match event {
                Some(DeviceEvent::Devices(list)) => devices = list,
                Some(DeviceEvent::Notice(notice)) => {
                    eprintln!("{}", notice.message);
                    break;
                },
                Some(_) => {},
                None => break,
            },
        }
    }

    print_devices(&devices);
    Ok(())
}

async fn monitor(
    mut commands: Sender<DeviceCommand>,
    mut events: Receiver<DeviceEvent>,
    id: String,
    duration: Option<Duration>,
) -> Result<(), AppRunError> {
    send_command(&mut commands, DeviceCommand::StartScan).await;
    println!("Waiting for {} to advertise…", id);

    let stop = stopped(duration.map(|duration| Instant::now() + duration));
    tokio::pin!(stop);
    let mut requested = false;

    loop {
        tokio::select! {
            _ = &mut stop => break,
            event = events.next() => match event {
                Some(DeviceEvent::Devices(devices)) => {
                    if !requested && devices.iter().any(|device| device.id == id) {
                        requested = true;
                        send_command(&mut commands, DeviceCommand::Connect(id.clone())).await;
                    }
                },
                Some(DeviceEvent::StateChange(DeviceState::Connected(device))) => {
                    println!("Connected to {} ({})", device.display_name(), device.id);
                },
                Some(DeviceEvent::Payload(payload)) => println!("{}", payload.text),
                Some(DeviceEvent::MalformedPayload(message)) => eprintln!("{}", message),
                Some(DeviceEvent::Notice(notice)) => {
                    eprintln!("{}", notice.message);
                    if notice.kind == DeviceErrorKind::PermissionDenied {
                        return Err(DeviceError::PermissionDenied.into());
                    }
                    break;
                },
                Some(_) => {},
                None => break,
            },
        }
    }

    Ok(())
}
