use crate::config::types::Config;
use crate::device::types::{DeviceCommand, DeviceEvent};
use crate::gui::route::Route;

#[derive(Debug, Clone)]
pub enum Message {
    SplashElapsed,
    Navigate(Route),
    Back,
    NoticeConfirmed,
    ConfigLoadComplete((Config, Option<String>)),
    DeviceEvent(DeviceEvent),
    DeviceCommand(DeviceCommand),
    CommandSent(()),
    SimulateReading,
}
