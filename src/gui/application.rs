use futures::SinkExt;
use futures::channel::mpsc::Sender;
use iced::{executor, Alignment, Application, Command, Element, Length, Settings, Size, Subscription};
use iced::theme::{self, Theme};
use iced::widget::{
    Column, Row, Space, button, column, container, horizontal_rule, row, scrollable, text,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use log::{error, info, warn};

use crate::config::io::ConfigIO;
use crate::config::types::Config;
use crate::device::connection::device_session_subscription;
use crate::device::types::{DeviceCommand, DeviceEvent, DeviceState, DiscoveredDevice};
use crate::error::AppRunError;
use crate::gui::route::{Navigator, Route};
use crate::gui::style::{
    BrandButtonStyleSheet, CardStyleSheet, LightStyleSheet, NavbarStyleSheet, ScreenStyleSheet, TextButtonStyleSheet, BRAND, MUTED,
};
use crate::gui::types::Message;
use crate::reading::level::DETECTION_LEVELS;
use crate::reading::presenter::DetectionPresenter;

const TEAM: [(&str, &str); 5] = [
    ("Andrés Rodas", "3D design and technical documentation"),
    ("Juan Diego López", "3D design and app development"),
    ("Darío Huerta", "Hardware and electronics assembly"),
    ("Harriet Mamani", "Chemistry and pesticide research"),
    ("Jheyson Castañeda", "Technical support and field testing"),
];

pub struct ApplicationFlags {
    config_io: ConfigIO,
}

pub struct SpectraApplication {
    // messages that the user must click away
    notices: Vec<String>,

    config_io: ConfigIO,
    config: Config,

    navigator: Navigator,

    // only set while the request-reading screen (and thus its device session) is shown
    device_commands: Option<Sender<DeviceCommand>>,
    device_state: DeviceState,
    devices: Vec<DiscoveredDevice>,
    latest_payload: Option<String>,
    malformed_payload: Option<String>,

    // set while the status screen is in the history
    presenter: Option<DetectionPresenter<StdRng>>,
}

impl SpectraApplication {
    fn load_config(&self) -> Command<Message> {
        let config_io = self.config_io.clone();

        let fut = async move {
            match config_io.read().await {
                Ok(config) => (config, None),
                Err(err) => {
                    error!("Failed to load config: {:?}", &err);
                    (Config::default(), Some(format!("Failed to load config: {}", &err)))
                },
            }
        };

        Command::perform(fut, Message::ConfigLoadComplete)
    }

    fn send_device_command(&self, command: DeviceCommand) -> Command<Message> {
        let Some(mut sender) = self.device_commands.clone() else {
            warn!("No device session to send {:?} to", command);
            return Command::none();
        };

        let fut = async move {
            if let Err(err) = sender.send(command).await {
                warn!("Failed to send device command: {:?}", err);
            }
        };

        Command::perform(fut, Message::CommandSent)
    }

    fn navigate(&mut self, navigate: impl FnOnce(&mut Navigator)) {
        let previous = self.navigator.current();
        navigate(&mut self.navigator);
        let current = self.navigator.current();

        if previous == current {
            return;
        }
        info!("Navigating from {:?} to {:?}", previous, current);

        if previous == Route::RequestReading {
            // the subscription goes away with the screen, which releases the scan and connection
            self.device_commands = None;
            self.device_state = DeviceState::Idle;
            self.devices.clear();
            self.latest_payload = None;
            self.malformed_payload = None;
        }

        if !self.navigator.contains(Route::Status) {
            self.presenter = None;
        }
    }

    // Arriving at the status screen from request-reading takes a new reading. Coming back to it
    // from a screen pushed on top keeps the level it showed.
    fn enter_status(&mut self) {
        self.presenter = Some(DetectionPresenter::new(StdRng::from_entropy()));
    }

    fn navbar(&self) -> Element<Message> {
        let mut back = button(text("‹").size(22)).style(theme::Button::Custom(Box::new(TextButtonStyleSheet)));
        if self.navigator.can_go_back() {
            back = back.on_press(Message::Back);
        }

        container(
            row![
                back,
                button(text("TanoSpectra").size(22))
                    .style(theme::Button::Custom(Box::new(TextButtonStyleSheet)))
                    .on_press(Message::Navigate(Route::Home)),
                Space::with_width(Length::Fill),
                button(text("About us").size(14).style(theme::Text::Color(BRAND)))
                    .style(theme::Button::Secondary)
                    .on_press(Message::Navigate(Route::About)),
            ].align_items(Alignment::Center).spacing(8),
        )
        .width(Length::Fill)
        .padding(15)
        .style(theme::Container::Custom(Box::new(NavbarStyleSheet)))
        .into()
    }

    fn card<'a>(&self, content: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
        container(content)
            .width(Length::Fill)
            .padding(30)
            .center_x()
            .style(theme::Container::Custom(Box::new(CardStyleSheet)))
            .into()
    }

    fn splash_view(&self) -> Element<Message> {
        container(
            column![
                text("TanoSpectra").size(40),
                text("Universidad Peruana Cayetano Heredia").size(16),
            ].align_items(Alignment::Center).spacing(10),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x()
        .center_y()
        .style(theme::Container::Custom(Box::new(NavbarStyleSheet)))
        .into()
    }

    fn home_view(&self) -> Element<Message> {
        let card = self.card(
            column![
                text("TanoSpectra").size(28).style(theme::Text::Color(BRAND)),
                text("Universidad Peruana Cayetano Heredia").size(16).style(theme::Text::Color(BRAND)),
                button(text("Enter"))
                    .padding([10, 30])
                    .style(theme::Button::Custom(Box::new(BrandButtonStyleSheet)))
                    .on_press(Message::Navigate(Route::RequestReading)),
            ].align_items(Alignment::Center).spacing(30),
        );

        container(card)
            .width(Length::Fill)
            .height(Length::Fill)
            .padding(20)
            .center_x()
            .center_y()
            .into()
    }

    fn device_panel(&self) -> Element<Message> {
        let ready = self.device_commands.is_some();
        let linked = matches!(self.device_state, DeviceState::Connecting(_) | DeviceState::Connected(_));

        let status = match &self.device_state {
            DeviceState::Idle if ready => "Not connected".to_string(),
            DeviceState::Idle => "Opening bluetooth…".to_string(),
            DeviceState::Scanning => "Scanning…".to_string(),
            DeviceState::Connecting(device) => format!("Connecting to {}…", device.display_name()),
            DeviceState::Connected(device) => format!("Connected to {}", device.display_name()),
        };

        let scan_button = match self.device_state {
            DeviceState::Scanning => button(text("Stop scan"))
                .style(theme::Button::Secondary)
                .on_press(Message::DeviceCommand(DeviceCommand::StopScan)),
            _ => {
                let scan = button(text("Scan for devices")).style(theme::Button::Custom(Box::new(BrandButtonStyleSheet)));
                if ready && !linked { scan.on_press(Message::DeviceCommand(DeviceCommand::StartScan)) } else { scan }
            },
        };

        let mut controls = row![scan_button].spacing(10);
        if let DeviceState::Connected(_) = self.device_state {
            controls = controls.push(
                button(text("Disconnect"))
                    .style(theme::Button::Destructive)
                    .on_press(Message::DeviceCommand(DeviceCommand::Disconnect)),
            );
        }

        let device_row = |device: &DiscoveredDevice| -> Element<Message> {
            let mut connect = button(text("Connect").size(14)).style(theme::Button::Secondary);
            if !matches!(self.device_state, DeviceState::Connecting(_)) {
                connect = connect.on_press(Message::DeviceCommand(DeviceCommand::Connect(device.id.clone())));
            }

            row![
                column![
                    text(device.display_name()),
                    text(&device.id).size(12).style(theme::Text::Color(MUTED)),
                ].width(Length::Fill),
                connect,
            ]
            .align_items(Alignment::Center)
            .spacing(10)
            .into()
        };

        let devices = Column::with_children(self.devices.iter().map(device_row)).spacing(8);

        let payload = match &self.latest_payload {
            None => text("No data received yet").size(14).style(theme::Text::Color(MUTED)),
            Some(payload) => text(format!("Last reading: {}", payload)).size(14),
        };

        let mut panel = column![
            text(status),
            controls,
            scrollable(devices).height(Length::Fixed(160.0)),
            payload,
        ]
        .spacing(12)
        .width(Length::Fill);

        if let Some(malformed) = &self.malformed_payload {
            panel = panel.push(text(malformed).size(12).style(theme::Text::Color(BRAND)));
        }

        panel.into()
    }

    fn request_reading_view(&self) -> Element<Message> {
        let card = self.card(
            column![
                text("Start spectral analysis").size(20).style(theme::Text::Color(BRAND)),
                text("Prepare the sample and start the reading.").size(14).style(theme::Text::Color(MUTED)),
                text("Place the sample in the spectrometer and press the button to request a new reading.").size(14),
                horizontal_rule(10),
                self.device_panel(),
                horizontal_rule(10),
                button(text("Request reading").size(16))
                    .padding([12, 20])
                    .style(theme::Button::Custom(Box::new(BrandButtonStyleSheet)))
                    .on_press(Message::Navigate(Route::Status)),
            ].align_items(Alignment::Center).spacing(15),
        );

        column![self.navbar(), container(card).padding(20)].into()
    }

    fn status_view(&self) -> Element<Message> {
        let Some(presenter) = self.presenter.as_ref() else {
            return self.navbar();
        };
        let current = presenter.current();

        let lights = DETECTION_LEVELS.iter().map(|level| {
            let lit = *level == current;
            let size = if lit { 48.0 } else { 40.0 };

            container(Space::new(Length::Fixed(size), Length::Fixed(size)))
                .style(theme::Container::Custom(Box::new(LightStyleSheet { color: level.color().color(), lit })))
                .into()
        });

        let details = Column::with_children(
            current.details().iter().map(|line| text(format!("• {}", line)).size(14).into())
        ).spacing(4);

        let card = self.card(
            column![
                text("Detected level").size(24).style(theme::Text::Color(BRAND)),
                Row::with_children(lights).spacing(16).align_items(Alignment::Center),
                text(current.label()).size(28).style(theme::Text::Color(current.color().color())),
                text(current.illustration()).size(12).style(theme::Text::Color(MUTED)),
                text(current.message()).size(16),
                details,
                button(text("Simulate new reading").size(16))
                    .padding([10, 20])
                    .style(theme::Button::Custom(Box::new(BrandButtonStyleSheet)))
                    .on_press(Message::SimulateReading),
            ].align_items(Alignment::Center).spacing(15),
        );

        column![self.navbar(), container(card).padding(20)].into()
    }

    fn about_view(&self) -> Element<Message> {
        let section = |title: &'static str, body: &'static str| -> Element<Message> {
            column![
                text(title).size(20).style(theme::Text::Color(BRAND)),
                text(body).size(14),
            ].spacing(8).into()
        };

        let team = Column::with_children(TEAM.iter().map(|(name, role)| {
            column![
                text(*name).size(15),
                text(*role).size(13).style(theme::Text::Color(MUTED)),
            ].into()
        })).spacing(8);

        let content = column![
            text("About TanoSpectra").size(26).style(theme::Text::Color(BRAND)),
            text("Innovating spectral analysis for a healthier future.").size(14).style(theme::Text::Color(MUTED)),
            section(
                "Our mission",
                "TanoSpectra provides fast and accessible detection of organophosphates through the \
analysis of spectral data, so that communities and industries can keep their food and environment safe.",
            ),
            section(
                "The technology",
                "A handheld spectrometer sends its readings to this application over Bluetooth Low Energy. \
The readings are interpreted to find markers associated with organophosphates.",
            ),
            section(
                "The team",
                "A team of developers, designers and scientists committed to making a positive impact through technology.",
            ),
            team,
        ].spacing(20);

        column![
            self.navbar(),
            scrollable(self.card(content)).height(Length::Fill),
        ].into()
    }
}

impl Application for SpectraApplication {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = ApplicationFlags;

    fn new(flags: ApplicationFlags) -> (SpectraApplication, Command<Self::Message>) {
        let app = SpectraApplication {
            notices: Vec::new(),
            config_io: flags.config_io,
            config: Config::default(),
            navigator: Navigator::new(Route::Splash),
            device_commands: None,
            device_state: DeviceState::Idle,
            devices: Vec::new(),
            latest_payload: None,
            malformed_payload: None,
            presenter: None,
        };

        let command = app.load_config();
        (app, command)
    }

    fn title(&self) -> String {
        String::from(concat!("TanoSpectra ", env!("CARGO_PKG_VERSION")))
    }

    fn update(&mut self, message: Message) -> Command<Self::Message> {
        match message {
            Message::ConfigLoadComplete((config, error_message)) => {
                info!("Config load complete");
                self.config = config;
                if let Some(error_message) = error_message {
                    self.notices.push(error_message);
                }

                if self.navigator.current() == Route::Splash {
                    return Command::perform(
                        splash_elapsed(self.config.splash_duration_ms),
                        |_| Message::SplashElapsed,
                    );
                }
            },
            Message::SplashElapsed => {
                if self.navigator.current() == Route::Splash {
                    self.navigate(|navigator| navigator.replace(Route::Home));
                }
            },
            Message::Navigate(route) => {
                let previous = self.navigator.current();
                self.navigate(|navigator| navigator.push(route));

                if route == Route::Status && previous != Route::Status {
                    self.enter_status();
                }
            },
            Message::Back => {
                self.navigate(|navigator| navigator.back());
            },
            Message::NoticeConfirmed => {
                if !self.notices.is_empty() {
                    self.notices.remove(0);
                }
            },
            Message::DeviceEvent(event) => {
                // events of a session that belonged to a screen no longer shown
                if self.navigator.current() != Route::RequestReading {
                    return Command::none();
                }

                match event {
                    DeviceEvent::Ready(sender) => {
                        self.device_commands = Some(sender);
                    },
                    DeviceEvent::StateChange(state) => {
                        self.device_state = state;
                    },
                    DeviceEvent::Devices(devices) => {
                        self.devices = devices;
                    },
                    DeviceEvent::Payload(payload) => {
                        self.latest_payload = Some(payload.text);
                        self.malformed_payload = None;
                    },
                    DeviceEvent::MalformedPayload(message) => {
                        self.malformed_payload = Some(message);
                    },
                    DeviceEvent::Notice(notice) => {
                        self.notices.push(notice.message);
                    },
                }
            },
            Message::DeviceCommand(command) => {
                return self.send_device_command(command);
            },
            Message::SimulateReading => {
                if let Some(presenter) = self.presenter.as_mut() {
                    presenter.simulate_reading();
                }
            },
            Message::CommandSent(()) => {},
        }

        Command::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        match self.navigator.current() {
            Route::RequestReading => device_session_subscription(self.config.device.clone())
                .map(Message::DeviceEvent),
            _ => Subscription::none(),
        }
    }

    fn view(&self) -> Element<Message> {
        if let Some(notice) = self.notices.first() {
            return container(
                column![
                    text(notice),

                    button(text("Okay"))
                        .on_press(Message::NoticeConfirmed),

                ].align_items(Alignment::Center).spacing(20),
            )
            .width(Length::Fill)
            .padding(20)
            .into()
        }

        let screen = match self.navigator.current() {
            Route::Splash => return self.splash_view(),
            Route::Home => self.home_view(),
            Route::About => self.about_view(),
            Route::RequestReading => self.request_reading_view(),
            Route::Status => self.status_view(),
        };

        container(screen)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(theme::Container::Custom(Box::new(ScreenStyleSheet)))
            .into()
    }
}

// One-shot: any duration is valid, including zero.
async fn splash_elapsed(duration_ms: u64) {
    tokio::time::sleep(Duration::from_millis(duration_ms)).await
}

pub fn run_application(config_io: ConfigIO) -> Result<(), AppRunError> {
    let flags = ApplicationFlags { config_io };
    let mut settings = Settings::with_flags(flags);

    settings.id = Some("tanospectra".to_string());
    settings.window.size = Size::new(420.0, 760.0);
    settings.window.resizable = true;

    // this function will call process::exit() unless there was a startup error
    SpectraApplication::run(settings)?;
    Ok(())
}
