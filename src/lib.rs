use std::path::PathBuf;
use clap::Parser;
use crate::config::io::ConfigIO;
use crate::error::AppRunError;
use crate::gui::application::run_application;
use crate::headless::{run_headless, HeadlessCommand};

pub mod config;
pub mod device;
pub mod error;
pub mod gui;
pub mod headless;
pub mod reading;

#[derive(Debug, Parser)]
#[command(version, about = "Spectral reading companion for the TanoSpectra spectrometer")]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also write the log to this file
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Run without the GUI
    #[command(subcommand)]
    pub command: Option<HeadlessCommand>,
}

pub fn init_logging(cli: &Cli) {
    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Warn)
        .level_for("tanospectra", level)
        .chain(std::io::stderr());

    if let Some(log_file) = cli.log_file.as_ref() {
        dispatch = dispatch.chain(
            fern::log_file(log_file).expect("Failed to open log file")
        );
    }

    dispatch.apply().expect("Failed to initialize logger");
}

pub fn run(cli: Cli) -> Result<(), AppRunError> {
    let mut config_io = ConfigIO::new_sync(cli.config)?;
    // held until exit
    let mut config_locker = config_io.locker()?;
    let _lock_guard = config_locker.lock()?;

    match cli.command {
        None => run_application(config_io),
        Some(command) => run_headless(config_io, command),
    }
}
