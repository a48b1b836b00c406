use clap::Parser;
use log::info;
use msgbox::IconType;
use tanospectra::{init_logging, run, Cli};
use tanospectra::error::{error_msgbox, AppRunError, ConfigError};

fn main() -> Result<(), AppRunError> {
    let cli = Cli::parse();
    init_logging(&cli);
    info!(concat!("TanoSpectra ", env!("CARGO_PKG_VERSION")));

    let headless = cli.command.is_some();

    match run(cli) {
        Err(AppRunError::ConfigError { source: ConfigError::CanNotLock { .. } }) => {
            let message = "This application has already been started";
            if headless {
                eprintln!("{}", message);
            }
            else {
                msgbox::create(
                    concat!("TanoSpectra ", env!("CARGO_PKG_VERSION")),
                    message,
                    IconType::Error,
                ).expect("Could not create msgbox");
            }
            Ok(())
        },
        Err(err) if headless => Err(err),
        Err(err) => {
            error_msgbox("Unexpected error", &err);
            Err(err)
        }
        Ok(_) => Ok(())
    }
}
