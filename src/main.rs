use clap::Parser;
use tracing::warn;

mod app;
mod catalog;
mod cli;
mod config;
mod cover;
mod runtime;
mod ui;

use cli::{Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut settings, config_warning) = runtime::load_settings(cli.config.clone());
    if let Some(path) = &cli.library {
        settings.library.path = path.clone();
    }

    runtime::init_logging(&settings.logging, cli.log_target())?;
    if let Some(msg) = &config_warning {
        warn!("{msg}");
    }

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => {
            let (mut library, mut status) = runtime::open_library(&settings);
            if let Some(msg) = config_warning {
                status = format!("{status} ({msg})");
            }
            runtime::run_tui(&settings, &mut library, status)
        }
        Command::PrintConfig => {
            print!("{}", settings.to_toml()?);
            Ok(())
        }
        Command::Library(command) => {
            let (mut library, _) = runtime::open_library(&settings);
            let mut stdout = std::io::stdout().lock();
            cli::execute(command, &settings, &mut library, &mut stdout)
        }
    }
}
