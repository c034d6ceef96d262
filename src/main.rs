mod domain;
mod infrastructure;
mod presentation;

use clap::Parser;
use domain::models::LoopExit;
use domain::settings::{Settings, SettingsService};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Drive a Bluetooth LE train hub from the keyboard
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Connect to the first hub whose advertised name contains this text
    #[arg(long, value_name = "PATTERN")]
    hub_name: Option<String>,

    /// How long to scan for a hub, in milliseconds
    #[arg(long, value_name = "MS")]
    scan_timeout: Option<u64>,

    /// Log filter, e.g. "debug" (RUST_LOG takes precedence)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Settings file to use instead of the per-user one
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(pattern) = &self.hub_name {
            settings.hub.name_pattern = pattern.clone();
        }
        if let Some(timeout) = self.scan_timeout {
            settings.hub.scan_timeout_ms = timeout;
        }
        if let Some(level) = &self.log_level {
            settings.log_settings.level = level.clone();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(reason) = presentation::keyboard::check_supported() {
        eprintln!("{}", reason);
        return ExitCode::FAILURE;
    }

    let mut settings_service = match SettingsService::new(cli.config.clone()) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Failed to load settings: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    cli.apply(settings_service.get_mut());

    let _logging_guard =
        infrastructure::logging::init_logger(&settings_service.get().log_settings)
            .map_err(|e| eprintln!("Failed to initialize logging: {}", e))
            .ok();

    if cli.save_config {
        match settings_service.save() {
            Ok(()) => info!("Settings saved to {}", settings_service.path().display()),
            Err(e) => error!("Failed to save settings: {:#}", e),
        }
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(presentation::app::run(settings_service.get()));
    match &result {
        Ok(LoopExit::Interrupted) => presentation::console::print_exiting(),
        Ok(_) => {}
        Err(e) => error!("Error: {:#}", e),
    }
    ExitCode::from(exit_status(&result))
}

/// 0 for a quit or interrupt, 1 when the session failed
fn exit_status(result: &anyhow::Result<LoopExit>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
