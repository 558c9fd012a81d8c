//! CoinBar - desktop ticker for cryptocurrency prices
//!
//! Polls CoinGecko on a fixed interval and shows the results in a small
//! native window with a countdown and a manual refresh button:
//! - Desktop window (default when run without a subcommand)
//! - `coinbar prices` for a one-shot fetch from the terminal
//! - `coinbar watch` to keep refreshing in the terminal

mod cli;
mod core;
mod logging;
mod native_ui;
mod providers;
mod scheduler;
mod settings;

use clap::Parser;
use cli::{exit_codes, Cli, Commands};
use settings::{ConfigError, Overrides, Settings};

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();

    // Initialize logging
    if let Err(e) = logging::init(cli.verbose, cli.json_output) {
        eprintln!("Failed to initialize logging: {}", e);
        return exit_codes::UNEXPECTED_FAILURE;
    }

    // Settings problems are fatal before anything else starts
    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            eprintln!("Configuration error: {}", e);
            return exit_codes::CONFIG_ERROR;
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create runtime: {}", e);
            return exit_codes::UNEXPECTED_FAILURE;
        }
    };

    match cli.command {
        Some(Commands::Prices(args)) => rt.block_on(async {
            match cli::prices::run(&settings, args).await {
                Ok(()) => exit_codes::SUCCESS,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    categorize_error(&e)
                }
            }
        }),
        Some(Commands::Watch) => rt.block_on(async {
            match cli::watch::run(&settings).await {
                Ok(()) => exit_codes::SUCCESS,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    categorize_error(&e)
                }
            }
        }),
        None => {
            #[cfg(windows)]
            hide_console_window();

            match native_ui::run(settings, rt) {
                Ok(()) => exit_codes::SUCCESS,
                Err(e) => {
                    tracing::error!("Window error: {:?}", e);
                    categorize_error(&e)
                }
            }
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings, ConfigError> {
    let overrides = Overrides {
        coins: cli.coins.clone(),
        refresh_interval_secs: cli.interval,
    };
    Settings::load(cli.config.as_deref(), overrides)
}

/// Categorize an error into the appropriate exit code
fn categorize_error(e: &anyhow::Error) -> i32 {
    if e.downcast_ref::<crate::core::FetchError>().is_some() {
        exit_codes::FETCH_ERROR
    } else if e.downcast_ref::<ConfigError>().is_some() {
        exit_codes::CONFIG_ERROR
    } else {
        exit_codes::UNEXPECTED_FAILURE
    }
}

/// Hide the console window on Windows (for GUI mode)
#[cfg(windows)]
fn hide_console_window() {
    use windows::Win32::System::Console::GetConsoleWindow;
    use windows::Win32::UI::WindowsAndMessaging::{ShowWindow, SW_HIDE};

    unsafe {
        let console = GetConsoleWindow();
        if !console.is_invalid() {
            let _ = ShowWindow(console, SW_HIDE);
        }
    }
}
