mod location;
mod peripheral;
mod position;
mod session;
mod settings;
mod web;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::settings::SettingsStore;
use crate::web::Config;

#[derive(Parser)]
#[command(name = "skytrack")]
#[command(about = "Satellite tracking and pointing bridge")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Validate { config: String },
    /// Run the tracking service
    Serve { config: String },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => validate(&config),
        Commands::Serve { config } => serve(&config),
    }
}

fn validate(path: &str) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Configuration is valid ({} api keys)", config.api_keys.len());

    let store = SettingsStore::new(config.settings.file.clone());
    match store.load() {
        Ok(settings) => {
            println!(
                "  credential: {}",
                if settings.api_key.is_some() {
                    "configured"
                } else {
                    "not set"
                }
            );
            println!(
                "  peripheral: {}",
                settings
                    .peripheral_mac
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "not set".to_string())
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Settings file error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn serve(path: &str) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Runtime error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(web::run_server(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
