pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use kodi_voice_core::config::{ConfigOverrides, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "kodi-voice",
    about = "Voice control for a Kodi media center",
    long_about = "Run the voice skill against a Kodi media center, inspect the effective \
                  configuration, and check connectivity.",
    after_help = "Examples:\n  kodi-voice listen\n  kodi-voice config\n  kodi-voice doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file to read instead of kodi-voice.toml")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override kodi.host")]
    kodi_host: Option<String>,
    #[arg(long, global = true, help = "Override kodi.port")]
    kodi_port: Option<u16>,
    #[arg(long, global = true, help = "Override logging.level")]
    log_level: Option<String>,
    #[arg(
        long,
        global = true,
        value_parser = parse_log_format,
        help = "Override logging.format (compact, pretty or json)"
    )]
    log_format: Option<LogFormat>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Read JSON skill requests from stdin, one per line, and write JSON responses"
    )]
    Listen {
        #[arg(long, help = "Mirror every response to the Kodi screen")]
        notifications: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and check the Kodi JSON-RPC endpoint")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Cli {
    fn load_options(&self, notifications: Option<bool>) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                kodi_host: self.kodi_host.clone(),
                kodi_port: self.kodi_port,
                log_level: self.log_level.clone(),
                log_format: self.log_format,
                notifications_enabled: notifications,
            },
        }
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse().map_err(|error: kodi_voice_core::config::ConfigError| error.to_string())
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Listen { notifications } => {
            commands::listen::run(cli.load_options(notifications.then_some(true)))
        }
        Command::Config => commands::CommandResult {
            exit_code: 0,
            output: commands::config::run(&cli.load_options(None)),
        },
        Command::Doctor { json } => commands::CommandResult {
            exit_code: 0,
            output: commands::doctor::run(&cli.load_options(None), *json),
        },
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
