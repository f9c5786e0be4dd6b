//! infinityctl - Disney Infinity base control CLI
//!
//! Lists connected bases, reads the figures and discs on them, drives the
//! platform LEDs and installs the udev rule regular users need on Linux.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use infinity_base::{ConfigError, InfinityError};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{ColorArgs, ConfigOverrides, UdevArgs};
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "infinityctl")]
#[command(about = "Disney Infinity base CLI - read figures, drive platform LEDs and set up udev")]
#[command(version)]
#[command(long_about = "
infinityctl talks to the Disney Infinity USB base (Wii / PlayStation model,
VID 0e6f PID 0129) over HID. It reads the tags placed on the base, sets, fades
and flashes the three platform LEDs, and prints or installs the udev rule that
lets a regular user open the device on Linux.

Use --json flag for machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// USB vendor id in hex
    #[arg(long, global = true, value_parser = parse_hex_u16)]
    vid: Option<u16>,

    /// USB product id in hex
    #[arg(long, global = true, value_parser = parse_hex_u16)]
    pid: Option<u16>,

    /// HID device path to open instead of the first matching base
    #[arg(long, global = true)]
    path: Option<String>,

    /// YAML or JSON driver configuration file
    #[arg(long, global = true, env = "INFINITYCTL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            vendor_id: self.vid,
            product_id: self.pid,
            path: self.path.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List connected bases
    List,

    /// Print the tags on the base grouped by platform
    Tags,

    /// Set, fade or flash a platform LED
    Color(ColorArgs),

    /// Print a line each time a figure or disc is added or removed
    Watch,

    /// Read the tags, light all three platforms, then watch for changes
    Demo,

    /// Print or install the udev rule for non-root access
    Udev(UdevArgs),
}

fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(s, 16).map_err(|e| format!("invalid hex value '{s}': {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "infinityctl={log_level},infinity_base={log_level},infinity_hid_common={log_level}"
                )
                .into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute_command(&cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            std::process::exit(exit_code(&e));
        }
    }
}

fn exit_code(error: &anyhow::Error) -> i32 {
    if let Some(e) = error.downcast_ref::<InfinityError>() {
        return match e {
            InfinityError::DeviceNotFound { .. } => 2,
            InfinityError::DeviceOpen { .. } => 6,
            _ => 1,
        };
    }
    if error.downcast_ref::<ConfigError>().is_some() {
        return 4;
    }
    match error.downcast_ref::<CliError>() {
        Some(CliError::DeviceNotFound(_)) => 2,
        Some(CliError::PermissionDenied(_)) => 6,
        None => 1,
    }
}

async fn execute_command(cli: &Cli) -> Result<()> {
    let config = commands::resolve_config(cli.config.as_deref(), &cli.overrides())?;

    match &cli.command {
        Commands::List => {
            let port = commands::open_port()?;
            commands::device::list(port.as_ref(), &config, cli.json)
        }
        Commands::Tags => {
            let base = commands::connect(&config, commands::open_port()?)?;
            commands::device::tags(&base, cli.json)
        }
        Commands::Color(args) => {
            let base = commands::connect(&config, commands::open_port()?)?;
            commands::led::execute(&base, args, cli.json)
        }
        Commands::Watch => {
            let base = commands::connect(&config, commands::open_port()?)?;
            commands::device::watch(&base, cli.json).await
        }
        Commands::Demo => commands::demo::run(commands::open_port()?, &config, cli.json).await,
        Commands::Udev(args) => commands::udev::execute(args, &config, cli.json),
    }
}
