//! `simbridge` – simulation ↔ robotics middleware bridge.
//!
//! - `simbridge types [--protocol ros|apollo]` lists every DataType the
//!   chosen protocol can bridge and its wire message type.
//! - `simbridge run` connects to a rosbridge server, publishes the
//!   simulation clock and logs vehicle control commands until Ctrl-C.
//! - `simbridge config [--save]` prints the effective configuration.

mod config;
mod telemetry;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{debug, error, info, warn};

use simbridge_apollo::ApolloBridgeFactory;
use simbridge_core::{BridgeFactory, BridgePlugin, Connection, RosbridgeConnection};
use simbridge_ros::RosBridgeFactory;
use simbridge_types::{BridgeError, ClockData, VehicleControlData};

use config::{Config, Protocol};

#[derive(Parser)]
#[command(name = "simbridge", version, about = "Simulation to robotics middleware bridge")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the bridgeable DataTypes and their wire message types.
    Types {
        /// Defaults to the configured protocol.
        #[arg(long, value_enum)]
        protocol: Option<Protocol>,
    },
    /// Connect to rosbridge and run until Ctrl-C.
    Run {
        #[arg(long, value_enum)]
        protocol: Option<Protocol>,
        /// Overrides `rosbridge_url`.
        #[arg(long)]
        url: Option<String>,
    },
    /// Print the effective configuration.
    Config {
        /// Write it to `~/.simbridge/config.toml`.
        #[arg(long)]
        save: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            eprintln!("  Using default configuration.");
            let mut cfg = Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };

    match cli.command {
        Command::Types { protocol } => {
            let protocol = protocol.unwrap_or(cfg.protocol);
            match build_plugin(protocol) {
                Ok(plugin) => {
                    print_capabilities(&plugin);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{}: {}", "Registration failed".red(), e);
                    ExitCode::FAILURE
                }
            }
        }
        Command::Config { save } => {
            print_config(&cfg);
            if save {
                match config::save(&cfg) {
                    Ok(path) => println!(
                        "\n  {} Config saved to {}",
                        "✓".green().bold(),
                        path.display().to_string().bold()
                    ),
                    Err(e) => {
                        eprintln!("{}: {}", "Error saving config".red(), e);
                        return ExitCode::FAILURE;
                    }
                }
            }
            ExitCode::SUCCESS
        }
        Command::Run { protocol, url } => {
            if let Some(p) = protocol {
                cfg.protocol = p;
            }
            if let Some(u) = url {
                cfg.rosbridge_url = u;
            }

            let _guard = telemetry::init_tracing("simbridge");
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    error!(error = %e, "failed to start Tokio runtime");
                    return ExitCode::FAILURE;
                }
            };
            match runtime.block_on(run(cfg)) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!(error = %e, "bridge stopped");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn build_plugin(protocol: Protocol) -> Result<BridgePlugin, BridgeError> {
    let factory: &dyn BridgeFactory = match protocol {
        Protocol::Ros => &RosBridgeFactory,
        Protocol::Apollo => &ApolloBridgeFactory,
    };
    BridgePlugin::from_factory(factory)
}

// ─────────────────────────────────────────────────────────────────────────────
// Run loop
// ─────────────────────────────────────────────────────────────────────────────

async fn run(cfg: Config) -> Result<(), BridgeError> {
    let plugin = build_plugin(cfg.protocol)?;
    info!(protocol = %cfg.protocol, url = %cfg.rosbridge_url, "starting bridge");

    let rosbridge = RosbridgeConnection::connect(&cfg.rosbridge_url).await?;
    let conn: Arc<dyn Connection> = Arc::new(rosbridge.clone());

    let mut clock = if plugin.has_publisher::<ClockData>() {
        Some(plugin.create_publisher::<ClockData>(Arc::clone(&conn), &cfg.clock_topic)?)
    } else {
        warn!(protocol = %cfg.protocol, "protocol has no clock message; clock disabled");
        None
    };

    let _control = plugin.create_subscriber::<VehicleControlData>(
        Arc::clone(&conn),
        &cfg.control_topic,
        |control| {
            info!(
                acceleration = ?control.acceleration,
                braking = ?control.braking,
                steer_angle = ?control.steer_angle,
                "vehicle control received"
            );
        },
    )?;

    let period = Duration::from_secs_f64(1.0 / f64::from(cfg.clock_hz.max(1)));
    let mut ticker = tokio::time::interval(period);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!(error = %e, "Ctrl-C handler failed");
                }
                println!();
                println!("{}", "⚠  Ctrl-C received – shutting down …".yellow().bold());
                rosbridge.close();
                return Ok(());
            }
            _ = ticker.tick() => {
                if rosbridge.is_closed() {
                    return Err(BridgeError::ConnectionClosed);
                }
                if let Some(publisher) = clock.as_mut() {
                    let now = chrono::Utc::now().timestamp_micros() as f64 / 1e6;
                    publisher.publish(&ClockData { clock: now }, |result| {
                        if let Err(e) = result {
                            debug!(error = %e, "clock publish failed");
                        }
                    });
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_capabilities(plugin: &BridgePlugin) {
    let caps = plugin.capabilities();
    let width = caps.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    println!();
    println!("  {} {}", plugin.name().bold().cyan(), "bridge".bold());
    println!();
    for (name, descriptor) in &caps {
        println!("  {}  {}", format!("{name:width$}").bold(), descriptor.dimmed());
    }
    println!();
    println!("  {} type(s)", caps.len());
}

fn print_config(cfg: &Config) {
    println!();
    println!("  {}  {}", "protocol".bold(), cfg.protocol);
    println!("  {}  {}", "rosbridge_url".bold(), cfg.rosbridge_url);
    println!("  {}  {}", "clock_topic".bold(), cfg.clock_topic);
    println!("  {}  {}", "control_topic".bold(), cfg.control_topic);
    println!("  {}  {}", "clock_hz".bold(), cfg.clock_hz);
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_types_with_protocol() {
        let cli = Cli::try_parse_from(["simbridge", "types", "--protocol", "apollo"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Types {
                protocol: Some(Protocol::Apollo)
            }
        ));
    }

    #[test]
    fn rejects_unknown_protocol() {
        assert!(Cli::try_parse_from(["simbridge", "types", "--protocol", "carla"]).is_err());
    }

    #[test]
    fn both_protocols_build() {
        let ros = build_plugin(Protocol::Ros).unwrap();
        assert_eq!(ros.name(), "ROS");
        assert!(ros.has_publisher::<ClockData>());
        assert!(ros.has_subscriber::<VehicleControlData>());

        let apollo = build_plugin(Protocol::Apollo).unwrap();
        assert_eq!(apollo.name(), "Apollo");
        assert!(!apollo.has_publisher::<ClockData>());
        assert!(apollo.has_subscriber::<VehicleControlData>());
    }
}
