//! CLI parser and command dispatch.

mod handlers;
mod icons;
mod menu;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use tormgr::service::ServiceAction;
use tormgr::{Settings, TorManager};

#[derive(Parser)]
#[command(name = "tormgr")]
#[command(about = "Manage a local Tor client: torrc, service, identity rotation")]
#[command(version)]
pub struct Cli {
    /// Settings file (default: ~/.config/tormgr/config.toml)
    #[arg(short, long, global = true, env = "TORMGR_CONFIG")]
    config: Option<PathBuf>,

    /// torrc to manage (overrides settings)
    #[arg(long, global = true)]
    torrc: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Exit instead of opening the menu when no command is given
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Install Tor and its GeoIP database
    Install,

    /// Upgrade the Tor package
    Update,

    /// Remove the Tor package
    Uninstall,

    /// Print the exit IP seen through the local SOCKS port
    Ip {
        /// SOCKS port to use (default: torrc SocksPort, then 9050)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Schedule periodic identity rotation (1, 30, 60, 240, 720 or 1440 minutes)
    Schedule {
        /// Interval in minutes
        #[arg(required_unless_present = "remove")]
        minutes: Option<u32>,

        /// Remove the scheduled rotation instead
        #[arg(long, conflicts_with = "minutes")]
        remove: bool,
    },

    /// Request a new identity (reload, then restart)
    Rotate,

    /// Set SocksPort and restart Tor
    SetPort {
        /// New SOCKS port (must be free)
        port: String,
    },

    /// Set ExitNodes countries and restart Tor
    SetCountries {
        /// Country codes, comma or space separated (e.g. "de,fr")
        codes: String,
    },

    /// List the accepted exit country codes
    Countries,

    /// Start the Tor service
    Start,

    /// Stop the Tor service
    Stop,

    /// Restart the Tor service
    Restart,

    /// Reload the Tor configuration
    Reload,

    /// Show the service manager's status output
    Status,

    /// Show installation, port, countries and rotation schedule
    Show,
}

/// Parse arguments and run the selected command (or the menu).
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(torrc) = cli.torrc {
        settings.torrc_path = torrc;
    }
    let mut manager = TorManager::system(settings);

    let command = match cli.command {
        Some(command) => command,
        None => {
            if cli.non_interactive || !std::io::stdin().is_terminal() {
                eprintln!("No command given; run with --help for usage.");
                return Ok(());
            }
            return menu::run(&mut manager).await;
        }
    };

    let result = match command {
        Commands::Install => handlers::install(&mut manager),
        Commands::Update => handlers::update(&mut manager),
        Commands::Uninstall => handlers::uninstall(&mut manager),
        Commands::Ip { port } => handlers::exit_ip(&mut manager, port).await,
        Commands::Schedule { remove: true, .. } => handlers::unschedule(&mut manager),
        Commands::Schedule { minutes, .. } => match minutes {
            Some(minutes) => handlers::schedule(&mut manager, minutes),
            None => anyhow::bail!("an interval in minutes is required"),
        },
        Commands::Rotate => handlers::rotate(&mut manager),
        Commands::SetPort { port } => handlers::set_port(&mut manager, &port),
        Commands::SetCountries { codes } => handlers::set_countries(&mut manager, &codes),
        Commands::Countries => {
            handlers::countries();
            Ok(())
        }
        Commands::Start => handlers::service(&mut manager, ServiceAction::Start),
        Commands::Stop => handlers::service(&mut manager, ServiceAction::Stop),
        Commands::Restart => handlers::service(&mut manager, ServiceAction::Restart),
        Commands::Reload => handlers::service(&mut manager, ServiceAction::Reload),
        Commands::Status => handlers::service(&mut manager, ServiceAction::Status),
        Commands::Show => {
            handlers::show(&mut manager);
            Ok(())
        }
    };

    result.map_err(anyhow::Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_schedule() {
        let cli = Cli::try_parse_from(["tormgr", "schedule", "30"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Schedule {
                minutes: Some(30),
                remove: false
            })
        ));

        let cli = Cli::try_parse_from(["tormgr", "schedule", "--remove"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Schedule { remove: true, .. })
        ));

        assert!(Cli::try_parse_from(["tormgr", "schedule"]).is_err());
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["tormgr", "set-port", "9150", "--torrc", "/tmp/torrc", "-v"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.torrc, Some(PathBuf::from("/tmp/torrc")));
        assert!(matches!(cli.command, Some(Commands::SetPort { ref port }) if port == "9150"));
    }
}
