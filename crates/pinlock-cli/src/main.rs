//! pinlock CLI - drive the wallet access gate from a terminal
//!
//! Records live in the configured storage directory, so sessions persist
//! between invocations exactly as they would inside a long-running host.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pinlock_core::GateConfig;

#[derive(Parser)]
#[command(name = "pinlock")]
#[command(about = "PIN and session gate for a local wallet profile", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to $PINLOCK_CONFIG or the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the record storage directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the wallet file used as the "wallet exists" signal
    #[arg(long, global = true)]
    wallet: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current access state
    Status,

    /// Set up a PIN (first time)
    SetPin {
        /// New PIN; read from stdin when omitted
        #[arg(long)]
        pin: Option<String>,

        /// Confirmation entry; read from stdin when omitted
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Unlock with the PIN
    Unlock {
        /// PIN; read from stdin when omitted
        #[arg(long)]
        pin: Option<String>,
    },

    /// Change the PIN
    ChangePin {
        /// Current PIN
        #[arg(long)]
        current: Option<String>,

        /// New PIN
        #[arg(long)]
        new: Option<String>,

        /// Confirmation entry for the new PIN
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Remove the PIN gate
    RemovePin {
        /// Current PIN
        #[arg(long)]
        current: Option<String>,
    },

    /// End the current session
    Lock,

    /// Slide a live session forward
    Extend,

    /// Signal user presence
    Activity,

    /// Show the time left in the session
    Remaining,

    /// Delete the PIN and session (wallet reset)
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pinlock=info,pinlock_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(GateConfig::default_path);
    let mut config = GateConfig::load_or_default(&config_path);
    if let Some(dir) = cli.data_dir {
        config.storage_dir = dir;
    }
    if let Some(wallet) = cli.wallet {
        config.wallet_path = wallet;
    }

    match cli.command {
        Commands::Status => commands::status(&commands::open_gate(&config)?),
        Commands::SetPin { pin, confirm } => {
            commands::set_pin(&commands::open_gate(&config)?, pin, confirm)
        }
        Commands::Unlock { pin } => commands::unlock(&commands::open_gate(&config)?, pin),
        Commands::ChangePin {
            current,
            new,
            confirm,
        } => commands::change_pin(&commands::open_gate(&config)?, current, new, confirm),
        Commands::RemovePin { current } => {
            commands::remove_pin(&commands::open_gate(&config)?, current)
        }
        Commands::Lock => commands::lock(&commands::open_gate(&config)?),
        Commands::Extend => commands::extend(&commands::open_gate(&config)?),
        Commands::Activity => commands::activity(&commands::open_gate(&config)?),
        Commands::Remaining => commands::remaining(&commands::open_gate(&config)?),
        Commands::Reset { yes } => commands::reset(&commands::open_gate(&config)?, yes),
        Commands::Config(ConfigCommands::Init { force }) => {
            commands::config_init(&config, &config_path, force)
        }
        Commands::Config(ConfigCommands::Show) => commands::config_show(&config),
    }
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
    fn test_parse_unlock_with_flag() {
        let cli = Cli::try_parse_from(["pinlock", "unlock", "--pin", "123456"]).unwrap();
        match cli.command {
            Commands::Unlock { pin } => assert_eq!(pin.as_deref(), Some("123456")),
            _ => panic!("expected unlock"),
        }
    }

    #[test]
    fn test_global_overrides() {
        let cli = Cli::try_parse_from(["pinlock", "status", "--data-dir", "/tmp/x"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
    }
}
