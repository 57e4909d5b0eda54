// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::connect::{connect, Access};
use crate::helpers::output::spawn_pending_printer;
use crate::helpers::telemetry::setup_tracing;
use crate::{available, create, decrypt, list, stats, view};
use anyhow::Result;
use cg_config::validation::ValidUrl;
use cg_config::{load_config, AppConfig};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{info, instrument, Level};

#[derive(Parser, Debug)]
#[command(name = "contentgate")]
#[command(about = "Create and decrypt FHE-protected content records on a ContentGate contract", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `contentgate -vvv` will
    /// give you trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,

    /// Set the Open Telemetry collector grpc endpoint. Eg. http://localhost:4317
    #[arg(long = "otel", global = true)]
    pub otel: Option<ValidUrl>,

    /// Approve every signing request without asking
    #[arg(short, long, global = true)]
    yes: bool,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn execute(self) -> Result<()> {
        let config = self.load_config()?;
        setup_tracing(&config, self.log_level())?;
        info!("Config loaded from: {:?}", config.config_file());

        let access = if self.command.needs_signer() {
            Access::Signing {
                auto_approve: self.yes,
            }
        } else {
            Access::ReadOnly
        };
        let gate = connect(&config, access).await?;
        if !self.quiet {
            spawn_pending_printer(gate.subscribe_status());
        }

        match self.command {
            Commands::List => list::execute(&gate).await?,
            Commands::View { id } => view::execute(&gate, &id).await?,
            Commands::Create {
                title,
                description,
                level,
            } => create::execute(&gate, title, description, level).await?,
            Commands::Decrypt { id } => decrypt::execute(&gate, &id).await?,
            Commands::Available => available::execute(&gate).await?,
            Commands::Stats => stats::execute(&gate).await?,
        }

        Ok(())
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        let config = load_config(self.config.clone(), self.otel.clone().map(Into::into))?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every content record on the contract
    List,

    /// Show one content record
    View {
        /// Content id, eg. content-1712345678901
        id: String,
    },

    /// Encrypt an access level and create a content record
    Create {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Access level to encrypt
        #[arg(long)]
        level: u64,
    },

    /// Decrypt a record's access level and prove it on-chain
    Decrypt {
        /// Content id
        id: String,
    },

    /// Check whether the contract accepts requests
    Available,

    /// Show content statistics and this session's activity
    Stats,
}

impl Commands {
    fn needs_signer(&self) -> bool {
        matches!(self, Commands::Create { .. } | Commands::Decrypt { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create() {
        let cli = Cli::parse_from([
            "contentgate",
            "create",
            "--title",
            "Deep dive",
            "--level",
            "5",
            "-vv",
            "--yes",
        ]);
        assert_eq!(cli.log_level(), Level::DEBUG);
        assert!(cli.yes);
        assert!(cli.command.needs_signer());
        let Commands::Create { title, level, description } = cli.command else {
            panic!("expected create");
        };
        assert_eq!(title, "Deep dive");
        assert_eq!(level, 5);
        assert_eq!(description, "");
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["contentgate", "list", "-q", "-v"]).is_err());
        let cli = Cli::parse_from(["contentgate", "list", "-q"]);
        assert_eq!(cli.log_level(), Level::ERROR);
        assert!(!cli.command.needs_signer());
    }
}
