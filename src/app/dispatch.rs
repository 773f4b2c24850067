use crate::cli::{Cli, Commands, LedgerCommands};
use anyhow::{Context, Result};
use std::sync::Arc;

use crate::Config;
use crate::app::ledger;
use crate::app::status::render_status;

pub async fn dispatch(cli: Cli, mut config: Config) -> Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            config.validate_for_serving()?;

            let host = config.gateway.host.clone();
            let port = config.gateway.port;
            crate::gateway::run_gateway(&host, port, Arc::new(config)).await
        }

        Commands::Status => {
            println!("{}", render_status(&config));
            Ok(())
        }

        Commands::Ledger { ledger_command } => match ledger_command {
            LedgerCommands::Show => {
                println!("{}", ledger::show(&config));
                Ok(())
            }
            LedgerCommands::Reset => {
                let handle = ledger::open_ledger(&config);
                handle.reset().context("reset attempt ledger")?;
                tracing::info!(location = %handle.location(), "ledger reset by operator");
                println!("✓ Ledger reset: {}", handle.location());
                Ok(())
            }
        },
    }
}
