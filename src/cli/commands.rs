use clap::{Parser, Subcommand};

/// `ScriptGate` - secret-gated code-generation relay.
#[derive(Parser, Debug)]
#[command(name = "scriptgate")]
#[command(version)]
#[command(about = "A secret-gated code-generation relay with lockout and local fallback.", long_about = None)]
pub struct Cli {
    /// Log at DEBUG instead of INFO
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP relay
    Serve {
        /// Port to listen on (use 0 for random available port; default from config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (default from config)
        #[arg(long)]
        host: Option<String>,
    },

    /// Show service status and gate configuration
    Status,

    /// Inspect or reset the attempt ledger
    Ledger {
        #[command(subcommand)]
        ledger_command: LedgerCommands,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerCommands {
    /// Print attempt history and usage totals
    Show,
    /// Clear all recorded attempts and usage
    Reset,
}
