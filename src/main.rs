use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bankrec::cli::{
    handle_account_command, handle_audit_command, handle_reconcile_command,
    handle_transaction_command, AccountCommands, AuditArgs, ReconcileCommands,
    TransactionCommands,
};
use bankrec::config::{RecPaths, Settings};
use bankrec::storage::Storage;

/// Environment variable holding the log filter (e.g. "bankrec=debug")
const LOG_ENV: &str = "BANKREC_LOG";

#[derive(Parser)]
#[command(
    name = "bankrec",
    author = "Kaylee Beyene",
    version,
    about = "Bank account reconciliation from the command line",
    long_about = "bankrec tracks bank accounts and their transactions and \
                  reconciles them against bank statements: clear the \
                  transactions that appear on a statement until the cleared \
                  balance matches, then complete the reconciliation."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Bank account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Transaction management commands
    #[command(subcommand, alias = "transaction")]
    Txn(TransactionCommands),

    /// Statement reconciliation commands
    #[command(subcommand, alias = "rec")]
    Reconcile(ReconcileCommands),

    /// Show recent audit log entries
    Audit(AuditArgs),

    /// Show current configuration and paths
    Config,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = RecPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    // Initialize storage
    let storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::Account(cmd)) => handle_account_command(&storage, &settings, cmd)?,
        Some(Commands::Txn(cmd)) => handle_transaction_command(&storage, &settings, cmd)?,
        Some(Commands::Reconcile(cmd)) => handle_reconcile_command(&storage, &settings, cmd)?,
        Some(Commands::Audit(args)) => handle_audit_command(&storage, args)?,
        Some(Commands::Config) => {
            println!("bankrec Configuration");
            println!("=====================");
            println!("Base directory:  {}", paths.base_dir().display());
            println!("Data directory:  {}", paths.data_dir().display());
            println!("Settings file:   {}", paths.settings_file().display());
            println!("Audit log:       {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Currency symbol: {}", settings.currency_symbol);
            println!("  Date format:     {}", settings.date_format);
            println!(
                "  Chronological statements required: {}",
                settings.reconciliation.require_chronological_statements
            );
            println!("  Completed by:    {}", settings.reconciliation.completed_by);
        }
        None => {
            println!("bankrec - Bank account reconciliation");
            println!();
            println!("Run 'bankrec --help' for usage information.");
        }
    }

    Ok(())
}
