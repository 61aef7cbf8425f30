//! Reconciliation CLI commands
//!
//! Implements CLI commands for the statement reconciliation workflow.

use clap::Subcommand;

use crate::config::Settings;
use crate::display::reconciliation::{
    format_bulk_outcome, format_reconciliation_detail, format_reconciliation_history,
    format_totals,
};
use crate::display::transaction::format_transaction_register;
use crate::error::{RecError, RecResult};
use crate::models::BankTransactionId;
use crate::services::{AccountService, ReconciliationService, TransactionService};
use crate::storage::Storage;

use super::{parse_date, parse_money};

/// Reconciliation subcommands
#[derive(Subcommand)]
pub enum ReconcileCommands {
    /// Start reconciling an account against a statement
    Start {
        /// Account name or ID
        account: String,
        /// Statement date (YYYY-MM-DD)
        statement_date: String,
        /// Statement ending balance (e.g., "1234.56")
        #[arg(allow_hyphen_values = true)]
        ending_balance: String,
        /// Notes to keep with the session
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Replace a session's notes
    Note {
        /// Reconciliation ID
        session: String,
        notes: String,
    },
    /// Clear a transaction into a session
    Clear {
        /// Reconciliation ID
        session: String,
        /// Transaction ID
        transaction: String,
    },
    /// Release a transaction from a session
    Unclear {
        /// Reconciliation ID
        session: String,
        /// Transaction ID
        transaction: String,
    },
    /// Clear (or release) several transactions at once
    Bulk {
        /// Reconciliation ID
        session: String,
        /// Transaction IDs
        #[arg(required = true)]
        transactions: Vec<String>,
        /// Release instead of clear
        #[arg(long)]
        unclear: bool,
    },
    /// Show a session with its cleared transactions
    Show {
        /// Reconciliation ID
        session: String,
    },
    /// Complete a balanced session
    Complete {
        /// Reconciliation ID
        session: String,
    },
    /// Abandon an in-progress session
    Void {
        /// Reconciliation ID
        session: String,
    },
    /// Reopen the latest completed session
    Undo {
        /// Reconciliation ID
        session: String,
    },
    /// List transactions not yet cleared
    Uncleared {
        /// Account name or ID
        account: String,
        /// Only transactions dated on or before this date (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Show an account's reconciliation history
    History {
        /// Account name or ID
        account: String,
    },
}

/// Handle a reconcile command
pub fn handle_reconcile_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ReconcileCommands,
) -> RecResult<()> {
    let service = ReconciliationService::with_policy(storage, settings.reconciliation.clone());
    let accounts = AccountService::new(storage);

    match cmd {
        ReconcileCommands::Start {
            account,
            statement_date,
            ending_balance,
            notes,
        } => {
            let account = accounts.resolve(&account)?;
            let statement_date = parse_date(&statement_date)?;
            let ending_balance = parse_money(&ending_balance)?;

            let mut session = service.start(account.id, statement_date, ending_balance)?;
            if let Some(notes) = notes {
                session = service.set_notes(session.id, notes)?;
            }
            let uncleared = service.uncleared(account.id, Some(statement_date))?;

            println!("Reconciliation started for: {}", account.name);
            println!("  ID: {}", session.id);
            println!();
            print!("{}", format_totals(&session.totals(), settings));
            println!();
            println!("Uncleared transactions through {}:", statement_date);
            print!("{}", format_transaction_register(&uncleared, settings));
        }

        ReconcileCommands::Clear {
            session,
            transaction,
        } => {
            let session = service.resolve(&session)?;
            let txn = TransactionService::new(storage).resolve(&transaction)?;
            let totals = service.toggle_cleared(session.id, txn.id, true)?;
            println!("Cleared: {}", txn.label());
            print!("{}", format_totals(&totals, settings));
        }

        ReconcileCommands::Unclear {
            session,
            transaction,
        } => {
            let session = service.resolve(&session)?;
            let txn = TransactionService::new(storage).resolve(&transaction)?;
            let totals = service.toggle_cleared(session.id, txn.id, false)?;
            println!("Uncleared: {}", txn.label());
            print!("{}", format_totals(&totals, settings));
        }

        ReconcileCommands::Bulk {
            session,
            transactions,
            unclear,
        } => {
            let session = service.resolve(&session)?;
            let ids = resolve_transaction_ids(storage, &transactions)?;
            let outcome = service.bulk_toggle(session.id, &ids, !unclear)?;
            print!("{}", format_bulk_outcome(&outcome, settings));
        }

        ReconcileCommands::Note { session, notes } => {
            let session = service.resolve(&session)?;
            let updated = service.set_notes(session.id, notes)?;
            println!("Updated notes for reconciliation {}", updated.id);
        }

        ReconcileCommands::Show { session } => {
            let session = service.resolve(&session)?;
            let account = accounts.require(session.account_id)?;
            let detail = service.detail(session.id)?;
            print!(
                "{}",
                format_reconciliation_detail(&detail, &account.name, settings)
            );
        }

        ReconcileCommands::Complete { session } => {
            let session = service.resolve(&session)?;
            let completed = service.complete(session.id)?;
            println!(
                "Reconciliation complete: statement {} balanced at {}",
                completed.statement_date,
                completed
                    .statement_ending_balance
                    .format_with_symbol(&settings.currency_symbol)
            );
        }

        ReconcileCommands::Void { session } => {
            let session = service.resolve(&session)?;
            let voided = service.void(session.id)?;
            println!("Voided reconciliation {}", voided.id);
        }

        ReconcileCommands::Undo { session } => {
            let session = service.resolve(&session)?;
            let reopened = service.undo(session.id)?;
            println!(
                "Reopened reconciliation {} (statement {})",
                reopened.id, reopened.statement_date
            );
        }

        ReconcileCommands::Uncleared { account, as_of } => {
            let account = accounts.resolve(&account)?;
            let as_of = as_of.as_deref().map(parse_date).transpose()?;
            let transactions = service.uncleared(account.id, as_of)?;
            println!("Uncleared transactions: {}", account.name);
            print!("{}", format_transaction_register(&transactions, settings));
        }

        ReconcileCommands::History { account } => {
            let account = accounts.resolve(&account)?;
            let sessions = service.history(account.id)?;
            println!("Reconciliation history: {}", account.name);
            print!("{}", format_reconciliation_history(&sessions, settings));
        }
    }

    Ok(())
}

/// Resolve transaction arguments to ids
///
/// Arguments that don't name a transaction are an error here; transactions
/// that exist but can't take part are reported by the bulk toggle itself.
fn resolve_transaction_ids(
    storage: &Storage,
    identifiers: &[String],
) -> RecResult<Vec<BankTransactionId>> {
    let service = TransactionService::new(storage);
    identifiers
        .iter()
        .map(|identifier| {
            service
                .find(identifier)?
                .map(|txn| txn.id)
                .ok_or_else(|| RecError::transaction_not_found(identifier.as_str()))
        })
        .collect()
}
