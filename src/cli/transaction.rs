//! Bank transaction CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::display::transaction::{format_transaction_details, format_transaction_register};
use crate::error::{RecError, RecResult};
use crate::models::TransactionType;
use crate::services::{
    AccountService, CreateTransactionInput, TransactionFilter, TransactionPatch,
    TransactionService,
};
use crate::storage::Storage;

use super::{parse_date, parse_date_or_today, parse_money};

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Record a transaction
    Add {
        /// Account name or ID
        account: String,
        /// Type (deposit, withdrawal, check, transfer, fee, interest, adjustment)
        transaction_type: String,
        /// Amount (e.g., "125.00"); the sign follows the type except for adjustments
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Transaction date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long)]
        payee: Option<String>,
        /// Check number
        #[arg(short, long)]
        check: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Bank reference
        #[arg(long)]
        reference: Option<String>,
    },
    /// Edit an uncleared transaction
    Edit {
        /// Transaction ID
        id: String,
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short = 't', long)]
        transaction_type: Option<String>,
        #[arg(short, long, allow_hyphen_values = true)]
        amount: Option<String>,
        #[arg(short, long)]
        payee: Option<String>,
        #[arg(short, long)]
        check: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        reference: Option<String>,
    },
    /// Delete an uncleared transaction
    Delete {
        /// Transaction ID
        id: String,
    },
    /// Show transaction details
    Show {
        /// Transaction ID
        id: String,
    },
    /// List an account's transactions
    List {
        /// Account name or ID
        account: String,
        /// Only cleared transactions
        #[arg(long, conflicts_with = "uncleared")]
        cleared: bool,
        /// Only uncleared transactions
        #[arg(long)]
        uncleared: bool,
        /// Earliest date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Latest date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Number of transactions to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },
}

fn parse_transaction_type(input: &str) -> RecResult<TransactionType> {
    TransactionType::parse(input).ok_or_else(|| {
        RecError::Validation(format!(
            "Invalid transaction type: '{}'. Valid types: deposit, withdrawal, check, transfer, fee, interest, adjustment",
            input
        ))
    })
}

/// Handle a transaction command
pub fn handle_transaction_command(
    storage: &Storage,
    settings: &Settings,
    cmd: TransactionCommands,
) -> RecResult<()> {
    let service = TransactionService::new(storage);

    match cmd {
        TransactionCommands::Add {
            account,
            transaction_type,
            amount,
            date,
            payee,
            check,
            description,
            reference,
        } => {
            let account = AccountService::new(storage).resolve(&account)?;
            let transaction_type = parse_transaction_type(&transaction_type)?;
            let amount = transaction_type.signed(parse_money(&amount)?);

            let mut input =
                CreateTransactionInput::new(parse_date_or_today(date.as_deref())?, transaction_type, amount);
            input.payee = payee;
            input.check_number = check;
            input.description = description;
            input.reference = reference;

            let txn = service.create(account.id, input)?;

            println!("Recorded {} on {}", txn.label(), account.name);
            println!(
                "  Amount: {}",
                txn.amount.format_with_symbol(&settings.currency_symbol)
            );
            println!("  ID: {}", txn.id);
        }

        TransactionCommands::Edit {
            id,
            date,
            transaction_type,
            amount,
            payee,
            check,
            description,
            reference,
        } => {
            let txn = service.resolve(&id)?;
            let transaction_type = transaction_type
                .as_deref()
                .map(parse_transaction_type)
                .transpose()?;
            let sign_with = transaction_type.unwrap_or(txn.transaction_type);
            let amount = amount
                .as_deref()
                .map(parse_money)
                .transpose()?
                .map(|a| sign_with.signed(a));

            let patch = TransactionPatch {
                date: date.as_deref().map(parse_date).transpose()?,
                transaction_type,
                amount,
                check_number: check,
                payee,
                description,
                reference,
            };

            let updated = service.update(txn.id, patch)?;
            println!("Updated transaction: {}", updated.id);
        }

        TransactionCommands::Delete { id } => {
            let txn = service.resolve(&id)?;
            let deleted = service.delete(txn.id)?;
            println!("Deleted transaction: {} ({})", deleted.id, deleted.label());
        }

        TransactionCommands::Show { id } => {
            let txn = service.resolve(&id)?;
            print!("{}", format_transaction_details(&txn, settings));
        }

        TransactionCommands::List {
            account,
            cleared,
            uncleared,
            from,
            to,
            limit,
        } => {
            let account = AccountService::new(storage).resolve(&account)?;
            let filter = TransactionFilter {
                cleared: match (cleared, uncleared) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                start_date: from.as_deref().map(parse_date).transpose()?,
                end_date: to.as_deref().map(parse_date).transpose()?,
                limit: Some(limit),
            };

            let transactions = service.list(account.id, &filter)?;
            println!("Transactions: {}", account.name);
            print!("{}", format_transaction_register(&transactions, settings));
        }
    }

    Ok(())
}
