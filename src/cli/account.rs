//! Bank account CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::display::account::{format_account_details, format_account_list};
use crate::error::{RecError, RecResult};
use crate::models::BankAccountType;
use crate::services::{AccountPatch, AccountService, CreateAccountInput};
use crate::storage::Storage;

use super::{parse_date_or_today, parse_money};

/// Bank account subcommands
#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new bank account
    Create {
        /// Account name
        name: String,
        /// Ledger (asset) account number this bank account posts to
        #[arg(short, long)]
        ledger: String,
        /// Name of the bank
        #[arg(short, long)]
        bank: String,
        /// Account type (checking, savings, money_market, credit_card)
        #[arg(short = 't', long, default_value = "checking")]
        account_type: String,
        /// Last four digits of the account number
        #[arg(long)]
        last4: Option<String>,
        /// Bank routing number
        #[arg(long)]
        routing: Option<String>,
        /// Opening balance (e.g., "1000.00")
        #[arg(short = 'o', long, default_value = "0")]
        opening_balance: String,
        /// Date of the opening balance (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List bank accounts
    List {
        /// Include inactive accounts
        #[arg(short, long)]
        all: bool,
    },
    /// Show account details
    Show {
        /// Account name or ID
        account: String,
    },
    /// Edit an account
    Edit {
        /// Account name or ID
        account: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        bank: Option<String>,
        #[arg(short = 't', long)]
        account_type: Option<String>,
        #[arg(long)]
        last4: Option<String>,
        #[arg(long)]
        routing: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Mark an account inactive
    Deactivate {
        /// Account name or ID
        account: String,
    },
    /// Mark an account active again
    Activate {
        /// Account name or ID
        account: String,
    },
}

fn parse_account_type(input: &str) -> RecResult<BankAccountType> {
    BankAccountType::parse(input).ok_or_else(|| {
        RecError::Validation(format!(
            "Invalid account type: '{}'. Valid types: checking, savings, money_market, credit_card",
            input
        ))
    })
}

/// Handle an account command
pub fn handle_account_command(
    storage: &Storage,
    settings: &Settings,
    cmd: AccountCommands,
) -> RecResult<()> {
    let service = AccountService::new(storage);

    match cmd {
        AccountCommands::Create {
            name,
            ledger,
            bank,
            account_type,
            last4,
            routing,
            opening_balance,
            date,
            notes,
        } => {
            let mut input = CreateAccountInput::new(
                name,
                ledger,
                bank,
                parse_money(&opening_balance)?,
                parse_date_or_today(date.as_deref())?,
            );
            input.account_type = parse_account_type(&account_type)?;
            input.account_number_last4 = last4;
            input.routing_number = routing;
            input.notes = notes;

            let account = service.create(input)?;

            println!("Created bank account: {}", account.name);
            println!("  Type: {}", account.account_type);
            println!("  Ledger Account: {}", account.ledger_account);
            println!(
                "  Opening Balance: {}",
                account
                    .opening_balance
                    .format_with_symbol(&settings.currency_symbol)
            );
            println!("  ID: {}", account.id);
        }

        AccountCommands::List { all } => {
            let summaries = service.list_with_summaries(all)?;
            print!("{}", format_account_list(&summaries, settings));
        }

        AccountCommands::Show { account } => {
            let found = service.resolve(&account)?;
            let summary = service.get_summary(found)?;
            print!("{}", format_account_details(&summary, settings));
        }

        AccountCommands::Edit {
            account,
            name,
            bank,
            account_type,
            last4,
            routing,
            notes,
        } => {
            let found = service.resolve(&account)?;
            let patch = AccountPatch {
                name,
                bank_name: bank,
                account_type: account_type.as_deref().map(parse_account_type).transpose()?,
                account_number_last4: last4,
                routing_number: routing,
                is_active: None,
                notes,
            };

            if patch.is_empty() {
                println!("No changes specified. Use --help to see editable fields.");
                return Ok(());
            }

            let updated = service.update(found.id, patch)?;
            println!("Updated bank account: {}", updated.name);
        }

        AccountCommands::Deactivate { account } => {
            let found = service.resolve(&account)?;
            let patch = AccountPatch {
                is_active: Some(false),
                ..AccountPatch::default()
            };
            let updated = service.update(found.id, patch)?;
            println!("Deactivated bank account: {}", updated.name);
        }

        AccountCommands::Activate { account } => {
            let found = service.resolve(&account)?;
            let patch = AccountPatch {
                is_active: Some(true),
                ..AccountPatch::default()
            };
            let updated = service.update(found.id, patch)?;
            println!("Activated bank account: {}", updated.name);
        }
    }

    Ok(())
}
