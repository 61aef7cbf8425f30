//! Bank account display formatting

use crate::config::Settings;
use crate::models::Money;
use crate::services::account::AccountSummary;

use super::{date, money};

/// Format a list of accounts with balances as a table
pub fn format_account_list(summaries: &[AccountSummary], settings: &Settings) -> String {
    if summaries.is_empty() {
        return "No bank accounts found.\n".to_string();
    }

    let name_width = summaries
        .iter()
        .map(|s| s.account.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let bank_width = summaries
        .iter()
        .map(|s| s.account.bank_name.chars().count() + 9)
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<bank_width$}  {:>7}  {:>14}  {:<12}  {}\n",
        "Name",
        "Bank",
        "Ledger",
        "Balance",
        "Reconciled",
        "Status",
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:-<bank_width$}  {:->7}  {:->14}  {:-<12}  {:-<10}\n",
        "", "", "", "", "", "",
    ));

    for summary in summaries {
        let account = &summary.account;
        let status = if !account.is_active {
            "Inactive".to_string()
        } else if summary.uncleared_count > 0 {
            format!("{} uncleared", summary.uncleared_count)
        } else {
            String::new()
        };
        let reconciled = account
            .last_reconciled_date
            .map(|d| date(d, settings))
            .unwrap_or_else(|| "never".to_string());

        output.push_str(&format!(
            "{:<name_width$}  {:<bank_width$}  {:>7}  {:>14}  {:<12}  {}\n",
            account.name,
            format!("{} {}", account.bank_name, account.masked_number()),
            account.ledger_account,
            money(account.current_balance, settings),
            reconciled,
            status,
        ));
    }

    let total = Money::checked_sum(
        summaries
            .iter()
            .filter(|s| s.account.is_active)
            .map(|s| s.account.current_balance),
    );
    output.push_str(&format!(
        "{:<name_width$}  {:<bank_width$}  {:>7}  {:>14}\n",
        "TOTAL",
        "",
        "",
        total
            .map(|t| money(t, settings))
            .unwrap_or_else(|| "overflow".to_string()),
    ));

    output
}

/// Format a single account's details
pub fn format_account_details(summary: &AccountSummary, settings: &Settings) -> String {
    let account = &summary.account;
    let mut output = String::new();

    output.push_str(&format!("Bank Account: {}\n", account.name));
    output.push_str(&format!("  ID:             {}\n", account.id));
    output.push_str(&format!("  Type:           {}\n", account.account_type));
    output.push_str(&format!(
        "  Bank:           {} {}\n",
        account.bank_name,
        account.masked_number()
    ));
    if let Some(routing) = &account.routing_number {
        output.push_str(&format!("  Routing:        {}\n", routing));
    }
    output.push_str(&format!("  Ledger Account: {}\n", account.ledger_account));
    output.push_str(&format!(
        "  Active:         {}\n",
        if account.is_active { "Yes" } else { "No" }
    ));
    output.push('\n');
    output.push_str(&format!(
        "  Opening Balance:  {} ({})\n",
        money(account.opening_balance, settings),
        date(account.opening_balance_date, settings)
    ));
    output.push_str(&format!(
        "  Current Balance:  {}\n",
        money(account.current_balance, settings)
    ));
    output.push_str(&format!(
        "  Transactions:     {} ({} uncleared)\n",
        summary.transaction_count, summary.uncleared_count
    ));

    output.push('\n');
    match (account.last_reconciled_date, account.last_reconciled_balance) {
        (Some(d), Some(balance)) => output.push_str(&format!(
            "  Last Reconciled:  {} at {}\n",
            date(d, settings),
            money(balance, settings)
        )),
        _ => output.push_str("  Last Reconciled:  never\n"),
    }

    if !account.notes.is_empty() {
        output.push('\n');
        output.push_str(&format!("  Notes: {}\n", account.notes));
    }

    output
}
