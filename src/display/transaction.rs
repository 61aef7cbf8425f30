//! Transaction display formatting

use crate::config::Settings;
use crate::models::BankTransaction;

use super::{date, money, truncate};

/// Format a single transaction as a register row
pub fn format_transaction_row(txn: &BankTransaction, settings: &Settings) -> String {
    let status_icon = if txn.is_cleared { "C" } else { " " };
    let who = txn
        .payee
        .as_deref()
        .or(txn.description.as_deref())
        .unwrap_or("(no payee)");
    let check = txn
        .check_number
        .as_deref()
        .map(|n| format!("#{}", n))
        .unwrap_or_default();

    format!(
        "{} {:<13} {:<10} {:<11} {:<6} {:<24} {:>12}",
        status_icon,
        txn.id.to_string(),
        date(txn.date, settings),
        txn.transaction_type.to_string(),
        check,
        truncate(who, 24),
        money(txn.amount, settings)
    )
}

/// Format a list of transactions as a register
pub fn format_transaction_register(transactions: &[BankTransaction], settings: &Settings) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:1} {:<13} {:<10} {:<11} {:<6} {:<24} {:>12}\n",
        "C", "ID", "Date", "Type", "Check", "Payee", "Amount"
    ));
    output.push_str(&"-".repeat(85));
    output.push('\n');

    for txn in transactions {
        output.push_str(&format_transaction_row(txn, settings));
        output.push('\n');
    }

    output
}

/// Format transaction details for display
pub fn format_transaction_details(txn: &BankTransaction, settings: &Settings) -> String {
    let mut output = String::new();

    output.push_str(&format!("Transaction: {}\n", txn.id));
    output.push_str(&format!("  Date:        {}\n", date(txn.date, settings)));
    output.push_str(&format!("  Type:        {}\n", txn.transaction_type));
    output.push_str(&format!("  Amount:      {}\n", money(txn.amount, settings)));

    for (label, value) in [
        ("Check #", &txn.check_number),
        ("Payee", &txn.payee),
        ("Description", &txn.description),
        ("Reference", &txn.reference),
    ] {
        if let Some(value) = value {
            output.push_str(&format!("  {:<12} {}\n", format!("{}:", label), value));
        }
    }

    match (txn.reconciliation_id, txn.cleared_date) {
        (Some(rec), Some(cleared)) => output.push_str(&format!(
            "  Cleared:     {} in {}\n",
            date(cleared, settings),
            rec
        )),
        _ => output.push_str("  Cleared:     no\n"),
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BankAccountId, Money, ReconciliationId, TransactionType};
    use chrono::NaiveDate;

    fn check() -> BankTransaction {
        let mut txn = BankTransaction::new(
            BankAccountId::new(),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            TransactionType::Check,
            Money::from_cents(-20000),
        );
        txn.check_number = Some("1042".into());
        txn.payee = Some("Acme Supply".into());
        txn
    }

    #[test]
    fn test_register_row() {
        let row = format_transaction_row(&check(), &Settings::default());
        assert!(row.starts_with("  txn-"));
        assert!(row.contains("#1042"));
        assert!(row.contains("Acme Supply"));
        assert!(row.ends_with("-$200.00"));
    }

    #[test]
    fn test_empty_register() {
        assert_eq!(
            format_transaction_register(&[], &Settings::default()),
            "No transactions found.\n"
        );
    }

    #[test]
    fn test_details_show_clearing() {
        let mut txn = check();
        let settings = Settings::default();
        assert!(format_transaction_details(&txn, &settings).contains("Cleared:     no"));

        txn.mark_cleared(
            ReconciliationId::new(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        );
        let output = format_transaction_details(&txn, &settings);
        assert!(output.contains("Cleared:     2025-01-31 in rec-"));
        assert!(output.contains("Check #:"));
    }
}
