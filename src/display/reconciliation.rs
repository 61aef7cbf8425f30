//! Reconciliation display formatting

use crate::config::Settings;
use crate::models::{Reconciliation, ReconciliationTotals};
use crate::services::reconciliation::{BulkToggleOutcome, ReconciliationDetail};
use crate::services::COMPLETION_TOLERANCE;

use super::transaction::format_transaction_register;
use super::{date, money};

/// Format session totals, with a hint on whether the session can be completed
pub fn format_totals(totals: &ReconciliationTotals, settings: &Settings) -> String {
    let mut output = String::new();

    for (label, amount) in [
        ("Beginning balance", totals.beginning_balance),
        ("Cleared deposits", totals.cleared_deposits),
        ("Cleared payments", totals.cleared_payments),
        ("Cleared balance", totals.cleared_balance),
        ("Statement ending", totals.statement_ending_balance),
        ("Difference", totals.difference),
    ] {
        output.push_str(&format!(
            "  {:<18} {:>14}\n",
            label,
            money(amount, settings)
        ));
    }

    if totals.difference.is_within(COMPLETION_TOLERANCE) {
        output.push_str("  Balanced: ready to complete\n");
    } else {
        output.push_str(&format!(
            "  Out of balance by {}\n",
            money(totals.difference, settings)
        ));
    }

    output
}

/// Format a session header, its totals, and the transactions it owns
pub fn format_reconciliation_detail(
    detail: &ReconciliationDetail,
    account_name: &str,
    settings: &Settings,
) -> String {
    let session = &detail.session;
    let mut output = String::new();

    output.push_str(&format!("Reconciliation: {}\n", session.id));
    output.push_str(&format!("  Account:        {}\n", account_name));
    output.push_str(&format!(
        "  Statement Date: {}\n",
        date(session.statement_date, settings)
    ));
    output.push_str(&format!("  Status:         {}\n", session.status));
    if let Some(completed_at) = session.completed_at {
        output.push_str(&format!(
            "  Completed:      {} by {}\n",
            completed_at.format("%Y-%m-%d %H:%M UTC"),
            session.completed_by.as_deref().unwrap_or("unknown")
        ));
    }
    if !session.notes.is_empty() {
        output.push_str(&format!("  Notes:          {}\n", session.notes));
    }
    output.push('\n');
    output.push_str(&format_totals(&session.totals(), settings));
    output.push('\n');
    output.push_str(&format!(
        "Cleared transactions ({}):\n",
        detail.transactions.len()
    ));
    output.push_str(&format_transaction_register(&detail.transactions, settings));

    output
}

/// Format an account's sessions, latest statement first
pub fn format_reconciliation_history(sessions: &[Reconciliation], settings: &Settings) -> String {
    if sessions.is_empty() {
        return "No reconciliations found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12} {:<10} {:<11} {:>14} {:>14} {:>12}\n",
        "ID", "Statement", "Status", "Beginning", "Ending", "Difference"
    ));
    output.push_str(&"-".repeat(78));
    output.push('\n');

    for session in sessions {
        output.push_str(&format!(
            "{:<12} {:<10} {:<11} {:>14} {:>14} {:>12}\n",
            session.id.to_string(),
            date(session.statement_date, settings),
            session.status.to_string(),
            money(session.beginning_balance, settings),
            money(session.statement_ending_balance, settings),
            money(session.difference, settings),
        ));
    }

    output
}

/// Format the result of a bulk toggle
pub fn format_bulk_outcome(outcome: &BulkToggleOutcome, settings: &Settings) -> String {
    let mut output = format!(
        "Applied to {} transaction(s), skipped {}\n",
        outcome.applied.len(),
        outcome.skipped.len()
    );
    for id in &outcome.skipped {
        output.push_str(&format!("  skipped {}\n", id));
    }
    output.push('\n');
    output.push_str(&format_totals(&outcome.totals, settings));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BankAccountId, BankTransactionId, Money};
    use chrono::NaiveDate;

    fn session() -> Reconciliation {
        Reconciliation::new(
            BankAccountId::new(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            Money::from_cents(130000),
            Money::from_cents(100000),
        )
    }

    #[test]
    fn test_totals_out_of_balance() {
        let output = format_totals(&session().totals(), &Settings::default());
        assert!(output.contains("Beginning balance"));
        assert!(output.contains("$1000.00"));
        assert!(output.contains("Out of balance by $300.00"));
    }

    #[test]
    fn test_totals_balanced() {
        let mut s = session();
        s.statement_ending_balance = s.beginning_balance;
        s.difference = Money::zero();
        let output = format_totals(&s.totals(), &Settings::default());
        assert!(output.contains("ready to complete"));
    }

    #[test]
    fn test_history() {
        let output = format_reconciliation_history(&[session()], &Settings::default());
        assert!(output.contains("rec-"));
        assert!(output.contains("2025-01-31"));
        assert!(output.contains("In Progress"));
        assert_eq!(
            format_reconciliation_history(&[], &Settings::default()),
            "No reconciliations found.\n"
        );
    }

    #[test]
    fn test_detail_lists_owned_transactions() {
        let detail = ReconciliationDetail {
            session: session(),
            transactions: Vec::new(),
        };
        let output = format_reconciliation_detail(&detail, "Operating", &Settings::default());
        assert!(output.contains("Account:        Operating"));
        assert!(output.contains("Cleared transactions (0):"));
    }

    #[test]
    fn test_bulk_outcome_lists_skips() {
        let skipped = BankTransactionId::new();
        let outcome = BulkToggleOutcome {
            totals: session().totals(),
            applied: vec![BankTransactionId::new()],
            skipped: vec![skipped],
        };
        let output = format_bulk_outcome(&outcome, &Settings::default());
        assert!(output.starts_with("Applied to 1 transaction(s), skipped 1"));
        assert!(output.contains(&format!("skipped {}", skipped)));
    }
}
