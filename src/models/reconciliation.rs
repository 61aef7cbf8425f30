//! Reconciliation session model
//!
//! One attempt to match a bank statement's ending balance against the
//! transactions cleared into it. Totals are always derived from the current
//! set of owned transactions via [`ReconciliationTotals::compute`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BankAccountId, ReconciliationId};
use super::money::Money;
use super::transaction::BankTransaction;

/// Lifecycle state of a reconciliation session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    #[default]
    InProgress,
    Completed,
    Voided,
}

impl fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "In Progress"),
            Self::Completed => write!(f, "Completed"),
            Self::Voided => write!(f, "Voided"),
        }
    }
}

/// Running totals of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationTotals {
    pub beginning_balance: Money,
    pub cleared_deposits: Money,
    pub cleared_payments: Money,
    pub cleared_balance: Money,
    pub statement_ending_balance: Money,
    pub difference: Money,
}

impl ReconciliationTotals {
    /// Derive totals from the transactions owned by a session
    ///
    /// Deposits sum the positive amounts, payments sum the magnitudes of the
    /// negative ones. Returns `None` if any total does not fit in `Money`.
    pub fn compute<'a>(
        beginning_balance: Money,
        statement_ending_balance: Money,
        owned: impl IntoIterator<Item = &'a BankTransaction>,
    ) -> Option<Self> {
        let mut cleared_deposits = Money::zero();
        let mut cleared_payments = Money::zero();

        for txn in owned {
            if txn.amount.is_positive() {
                cleared_deposits = cleared_deposits.checked_add(txn.amount)?;
            } else if txn.amount.is_negative() {
                cleared_payments = cleared_payments.checked_sub(txn.amount)?;
            }
        }

        let cleared_balance = beginning_balance
            .checked_add(cleared_deposits)?
            .checked_sub(cleared_payments)?;
        Some(Self {
            beginning_balance,
            cleared_deposits,
            cleared_payments,
            cleared_balance,
            statement_ending_balance,
            difference: statement_ending_balance.checked_sub(cleared_balance)?,
        })
    }
}

/// A reconciliation session against one bank statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reconciliation {
    pub id: ReconciliationId,

    pub account_id: BankAccountId,

    pub statement_date: NaiveDate,

    /// Ending balance as printed on the statement
    pub statement_ending_balance: Money,

    /// Carried forward from the previous completed session (or the opening balance)
    pub beginning_balance: Money,

    pub cleared_deposits: Money,

    pub cleared_payments: Money,

    pub cleared_balance: Money,

    pub difference: Money,

    #[serde(default)]
    pub status: ReconciliationStatus,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub completed_by: Option<String>,

    #[serde(default)]
    pub notes: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Reconciliation {
    /// Open a new in-progress session with nothing cleared yet
    pub fn new(
        account_id: BankAccountId,
        statement_date: NaiveDate,
        statement_ending_balance: Money,
        beginning_balance: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ReconciliationId::new(),
            account_id,
            statement_date,
            statement_ending_balance,
            beginning_balance,
            cleared_deposits: Money::zero(),
            cleared_payments: Money::zero(),
            cleared_balance: beginning_balance,
            difference: statement_ending_balance - beginning_balance,
            status: ReconciliationStatus::InProgress,
            completed_at: None,
            completed_by: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == ReconciliationStatus::InProgress
    }

    pub fn is_completed(&self) -> bool {
        self.status == ReconciliationStatus::Completed
    }

    /// Current totals as stored on the session
    pub fn totals(&self) -> ReconciliationTotals {
        ReconciliationTotals {
            beginning_balance: self.beginning_balance,
            cleared_deposits: self.cleared_deposits,
            cleared_payments: self.cleared_payments,
            cleared_balance: self.cleared_balance,
            statement_ending_balance: self.statement_ending_balance,
            difference: self.difference,
        }
    }

    /// Overwrite the stored totals with freshly computed ones
    pub fn apply_totals(&mut self, totals: ReconciliationTotals) {
        self.cleared_deposits = totals.cleared_deposits;
        self.cleared_payments = totals.cleared_payments;
        self.cleared_balance = totals.cleared_balance;
        self.difference = totals.difference;
        self.updated_at = Utc::now();
    }

    pub fn mark_completed(&mut self, completed_by: impl Into<String>) {
        let now = Utc::now();
        self.status = ReconciliationStatus::Completed;
        self.completed_at = Some(now);
        self.completed_by = Some(completed_by.into());
        self.updated_at = now;
    }

    pub fn mark_voided(&mut self) {
        self.status = ReconciliationStatus::Voided;
        self.updated_at = Utc::now();
    }

    /// Return a completed session to in-progress
    pub fn reopen(&mut self) {
        self.status = ReconciliationStatus::InProgress;
        self.completed_at = None;
        self.completed_by = None;
        self.updated_at = Utc::now();
    }
}

impl fmt::Display for Reconciliation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} statement {} ending {} [{}]",
            self.id, self.statement_date, self.statement_ending_balance, self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn test_new_session_totals() {
        let session = Reconciliation::new(
            BankAccountId::new(),
            date(1, 31),
            Money::from_cents(130000),
            Money::from_cents(100000),
        );
        assert!(session.is_in_progress());
        assert_eq!(session.cleared_deposits, Money::zero());
        assert_eq!(session.cleared_payments, Money::zero());
        assert_eq!(session.cleared_balance, Money::from_cents(100000));
        assert_eq!(session.difference, Money::from_cents(30000));
    }

    #[test]
    fn test_compute_totals() {
        let account = BankAccountId::new();
        let deposit =
            BankTransaction::new(account, date(1, 5), TransactionType::Deposit, Money::from_cents(50000));
        let withdrawal = BankTransaction::new(
            account,
            date(1, 10),
            TransactionType::Withdrawal,
            Money::from_cents(-20000),
        );

        let totals = ReconciliationTotals::compute(
            Money::from_cents(100000),
            Money::from_cents(130000),
            [&deposit, &withdrawal],
        )
        .unwrap();
        assert_eq!(totals.cleared_deposits, Money::from_cents(50000));
        assert_eq!(totals.cleared_payments, Money::from_cents(20000));
        assert_eq!(totals.cleared_balance, Money::from_cents(130000));
        assert!(totals.difference.is_zero());

        let partial = ReconciliationTotals::compute(
            Money::from_cents(100000),
            Money::from_cents(130000),
            [&deposit],
        )
        .unwrap();
        assert_eq!(partial.cleared_balance, Money::from_cents(150000));
        assert_eq!(partial.difference, Money::from_cents(-20000));
    }

    #[test]
    fn test_compute_totals_overflow() {
        let account = BankAccountId::new();
        let huge = BankTransaction::new(
            account,
            date(1, 5),
            TransactionType::Deposit,
            Money::from_cents(i64::MAX / 2 + 1),
        );

        assert!(ReconciliationTotals::compute(Money::zero(), Money::zero(), [&huge, &huge]).is_none());
        assert!(
            ReconciliationTotals::compute(Money::from_cents(i64::MAX / 2 + 1), Money::zero(), [&huge])
                .is_none()
        );
    }

    #[test]
    fn test_status_transitions() {
        let mut session = Reconciliation::new(
            BankAccountId::new(),
            date(1, 31),
            Money::zero(),
            Money::zero(),
        );

        session.mark_completed("controller");
        assert!(session.is_completed());
        assert!(session.completed_at.is_some());
        assert_eq!(session.completed_by.as_deref(), Some("controller"));

        session.reopen();
        assert!(session.is_in_progress());
        assert!(session.completed_at.is_none());
        assert!(session.completed_by.is_none());

        session.mark_voided();
        assert_eq!(session.status, ReconciliationStatus::Voided);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ReconciliationStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
