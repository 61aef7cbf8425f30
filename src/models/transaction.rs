//! Bank transaction model
//!
//! A money movement on a bank account. Amounts are signed: deposits and
//! interest are positive, withdrawals, checks, fees and transfers out are
//! negative. The store keeps whatever sign it is given.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BankAccountId, BankTransactionId, ReconciliationId};
use super::money::Money;

/// Kind of bank transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Check,
    Transfer,
    Fee,
    Interest,
    Adjustment,
}

impl TransactionType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "deposit" | "dep" => Some(Self::Deposit),
            "withdrawal" | "wd" => Some(Self::Withdrawal),
            "check" | "chk" | "cheque" => Some(Self::Check),
            "transfer" | "xfer" => Some(Self::Transfer),
            "fee" => Some(Self::Fee),
            "interest" | "int" => Some(Self::Interest),
            "adjustment" | "adj" => Some(Self::Adjustment),
            _ => None,
        }
    }

    /// Apply the conventional sign for this type to an entered amount
    ///
    /// Adjustments can go either way and keep the sign they were given.
    pub fn signed(&self, amount: Money) -> Money {
        match self {
            Self::Deposit | Self::Interest => amount.abs(),
            Self::Withdrawal | Self::Check | Self::Transfer | Self::Fee => -amount.abs(),
            Self::Adjustment => amount,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposit => write!(f, "Deposit"),
            Self::Withdrawal => write!(f, "Withdrawal"),
            Self::Check => write!(f, "Check"),
            Self::Transfer => write!(f, "Transfer"),
            Self::Fee => write!(f, "Fee"),
            Self::Interest => write!(f, "Interest"),
            Self::Adjustment => write!(f, "Adjustment"),
        }
    }
}

/// A transaction on a bank account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankTransaction {
    pub id: BankTransactionId,

    pub account_id: BankAccountId,

    pub date: NaiveDate,

    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    /// Signed amount (positive for money in, negative for money out)
    pub amount: Money,

    #[serde(default)]
    pub check_number: Option<String>,

    #[serde(default)]
    pub payee: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub reference: Option<String>,

    #[serde(default)]
    pub is_cleared: bool,

    /// Statement date of the owning reconciliation while cleared
    #[serde(default)]
    pub cleared_date: Option<NaiveDate>,

    /// Reconciliation this transaction was cleared into
    #[serde(default)]
    pub reconciliation_id: Option<ReconciliationId>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl BankTransaction {
    /// Create a new, uncleared transaction
    pub fn new(
        account_id: BankAccountId,
        date: NaiveDate,
        transaction_type: TransactionType,
        amount: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: BankTransactionId::new(),
            account_id,
            date,
            transaction_type,
            amount,
            check_number: None,
            payee: None,
            description: None,
            reference: None,
            is_cleared: false,
            cleared_date: None,
            reconciliation_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark as cleared into a reconciliation dated `statement_date`
    pub fn mark_cleared(&mut self, reconciliation_id: ReconciliationId, statement_date: NaiveDate) {
        self.is_cleared = true;
        self.cleared_date = Some(statement_date);
        self.reconciliation_id = Some(reconciliation_id);
        self.updated_at = Utc::now();
    }

    /// Revert to uncleared, detaching from any reconciliation
    pub fn mark_uncleared(&mut self) {
        self.is_cleared = false;
        self.cleared_date = None;
        self.reconciliation_id = None;
        self.updated_at = Utc::now();
    }

    /// Whether the cleared flag and its companion fields agree
    pub fn clearing_is_consistent(&self) -> bool {
        self.is_cleared == self.reconciliation_id.is_some()
            && self.is_cleared == self.cleared_date.is_some()
    }

    /// Short label used in audit entries and listings
    pub fn label(&self) -> String {
        let who = self
            .payee
            .as_deref()
            .or(self.description.as_deref())
            .unwrap_or("");
        format!("{} {} {}", self.date, self.transaction_type, who)
            .trim_end()
            .to_string()
    }
}

impl fmt::Display for BankTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.label(), self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn test_new_transaction_is_uncleared() {
        let txn = BankTransaction::new(
            BankAccountId::new(),
            date(5),
            TransactionType::Deposit,
            Money::from_cents(50000),
        );
        assert!(!txn.is_cleared);
        assert!(txn.cleared_date.is_none());
        assert!(txn.reconciliation_id.is_none());
        assert!(txn.clearing_is_consistent());
    }

    #[test]
    fn test_clear_and_unclear() {
        let mut txn = BankTransaction::new(
            BankAccountId::new(),
            date(10),
            TransactionType::Withdrawal,
            Money::from_cents(-20000),
        );
        let rec = ReconciliationId::new();

        txn.mark_cleared(rec, date(31));
        assert!(txn.is_cleared);
        assert_eq!(txn.cleared_date, Some(date(31)));
        assert_eq!(txn.reconciliation_id, Some(rec));
        assert!(txn.clearing_is_consistent());

        txn.mark_uncleared();
        assert!(!txn.is_cleared);
        assert!(txn.cleared_date.is_none());
        assert!(txn.reconciliation_id.is_none());
        assert!(txn.clearing_is_consistent());
    }

    #[test]
    fn test_signed_amounts() {
        let amount = Money::from_cents(2500);
        assert_eq!(TransactionType::Deposit.signed(-amount), amount);
        assert_eq!(TransactionType::Interest.signed(amount), amount);
        assert_eq!(TransactionType::Check.signed(amount), -amount);
        assert_eq!(TransactionType::Fee.signed(-amount), -amount);
        assert_eq!(TransactionType::Adjustment.signed(-amount), -amount);
    }

    #[test]
    fn test_type_parsing() {
        assert_eq!(TransactionType::parse("Deposit"), Some(TransactionType::Deposit));
        assert_eq!(TransactionType::parse("chk"), Some(TransactionType::Check));
        assert_eq!(TransactionType::parse("refund"), None);
    }

    #[test]
    fn test_display() {
        let mut txn = BankTransaction::new(
            BankAccountId::new(),
            date(10),
            TransactionType::Withdrawal,
            Money::from_cents(-20000),
        );
        txn.payee = Some("Acme Supply".into());
        assert_eq!(txn.to_string(), "2025-01-10 Withdrawal Acme Supply -$200.00");
    }

    #[test]
    fn test_serialization() {
        let mut txn = BankTransaction::new(
            BankAccountId::new(),
            date(5),
            TransactionType::Deposit,
            Money::from_cents(50000),
        );
        txn.reference = Some("DEP-001".into());
        let json = serde_json::to_string(&txn).unwrap();
        let back: BankTransaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, txn.id);
        assert_eq!(back.amount, txn.amount);
        assert_eq!(back.reference.as_deref(), Some("DEP-001"));
    }
}
