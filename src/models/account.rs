//! Bank account model
//!
//! A bank account mirrors one physical account at a bank and links to a single
//! asset account in the general ledger.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::BankAccountId;
use super::money::Money;

/// Type of bank account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BankAccountType {
    #[default]
    Checking,
    Savings,
    MoneyMarket,
    CreditCard,
}

impl BankAccountType {
    /// Parse account type from user input
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "checking" => Some(Self::Checking),
            "savings" => Some(Self::Savings),
            "money_market" | "moneymarket" | "mm" => Some(Self::MoneyMarket),
            "credit_card" | "creditcard" | "credit" => Some(Self::CreditCard),
            _ => None,
        }
    }
}

impl fmt::Display for BankAccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checking => write!(f, "Checking"),
            Self::Savings => write!(f, "Savings"),
            Self::MoneyMarket => write!(f, "Money Market"),
            Self::CreditCard => write!(f, "Credit Card"),
        }
    }
}

/// A bank account tracked for reconciliation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: BankAccountId,

    /// Display name, unique across accounts (e.g., "Operating")
    pub name: String,

    /// General-ledger account number this bank account posts to
    pub ledger_account: String,

    pub bank_name: String,

    /// Last four digits of the bank account number
    #[serde(default)]
    pub account_number_last4: Option<String>,

    #[serde(default)]
    pub routing_number: Option<String>,

    #[serde(rename = "type")]
    pub account_type: BankAccountType,

    pub opening_balance: Money,

    pub opening_balance_date: NaiveDate,

    /// Opening balance plus every recorded transaction; maintained by the ledger service
    pub current_balance: Money,

    /// Statement date of the most recent completed reconciliation
    pub last_reconciled_date: Option<NaiveDate>,

    /// Statement ending balance of the most recent completed reconciliation
    pub last_reconciled_balance: Option<Money>,

    pub is_active: bool,

    #[serde(default)]
    pub notes: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl BankAccount {
    /// Create a new active account whose current balance starts at the opening balance
    pub fn new(
        name: impl Into<String>,
        ledger_account: impl Into<String>,
        bank_name: impl Into<String>,
        opening_balance: Money,
        opening_balance_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: BankAccountId::new(),
            name: name.into(),
            ledger_account: ledger_account.into(),
            bank_name: bank_name.into(),
            account_number_last4: None,
            routing_number: None,
            account_type: BankAccountType::default(),
            opening_balance,
            opening_balance_date,
            current_balance: opening_balance,
            last_reconciled_date: None,
            last_reconciled_balance: None,
            is_active: true,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Stamp the reconciled watermark
    pub fn set_reconciled(&mut self, date: NaiveDate, balance: Money) {
        self.last_reconciled_date = Some(date);
        self.last_reconciled_balance = Some(balance);
        self.updated_at = Utc::now();
    }

    /// Remove the reconciled watermark
    pub fn clear_reconciled(&mut self) {
        self.last_reconciled_date = None;
        self.last_reconciled_balance = None;
        self.updated_at = Utc::now();
    }

    /// Masked account number for display ("****1234")
    pub fn masked_number(&self) -> String {
        match &self.account_number_last4 {
            Some(last4) => format!("****{}", last4),
            None => "****".to_string(),
        }
    }

    /// Validate the account
    pub fn validate(&self) -> Result<(), AccountValidationError> {
        if self.name.trim().is_empty() {
            return Err(AccountValidationError::EmptyName);
        }
        if self.name.len() > 100 {
            return Err(AccountValidationError::NameTooLong(self.name.len()));
        }
        if self.bank_name.trim().is_empty() {
            return Err(AccountValidationError::EmptyBankName);
        }
        if self.ledger_account.trim().is_empty() {
            return Err(AccountValidationError::MissingLedgerAccount);
        }
        if let Some(last4) = &self.account_number_last4 {
            if last4.len() != 4 || !last4.chars().all(|c| c.is_ascii_digit()) {
                return Err(AccountValidationError::InvalidLast4(last4.clone()));
            }
        }
        Ok(())
    }
}

impl fmt::Display for BankAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {})",
            self.name,
            self.bank_name,
            self.masked_number()
        )
    }
}

/// Validation errors for bank accounts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountValidationError {
    #[error("Account name cannot be empty")]
    EmptyName,
    #[error("Account name too long ({0} chars, max 100)")]
    NameTooLong(usize),
    #[error("Bank name cannot be empty")]
    EmptyBankName,
    #[error("A ledger account is required")]
    MissingLedgerAccount,
    #[error("Last four digits must be exactly 4 digits, got '{0}'")]
    InvalidLast4(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opening_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn test_new_account_starts_at_opening_balance() {
        let account = BankAccount::new(
            "Operating",
            "1010",
            "First National",
            Money::from_cents(100000),
            opening_date(),
        );
        assert_eq!(account.current_balance, account.opening_balance);
        assert!(account.is_active);
        assert!(account.last_reconciled_date.is_none());
        assert_eq!(account.account_type, BankAccountType::Checking);
    }

    #[test]
    fn test_watermark() {
        let mut account =
            BankAccount::new("Operating", "1010", "First National", Money::zero(), opening_date());
        let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();

        account.set_reconciled(date, Money::from_cents(130000));
        assert_eq!(account.last_reconciled_date, Some(date));
        assert_eq!(account.last_reconciled_balance, Some(Money::from_cents(130000)));

        account.clear_reconciled();
        assert!(account.last_reconciled_date.is_none());
        assert!(account.last_reconciled_balance.is_none());
    }

    #[test]
    fn test_validation() {
        let mut account =
            BankAccount::new("Operating", "1010", "First National", Money::zero(), opening_date());
        assert!(account.validate().is_ok());

        account.account_number_last4 = Some("12a4".into());
        assert!(matches!(
            account.validate(),
            Err(AccountValidationError::InvalidLast4(_))
        ));

        account.account_number_last4 = Some("1234".into());
        account.ledger_account = " ".into();
        assert_eq!(
            account.validate(),
            Err(AccountValidationError::MissingLedgerAccount)
        );

        account.name = String::new();
        assert_eq!(account.validate(), Err(AccountValidationError::EmptyName));
    }

    #[test]
    fn test_account_type_parsing() {
        assert_eq!(BankAccountType::parse("checking"), Some(BankAccountType::Checking));
        assert_eq!(
            BankAccountType::parse("Money Market"),
            Some(BankAccountType::MoneyMarket)
        );
        assert_eq!(
            BankAccountType::parse("credit-card"),
            Some(BankAccountType::CreditCard)
        );
        assert_eq!(BankAccountType::parse("brokerage"), None);
    }

    #[test]
    fn test_display() {
        let mut account =
            BankAccount::new("Operating", "1010", "First National", Money::zero(), opening_date());
        account.account_number_last4 = Some("1234".into());
        assert_eq!(account.to_string(), "Operating (First National ****1234)");
    }
}
