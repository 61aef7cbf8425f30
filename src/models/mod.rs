//! Core data models for bankrec
//!
//! Bank accounts, the transactions recorded against them, and the
//! reconciliation sessions that clear those transactions against statements.

pub mod account;
pub mod ids;
pub mod money;
pub mod reconciliation;
pub mod transaction;

pub use account::{AccountValidationError, BankAccount, BankAccountType};
pub use ids::{BankAccountId, BankTransactionId, ReconciliationId};
pub use money::{Money, MoneyParseError};
pub use reconciliation::{Reconciliation, ReconciliationStatus, ReconciliationTotals};
pub use transaction::{BankTransaction, TransactionType};
