//! Service layer for bankrec
//!
//! Business logic on top of the storage layer: validation, derived balances,
//! and the reconciliation state machine. Every mutating call runs as one
//! unit of work on [`Storage`](crate::storage::Storage).

pub mod account;
pub mod reconciliation;
pub mod transaction;

pub use account::{AccountPatch, AccountService, AccountSummary, CreateAccountInput};
pub use reconciliation::{
    BulkToggleOutcome, ReconciliationDetail, ReconciliationService, COMPLETION_TOLERANCE,
};
pub use transaction::{
    CreateTransactionInput, TransactionFilter, TransactionPatch, TransactionService,
};
