//! Transaction service
//!
//! Records, edits, and removes bank transactions. Every mutation recomputes
//! the owning account's balance in the same unit of work. Cleared
//! transactions are frozen until their reconciliation releases them.

use chrono::{NaiveDate, Utc};
use tracing::debug;

use crate::audit::EntityType;
use crate::error::{RecError, RecResult};
use crate::models::{
    BankAccountId, BankTransaction, BankTransactionId, Money, ReconciliationId, TransactionType,
};
use crate::services::account::AccountService;
use crate::storage::Storage;

/// Service for bank transaction management
pub struct TransactionService<'a> {
    storage: &'a Storage,
}

/// Fields for a new transaction
///
/// The amount is stored exactly as given; callers apply the sign convention
/// of the transaction type (see [`TransactionType::signed`]).
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    pub date: NaiveDate,
    pub transaction_type: TransactionType,
    pub amount: Money,
    pub check_number: Option<String>,
    pub payee: Option<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
}

impl CreateTransactionInput {
    pub fn new(date: NaiveDate, transaction_type: TransactionType, amount: Money) -> Self {
        Self {
            date,
            transaction_type,
            amount,
            check_number: None,
            payee: None,
            description: None,
            reference: None,
        }
    }

    pub fn payee(mut self, payee: impl Into<String>) -> Self {
        self.payee = Some(payee.into());
        self
    }
}

/// Partial update of a transaction; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub date: Option<NaiveDate>,
    pub transaction_type: Option<TransactionType>,
    pub amount: Option<Money>,
    pub check_number: Option<String>,
    pub payee: Option<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
}

/// Filter options for listing transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub cleared: Option<bool>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<usize>,
}

impl TransactionFilter {
    fn matches(&self, txn: &BankTransaction) -> bool {
        self.cleared.map_or(true, |c| txn.is_cleared == c)
            && self.start_date.map_or(true, |d| txn.date >= d)
            && self.end_date.map_or(true, |d| txn.date <= d)
    }
}

/// Oldest first, ties broken by entry order
fn sort_chronological(transactions: &mut [BankTransaction]) {
    transactions.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
}

impl<'a> TransactionService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Record a new, uncleared transaction on an account
    pub fn create(
        &self,
        account_id: BankAccountId,
        input: CreateTransactionInput,
    ) -> RecResult<BankTransaction> {
        let txn = self.storage.atomically(|| {
            let accounts = AccountService::new(self.storage);
            accounts.require(account_id)?;

            let mut txn = BankTransaction::new(
                account_id,
                input.date,
                input.transaction_type,
                input.amount,
            );
            txn.check_number = input.check_number.clone();
            txn.payee = input.payee.clone();
            txn.description = input.description.clone();
            txn.reference = input.reference.clone();

            self.storage.transactions.upsert(txn.clone())?;
            self.storage.log_create(
                EntityType::BankTransaction,
                txn.id.to_string(),
                Some(txn.label()),
                &txn,
            )?;
            accounts.recompute_balance_in_unit(account_id)?;
            Ok(txn)
        })?;

        debug!(transaction_id = %txn.id, bank_account_id = %account_id, amount = %txn.amount, "Transaction recorded");
        Ok(txn)
    }

    pub fn get(&self, id: BankTransactionId) -> RecResult<Option<BankTransaction>> {
        self.storage.transactions.get(id)
    }

    pub fn require(&self, id: BankTransactionId) -> RecResult<BankTransaction> {
        self.storage
            .transactions
            .get(id)?
            .ok_or_else(|| RecError::transaction_not_found(id.to_string()))
    }

    /// Find a transaction by full ID or unambiguous ID prefix
    pub fn find(&self, identifier: &str) -> RecResult<Option<BankTransaction>> {
        if let Ok(id) = identifier.parse::<BankTransactionId>() {
            return self.storage.transactions.get(id);
        }

        let mut matches = self.storage.transactions.find_by_short_id(identifier)?;
        if matches.len() == 1 {
            return Ok(matches.pop());
        }

        Ok(None)
    }

    pub fn resolve(&self, identifier: &str) -> RecResult<BankTransaction> {
        self.find(identifier)?
            .ok_or_else(|| RecError::transaction_not_found(identifier))
    }

    /// Apply a partial update to an uncleared transaction
    pub fn update(
        &self,
        id: BankTransactionId,
        patch: TransactionPatch,
    ) -> RecResult<BankTransaction> {
        self.storage.atomically(|| {
            let mut txn = self.require(id)?;
            if txn.is_cleared {
                return Err(RecError::conflict("Cannot modify a cleared transaction"));
            }

            let before = txn.clone();
            if let Some(date) = patch.date {
                txn.date = date;
            }
            if let Some(transaction_type) = patch.transaction_type {
                txn.transaction_type = transaction_type;
            }
            if let Some(amount) = patch.amount {
                txn.amount = amount;
            }
            if let Some(check_number) = &patch.check_number {
                txn.check_number = Some(check_number.clone());
            }
            if let Some(payee) = &patch.payee {
                txn.payee = Some(payee.clone());
            }
            if let Some(description) = &patch.description {
                txn.description = Some(description.clone());
            }
            if let Some(reference) = &patch.reference {
                txn.reference = Some(reference.clone());
            }
            txn.updated_at = Utc::now();

            self.storage.transactions.upsert(txn.clone())?;
            self.storage.log_update(
                EntityType::BankTransaction,
                txn.id.to_string(),
                Some(txn.label()),
                &before,
                &txn,
            )?;
            AccountService::new(self.storage).recompute_balance_in_unit(txn.account_id)?;
            Ok(txn)
        })
    }

    /// Remove an uncleared transaction
    pub fn delete(&self, id: BankTransactionId) -> RecResult<BankTransaction> {
        self.storage.atomically(|| {
            let txn = self.require(id)?;
            if txn.is_cleared {
                return Err(RecError::conflict("Cannot delete a cleared transaction"));
            }

            self.storage.transactions.delete(id)?;
            self.storage.log_delete(
                EntityType::BankTransaction,
                txn.id.to_string(),
                Some(txn.label()),
                &txn,
            )?;
            AccountService::new(self.storage).recompute_balance_in_unit(txn.account_id)?;
            Ok(txn)
        })
    }

    /// Transactions of an account matching a filter, newest first
    pub fn list(
        &self,
        account_id: BankAccountId,
        filter: &TransactionFilter,
    ) -> RecResult<Vec<BankTransaction>> {
        let transactions = self.storage.transactions.get_by_account(account_id)?;
        let matching = transactions.into_iter().filter(|t| filter.matches(t));

        Ok(match filter.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    /// Uncleared transactions dated on or before `as_of`, oldest first
    pub fn list_uncleared(
        &self,
        account_id: BankAccountId,
        as_of: Option<NaiveDate>,
    ) -> RecResult<Vec<BankTransaction>> {
        let mut transactions: Vec<_> = self
            .storage
            .transactions
            .get_by_account(account_id)?
            .into_iter()
            .filter(|t| !t.is_cleared && as_of.map_or(true, |d| t.date <= d))
            .collect();
        sort_chronological(&mut transactions);
        Ok(transactions)
    }

    /// Every transaction cleared into a session, oldest first
    pub fn list_by_reconciliation(
        &self,
        reconciliation_id: ReconciliationId,
    ) -> RecResult<Vec<BankTransaction>> {
        let mut transactions = self
            .storage
            .transactions
            .get_by_reconciliation(reconciliation_id)?;
        sort_chronological(&mut transactions);
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::RecPaths;
    use crate::models::BankAccount;
    use crate::services::account::CreateAccountInput;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = RecPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn create_account(storage: &Storage) -> BankAccount {
        AccountService::new(storage)
            .create(CreateAccountInput::new(
                "Operating",
                "1000",
                "First National",
                Money::from_cents(100000),
                date(1, 1),
            ))
            .unwrap()
    }

    fn balance(storage: &Storage, id: BankAccountId) -> Money {
        storage.accounts.get(id).unwrap().unwrap().current_balance
    }

    #[test]
    fn test_create_recomputes_balance() {
        let (_temp_dir, storage) = create_test_storage();
        let account = create_account(&storage);
        let service = TransactionService::new(&storage);

        service
            .create(
                account.id,
                CreateTransactionInput::new(date(1, 5), TransactionType::Deposit, Money::from_cents(50000)),
            )
            .unwrap();
        service
            .create(
                account.id,
                CreateTransactionInput::new(
                    date(1, 10),
                    TransactionType::Withdrawal,
                    Money::from_cents(-20000),
                ),
            )
            .unwrap();

        assert_eq!(balance(&storage, account.id), Money::from_cents(130000));
    }

    #[test]
    fn test_create_for_missing_account() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage);

        let err = service
            .create(
                BankAccountId::new(),
                CreateTransactionInput::new(date(1, 5), TransactionType::Deposit, Money::from_cents(1)),
            )
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(storage.transactions.count().unwrap(), 0);
    }

    #[test]
    fn test_amount_stored_as_given() {
        let (_temp_dir, storage) = create_test_storage();
        let account = create_account(&storage);
        let service = TransactionService::new(&storage);

        let txn = service
            .create(
                account.id,
                CreateTransactionInput::new(date(1, 5), TransactionType::Withdrawal, Money::from_cents(700)),
            )
            .unwrap();
        assert_eq!(txn.amount, Money::from_cents(700));
    }

    #[test]
    fn test_update_coalesces_and_recomputes() {
        let (_temp_dir, storage) = create_test_storage();
        let account = create_account(&storage);
        let service = TransactionService::new(&storage);

        let txn = service
            .create(
                account.id,
                CreateTransactionInput::new(date(1, 5), TransactionType::Deposit, Money::from_cents(50000))
                    .payee("Customer A"),
            )
            .unwrap();

        let updated = service
            .update(
                txn.id,
                TransactionPatch {
                    amount: Some(Money::from_cents(45000)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.amount, Money::from_cents(45000));
        assert_eq!(updated.payee.as_deref(), Some("Customer A"));
        assert_eq!(updated.date, date(1, 5));
        assert_eq!(balance(&storage, account.id), Money::from_cents(145000));
    }

    #[test]
    fn test_cleared_transactions_are_frozen() {
        let (_temp_dir, storage) = create_test_storage();
        let account = create_account(&storage);
        let service = TransactionService::new(&storage);

        let txn = service
            .create(
                account.id,
                CreateTransactionInput::new(date(1, 5), TransactionType::Deposit, Money::from_cents(50000)),
            )
            .unwrap();

        let mut cleared = txn.clone();
        cleared.mark_cleared(ReconciliationId::new(), date(1, 31));
        storage.transactions.upsert(cleared).unwrap();

        let err = service
            .update(
                txn.id,
                TransactionPatch {
                    amount: Some(Money::from_cents(1)),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_conflict());

        assert!(service.delete(txn.id).unwrap_err().is_conflict());
        assert_eq!(service.require(txn.id).unwrap().amount, Money::from_cents(50000));
    }

    #[test]
    fn test_delete_recomputes_balance() {
        let (_temp_dir, storage) = create_test_storage();
        let account = create_account(&storage);
        let service = TransactionService::new(&storage);

        let txn = service
            .create(
                account.id,
                CreateTransactionInput::new(date(1, 5), TransactionType::Fee, Money::from_cents(-2500)),
            )
            .unwrap();
        assert_eq!(balance(&storage, account.id), Money::from_cents(97500));

        service.delete(txn.id).unwrap();
        assert_eq!(balance(&storage, account.id), Money::from_cents(100000));
        assert!(service.get(txn.id).unwrap().is_none());
        assert!(service.delete(txn.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_uncleared_as_of_chronological() {
        let (_temp_dir, storage) = create_test_storage();
        let account = create_account(&storage);
        let service = TransactionService::new(&storage);

        for (m, d) in [(2, 3), (1, 20), (1, 5)] {
            service
                .create(
                    account.id,
                    CreateTransactionInput::new(date(m, d), TransactionType::Deposit, Money::from_cents(100)),
                )
                .unwrap();
        }

        let all = service.list_uncleared(account.id, None).unwrap();
        let dates: Vec<_> = all.iter().map(|t| t.date).collect();
        assert_eq!(dates, vec![date(1, 5), date(1, 20), date(2, 3)]);

        let january = service.list_uncleared(account.id, Some(date(1, 31))).unwrap();
        assert_eq!(january.len(), 2);
    }

    #[test]
    fn test_list_filters() {
        let (_temp_dir, storage) = create_test_storage();
        let account = create_account(&storage);
        let service = TransactionService::new(&storage);

        for d in [5, 10, 15, 20] {
            service
                .create(
                    account.id,
                    CreateTransactionInput::new(date(1, d), TransactionType::Deposit, Money::from_cents(100)),
                )
                .unwrap();
        }

        let newest = service
            .list(
                account.id,
                &TransactionFilter {
                    limit: Some(2),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(newest.len(), 2);
        assert_eq!(newest[0].date, date(1, 20));

        let ranged = service
            .list(
                account.id,
                &TransactionFilter {
                    start_date: Some(date(1, 8)),
                    end_date: Some(date(1, 15)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(ranged.len(), 2);

        let cleared = service
            .list(
                account.id,
                &TransactionFilter {
                    cleared: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(cleared.is_empty());
    }

    #[test]
    fn test_find_by_short_id() {
        let (_temp_dir, storage) = create_test_storage();
        let account = create_account(&storage);
        let service = TransactionService::new(&storage);

        let txn = service
            .create(
                account.id,
                CreateTransactionInput::new(date(1, 5), TransactionType::Deposit, Money::from_cents(100)),
            )
            .unwrap();

        assert_eq!(service.resolve(&txn.id.to_string()).unwrap().id, txn.id);
        assert!(service.resolve("txn-zzzz").unwrap_err().is_not_found());
    }

    #[test]
    fn test_balance_overflow_is_rejected_and_store_stays_usable() {
        let (_temp_dir, storage) = create_test_storage();
        let account = AccountService::new(&storage)
            .create(CreateAccountInput::new(
                "Treasury",
                "1010",
                "First National",
                Money::from_cents(5_000_000_000_000_000_000),
                date(1, 1),
            ))
            .unwrap();
        let service = TransactionService::new(&storage);

        let err = service
            .create(
                account.id,
                CreateTransactionInput::new(
                    date(1, 5),
                    TransactionType::Deposit,
                    Money::from_cents(5_000_000_000_000_000_000),
                ),
            )
            .unwrap_err();
        assert!(err.is_validation());
        assert!(storage.transactions.get_by_account(account.id).unwrap().is_empty());
        assert_eq!(
            balance(&storage, account.id),
            Money::from_cents(5_000_000_000_000_000_000)
        );

        let fee = service
            .create(
                account.id,
                CreateTransactionInput::new(date(1, 6), TransactionType::Fee, Money::from_cents(-100)),
            )
            .unwrap();
        assert_eq!(
            balance(&storage, account.id),
            Money::from_cents(4_999_999_999_999_999_900)
        );
        assert!(service.get(fee.id).unwrap().is_some());
    }
}
