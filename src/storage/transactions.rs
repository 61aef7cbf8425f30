//! Bank transaction repository for JSON storage
//!
//! Manages loading and saving transactions to transactions.json, with an
//! index by owning account.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::RecError;
use crate::models::{BankAccountId, BankTransaction, BankTransactionId, ReconciliationId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable transaction data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TransactionData {
    transactions: Vec<BankTransaction>,
}

/// In-memory copy of the table, used to roll back a failed unit of work
pub type TransactionSnapshot = HashMap<BankTransactionId, BankTransaction>;

/// Repository for transaction persistence with indexing
pub struct TransactionRepository {
    path: PathBuf,
    data: RwLock<HashMap<BankTransactionId, BankTransaction>>,
    /// Index: account_id -> transaction_ids
    by_account: RwLock<HashMap<BankAccountId, Vec<BankTransactionId>>>,
}

fn build_account_index(
    data: &HashMap<BankTransactionId, BankTransaction>,
) -> HashMap<BankAccountId, Vec<BankTransactionId>> {
    let mut index: HashMap<BankAccountId, Vec<BankTransactionId>> = HashMap::new();
    for txn in data.values() {
        index.entry(txn.account_id).or_default().push(txn.id);
    }
    index
}

/// Newest first
fn sort_newest_first(transactions: &mut [BankTransaction]) {
    transactions.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then(b.created_at.cmp(&a.created_at))
    });
}

impl TransactionRepository {
    /// Create a new transaction repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_account: RwLock::new(HashMap::new()),
        }
    }

    /// Load transactions from disk and build indexes
    pub fn load(&self) -> Result<(), RecError> {
        let file_data: TransactionData = read_json(&self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| RecError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        let mut by_account = self
            .by_account
            .write()
            .map_err(|e| RecError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.clear();
        for txn in file_data.transactions {
            data.insert(txn.id, txn);
        }
        *by_account = build_account_index(&data);

        Ok(())
    }

    /// Save transactions to disk
    pub fn save(&self) -> Result<(), RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut transactions: Vec<_> = data.values().cloned().collect();
        sort_newest_first(&mut transactions);

        write_json_atomic(&self.path, &TransactionData { transactions })
    }

    /// Get a transaction by ID
    pub fn get(&self, id: BankTransactionId) -> Result<Option<BankTransaction>, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.get(&id).cloned())
    }

    /// Get transactions for an account, newest first
    pub fn get_by_account(
        &self,
        account_id: BankAccountId,
    ) -> Result<Vec<BankTransaction>, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        let by_account = self
            .by_account
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let ids = by_account
            .get(&account_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        let mut transactions: Vec<_> = ids.iter().filter_map(|id| data.get(id).cloned()).collect();
        sort_newest_first(&mut transactions);
        Ok(transactions)
    }

    /// Get the transactions cleared into a reconciliation session
    pub fn get_by_reconciliation(
        &self,
        reconciliation_id: ReconciliationId,
    ) -> Result<Vec<BankTransaction>, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut transactions: Vec<_> = data
            .values()
            .filter(|t| t.reconciliation_id == Some(reconciliation_id))
            .cloned()
            .collect();
        sort_newest_first(&mut transactions);
        Ok(transactions)
    }

    /// Find transactions whose id starts with the given abbreviation
    pub fn find_by_short_id(&self, short: &str) -> Result<Vec<BankTransaction>, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data
            .values()
            .filter(|t| t.id.matches_short(short))
            .cloned()
            .collect())
    }

    /// Insert or update a transaction
    pub fn upsert(&self, txn: BankTransaction) -> Result<(), RecError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| RecError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        let mut by_account = self
            .by_account
            .write()
            .map_err(|e| RecError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        if let Some(old) = data.get(&txn.id) {
            if let Some(ids) = by_account.get_mut(&old.account_id) {
                ids.retain(|&id| id != txn.id);
            }
        }

        by_account.entry(txn.account_id).or_default().push(txn.id);
        data.insert(txn.id, txn);
        Ok(())
    }

    /// Delete a transaction
    pub fn delete(&self, id: BankTransactionId) -> Result<bool, RecError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| RecError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        let mut by_account = self
            .by_account
            .write()
            .map_err(|e| RecError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        match data.remove(&id) {
            Some(txn) => {
                if let Some(ids) = by_account.get_mut(&txn.account_id) {
                    ids.retain(|&tid| tid != id);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Count transactions
    pub fn count(&self) -> Result<usize, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.len())
    }

    pub fn snapshot(&self) -> Result<TransactionSnapshot, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.clone())
    }

    /// Replace the table with a snapshot and rebuild the index
    pub fn restore(&self, snapshot: TransactionSnapshot) -> Result<(), RecError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| RecError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        let mut by_account = self
            .by_account
            .write()
            .map_err(|e| RecError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        *by_account = build_account_index(&snapshot);
        *data = snapshot;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, TransactionType};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, TransactionRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("transactions.json");
        let repo = TransactionRepository::new(path);
        (temp_dir, repo)
    }

    fn txn(account_id: BankAccountId, day: u32, cents: i64) -> BankTransaction {
        BankTransaction::new(
            account_id,
            NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            TransactionType::Adjustment,
            Money::from_cents(cents),
        )
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_get_by_account_newest_first() {
        let (_temp_dir, repo) = create_test_repo();
        let account1 = BankAccountId::new();
        let account2 = BankAccountId::new();

        repo.upsert(txn(account1, 5, -100)).unwrap();
        repo.upsert(txn(account1, 20, -200)).unwrap();
        repo.upsert(txn(account2, 10, -300)).unwrap();

        let account1_txns = repo.get_by_account(account1).unwrap();
        assert_eq!(account1_txns.len(), 2);
        assert_eq!(account1_txns[0].amount.cents(), -200);

        assert_eq!(repo.get_by_account(account2).unwrap().len(), 1);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let t = txn(BankAccountId::new(), 15, -5000);
        let id = t.id;

        repo.upsert(t).unwrap();
        repo.save().unwrap();

        let repo2 = TransactionRepository::new(temp_dir.path().join("transactions.json"));
        repo2.load().unwrap();

        assert_eq!(repo2.get(id).unwrap().unwrap().amount.cents(), -5000);
    }

    #[test]
    fn test_get_by_reconciliation() {
        let (_temp_dir, repo) = create_test_repo();
        let account = BankAccountId::new();
        let session = ReconciliationId::new();

        let mut cleared = txn(account, 5, 100);
        cleared.mark_cleared(session, NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
        repo.upsert(cleared).unwrap();
        repo.upsert(txn(account, 6, 200)).unwrap();

        let owned = repo.get_by_reconciliation(session).unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].amount.cents(), 100);
    }

    #[test]
    fn test_delete_updates_index() {
        let (_temp_dir, repo) = create_test_repo();
        let account = BankAccountId::new();
        let t = txn(account, 15, -5000);
        let id = t.id;

        repo.upsert(t).unwrap();
        assert!(repo.delete(id).unwrap());
        assert!(!repo.delete(id).unwrap());
        assert!(repo.get_by_account(account).unwrap().is_empty());
    }

    #[test]
    fn test_restore_rebuilds_index() {
        let (_temp_dir, repo) = create_test_repo();
        let account = BankAccountId::new();
        repo.upsert(txn(account, 1, 100)).unwrap();
        let snapshot = repo.snapshot().unwrap();

        repo.upsert(txn(account, 2, 200)).unwrap();
        repo.restore(snapshot).unwrap();

        let remaining = repo.get_by_account(account).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].amount.cents(), 100);
    }
}
