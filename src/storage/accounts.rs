//! Bank account repository for JSON storage
//!
//! Manages loading and saving bank accounts to accounts.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::RecError;
use crate::models::{BankAccount, BankAccountId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable account data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct AccountData {
    accounts: Vec<BankAccount>,
}

/// In-memory copy of the table, used to roll back a failed unit of work
pub type AccountSnapshot = HashMap<BankAccountId, BankAccount>;

/// Repository for bank account persistence
pub struct BankAccountRepository {
    path: PathBuf,
    data: RwLock<HashMap<BankAccountId, BankAccount>>,
}

impl BankAccountRepository {
    /// Create a new account repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load accounts from disk
    pub fn load(&self) -> Result<(), RecError> {
        let file_data: AccountData = read_json(&self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| RecError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.clear();
        for account in file_data.accounts {
            data.insert(account.id, account);
        }

        Ok(())
    }

    /// Save accounts to disk
    pub fn save(&self) -> Result<(), RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut accounts: Vec<_> = data.values().cloned().collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        write_json_atomic(&self.path, &AccountData { accounts })
    }

    /// Get an account by ID
    pub fn get(&self, id: BankAccountId) -> Result<Option<BankAccount>, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.get(&id).cloned())
    }

    /// Get all accounts, sorted by name
    pub fn get_all(&self) -> Result<Vec<BankAccount>, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut accounts: Vec<_> = data.values().cloned().collect();
        accounts.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(accounts)
    }

    /// Get all active accounts
    pub fn get_active(&self) -> Result<Vec<BankAccount>, RecError> {
        let all = self.get_all()?;
        Ok(all.into_iter().filter(|a| a.is_active).collect())
    }

    /// Get an account by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Result<Option<BankAccount>, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let name_lower = name.to_lowercase();
        Ok(data
            .values()
            .find(|a| a.name.to_lowercase() == name_lower)
            .cloned())
    }

    /// Find accounts whose id starts with the given abbreviation
    pub fn find_by_short_id(&self, short: &str) -> Result<Vec<BankAccount>, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data
            .values()
            .filter(|a| a.id.matches_short(short))
            .cloned()
            .collect())
    }

    /// Active account linked to the given ledger account, other than `exclude_id`
    pub fn active_for_ledger_account(
        &self,
        ledger_account: &str,
        exclude_id: Option<BankAccountId>,
    ) -> Result<Option<BankAccount>, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data
            .values()
            .find(|a| {
                a.is_active && a.ledger_account == ledger_account && Some(a.id) != exclude_id
            })
            .cloned())
    }

    /// Insert or update an account
    pub fn upsert(&self, account: BankAccount) -> Result<(), RecError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| RecError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.insert(account.id, account);
        Ok(())
    }

    /// Check if an account name is already taken
    pub fn name_exists(
        &self,
        name: &str,
        exclude_id: Option<BankAccountId>,
    ) -> Result<bool, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let name_lower = name.to_lowercase();
        Ok(data
            .values()
            .any(|a| a.name.to_lowercase() == name_lower && Some(a.id) != exclude_id))
    }

    /// Count accounts
    pub fn count(&self) -> Result<usize, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.len())
    }

    pub fn snapshot(&self) -> Result<AccountSnapshot, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.clone())
    }

    pub fn restore(&self, snapshot: AccountSnapshot) -> Result<(), RecError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| RecError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        *data = snapshot;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, BankAccountRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("accounts.json");
        let repo = BankAccountRepository::new(path);
        (temp_dir, repo)
    }

    fn account(name: &str, ledger: &str) -> BankAccount {
        BankAccount::new(
            name,
            ledger,
            "First National",
            Money::from_cents(100000),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let acct = account("Operating", "1000");
        let id = acct.id;
        repo.upsert(acct).unwrap();
        repo.save().unwrap();

        let repo2 = BankAccountRepository::new(temp_dir.path().join("accounts.json"));
        repo2.load().unwrap();

        let retrieved = repo2.get(id).unwrap().unwrap();
        assert_eq!(retrieved.name, "Operating");
        assert_eq!(retrieved.current_balance, Money::from_cents(100000));
    }

    #[test]
    fn test_get_by_name_case_insensitive() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert(account("Payroll Account", "1010")).unwrap();

        assert!(repo.get_by_name("payroll account").unwrap().is_some());
        assert!(repo.get_by_name("other").unwrap().is_none());
        assert!(repo.name_exists("PAYROLL ACCOUNT", None).unwrap());
    }

    #[test]
    fn test_ledger_link_ignores_inactive_and_excluded() {
        let (_temp_dir, repo) = create_test_repo();
        let mut closed = account("Old", "1000");
        closed.is_active = false;
        repo.upsert(closed).unwrap();

        assert!(repo.active_for_ledger_account("1000", None).unwrap().is_none());

        let open = account("New", "1000");
        let open_id = open.id;
        repo.upsert(open).unwrap();

        assert!(repo.active_for_ledger_account("1000", None).unwrap().is_some());
        assert!(repo
            .active_for_ledger_account("1000", Some(open_id))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_snapshot_restore() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert(account("Keep", "1000")).unwrap();
        let snapshot = repo.snapshot().unwrap();

        repo.upsert(account("Discard", "1010")).unwrap();
        assert_eq!(repo.count().unwrap(), 2);

        repo.restore(snapshot).unwrap();
        assert_eq!(repo.count().unwrap(), 1);
        assert!(repo.get_by_name("Discard").unwrap().is_none());
    }
}
