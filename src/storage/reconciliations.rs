//! Reconciliation session repository for JSON storage
//!
//! Manages loading and saving sessions to reconciliations.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::RecError;
use crate::models::{BankAccountId, Reconciliation, ReconciliationId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable reconciliation data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct ReconciliationData {
    reconciliations: Vec<Reconciliation>,
}

/// In-memory copy of the table, used to roll back a failed unit of work
pub type ReconciliationSnapshot = HashMap<ReconciliationId, Reconciliation>;

/// Latest statement first
fn sort_latest_first(sessions: &mut [Reconciliation]) {
    sessions.sort_by(|a, b| {
        b.statement_date
            .cmp(&a.statement_date)
            .then(b.created_at.cmp(&a.created_at))
    });
}

/// Repository for reconciliation session persistence
pub struct ReconciliationRepository {
    path: PathBuf,
    data: RwLock<HashMap<ReconciliationId, Reconciliation>>,
}

impl ReconciliationRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load sessions from disk
    pub fn load(&self) -> Result<(), RecError> {
        let file_data: ReconciliationData = read_json(&self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| RecError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.clear();
        for session in file_data.reconciliations {
            data.insert(session.id, session);
        }

        Ok(())
    }

    /// Save sessions to disk
    pub fn save(&self) -> Result<(), RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut reconciliations: Vec<_> = data.values().cloned().collect();
        sort_latest_first(&mut reconciliations);

        write_json_atomic(&self.path, &ReconciliationData { reconciliations })
    }

    pub fn get(&self, id: ReconciliationId) -> Result<Option<Reconciliation>, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.get(&id).cloned())
    }

    /// Every session of an account, latest statement first
    pub fn get_by_account(
        &self,
        account_id: BankAccountId,
    ) -> Result<Vec<Reconciliation>, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut sessions: Vec<_> = data
            .values()
            .filter(|r| r.account_id == account_id)
            .cloned()
            .collect();
        sort_latest_first(&mut sessions);
        Ok(sessions)
    }

    /// The account's in-progress session, if one is open
    pub fn find_in_progress(
        &self,
        account_id: BankAccountId,
    ) -> Result<Option<Reconciliation>, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data
            .values()
            .find(|r| r.account_id == account_id && r.is_in_progress())
            .cloned())
    }

    /// Completed session with the latest statement date, other than `exclude_id`
    pub fn latest_completed(
        &self,
        account_id: BankAccountId,
        exclude_id: Option<ReconciliationId>,
    ) -> Result<Option<Reconciliation>, RecError> {
        let sessions = self.get_by_account(account_id)?;
        Ok(sessions
            .into_iter()
            .find(|r| r.is_completed() && Some(r.id) != exclude_id))
    }

    /// Find sessions whose id starts with the given abbreviation
    pub fn find_by_short_id(&self, short: &str) -> Result<Vec<Reconciliation>, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data
            .values()
            .filter(|r| r.id.matches_short(short))
            .cloned()
            .collect())
    }

    pub fn upsert(&self, session: Reconciliation) -> Result<(), RecError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| RecError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.insert(session.id, session);
        Ok(())
    }

    pub fn count(&self) -> Result<usize, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.len())
    }

    pub fn snapshot(&self) -> Result<ReconciliationSnapshot, RecError> {
        let data = self
            .data
            .read()
            .map_err(|e| RecError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.clone())
    }

    pub fn restore(&self, snapshot: ReconciliationSnapshot) -> Result<(), RecError> {
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

    fn create_test_repo() -> (TempDir, ReconciliationRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reconciliations.json");
        let repo = ReconciliationRepository::new(path);
        (temp_dir, repo)
    }

    fn session(account_id: BankAccountId, month: u32) -> Reconciliation {
        Reconciliation::new(
            account_id,
            NaiveDate::from_ymd_opt(2025, month, 28).unwrap(),
            Money::from_cents(1000),
            Money::zero(),
        )
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let s = session(BankAccountId::new(), 1);
        let id = s.id;
        repo.upsert(s).unwrap();
        repo.save().unwrap();

        let repo2 = ReconciliationRepository::new(temp_dir.path().join("reconciliations.json"));
        repo2.load().unwrap();
        assert!(repo2.get(id).unwrap().unwrap().is_in_progress());
    }

    #[test]
    fn test_find_in_progress() {
        let (_temp_dir, repo) = create_test_repo();
        let account = BankAccountId::new();
        let mut done = session(account, 1);
        done.mark_completed("system");
        repo.upsert(done).unwrap();

        assert!(repo.find_in_progress(account).unwrap().is_none());

        let open = session(account, 2);
        let open_id = open.id;
        repo.upsert(open).unwrap();
        assert_eq!(repo.find_in_progress(account).unwrap().unwrap().id, open_id);
        assert!(repo.find_in_progress(BankAccountId::new()).unwrap().is_none());
    }

    #[test]
    fn test_latest_completed_by_statement_date() {
        let (_temp_dir, repo) = create_test_repo();
        let account = BankAccountId::new();

        let mut march = session(account, 3);
        march.mark_completed("system");
        let march_id = march.id;
        let mut january = session(account, 1);
        january.mark_completed("system");
        let january_id = january.id;
        let mut voided = session(account, 4);
        voided.mark_voided();

        repo.upsert(january).unwrap();
        repo.upsert(march).unwrap();
        repo.upsert(voided).unwrap();

        assert_eq!(repo.latest_completed(account, None).unwrap().unwrap().id, march_id);
        assert_eq!(
            repo.latest_completed(account, Some(march_id)).unwrap().unwrap().id,
            january_id
        );
    }

    #[test]
    fn test_get_by_account_latest_first() {
        let (_temp_dir, repo) = create_test_repo();
        let account = BankAccountId::new();
        repo.upsert(session(account, 1)).unwrap();
        repo.upsert(session(account, 5)).unwrap();
        repo.upsert(session(BankAccountId::new(), 2)).unwrap();

        let history = repo.get_by_account(account).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].statement_date > history[1].statement_date);
    }
}
