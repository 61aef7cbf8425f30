//! Storage layer for bankrec
//!
//! JSON table files with atomic writes, one repository per table, and a
//! coordinator that runs each state change as a single unit of work.

pub mod accounts;
pub mod file_io;
pub mod reconciliations;
pub mod transactions;

pub use accounts::BankAccountRepository;
pub use file_io::{read_json, write_json_atomic};
pub use reconciliations::ReconciliationRepository;
pub use transactions::TransactionRepository;

use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, warn};

use crate::audit::{AuditEntry, AuditLogger, Change, EntityType};
use crate::config::paths::RecPaths;
use crate::error::{RecError, RecResult};

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: RecPaths,
    pub accounts: BankAccountRepository,
    pub transactions: TransactionRepository,
    pub reconciliations: ReconciliationRepository,
    audit: AuditLogger,
    /// Serializes units of work
    write_lock: Mutex<()>,
    /// Audit entries recorded by the running unit of work
    pending_audit: Mutex<Vec<AuditEntry>>,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: RecPaths) -> Result<Self, RecError> {
        paths.ensure_directories()?;

        Ok(Self {
            accounts: BankAccountRepository::new(paths.accounts_file()),
            transactions: TransactionRepository::new(paths.transactions_file()),
            reconciliations: ReconciliationRepository::new(paths.reconciliations_file()),
            audit: AuditLogger::new(paths.audit_log()),
            write_lock: Mutex::new(()),
            pending_audit: Mutex::new(Vec::new()),
            paths,
        })
    }

    pub fn paths(&self) -> &RecPaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk
    pub fn load_all(&self) -> Result<(), RecError> {
        self.accounts.load()?;
        self.transactions.load()?;
        self.reconciliations.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), RecError> {
        self.accounts.save()?;
        self.transactions.save()?;
        self.reconciliations.save()?;
        Ok(())
    }

    /// Run `work` as one unit of work
    ///
    /// Units are serialized by a store-wide lock. When `work` (or the save
    /// that follows it) fails, every table is put back the way it was, and
    /// the audit entries the unit recorded are dropped. Units must not nest.
    pub fn atomically<T>(&self, work: impl FnOnce() -> RecResult<T>) -> RecResult<T> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| RecError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let accounts = self.accounts.snapshot()?;
        let transactions = self.transactions.snapshot()?;
        let reconciliations = self.reconciliations.snapshot()?;
        self.take_pending_audit()?;

        let outcome = work().and_then(|value| {
            self.save_all()?;
            Ok(value)
        });

        match outcome {
            Ok(value) => {
                let entries = self.take_pending_audit()?;
                if let Err(e) = self.audit.log_batch(&entries) {
                    warn!(error = %e, "Failed to write audit entries");
                }
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "Rolling back unit of work");
                self.take_pending_audit()?;
                self.accounts.restore(accounts)?;
                self.transactions.restore(transactions)?;
                self.reconciliations.restore(reconciliations)?;
                if let Err(e) = self.save_all() {
                    warn!(error = %e, "Failed to persist rolled-back state");
                }
                Err(err)
            }
        }
    }

    fn take_pending_audit(&self) -> RecResult<Vec<AuditEntry>> {
        let mut pending = self
            .pending_audit
            .lock()
            .map_err(|e| RecError::Storage(format!("Failed to acquire audit lock: {}", e)))?;
        Ok(std::mem::take(&mut *pending))
    }

    fn record(&self, entry: AuditEntry) -> RecResult<()> {
        let mut pending = self
            .pending_audit
            .lock()
            .map_err(|e| RecError::Storage(format!("Failed to acquire audit lock: {}", e)))?;
        pending.push(entry);
        Ok(())
    }

    /// Record a create in the running unit of work
    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> RecResult<()> {
        self.record(AuditEntry::new(
            entity_type,
            entity_id,
            entity_name,
            Change::Created(to_json(entity)?),
        ))
    }

    /// Record an update in the running unit of work, with a summary of changed fields
    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> RecResult<()> {
        let change = Change::Updated {
            before: to_json(before)?,
            after: to_json(after)?,
        };
        self.record(AuditEntry::new(entity_type, entity_id, entity_name, change))
    }

    /// Record a delete in the running unit of work
    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> RecResult<()> {
        self.record(AuditEntry::new(
            entity_type,
            entity_id,
            entity_name,
            Change::Deleted(to_json(entity)?),
        ))
    }
}

fn to_json<T: Serialize>(entity: &T) -> RecResult<serde_json::Value> {
    serde_json::to_value(entity)
        .map_err(|e| RecError::Json(format!("Failed to serialize audit snapshot: {}", e)))
}
