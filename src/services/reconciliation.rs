//! Reconciliation service
//!
//! Drives the session state machine: a session is started against a bank
//! statement, transactions are cleared into it until the cleared balance
//! matches the statement, and it is then completed. An in-progress session
//! can be voided; a completed one can be undone as long as no later
//! statement has been completed on top of it.
//!
//! Session totals are never patched. Every toggle recomputes them from the
//! transactions the session currently owns.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::config::ReconciliationSettings;
use crate::error::{RecError, RecResult};
use crate::models::{
    BankAccountId, BankTransaction, BankTransactionId, Money, Reconciliation, ReconciliationId,
    ReconciliationStatus, ReconciliationTotals,
};
use crate::services::account::AccountService;
use crate::services::transaction::TransactionService;
use crate::storage::Storage;

/// Largest difference a session may be completed with
pub const COMPLETION_TOLERANCE: Money = Money::zero();

/// Service for reconciliation sessions
pub struct ReconciliationService<'a> {
    storage: &'a Storage,
    policy: ReconciliationSettings,
}

/// A session together with the transactions cleared into it
#[derive(Debug, Clone)]
pub struct ReconciliationDetail {
    pub session: Reconciliation,
    /// Owned transactions, oldest first
    pub transactions: Vec<BankTransaction>,
}

/// Result of a bulk toggle
#[derive(Debug, Clone)]
pub struct BulkToggleOutcome {
    pub totals: ReconciliationTotals,
    /// Transactions that now have the requested state
    pub applied: Vec<BankTransactionId>,
    /// Unknown transactions, transactions of another account, and
    /// transactions owned by another session
    pub skipped: Vec<BankTransactionId>,
}

impl<'a> ReconciliationService<'a> {
    /// Create a service using the default reconciliation policy
    pub fn new(storage: &'a Storage) -> Self {
        Self::with_policy(storage, ReconciliationSettings::default())
    }

    pub fn with_policy(storage: &'a Storage, policy: ReconciliationSettings) -> Self {
        Self { storage, policy }
    }

    /// Open a session against a bank statement
    ///
    /// The beginning balance is the ending balance of the latest completed
    /// session, or the account's opening balance if there is none.
    pub fn start(
        &self,
        account_id: BankAccountId,
        statement_date: NaiveDate,
        statement_ending_balance: Money,
    ) -> RecResult<Reconciliation> {
        let session = self.storage.atomically(|| {
            let account = AccountService::new(self.storage).require(account_id)?;
            if !account.is_active {
                return Err(RecError::conflict(format!(
                    "Cannot reconcile inactive bank account '{}'",
                    account.name
                )));
            }

            if let Some(open) = self.storage.reconciliations.find_in_progress(account_id)? {
                return Err(RecError::conflict_with(
                    format!(
                        "Reconciliation {} is already in progress for '{}'",
                        open.id, account.name
                    ),
                    open.id.as_uuid().to_string(),
                ));
            }

            let previous = self.storage.reconciliations.latest_completed(account_id, None)?;
            if let Some(previous) = &previous {
                if self.policy.require_chronological_statements
                    && statement_date <= previous.statement_date
                {
                    return Err(RecError::Validation(format!(
                        "Statement date {} must be after the last completed statement ({})",
                        statement_date, previous.statement_date
                    )));
                }
            }

            let beginning_balance = previous
                .map(|p| p.statement_ending_balance)
                .unwrap_or(account.opening_balance);
            if statement_ending_balance
                .checked_sub(beginning_balance)
                .is_none()
            {
                return Err(RecError::Validation(format!(
                    "Statement ending balance {} is out of range",
                    statement_ending_balance
                )));
            }

            let session = Reconciliation::new(
                account_id,
                statement_date,
                statement_ending_balance,
                beginning_balance,
            );

            self.storage.reconciliations.upsert(session.clone())?;
            self.storage.log_create(
                EntityType::Reconciliation,
                session.id.to_string(),
                Some(format!("{} statement {}", account.name, statement_date)),
                &session,
            )?;
            Ok(session)
        })?;

        info!(
            reconciliation_id = %session.id,
            bank_account_id = %account_id,
            statement_date = %statement_date,
            beginning_balance = %session.beginning_balance,
            "Reconciliation started"
        );
        Ok(session)
    }

    pub fn get(&self, id: ReconciliationId) -> RecResult<Option<Reconciliation>> {
        self.storage.reconciliations.get(id)
    }

    pub fn require(&self, id: ReconciliationId) -> RecResult<Reconciliation> {
        self.storage
            .reconciliations
            .get(id)?
            .ok_or_else(|| RecError::reconciliation_not_found(id.to_string()))
    }

    /// Find a session by full ID or unambiguous ID prefix
    pub fn find(&self, identifier: &str) -> RecResult<Option<Reconciliation>> {
        if let Ok(id) = identifier.parse::<ReconciliationId>() {
            return self.storage.reconciliations.get(id);
        }

        let mut matches = self.storage.reconciliations.find_by_short_id(identifier)?;
        if matches.len() == 1 {
            return Ok(matches.pop());
        }

        Ok(None)
    }

    pub fn resolve(&self, identifier: &str) -> RecResult<Reconciliation> {
        self.find(identifier)?
            .ok_or_else(|| RecError::reconciliation_not_found(identifier))
    }

    /// The session with its owned transactions
    pub fn detail(&self, id: ReconciliationId) -> RecResult<ReconciliationDetail> {
        let session = self.require(id)?;
        let transactions = TransactionService::new(self.storage).list_by_reconciliation(id)?;
        Ok(ReconciliationDetail {
            session,
            transactions,
        })
    }

    /// Clear a transaction into the session, or release it
    ///
    /// Setting a transaction to the state it already has changes nothing.
    pub fn toggle_cleared(
        &self,
        session_id: ReconciliationId,
        transaction_id: BankTransactionId,
        clear: bool,
    ) -> RecResult<ReconciliationTotals> {
        let totals = self.storage.atomically(|| {
            let session = self.require_in_progress(session_id)?;
            let txn = TransactionService::new(self.storage).require(transaction_id)?;

            if txn.account_id != session.account_id {
                return Err(RecError::conflict(format!(
                    "Transaction {} belongs to a different bank account",
                    txn.id
                )));
            }
            if let Some(owner) = foreign_owner(&txn, &session) {
                return Err(RecError::conflict_with(
                    format!("Transaction {} is cleared in reconciliation {}", txn.id, owner),
                    owner.as_uuid().to_string(),
                ));
            }

            self.set_cleared_in_unit(&session, txn, clear)?;
            self.recompute_in_unit(session_id)
        })?;

        debug!(
            reconciliation_id = %session_id,
            transaction_id = %transaction_id,
            clear,
            difference = %totals.difference,
            "Toggled cleared state"
        );
        Ok(totals)
    }

    /// Apply one cleared state to many transactions with a single recompute
    ///
    /// Transactions that can't take part are reported in `skipped` rather than
    /// failing the batch. Either every eligible transaction is changed or none is.
    pub fn bulk_toggle(
        &self,
        session_id: ReconciliationId,
        transaction_ids: &[BankTransactionId],
        clear: bool,
    ) -> RecResult<BulkToggleOutcome> {
        let outcome = self.storage.atomically(|| {
            let session = self.require_in_progress(session_id)?;
            let mut seen = HashSet::new();
            let mut applied = Vec::new();
            let mut skipped = Vec::new();

            for &id in transaction_ids {
                if !seen.insert(id) {
                    continue;
                }
                match self.storage.transactions.get(id)? {
                    Some(txn)
                        if txn.account_id == session.account_id
                            && foreign_owner(&txn, &session).is_none() =>
                    {
                        self.set_cleared_in_unit(&session, txn, clear)?;
                        applied.push(id);
                    }
                    _ => skipped.push(id),
                }
            }

            let totals = self.recompute_in_unit(session_id)?;
            Ok(BulkToggleOutcome {
                totals,
                applied,
                skipped,
            })
        })?;

        debug!(
            reconciliation_id = %session_id,
            clear,
            applied = outcome.applied.len(),
            skipped = outcome.skipped.len(),
            "Bulk toggled cleared state"
        );
        Ok(outcome)
    }

    /// Recompute and persist the session totals from its owned transactions
    ///
    /// A voided session keeps the totals it had when it was voided.
    pub fn recompute(&self, session_id: ReconciliationId) -> RecResult<ReconciliationTotals> {
        self.storage
            .atomically(|| self.recompute_in_unit(session_id))
    }

    /// Close a balanced session and move the account's reconciled watermark
    pub fn complete(&self, session_id: ReconciliationId) -> RecResult<Reconciliation> {
        let session = self.storage.atomically(|| {
            self.require_in_progress(session_id)?;
            let totals = self.recompute_in_unit(session_id)?;
            if !totals.difference.is_within(COMPLETION_TOLERANCE) {
                return Err(RecError::UnbalancedReconciliation {
                    difference: totals.difference,
                });
            }

            let mut session = self.require(session_id)?;
            let before = session.clone();
            session.mark_completed(self.policy.completed_by.clone());

            self.storage.reconciliations.upsert(session.clone())?;
            self.storage.log_update(
                EntityType::Reconciliation,
                session.id.to_string(),
                None,
                &before,
                &session,
            )?;

            AccountService::new(self.storage).write_watermark_in_unit(
                session.account_id,
                Some((session.statement_date, session.statement_ending_balance)),
            )?;
            Ok(session)
        })?;

        info!(
            reconciliation_id = %session.id,
            bank_account_id = %session.account_id,
            statement_date = %session.statement_date,
            "Reconciliation completed"
        );
        Ok(session)
    }

    /// Abandon an in-progress session, releasing every transaction it owns
    pub fn void(&self, session_id: ReconciliationId) -> RecResult<Reconciliation> {
        let session = self.storage.atomically(|| {
            let mut session = self.require_in_progress(session_id)?;
            let released = self.release_owned_in_unit(session_id)?;

            let before = session.clone();
            session.mark_voided();
            self.storage.reconciliations.upsert(session.clone())?;
            self.storage.log_update(
                EntityType::Reconciliation,
                session.id.to_string(),
                None,
                &before,
                &session,
            )?;

            debug!(reconciliation_id = %session_id, released, "Released transactions");
            Ok(session)
        })?;

        info!(
            reconciliation_id = %session.id,
            bank_account_id = %session.account_id,
            "Reconciliation voided"
        );
        Ok(session)
    }

    /// Reopen a completed session
    ///
    /// Undo does not release the session's transactions: they stay cleared
    /// and owned, so the reopened session has the same totals it was
    /// completed with and completing it again restores the prior state.
    /// Voiding the reopened session is what returns them to uncleared. The
    /// account's watermark falls back to the newest remaining completed
    /// session.
    pub fn undo(&self, session_id: ReconciliationId) -> RecResult<Reconciliation> {
        let session = self.storage.atomically(|| {
            let mut session = self.require(session_id)?;
            if !session.is_completed() {
                return Err(RecError::conflict(format!(
                    "Reconciliation {} is not completed (status: {})",
                    session.id, session.status
                )));
            }

            let siblings = self.storage.reconciliations.get_by_account(session.account_id)?;
            if let Some(later) = siblings.iter().find(|r| {
                r.id != session.id && r.is_completed() && r.statement_date > session.statement_date
            }) {
                return Err(RecError::conflict_with(
                    format!(
                        "A later completed reconciliation exists ({} for {})",
                        later.id, later.statement_date
                    ),
                    later.id.as_uuid().to_string(),
                ));
            }
            if let Some(open) = siblings.iter().find(|r| r.is_in_progress()) {
                return Err(RecError::conflict_with(
                    format!("Reconciliation {} is already in progress", open.id),
                    open.id.as_uuid().to_string(),
                ));
            }

            let before = session.clone();
            session.reopen();
            self.storage.reconciliations.upsert(session.clone())?;
            self.storage.log_update(
                EntityType::Reconciliation,
                session.id.to_string(),
                None,
                &before,
                &session,
            )?;
            self.recompute_in_unit(session_id)?;

            let watermark = self
                .storage
                .reconciliations
                .latest_completed(session.account_id, Some(session.id))?
                .map(|r| (r.statement_date, r.statement_ending_balance));
            AccountService::new(self.storage)
                .write_watermark_in_unit(session.account_id, watermark)?;

            self.require(session_id)
        })?;

        info!(
            reconciliation_id = %session.id,
            bank_account_id = %session.account_id,
            "Reconciliation reopened"
        );
        Ok(session)
    }

    /// Replace a session's notes; allowed in any status
    pub fn set_notes(
        &self,
        session_id: ReconciliationId,
        notes: impl Into<String>,
    ) -> RecResult<Reconciliation> {
        let notes = notes.into().trim().to_string();
        self.storage.atomically(|| {
            let mut session = self.require(session_id)?;
            if session.notes == notes {
                return Ok(session);
            }

            let before = session.clone();
            session.notes = notes.clone();
            session.updated_at = Utc::now();

            self.storage.reconciliations.upsert(session.clone())?;
            self.storage.log_update(
                EntityType::Reconciliation,
                session.id.to_string(),
                None,
                &before,
                &session,
            )?;
            Ok(session)
        })
    }

    /// Sessions of an account, latest statement first
    pub fn history(&self, account_id: BankAccountId) -> RecResult<Vec<Reconciliation>> {
        self.storage.reconciliations.get_by_account(account_id)
    }

    /// Transactions still waiting to be cleared, oldest first
    pub fn uncleared(
        &self,
        account_id: BankAccountId,
        as_of: Option<NaiveDate>,
    ) -> RecResult<Vec<BankTransaction>> {
        TransactionService::new(self.storage).list_uncleared(account_id, as_of)
    }

    fn require_in_progress(&self, id: ReconciliationId) -> RecResult<Reconciliation> {
        let session = self.require(id)?;
        if session.status != ReconciliationStatus::InProgress {
            return Err(RecError::conflict(format!(
                "Reconciliation {} is not in progress (status: {})",
                session.id, session.status
            )));
        }
        Ok(session)
    }

    /// Set one transaction's cleared state; returns whether anything changed
    fn set_cleared_in_unit(
        &self,
        session: &Reconciliation,
        mut txn: BankTransaction,
        clear: bool,
    ) -> RecResult<bool> {
        let owned = txn.reconciliation_id == Some(session.id);
        if clear == owned {
            return Ok(false);
        }

        let before = txn.clone();
        if clear {
            txn.mark_cleared(session.id, session.statement_date);
        } else {
            txn.mark_uncleared();
        }

        self.storage.transactions.upsert(txn.clone())?;
        self.storage.log_update(
            EntityType::BankTransaction,
            txn.id.to_string(),
            Some(txn.label()),
            &before,
            &txn,
        )?;
        Ok(true)
    }

    fn release_owned_in_unit(&self, session_id: ReconciliationId) -> RecResult<usize> {
        let owned = self.storage.transactions.get_by_reconciliation(session_id)?;
        let count = owned.len();

        for mut txn in owned {
            let before = txn.clone();
            txn.mark_uncleared();
            self.storage.transactions.upsert(txn.clone())?;
            self.storage.log_update(
                EntityType::BankTransaction,
                txn.id.to_string(),
                Some(txn.label()),
                &before,
                &txn,
            )?;
        }

        Ok(count)
    }

    fn recompute_in_unit(&self, session_id: ReconciliationId) -> RecResult<ReconciliationTotals> {
        let mut session = self.require(session_id)?;
        if session.status == ReconciliationStatus::Voided {
            return Ok(session.totals());
        }

        let owned = self.storage.transactions.get_by_reconciliation(session_id)?;
        let totals = ReconciliationTotals::compute(
            session.beginning_balance,
            session.statement_ending_balance,
            &owned,
        )
        .ok_or_else(|| {
            RecError::Validation(format!(
                "Cleared totals of reconciliation {} exceed the supported amount range",
                session.id
            ))
        })?;

        if totals != session.totals() {
            let before = session.clone();
            session.apply_totals(totals);
            self.storage.reconciliations.upsert(session.clone())?;
            self.storage.log_update(
                EntityType::Reconciliation,
                session.id.to_string(),
                None,
                &before,
                &session,
            )?;
        }

        debug!(
            reconciliation_id = %session_id,
            cleared_balance = %totals.cleared_balance,
            difference = %totals.difference,
            "Recomputed reconciliation totals"
        );
        Ok(totals)
    }
}

/// Another session that already owns `txn`, if any
fn foreign_owner(txn: &BankTransaction, session: &Reconciliation) -> Option<ReconciliationId> {
    txn.reconciliation_id.filter(|&owner| owner != session.id)
}
