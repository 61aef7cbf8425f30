//! Bank account service
//!
//! Account CRUD plus the derived ledger state: the current balance, which is
//! always recomputed from the opening balance and every recorded
//! transaction, and the last-reconciled watermark.
//!
//! Methods ending in `_in_unit` do not take the storage write lock and must be
//! called from inside [`Storage::atomically`].

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::error::{RecError, RecResult};
use crate::models::{BankAccount, BankAccountId, BankAccountType, Money};
use crate::storage::Storage;

/// Service for bank account management
pub struct AccountService<'a> {
    storage: &'a Storage,
}

/// Fields for a new bank account
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    pub name: String,
    /// Number of the linked ledger (asset) account
    pub ledger_account: String,
    pub bank_name: String,
    pub account_type: BankAccountType,
    pub account_number_last4: Option<String>,
    pub routing_number: Option<String>,
    pub opening_balance: Money,
    pub opening_balance_date: NaiveDate,
    pub notes: Option<String>,
}

impl CreateAccountInput {
    pub fn new(
        name: impl Into<String>,
        ledger_account: impl Into<String>,
        bank_name: impl Into<String>,
        opening_balance: Money,
        opening_balance_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            ledger_account: ledger_account.into(),
            bank_name: bank_name.into(),
            account_type: BankAccountType::default(),
            account_number_last4: None,
            routing_number: None,
            opening_balance,
            opening_balance_date,
            notes: None,
        }
    }
}

/// Partial update of a bank account; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub bank_name: Option<String>,
    pub account_type: Option<BankAccountType>,
    pub account_number_last4: Option<String>,
    pub routing_number: Option<String>,
    pub is_active: Option<bool>,
    pub notes: Option<String>,
}

impl AccountPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.bank_name.is_none()
            && self.account_type.is_none()
            && self.account_number_last4.is_none()
            && self.routing_number.is_none()
            && self.is_active.is_none()
            && self.notes.is_none()
    }
}

/// Summary of an account with computed fields
#[derive(Debug, Clone)]
pub struct AccountSummary {
    pub account: BankAccount,
    pub transaction_count: usize,
    pub uncleared_count: usize,
}

impl<'a> AccountService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new bank account
    pub fn create(&self, input: CreateAccountInput) -> RecResult<BankAccount> {
        let mut account = BankAccount::new(
            input.name.trim(),
            input.ledger_account.trim(),
            input.bank_name.trim(),
            input.opening_balance,
            input.opening_balance_date,
        );
        account.account_type = input.account_type;
        account.account_number_last4 = input.account_number_last4;
        account.routing_number = input.routing_number;
        account.notes = input.notes.unwrap_or_default();

        account
            .validate()
            .map_err(|e| RecError::Validation(e.to_string()))?;

        self.storage.atomically(|| {
            self.ensure_name_available(&account.name, None)?;
            self.ensure_ledger_link_available(&account.ledger_account, None)?;

            self.storage.accounts.upsert(account.clone())?;
            self.storage.log_create(
                EntityType::BankAccount,
                account.id.to_string(),
                Some(account.name.clone()),
                &account,
            )
        })?;

        info!(bank_account_id = %account.id, name = %account.name, "Bank account created");
        Ok(account)
    }

    /// Get an account by ID
    pub fn get(&self, id: BankAccountId) -> RecResult<Option<BankAccount>> {
        self.storage.accounts.get(id)
    }

    /// Get an account by ID, failing if it doesn't exist
    pub fn require(&self, id: BankAccountId) -> RecResult<BankAccount> {
        self.storage
            .accounts
            .get(id)?
            .ok_or_else(|| RecError::account_not_found(id.to_string()))
    }

    /// Find an account by name, full ID, or unambiguous ID prefix
    pub fn find(&self, identifier: &str) -> RecResult<Option<BankAccount>> {
        if let Some(account) = self.storage.accounts.get_by_name(identifier)? {
            return Ok(Some(account));
        }

        if let Ok(id) = identifier.parse::<BankAccountId>() {
            return self.storage.accounts.get(id);
        }

        let mut matches = self.storage.accounts.find_by_short_id(identifier)?;
        if matches.len() == 1 {
            return Ok(matches.pop());
        }

        Ok(None)
    }

    /// Like [`find`](Self::find), but a miss is an error
    pub fn resolve(&self, identifier: &str) -> RecResult<BankAccount> {
        self.find(identifier)?
            .ok_or_else(|| RecError::account_not_found(identifier))
    }

    pub fn list(&self, include_inactive: bool) -> RecResult<Vec<BankAccount>> {
        if include_inactive {
            self.storage.accounts.get_all()
        } else {
            self.storage.accounts.get_active()
        }
    }

    /// All accounts with their transaction counts
    pub fn list_with_summaries(&self, include_inactive: bool) -> RecResult<Vec<AccountSummary>> {
        let accounts = self.list(include_inactive)?;
        let mut summaries = Vec::with_capacity(accounts.len());

        for account in accounts {
            summaries.push(self.get_summary(account)?);
        }

        Ok(summaries)
    }

    pub fn get_summary(&self, account: BankAccount) -> RecResult<AccountSummary> {
        let transactions = self.storage.transactions.get_by_account(account.id)?;
        let uncleared_count = transactions.iter().filter(|t| !t.is_cleared).count();

        Ok(AccountSummary {
            transaction_count: transactions.len(),
            uncleared_count,
            account,
        })
    }

    /// Apply a partial update
    pub fn update(&self, id: BankAccountId, patch: AccountPatch) -> RecResult<BankAccount> {
        let account = self.storage.atomically(|| {
            let mut account = self.require(id)?;
            let before = account.clone();

            if let Some(name) = &patch.name {
                let name = name.trim();
                self.ensure_name_available(name, Some(id))?;
                account.name = name.to_string();
            }
            if let Some(bank_name) = &patch.bank_name {
                account.bank_name = bank_name.trim().to_string();
            }
            if let Some(account_type) = patch.account_type {
                account.account_type = account_type;
            }
            if let Some(last4) = &patch.account_number_last4 {
                account.account_number_last4 = Some(last4.trim().to_string());
            }
            if let Some(routing) = &patch.routing_number {
                account.routing_number = Some(routing.trim().to_string());
            }
            if let Some(is_active) = patch.is_active {
                if is_active && !before.is_active {
                    self.ensure_ledger_link_available(&account.ledger_account, Some(id))?;
                }
                account.is_active = is_active;
            }
            if let Some(notes) = &patch.notes {
                account.notes = notes.clone();
            }

            account
                .validate()
                .map_err(|e| RecError::Validation(e.to_string()))?;
            account.updated_at = Utc::now();

            self.storage.accounts.upsert(account.clone())?;
            self.storage.log_update(
                EntityType::BankAccount,
                account.id.to_string(),
                Some(account.name.clone()),
                &before,
                &account,
            )?;
            Ok(account)
        })?;

        debug!(bank_account_id = %account.id, "Bank account updated");
        Ok(account)
    }

    /// Recompute the current balance from the opening balance and all transactions
    pub fn recompute_balance(&self, id: BankAccountId) -> RecResult<Money> {
        self.storage
            .atomically(|| self.recompute_balance_in_unit(id))
    }

    pub(crate) fn recompute_balance_in_unit(&self, id: BankAccountId) -> RecResult<Money> {
        let mut account = self.require(id)?;
        let transactions = self.storage.transactions.get_by_account(id)?;
        let balance = Money::checked_sum(transactions.iter().map(|t| t.amount))
            .and_then(|total| account.opening_balance.checked_add(total))
            .ok_or_else(|| {
                RecError::Validation(format!(
                    "Balance of '{}' exceeds the supported amount range",
                    account.name
                ))
            })?;

        if account.current_balance != balance {
            let before = account.clone();
            account.current_balance = balance;
            account.updated_at = Utc::now();
            self.storage.accounts.upsert(account.clone())?;
            self.storage.log_update(
                EntityType::BankAccount,
                account.id.to_string(),
                Some(account.name.clone()),
                &before,
                &account,
            )?;
        }

        debug!(bank_account_id = %id, balance = %balance, "Recomputed account balance");
        Ok(balance)
    }

    /// Stamp the last-reconciled watermark
    pub fn set_reconciled_watermark(
        &self,
        id: BankAccountId,
        date: NaiveDate,
        balance: Money,
    ) -> RecResult<BankAccount> {
        self.storage
            .atomically(|| self.write_watermark_in_unit(id, Some((date, balance))))
    }

    /// Reset the last-reconciled watermark to "never reconciled"
    pub fn clear_reconciled_watermark(&self, id: BankAccountId) -> RecResult<BankAccount> {
        self.storage
            .atomically(|| self.write_watermark_in_unit(id, None))
    }

    pub(crate) fn write_watermark_in_unit(
        &self,
        id: BankAccountId,
        watermark: Option<(NaiveDate, Money)>,
    ) -> RecResult<BankAccount> {
        let mut account = self.require(id)?;
        let before = account.clone();

        match watermark {
            Some((date, balance)) => account.set_reconciled(date, balance),
            None => account.clear_reconciled(),
        }

        self.storage.accounts.upsert(account.clone())?;
        self.storage.log_update(
            EntityType::BankAccount,
            account.id.to_string(),
            Some(account.name.clone()),
            &before,
            &account,
        )?;
        Ok(account)
    }

    fn ensure_name_available(&self, name: &str, exclude: Option<BankAccountId>) -> RecResult<()> {
        if self.storage.accounts.name_exists(name, exclude)? {
            return Err(RecError::Duplicate {
                entity_type: "Bank account",
                identifier: name.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_ledger_link_available(
        &self,
        ledger_account: &str,
        exclude: Option<BankAccountId>,
    ) -> RecResult<()> {
        if let Some(existing) = self
            .storage
            .accounts
            .active_for_ledger_account(ledger_account, exclude)?
        {
            return Err(RecError::conflict_with(
                format!(
                    "Ledger account {} is already linked to bank account '{}'",
                    ledger_account, existing.name
                ),
                existing.id.to_string(),
            ));
        }
        Ok(())
    }
}
