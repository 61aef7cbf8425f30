//! bankrec - Bank account reconciliation
//!
//! This library provides the core of the bankrec application: bank accounts
//! linked to ledger accounts, the transactions recorded against them, and
//! reconciliation sessions that clear those transactions against bank
//! statements.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (accounts, transactions, reconciliations)
//! - `storage`: JSON file storage layer and units of work
//! - `services`: Business logic layer
//! - `audit`: Audit logging system
//! - `display`: Terminal formatting
//! - `cli`: Command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use bankrec::config::{RecPaths, Settings};
//! use bankrec::services::ReconciliationService;
//! use bankrec::storage::Storage;
//!
//! let paths = RecPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::new(paths)?;
//! storage.load_all()?;
//!
//! let service = ReconciliationService::with_policy(&storage, settings.reconciliation);
//! let session = service.start(account_id, statement_date, ending_balance)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{RecError, RecResult};
