//! Audit logging for bankrec
//!
//! Every create, update, and delete of a bank account, transaction, or
//! reconciliation session is appended to `audit.log` as one JSON line with
//! before/after values.
//!
//! - `AuditEntry`: one logged operation
//! - `AuditLogger`: appends and reads the JSONL file
//! - `generate_diff`: short summary of the fields an update changed

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, Change, EntityType, Operation};
pub use logger::AuditLogger;
