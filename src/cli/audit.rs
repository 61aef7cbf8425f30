//! Audit log CLI command

use clap::Args;

use crate::error::RecResult;
use crate::storage::Storage;

/// Arguments for viewing the audit log
#[derive(Args)]
pub struct AuditArgs {
    /// Number of most recent entries to show
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Only entries about this account, transaction, or reconciliation ID
    #[arg(short, long)]
    pub entity: Option<String>,
}

/// Print the most recent audit entries, oldest first
pub fn handle_audit_command(storage: &Storage, args: AuditArgs) -> RecResult<()> {
    let entries = match &args.entity {
        Some(identifier) => storage.audit().read_for_entity(identifier, args.limit)?,
        None => storage.audit().read_recent(args.limit)?,
    };

    if entries.is_empty() {
        println!("No audit entries found.");
        return Ok(());
    }

    for entry in &entries {
        println!("{}", entry);
    }

    Ok(())
}
