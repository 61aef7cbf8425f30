//! Audit entry data structures
//!
//! An entry is built from a [`Change`]: the entity's JSON state before
//! and/or after the operation. The operation and the diff summary are
//! derived from it, so an update always carries both sides.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::diff::generate_diff;

/// Kind of operation recorded by an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Create => "CREATE",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        })
    }
}

/// Audited tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    BankAccount,
    BankTransaction,
    Reconciliation,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityType::BankAccount => "BankAccount",
            EntityType::BankTransaction => "BankTransaction",
            EntityType::Reconciliation => "Reconciliation",
        })
    }
}

/// Entity state captured for one operation
#[derive(Debug, Clone)]
pub enum Change {
    Created(Value),
    Updated { before: Value, after: Value },
    Deleted(Value),
}

/// One line of the audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    pub entity_type: EntityType,

    /// Id as printed to users (e.g. `rec-1a2b3c4d`)
    pub entity_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,

    /// Changed fields of an update, e.g. `status: "in_progress" -> "completed"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
}

impl AuditEntry {
    pub fn new(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        change: Change,
    ) -> Self {
        let (operation, before, after) = match change {
            Change::Created(after) => (Operation::Create, None, Some(after)),
            Change::Updated { before, after } => (Operation::Update, Some(before), Some(after)),
            Change::Deleted(before) => (Operation::Delete, Some(before), None),
        };
        let diff_summary = match (&before, &after) {
            (Some(before), Some(after)) => generate_diff(before, after),
            _ => None,
        };

        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_id: entity_id.into(),
            entity_name,
            before,
            after,
            diff_summary,
        }
    }

    /// Whether `identifier` names this entry's entity
    ///
    /// Accepts the printed id, a full UUID (with or without prefix), or a
    /// prefix of at least four hex digits.
    pub fn refers_to(&self, identifier: &str) -> bool {
        let wanted = strip_id_prefix(identifier.trim()).to_lowercase();
        let logged = strip_id_prefix(&self.entity_id).to_lowercase();
        if wanted.len() < 4 || logged.is_empty() {
            return false;
        }
        logged.starts_with(&wanted) || wanted.starts_with(&logged)
    }

    /// Before and after values of one top-level field, if an update changed it
    pub fn field_change(&self, field: &str) -> Option<(&Value, &Value)> {
        let before = self.before.as_ref()?.get(field)?;
        let after = self.after.as_ref()?.get(field)?;
        (before != after).then_some((before, after))
    }
}

fn strip_id_prefix(id: &str) -> &str {
    ["acct-", "txn-", "rec-"]
        .iter()
        .find_map(|prefix| id.strip_prefix(prefix))
        .unwrap_or(id)
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity_type,
            self.entity_id
        )?;
        if let Some(name) = &self.entity_name {
            write!(f, " ({})", name)?;
        }
        if let Some(diff) = &self.diff_summary {
            write!(f, "\n  Changes: {}", diff)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session_update() -> AuditEntry {
        AuditEntry::new(
            EntityType::Reconciliation,
            "rec-1a2b3c4d",
            None,
            Change::Updated {
                before: json!({"status": "in_progress", "difference": 0}),
                after: json!({"status": "completed", "difference": 0}),
            },
        )
    }

    #[test]
    fn test_entity_type_serialization() {
        let json = serde_json::to_string(&EntityType::BankTransaction).unwrap();
        assert_eq!(json, "\"bank_transaction\"");
        assert_eq!(EntityType::Reconciliation.to_string(), "Reconciliation");
    }

    #[test]
    fn test_update_derives_diff() {
        let entry = session_update();
        assert_eq!(entry.operation, Operation::Update);
        assert_eq!(
            entry.diff_summary.as_deref(),
            Some("status: \"in_progress\" -> \"completed\"")
        );
        assert_eq!(
            entry.field_change("status"),
            Some((&json!("in_progress"), &json!("completed")))
        );
        assert!(entry.field_change("difference").is_none());
    }

    #[test]
    fn test_delete_has_no_after() {
        let entry = AuditEntry::new(
            EntityType::BankTransaction,
            "txn-12345678",
            None,
            Change::Deleted(json!({"amount": -2000})),
        );

        assert_eq!(entry.operation, Operation::Delete);
        assert!(entry.after.is_none());
        assert!(entry.diff_summary.is_none());
        assert!(entry.field_change("amount").is_none());
    }

    #[test]
    fn test_refers_to() {
        let entry = session_update();
        assert!(entry.refers_to("rec-1a2b3c4d"));
        assert!(entry.refers_to("1a2b"));
        assert!(entry.refers_to("1a2b3c4d-0000-4000-8000-000000000000"));
        assert!(!entry.refers_to("1a2"));
        assert!(!entry.refers_to("rec-ffff"));
    }

    #[test]
    fn test_display() {
        let entry = AuditEntry::new(
            EntityType::BankAccount,
            "acct-12345678",
            Some("Operating".to_string()),
            Change::Created(json!({"name": "Operating"})),
        );

        let formatted = entry.to_string();
        assert!(formatted.contains("CREATE BankAccount acct-12345678 (Operating)"));
        assert!(!formatted.contains("Changes:"));
        assert!(session_update().to_string().contains("\n  Changes: status:"));
    }
}
