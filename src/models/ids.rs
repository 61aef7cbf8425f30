//! Strongly-typed ID wrappers for all entity types
//!
//! Newtype wrappers keep bank account, transaction, and reconciliation ids
//! from being mixed up at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Shortest prefix accepted when looking an entity up by abbreviated id
pub const MIN_SHORT_ID_LEN: usize = 4;

macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Get the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse an ID from a full UUID string (prefix optional)
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                s.parse()
            }

            /// Whether an abbreviated id (as printed by `Display`) refers to this id
            pub fn matches_short(&self, short: &str) -> bool {
                let short = short.trim();
                let short = short.strip_prefix($display_prefix).unwrap_or(short);
                short.len() >= MIN_SHORT_ID_LEN
                    && self.0.to_string().starts_with(&short.to_lowercase())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, &self.0.to_string()[..8])
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(BankAccountId, "acct-");
define_id!(BankTransactionId, "txn-");
define_id!(ReconciliationId, "rec-");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        let id = BankAccountId::new();
        let display = id.to_string();
        assert!(display.starts_with("acct-"));
        assert_eq!(display.len(), 13);
    }

    #[test]
    fn test_id_serialization() {
        let id = ReconciliationId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: ReconciliationId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_parse_with_and_without_prefix() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let plain = BankTransactionId::parse(uuid_str).unwrap();
        let prefixed: BankTransactionId = format!("txn-{}", uuid_str).parse().unwrap();
        assert_eq!(plain, prefixed);
        assert_eq!(plain.as_uuid().to_string(), uuid_str);
    }

    #[test]
    fn test_matches_short() {
        let id = BankTransactionId::parse("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert!(id.matches_short("txn-550e8400"));
        assert!(id.matches_short("550E"));
        assert!(!id.matches_short("550"));
        assert!(!id.matches_short("txn-660e8400"));
    }
}
